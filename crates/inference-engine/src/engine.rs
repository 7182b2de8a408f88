//! Price Estimator
//!
//! Pairs a price model with the column order of the fitted pipeline that
//! feeds it. A model trained on a different column order is refused at
//! construction time rather than silently mis-scored.

use std::time::Instant;

use feature_engine::EncodedFeatureVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::PriceModel;
use crate::InferenceError;

/// Half-width of the recommended price range, in dollars
pub const DEFAULT_PRICE_SPREAD: f64 = 1900.0;

/// Recommended listing price for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub vin: String,
    /// Raw model output
    pub price: f64,
    /// Lower bound of the range, whole dollars
    pub min_price: i64,
    /// Upper bound of the range, whole dollars
    pub max_price: i64,
    /// Lower bound relative to the prediction, rounded percent
    pub min_delta_pct: i64,
    /// Upper bound relative to the prediction, rounded percent
    pub max_delta_pct: i64,
    /// Features the model saw as missing
    pub missing_features: usize,
    /// Scoring latency in milliseconds
    pub latency_ms: u64,
}

/// Scores encoded vectors and derives a price range
pub struct PriceEstimator {
    model: Box<dyn PriceModel>,
    spread: f64,
}

impl std::fmt::Debug for PriceEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceEstimator")
            .field("features", &self.model.feature_names().len())
            .field("spread", &self.spread)
            .finish()
    }
}

impl PriceEstimator {
    /// Bind a model to the pipeline's output columns.
    pub fn new(
        model: Box<dyn PriceModel>,
        pipeline_columns: &[String],
        spread: f64,
    ) -> Result<Self, InferenceError> {
        check_schema(model.feature_names(), pipeline_columns)?;
        info!(
            "Price estimator ready: {} features, spread {}",
            pipeline_columns.len(),
            spread
        );
        Ok(Self { model, spread })
    }

    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Score one vector and build the recommended range around it.
    pub fn estimate(&self, vector: &EncodedFeatureVector) -> Result<PriceEstimate, InferenceError> {
        let start = Instant::now();
        let price = self.model.predict(&vector.values)?;

        if !price.is_finite() || price <= 0.0 {
            warn!("Model produced unusable price {} for {}", price, vector.vin);
            return Err(InferenceError::PredictionFailed(format!(
                "model produced unusable price {price}"
            )));
        }

        // halves round to even
        let center = price.round_ties_even();
        let min_price = center - self.spread;
        let max_price = center + self.spread;
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!("Estimated {} at {:.0} in {}ms", vector.vin, price, latency_ms);

        Ok(PriceEstimate {
            vin: vector.vin.clone(),
            price,
            min_price: min_price as i64,
            max_price: max_price as i64,
            min_delta_pct: delta_pct(min_price, price),
            max_delta_pct: delta_pct(max_price, price),
            missing_features: vector.missing_count(),
            latency_ms,
        })
    }
}

fn delta_pct(bound: f64, price: f64) -> i64 {
    (bound / price * 100.0).round_ties_even() as i64 - 100
}

fn check_schema(expected: &[String], actual: &[String]) -> Result<(), InferenceError> {
    if expected == actual {
        return Ok(());
    }
    let missing = expected
        .iter()
        .filter(|c| !actual.contains(c))
        .cloned()
        .collect();
    let unexpected = actual
        .iter()
        .filter(|c| !expected.contains(c))
        .cloned()
        .collect();
    Err(InferenceError::SchemaMismatch {
        expected: expected.len(),
        actual: actual.len(),
        missing,
        unexpected,
    })
}
