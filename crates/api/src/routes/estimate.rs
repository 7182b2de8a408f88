//! Price Estimate Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use data_validator::Listing;
use feature_engine::VehicleRecord;
use inference_engine::PriceEstimate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::{AppState, ESTIMATES_TOTAL, LOOKUP_FAILURES_TOTAL, PREDICTION_FAILURES_TOTAL};

/// Estimate plus the merged record it was computed from
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    #[serde(flatten)]
    pub estimate: PriceEstimate,
    /// Rounded model output
    pub rounded_price: i64,
    pub vehicle: VehicleRecord,
}

/// Price a listing: validate, decode, merge, transform, predict
pub async fn post_estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Listing>, JsonRejection>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let Json(listing) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let result = state.validator.validate_listing(&listing);
    if !result.valid {
        return Err(ApiError::Validation(result.errors));
    }

    let pipeline = state.pipeline.fitted().ok_or(ApiError::NotReady("feature pipeline"))?;
    let estimator = state
        .estimator
        .as_ref()
        .ok_or(ApiError::NotReady("price model"))?;

    let decode = state.decoder.decode(&listing.vin).await.map_err(|e| {
        warn!("Lookup failed for {}: {}", listing.vin.trim(), e);
        metrics::counter!(LOOKUP_FAILURES_TOTAL).increment(1);
        ApiError::from(e)
    })?;

    let record = state.adapter.merge_payload(&listing, &decode)?;
    let vector = pipeline.transform_one(&record);

    let estimate = estimator.estimate(&vector).map_err(|e| {
        metrics::counter!(PREDICTION_FAILURES_TOTAL).increment(1);
        ApiError::from(e)
    })?;

    metrics::counter!(ESTIMATES_TOTAL).increment(1);
    info!(
        "Estimated {} ({}) at {:.0} [{}, {}]",
        record.vin, record.model, estimate.price, estimate.min_price, estimate.max_price
    );

    Ok(Json(EstimateResponse {
        rounded_price: estimate.price.round_ties_even() as i64,
        estimate,
        vehicle: record,
    }))
}
