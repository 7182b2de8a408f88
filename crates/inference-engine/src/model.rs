//! Price Models

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::InferenceError;

/// A trained regressor over encoded feature vectors.
pub trait PriceModel: Send + Sync {
    /// Column order the model was trained on
    fn feature_names(&self) -> &[String];

    /// Predict a price from values in [`PriceModel::feature_names`] order.
    fn predict(&self, values: &[Option<f64>]) -> Result<f64, InferenceError>;
}

/// Linear reference model persisted as JSON.
///
/// Missing inputs contribute nothing to the sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPriceModel {
    /// Training column order
    pub feature_names: Vec<String>,
    pub intercept: f64,
    /// One weight per feature
    pub coefficients: Vec<f64>,
}

impl LinearPriceModel {
    /// Build a model, rejecting mismatched weight counts
    pub fn new(
        feature_names: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            feature_names,
            intercept,
            coefficients,
        };
        model.check()?;
        Ok(model)
    }

    /// Model that predicts `price` whatever the inputs
    pub fn constant(feature_names: Vec<String>, price: f64) -> Self {
        let coefficients = vec![0.0; feature_names.len()];
        Self {
            feature_names,
            intercept: price,
            coefficients,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let model: Self = serde_json::from_str(json)
            .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;
        model.check()?;
        Ok(model)
    }

    /// Load a model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        let model = Self::from_json(&json)?;
        info!(
            "Loaded price model from {} ({} features)",
            path.display(),
            model.feature_names.len()
        );
        Ok(model)
    }

    fn check(&self) -> Result<(), InferenceError> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(InferenceError::ModelLoadError(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(InferenceError::ModelLoadError(
                "non-finite model weight".to_string(),
            ));
        }
        Ok(())
    }
}

impl PriceModel for LinearPriceModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, values: &[Option<f64>]) -> Result<f64, InferenceError> {
        if values.len() != self.coefficients.len() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.coefficients.len(),
                actual: values.len(),
            });
        }
        let price = self
            .coefficients
            .iter()
            .zip(values)
            .filter_map(|(weight, value)| value.map(|v| weight * v))
            .sum::<f64>()
            + self.intercept;
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_linear_prediction_skips_missing() {
        let model = LinearPriceModel::new(names(&["Mileage", "Region"]), 1000.0, vec![-0.1, 50.0])
            .unwrap();
        let price = model.predict(&[Some(10_000.0), Some(2.0)]).unwrap();
        assert!((price - 100.0).abs() < 1e-9);

        let price = model.predict(&[None, Some(2.0)]).unwrap();
        assert!((price - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_checked() {
        let model = LinearPriceModel::constant(names(&["a", "b"]), 5.0);
        assert!(matches!(
            model.predict(&[Some(1.0)]),
            Err(InferenceError::InvalidInputShape { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_artifact_rejects_bad_weights() {
        let json = r#"{"feature_names":["a","b"],"intercept":1.0,"coefficients":[1.0]}"#;
        assert!(matches!(
            LinearPriceModel::from_json(json),
            Err(InferenceError::ModelLoadError(_))
        ));
        assert!(LinearPriceModel::from_json("not json").is_err());

        let json = r#"{"feature_names":["a"],"intercept":1.0,"coefficients":[2.5]}"#;
        let model = LinearPriceModel::from_json(json).unwrap();
        assert_eq!(model.feature_names(), &["a".to_string()]);
    }
}
