//! Price Inference Engine
//!
//! Scores encoded feature vectors with a persisted price model and turns the
//! raw prediction into a recommended listing price range.

mod engine;
mod model;

pub use engine::{PriceEstimate, PriceEstimator, DEFAULT_PRICE_SPREAD};
pub use model::{LinearPriceModel, PriceModel};

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    /// Model was trained on a different column order than the pipeline produces
    #[error(
        "feature schema mismatch: model expects {expected} columns, pipeline produces {actual}; missing {missing:?}, unexpected {unexpected:?}"
    )]
    SchemaMismatch {
        expected: usize,
        actual: usize,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}
