//! API Error Responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use data_validator::{AdapterError, ValidationError};
use feature_engine::PipelineError;
use inference_engine::InferenceError;
use serde_json::{json, Value};
use thiserror::Error;
use vin_decoder::LookupError;

/// Failure of a request, rendered as `{ "error", "message", "details" }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("listing failed validation ({} errors)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// A required artifact was not loaded at startup
    #[error("{0} not loaded")]
    NotReady(&'static str),
}

impl ApiError {
    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::Validation(_) => "validation",
            ApiError::Adapter(AdapterError::MissingVinMatch { .. }) => "vin_mismatch",
            ApiError::Adapter(AdapterError::SchemaMismatch { .. }) => "schema_mismatch",
            ApiError::Lookup(LookupError::InvalidVin(_)) => "validation",
            ApiError::Lookup(_) => "lookup_failure",
            ApiError::Pipeline(PipelineError::NotFitted) => "not_ready",
            ApiError::Pipeline(_) => "pipeline",
            ApiError::Inference(_) => "prediction_failure",
            ApiError::NotReady(_) => "not_ready",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) | ApiError::Adapter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Lookup(LookupError::InvalidVin(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Lookup(_) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(PipelineError::NotFitted) | ApiError::NotReady(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Pipeline(_) | ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::Validation(errors) => {
                json!(errors.iter().map(|e| e.to_string()).collect::<Vec<_>>())
            }
            ApiError::Adapter(AdapterError::SchemaMismatch { missing }) => {
                json!({ "missing": missing })
            }
            ApiError::Adapter(AdapterError::MissingVinMatch {
                listing_vin,
                decoded_vin,
            }) => json!({ "listing_vin": listing_vin, "decoded_vin": decoded_vin }),
            ApiError::Lookup(LookupError::Status { status, .. }) => json!({ "status": status }),
            ApiError::Inference(InferenceError::SchemaMismatch {
                missing,
                unexpected,
                ..
            }) => json!({ "missing": missing, "unexpected": unexpected }),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "details": self.details(),
        });
        (self.status(), Json(body)).into_response()
    }
}
