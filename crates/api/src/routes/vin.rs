//! VIN Lookup Routes

use axum::{
    extract::{Path, State},
    Json,
};
use data_validator::DecodedVehicle;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::{AppState, LOOKUP_FAILURES_TOTAL};

/// Whitelisted decode for one VIN
#[derive(Debug, Serialize)]
pub struct VinResponse {
    pub decoded: DecodedVehicle,
    /// Required decode fields the service did not report
    pub missing_fields: Vec<String>,
}

/// Decode a VIN without pricing it
pub async fn get_vin(
    State(state): State<Arc<AppState>>,
    Path(vin): Path<String>,
) -> Result<Json<VinResponse>, ApiError> {
    state
        .validator
        .validate_vin(&vin)
        .map_err(|e| ApiError::Validation(vec![e]))?;

    let payload = state.decoder.decode(&vin).await.map_err(|e| {
        metrics::counter!(LOOKUP_FAILURES_TOTAL).increment(1);
        ApiError::from(e)
    })?;

    let decoded = DecodedVehicle::from_payload(&payload);
    let missing_fields = state.adapter.missing_fields(&decoded);
    info!("Decoded {} ({} fields missing)", vin.trim(), missing_fields.len());

    Ok(Json(VinResponse {
        decoded,
        missing_fields,
    }))
}
