//! Feature Schema Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Frozen output column order of the loaded pipeline
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub columns: Vec<String>,
    pub count: usize,
    /// Extra columns excluded at fit time
    pub extra_exclusions: Vec<String>,
}

/// Get the feature schema
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let fitted = state.pipeline.fitted().ok_or(ApiError::NotReady("feature pipeline"))?;

    Ok(Json(SchemaResponse {
        columns: fitted.columns().to_vec(),
        count: fitted.columns().len(),
        extra_exclusions: fitted.config().extra_exclusions.clone(),
    }))
}
