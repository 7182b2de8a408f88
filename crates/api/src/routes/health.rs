//! Health and Metrics Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when estimates can be served, `degraded` otherwise
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    /// Width of the encoded feature vector, once fitted
    pub feature_count: Option<usize>,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub pipeline: ComponentHealth,
    pub model: ComponentHealth,
    pub vin_decoder: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn new(ok: bool, detail: Option<String>) -> Self {
        Self {
            status: if ok { "ok" } else { "unavailable" }.to_string(),
            detail,
        }
    }
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let fitted = state.pipeline.is_fitted();
    let model_loaded = state.estimator.is_some();
    let feature_count = state.pipeline.fitted().map(|p| p.columns().len());

    Json(HealthResponse {
        status: if fitted && model_loaded { "healthy" } else { "degraded" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            pipeline: ComponentHealth::new(fitted, None),
            model: ComponentHealth::new(
                model_loaded,
                state
                    .estimator
                    .as_ref()
                    .map(|e| format!("spread {}", e.spread())),
            ),
            // configuration only; the decode service is not contacted
            vin_decoder: ComponentHealth {
                status: "configured".to_string(),
                detail: Some(state.decoder.config().base_url.clone()),
            },
        },
        feature_count,
    })
}

/// Prometheus text exposition
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}
