//! Used-BMW Pricing API Server
//!
//! REST service that prices a listing: range-check the form input, decode
//! the VIN, merge both into a vehicle record, encode it with the fitted
//! feature pipeline and score it with the price model.

use axum::{
    routing::{get, post},
    Router,
};
use data_validator::{Validator, VinRecordAdapter};
use feature_engine::{FittedPipeline, PipelineState};
use inference_engine::{LinearPriceModel, PriceEstimator};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vin_decoder::VinDecoder;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::AppConfig;
pub use error::ApiError;
pub use rate_limit::{create_governor_config, RateLimitConfig};

/// Successful estimates
pub const ESTIMATES_TOTAL: &str = "pricing_estimates_total";
/// VIN lookups that failed during an estimate or decode request
pub const LOOKUP_FAILURES_TOTAL: &str = "pricing_lookup_failures_total";
/// Model errors or unusable predictions
pub const PREDICTION_FAILURES_TOTAL: &str = "pricing_prediction_failures_total";

/// Application state shared across handlers
pub struct AppState {
    /// Feature pipeline, unfitted until an artifact is loaded
    pub pipeline: PipelineState,
    /// Price model bound to the pipeline's columns
    pub estimator: Option<PriceEstimator>,
    pub decoder: VinDecoder,
    pub validator: Validator,
    pub adapter: VinRecordAdapter,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        pipeline: PipelineState,
        estimator: Option<PriceEstimator>,
        decoder: VinDecoder,
    ) -> Self {
        Self {
            pipeline,
            estimator,
            decoder,
            validator: Validator::default(),
            adapter: VinRecordAdapter::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Load artifacts named by the config.
    ///
    /// Missing artifact files leave the service degraded (estimates answer
    /// 503); unreadable artifacts or a model trained on other columns abort
    /// startup.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let pipeline = if config.pipeline_path.exists() {
            PipelineState::from(FittedPipeline::load(&config.pipeline_path)?)
        } else {
            warn!(
                "No pipeline artifact at {}; serving unfitted",
                config.pipeline_path.display()
            );
            PipelineState::default()
        };

        let estimator = match pipeline.fitted() {
            Some(fitted) if config.model_path.exists() => {
                let model = LinearPriceModel::load(&config.model_path)?;
                Some(PriceEstimator::new(
                    Box::new(model),
                    fitted.columns(),
                    config.price_spread,
                )?)
            }
            Some(_) => {
                warn!("No price model at {}", config.model_path.display());
                None
            }
            None => None,
        };

        let decoder = VinDecoder::new(config.vin_decoder.clone())?;
        Ok(Self::new(pipeline, estimator, decoder))
    }
}

/// Create the application router
///
/// `rate_limit` applies to the estimate route only.
pub fn create_router(state: Arc<AppState>, rate_limit: Option<&RateLimitConfig>) -> Router {
    let mut estimate: Router<Arc<AppState>> =
        Router::new().route("/api/v1/estimate", post(routes::estimate::post_estimate));

    if let Some(limits) = rate_limit {
        match create_governor_config(limits) {
            Some(config) => estimate = estimate.layer(GovernorLayer { config }),
            None => warn!("Rate limiting disabled: per_second and burst_size must be non-zero"),
        }
    }

    Router::new()
        .route("/api/v1/health", get(routes::health::health_handler))
        .route("/api/v1/schema", get(routes::schema::get_schema))
        .route("/api/v1/vin/:vin", get(routes::vin::get_vin))
        .route("/metrics", get(routes::health::metrics_handler))
        .merge(estimate)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Install the Prometheus recorder and describe the service counters
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe_counter!(ESTIMATES_TOTAL, "Listings priced successfully");
            metrics::describe_counter!(LOOKUP_FAILURES_TOTAL, "Failed VIN lookups");
            metrics::describe_counter!(PREDICTION_FAILURES_TOTAL, "Failed price predictions");
            Some(handle)
        }
        Err(e) => {
            warn!("Prometheus recorder not installed: {}", e);
            None
        }
    }
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let mut state = AppState::from_config(&config)?;
    if let Some(handle) = init_metrics() {
        state = state.with_metrics(handle);
    }
    let app = create_router(Arc::new(state), Some(&config.rate_limit));

    info!("Starting pricing API on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::extract::Path;
    use axum::http::{Request, StatusCode};
    use axum::Json;
    use feature_engine::{FeaturePipeline, VehicleRecord};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use vin_decoder::DecoderConfig;

    const VIN: &str = "WBXHT3C39H5F68219";

    fn decode_payload(vin: &str) -> Value {
        json!({
            "VIN": vin,
            "Model": "X1",
            "EngineCylinders": "4",
            "DisplacementL": "2.0",
            "DisplacementCI": "122.04748818946",
            "DisplacementCC": "2000.0",
            "FuelTypePrimary": "Gasoline",
            "GVWR": "Class 1D: 5,001 - 6,000 lb (2,268 - 2,722 kg)",
            "EngineHP": "228",
            "Doors": "4",
            "BodyClass": "Sport Utility Vehicle (SUV)/Multi-Purpose Vehicle (MPV)",
            "PlantCountry": "GERMANY",
            "PlantCity": "REGENSBURG",
            "Manufacturer": "BMW MANUFACTURER CORPORATION / BMW NORTH AMERICA",
            "VehicleType": "MULTIPURPOSE PASSENGER VEHICLE (MPV)",
            "ErrorCode": "0"
        })
    }

    async fn stub_ok(Path(vin): Path<String>) -> Json<Value> {
        Json(json!({ "Count": 1, "Results": [decode_payload(&vin)] }))
    }

    async fn stub_other(Path(_vin): Path<String>) -> Json<Value> {
        Json(json!({ "Results": [decode_payload("WBA8E9G50GNT12345")] }))
    }

    async fn stub_partial(Path(vin): Path<String>) -> Json<Value> {
        let mut payload = decode_payload(&vin);
        if let Some(map) = payload.as_object_mut() {
            map.remove("GVWR");
        }
        Json(json!({ "Results": [payload] }))
    }

    async fn spawn_vin_stub() -> String {
        let app = Router::new()
            .route("/ok/:vin", get(stub_ok))
            .route("/other/:vin", get(stub_other))
            .route("/partial/:vin", get(stub_partial))
            .route(
                "/down/:vin",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn training_records() -> Vec<VehicleRecord> {
        let base = VehicleRecord {
            vin: VIN.to_string(),
            year: 2017,
            mileage: 41_000.0,
            state: "TX".to_string(),
            make: "BMW".to_string(),
            model: "X1xDrive28i".to_string(),
            num_of_years: 3,
            engine_cylinders: Some(4.0),
            displacement_l: Some(2.0),
            engine_hp: Some(228.0),
            fuel_type_primary: Some("Gasoline".to_string()),
            body_class: Some("Sport Utility Vehicle (SUV)/Multi-Purpose Vehicle (MPV)".to_string()),
            plant_country: Some("GERMANY".to_string()),
            ..Default::default()
        };
        vec![
            base.clone(),
            VehicleRecord {
                vin: "WBA8E9G50GNT12345".to_string(),
                model: "335i".to_string(),
                engine_cylinders: Some(6.0),
                body_class: Some("Sedan/Saloon".to_string()),
                state: "CA".to_string(),
                ..base
            },
        ]
    }

    fn state(decoder_url: &str, fitted: bool) -> Arc<AppState> {
        let decoder = VinDecoder::new(DecoderConfig {
            base_url: decoder_url.to_string(),
            batch_url: decoder_url.to_string(),
            timeout_ms: 2000,
        })
        .unwrap();

        if !fitted {
            return Arc::new(AppState::new(PipelineState::default(), None, decoder));
        }

        let pipeline = FeaturePipeline::default().fit(&training_records()).unwrap();
        let model = LinearPriceModel::constant(pipeline.columns().to_vec(), 25_000.0);
        let estimator = PriceEstimator::new(Box::new(model), pipeline.columns(), 1900.0).unwrap();
        Arc::new(AppState::new(
            PipelineState::from(pipeline),
            Some(estimator),
            decoder,
        ))
    }

    fn estimate_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/estimate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn listing() -> Value {
        json!({
            "vin": "wbxht3c39h5f68219",
            "year": 2017,
            "mileage": 20000.0,
            "num_of_years": 5,
            "state": "CA",
            "model": "X"
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_components() {
        let app = create_router(state("http://127.0.0.1:9/", true), None);
        let (status, body) = send(app, get_request("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["pipeline"]["status"], "ok");
        assert_eq!(body["components"]["vin_decoder"]["status"], "configured");
        assert_eq!(body["components"]["vin_decoder"]["detail"], "http://127.0.0.1:9/");
        assert!(body["feature_count"].as_u64().unwrap() > 0);

        let app = create_router(state("http://127.0.0.1:9/", false), None);
        let (_, body) = send(app, get_request("/api/v1/health")).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["feature_count"], Value::Null);
    }

    #[tokio::test]
    async fn test_schema_route() {
        let fitted = state("http://127.0.0.1:9/", true);
        let expected = fitted.pipeline.fitted().unwrap().columns().to_vec();
        let (status, body) = send(create_router(fitted, None), get_request("/api/v1/schema")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(expected));
        assert!(!expected.contains(&"Vin".to_string()));

        let app = create_router(state("http://127.0.0.1:9/", false), None);
        let (status, body) = send(app, get_request("/api/v1/schema")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "not_ready");
    }

    #[tokio::test]
    async fn test_estimate_end_to_end() {
        let base = spawn_vin_stub().await;
        let app = create_router(state(&format!("{base}/ok/"), true), None);

        let (status, body) = send(app, estimate_request(listing())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["rounded_price"], 25_000);
        assert_eq!(body["min_price"], 23_100);
        assert_eq!(body["max_price"], 26_900);
        assert_eq!(body["min_delta_pct"], -8);
        assert_eq!(body["max_delta_pct"], 8);
        assert_eq!(body["vehicle"]["Vin"], VIN);
        assert_eq!(body["vehicle"]["ModelVIN"], "X1");
        assert_eq!(body["vehicle"]["EngineCylinders"], 4.0);
    }

    #[tokio::test]
    async fn test_estimate_rejects_invalid_listing() {
        let app = create_router(state("http://127.0.0.1:9/", true), None);
        let mut bad = listing();
        bad["vin"] = json!("WBX123");
        bad["year"] = json!(1950);

        let (status, body) = send(app.clone(), estimate_request(bad)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);

        let (status, body) = send(app, estimate_request(json!({ "vin": VIN }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_body");
    }

    #[tokio::test]
    async fn test_estimate_lookup_and_merge_failures() {
        let base = spawn_vin_stub().await;

        let app = create_router(state(&format!("{base}/down/"), true), None);
        let (status, body) = send(app, estimate_request(listing())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "lookup_failure");
        assert_eq!(body["details"]["status"], 503);

        let app = create_router(state(&format!("{base}/other/"), true), None);
        let (status, body) = send(app, estimate_request(listing())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "vin_mismatch");

        let app = create_router(state(&format!("{base}/partial/"), true), None);
        let (status, body) = send(app, estimate_request(listing())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"]["missing"], json!(["GVWR"]));
    }

    #[tokio::test]
    async fn test_estimate_requires_fitted_pipeline() {
        let app = create_router(state("http://127.0.0.1:9/", false), None);
        let (status, body) = send(app, estimate_request(listing())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "not_ready");
    }

    #[tokio::test]
    async fn test_vin_route() {
        let base = spawn_vin_stub().await;
        let app = create_router(state(&format!("{base}/ok/"), false), None);

        let (status, body) = send(app.clone(), get_request("/api/v1/vin/wbxht3c39h5f68219")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["decoded"]["vin"], VIN);
        assert_eq!(body["decoded"]["fields"]["ModelVIN"], "X1");
        assert_eq!(body["decoded"]["fields"]["Doors"], 4.0);
        assert_eq!(body["missing_fields"], json!([]));

        let (status, _) = send(app, get_request("/api/v1/vin/SHORT")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_estimate_rate_limited() {
        let limits = RateLimitConfig {
            per_second: 60,
            burst_size: 1,
        };
        let app = create_router(state("http://127.0.0.1:9/", true), Some(&limits))
            .layer(axum::Extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000)))));

        let (status, _) = send(app.clone(), estimate_request(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app.clone(), estimate_request(json!({}))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        // other routes are not limited
        let (status, _) = send(app, get_request("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
