//! Service Configuration
//!
//! Layered: built-in defaults, then `config/pricing.toml` if present, then
//! `PRICING__*` environment variables (`__` separates nested keys, e.g.
//! `PRICING__VIN_DECODER__TIMEOUT_MS`).

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use inference_engine::DEFAULT_PRICE_SPREAD;
use serde::Deserialize;
use vin_decoder::DecoderConfig;

use crate::rate_limit::RateLimitConfig;

/// Default config file, extension resolved by the `config` crate
pub const DEFAULT_CONFIG_FILE: &str = "config/pricing";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PRICING";

/// Top-level service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address
    pub bind_addr: String,
    /// Fitted pipeline artifact (JSON)
    pub pipeline_path: PathBuf,
    /// Price model artifact (JSON)
    pub model_path: PathBuf,
    /// Half-width of the recommended price range
    pub price_spread: f64,
    pub vin_decoder: DecoderConfig,
    /// Limits on the estimate route
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            pipeline_path: PathBuf::from("artifacts/pipeline.json"),
            model_path: PathBuf::from("artifacts/model.json"),
            price_spread: DEFAULT_PRICE_SPREAD,
            vin_decoder: DecoderConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(DEFAULT_CONFIG_FILE, None)
    }

    /// Load from `file` (optional on disk) and either the process environment
    /// or an explicit variable map.
    pub fn from_sources(
        file: &str,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").source(env))
            .build()?
            .try_deserialize()
    }
}
