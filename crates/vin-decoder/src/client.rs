//! vPIC Client
//!
//! Single decodes go through `DecodeVinValues/{vin}`; training-set assembly
//! uses `DecodeVINValuesBatch`, which accepts up to 50 VINs per request.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::LookupError;
use crate::DecodePayload;

pub const DEFAULT_BASE_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles/DecodeVinValues/";
pub const DEFAULT_BATCH_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles/DecodeVINValuesBatch/";

/// Service limit on VINs per batch request
pub const MAX_BATCH_SIZE: usize = 50;

/// Default request timeout
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Longest error body kept in a [`LookupError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// VIN decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Single-VIN endpoint; the VIN is appended as a path segment
    pub base_url: String,
    /// Batch endpoint
    pub batch_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_url: DEFAULT_BATCH_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DecodeResponse {
    #[serde(rename = "Results")]
    results: Vec<Value>,
}

/// Extract result objects from a vPIC response body.
pub fn parse_results(body: &str) -> Result<Vec<DecodePayload>, LookupError> {
    let response: DecodeResponse = serde_json::from_str(body)?;
    response
        .results
        .into_iter()
        .map(|result| match result {
            Value::Object(map) => Ok(map),
            other => Err(LookupError::Malformed(format!(
                "result entry is not an object: {other}"
            ))),
        })
        .collect()
}

fn normalize(vin: &str) -> Result<String, LookupError> {
    let vin = vin.trim().to_uppercase();
    if vin.len() != 17 {
        return Err(LookupError::InvalidVin(vin));
    }
    Ok(vin)
}

/// HTTP client for the VIN decode service
pub struct VinDecoder {
    client: reqwest::Client,
    config: DecoderConfig,
}

impl VinDecoder {
    /// Create a decoder with its own connection pool
    pub fn new(config: DecoderConfig) -> Result<Self, LookupError> {
        info!("Creating VIN decoder for {}", config.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one VIN. Never fabricates attributes: any failure is an error.
    pub async fn decode(&self, vin: &str) -> Result<DecodePayload, LookupError> {
        let vin = normalize(vin)?;
        let url = format!(
            "{}/{}?format=json",
            self.config.base_url.trim_end_matches('/'),
            vin
        );
        debug!("Decoding VIN {}", vin);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let body = self.read_body(response).await?;

        parse_results(&body)?
            .into_iter()
            .next()
            .ok_or(LookupError::NoResults(vin))
    }

    /// Decode many VINs, chunked to the service batch limit.
    ///
    /// Malformed VINs are skipped with a warning; they simply have no result,
    /// so callers joining on VIN see them as unmatched.
    pub async fn decode_batch(&self, vins: &[String]) -> Result<Vec<DecodePayload>, LookupError> {
        let vins: Vec<String> = vins
            .iter()
            .filter_map(|v| match normalize(v) {
                Ok(vin) => Some(vin),
                Err(err) => {
                    warn!("Skipping batch entry: {}", err);
                    None
                }
            })
            .collect();
        let mut results = Vec::with_capacity(vins.len());

        for (idx, chunk) in vins.chunks(MAX_BATCH_SIZE).enumerate() {
            let data = chunk.join(";");
            let response = self
                .client
                .post(&self.config.batch_url)
                .form(&[("format", "json"), ("data", data.as_str())])
                .send()
                .await
                .map_err(|e| self.request_error(e))?;
            let body = self.read_body(response).await?;
            let batch = parse_results(&body)?;
            info!("Batch {}: decoded {} of {} VINs", idx, batch.len(), chunk.len());
            results.extend(batch);
        }

        Ok(results)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, LookupError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if status != reqwest::StatusCode::OK {
            warn!("VIN lookup returned HTTP {}", status);
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn request_error(&self, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::Timeout(self.config.timeout_ms)
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}
