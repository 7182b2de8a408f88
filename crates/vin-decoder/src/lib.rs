//! VIN Decoding Client
//!
//! Looks up vehicle attributes for a VIN from the NHTSA vPIC service.

mod client;
mod error;

pub use client::{
    parse_results, DecoderConfig, VinDecoder, DEFAULT_BASE_URL, DEFAULT_BATCH_URL, MAX_BATCH_SIZE,
};
pub use error::LookupError;

/// One decode result object: attribute name to raw value
pub type DecodePayload = serde_json::Map<String, serde_json::Value>;
