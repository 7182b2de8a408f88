//! VIN Lookup Error Types

use thiserror::Error;

/// Errors that can occur while decoding a VIN
#[derive(Debug, Error)]
pub enum LookupError {
    /// VIN rejected before any request was sent
    #[error("invalid VIN {0:?}: expected 17 characters")]
    InvalidVin(String),

    /// Service answered with something other than 200
    #[error("VIN lookup failed: HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or protocol failure
    #[error("VIN lookup failed: {0}")]
    Transport(String),

    /// No answer within the configured timeout
    #[error("VIN lookup timed out after {0}ms")]
    Timeout(u64),

    /// Body was not the expected `{"Results": [...]}` document
    #[error("VIN lookup returned a malformed payload: {0}")]
    Malformed(String),

    /// Well-formed answer without any result object
    #[error("VIN lookup returned no results for {0}")]
    NoResults(String),
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Malformed(err.to_string())
    }
}
