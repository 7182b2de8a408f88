//! Validation and Adapter Error Types

use thiserror::Error;

/// Errors from checking a locally entered listing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// VIN is not 17 alphanumeric characters
    #[error("invalid VIN {0:?}: expected 17 alphanumeric characters")]
    InvalidVin(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors from reconciling a listing with a VIN-decode payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// Listing VIN has no counterpart in the decode results
    #[error("no decode result matches listing VIN {listing_vin} (decoded VIN: {})", .decoded_vin.as_deref().unwrap_or("none"))]
    MissingVinMatch {
        listing_vin: String,
        decoded_vin: Option<String>,
    },

    /// Required pipeline input fields absent after the merge
    #[error("missing required fields after merge: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
}
