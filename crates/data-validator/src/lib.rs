//! Listing Validation and VIN Record Adapter
//!
//! Checks locally entered listing attributes and reconciles them with
//! VIN-decode payloads into pipeline-ready vehicle records.

mod adapter;
mod error;
mod validator;

pub use adapter::{
    coerce_number, coerce_text, DecodePayload, DecodedVehicle, FieldValue, Listing, MergeReport,
    VinRecordAdapter,
};
pub use error::{AdapterError, ValidationError};
pub use validator::{normalize_vin, ValidationConfig, ValidationResult, Validator, VIN_LENGTH};
