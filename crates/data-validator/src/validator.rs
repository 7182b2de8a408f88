//! Listing Validator for Range Checking

use crate::adapter::Listing;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// VIN length after trimming
pub const VIN_LENGTH: usize = 17;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Model year valid range
    pub year_range: (f64, f64),
    /// Odometer valid range
    pub mileage_range: (f64, f64),
    /// Years in service valid range
    pub years_in_service_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            year_range: (1981.0, 2025.0),
            mileage_range: (0.0, 300_000.0),
            years_in_service_range: (0.0, 30.0),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }
}

/// Normalize a VIN the way lookups and joins compare it.
pub fn normalize_vin(vin: &str) -> String {
    vin.trim().to_uppercase()
}

/// Validator for listing input
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !(range.0..=range.1).contains(&value) {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a VIN: 17 alphanumeric characters once trimmed
    pub fn validate_vin(&self, vin: &str) -> Result<(), ValidationError> {
        let vin = normalize_vin(vin);
        if vin.is_empty() {
            return Err(ValidationError::MissingField("vin"));
        }
        if vin.len() != VIN_LENGTH || !vin.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidVin(vin));
        }
        Ok(())
    }

    /// Validate model year
    pub fn validate_year(&self, year: i32) -> Result<(), ValidationError> {
        self.validate_range("year", year as f64, self.config.year_range)
    }

    /// Validate odometer reading
    pub fn validate_mileage(&self, mileage: f64) -> Result<(), ValidationError> {
        self.validate_range("mileage", mileage, self.config.mileage_range)
    }

    /// Validate years in service
    pub fn validate_years_in_service(&self, years: u32) -> Result<(), ValidationError> {
        self.validate_range("num_of_years", years as f64, self.config.years_in_service_range)
    }

    /// Check every listing field, collecting all failures
    pub fn validate_listing(&self, listing: &Listing) -> ValidationResult {
        let checks = [
            self.validate_vin(&listing.vin),
            self.validate_year(listing.year),
            self.validate_mileage(listing.mileage),
            self.validate_years_in_service(listing.num_of_years),
        ];
        let fields_checked = checks.len();
        let errors: Vec<ValidationError> = checks.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            debug!("Listing {} failed validation: {:?}", listing.vin, errors);
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
