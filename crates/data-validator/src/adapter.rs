//! VIN Record Adapter
//!
//! Reconciles a raw VIN-decode payload with a locally entered listing and
//! produces the [`VehicleRecord`] the feature pipeline expects. Field lists
//! come from [`feature_engine::schema`] so the adapter and the pipeline
//! cannot drift apart.

use std::collections::BTreeMap;

use feature_engine::schema;
use feature_engine::VehicleRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::validator::normalize_vin;

/// Raw decode payload: one result object from the lookup service
pub type DecodePayload = Map<String, Value>;

/// Vehicle attributes entered locally for a sale listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub vin: String,
    pub year: i32,
    pub mileage: f64,
    pub num_of_years: u32,
    /// Two-letter state code; empty when unknown
    #[serde(default)]
    pub state: String,
    /// Series letter or raw model designator
    pub model: String,
    #[serde(default)]
    pub city: String,
    #[serde(default = "default_make")]
    pub make: String,
}

fn default_make() -> String {
    "BMW".to_string()
}

/// A whitelisted decode field after coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(Option<f64>),
    Text(Option<String>),
}

/// Whitelisted, type-coerced view of a decode payload.
///
/// A field key is present whenever the payload carried it, even if its value
/// could not be used; absent keys are what the schema check reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedVehicle {
    /// Normalized VIN reported by the decode
    pub vin: Option<String>,
    /// Fields keyed by merged column name (`Model` becomes `ModelVIN`)
    pub fields: BTreeMap<&'static str, FieldValue>,
}

impl DecodedVehicle {
    /// Select the whitelist from a payload and coerce the numeric subset.
    pub fn from_payload(payload: &DecodePayload) -> Self {
        let mut decoded = DecodedVehicle::default();

        for field in schema::VIN_DECODE_FIELDS {
            let Some(raw) = payload.get(field) else {
                continue;
            };

            if field == schema::DECODE_VIN {
                decoded.vin = coerce_text(raw).map(|v| normalize_vin(&v));
                continue;
            }

            let column = if field == schema::DECODE_MODEL {
                schema::MODEL_VIN
            } else {
                field
            };
            let value = if schema::VIN_NUMERIC_FIELDS.contains(&field) {
                let number = coerce_number(raw);
                if number.is_none() && !is_blank(raw) {
                    debug!("Decode field {} is not numeric: {}", field, raw);
                }
                FieldValue::Number(number)
            } else {
                FieldValue::Text(coerce_text(raw))
            };
            decoded.fields.insert(column, value);
        }

        decoded
    }

    /// Whether the payload carried `column` at all
    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        match self.fields.get(column) {
            Some(FieldValue::Number(value)) => *value,
            _ => None,
        }
    }

    pub fn text(&self, column: &str) -> Option<String> {
        match self.fields.get(column) {
            Some(FieldValue::Text(value)) => value.clone(),
            _ => None,
        }
    }
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Numbers pass through; strings are parsed; anything unusable is missing.
pub fn coerce_number(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Trimmed text; empty strings and nulls are missing.
pub fn coerce_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Outcome of merging many listings with many decode results
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Successfully merged records, in listing order
    pub records: Vec<VehicleRecord>,
    /// Listing VINs with no decode result
    pub unmatched_listings: Vec<String>,
    /// Decode VINs with no listing
    pub unmatched_decodes: Vec<String>,
    /// Matched pairs that failed the schema check
    pub schema_failures: Vec<(String, AdapterError)>,
}

/// Merges listings with VIN-decode results
#[derive(Debug, Clone, Default)]
pub struct VinRecordAdapter;

impl VinRecordAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Required input fields still absent once the listing and decode are combined
    pub fn missing_fields(&self, decoded: &DecodedVehicle) -> Vec<String> {
        schema::REQUIRED_INPUT_FIELDS
            .iter()
            .filter(|field| !schema::LISTING_FIELDS.contains(*field) && !decoded.contains(field))
            .map(|field| field.to_string())
            .collect()
    }

    /// Inner-join one listing with one decode result by VIN.
    pub fn merge(
        &self,
        listing: &Listing,
        decoded: &DecodedVehicle,
    ) -> Result<VehicleRecord, AdapterError> {
        let listing_vin = normalize_vin(&listing.vin);
        if decoded.vin.as_deref() != Some(listing_vin.as_str()) {
            warn!(
                "VIN mismatch: listing {} vs decode {:?}",
                listing_vin, decoded.vin
            );
            return Err(AdapterError::MissingVinMatch {
                listing_vin,
                decoded_vin: decoded.vin.clone(),
            });
        }

        let missing = self.missing_fields(decoded);
        if !missing.is_empty() {
            warn!("Merged record for {} is missing {:?}", listing_vin, missing);
            return Err(AdapterError::SchemaMismatch { missing });
        }

        Ok(VehicleRecord {
            vin: listing_vin,
            year: listing.year,
            mileage: listing.mileage,
            city: listing.city.trim().to_string(),
            state: listing.state.trim().to_string(),
            make: listing.make.trim().to_string(),
            model: listing.model.trim().to_string(),
            num_of_years: listing.num_of_years,
            engine_cylinders: decoded.number(schema::ENGINE_CYLINDERS),
            displacement_l: decoded.number(schema::DISPLACEMENT_L),
            displacement_ci: decoded.number(schema::DISPLACEMENT_CI),
            displacement_cc: decoded.number(schema::DISPLACEMENT_CC),
            fuel_type_primary: decoded.text(schema::FUEL_TYPE_PRIMARY),
            gvwr: decoded.text(schema::GVWR),
            engine_hp: decoded.number(schema::ENGINE_HP),
            doors: decoded.number(schema::DOORS),
            body_class: decoded.text(schema::BODY_CLASS),
            model_vin: decoded.text(schema::MODEL_VIN),
            plant_country: decoded.text(schema::PLANT_COUNTRY),
            plant_city: decoded.text(schema::PLANT_CITY),
            manufacturer: decoded.text(schema::MANUFACTURER),
            vehicle_type: decoded.text(schema::VEHICLE_TYPE),
        })
    }

    /// Parse, whitelist and merge a single payload.
    pub fn merge_payload(
        &self,
        listing: &Listing,
        payload: &DecodePayload,
    ) -> Result<VehicleRecord, AdapterError> {
        self.merge(listing, &DecodedVehicle::from_payload(payload))
    }

    /// Inner-join many listings with many decode results by VIN.
    pub fn merge_batch(&self, listings: &[Listing], decoded: &[DecodedVehicle]) -> MergeReport {
        let mut report = MergeReport::default();
        let mut used = vec![false; decoded.len()];

        for listing in listings {
            let vin = normalize_vin(&listing.vin);
            let Some(idx) = decoded
                .iter()
                .position(|d| d.vin.as_deref() == Some(vin.as_str()))
            else {
                report.unmatched_listings.push(vin);
                continue;
            };
            used[idx] = true;

            match self.merge(listing, &decoded[idx]) {
                Ok(record) => report.records.push(record),
                Err(err) => report.schema_failures.push((vin, err)),
            }
        }

        report.unmatched_decodes = decoded
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(d, _)| d.vin.clone().unwrap_or_default())
            .collect();

        debug!(
            "Merged {} of {} listings ({} unmatched listings, {} unmatched decodes)",
            report.records.len(),
            listings.len(),
            report.unmatched_listings.len(),
            report.unmatched_decodes.len()
        );
        report
    }
}
