//! Stateless Feature Derivation
//!
//! Everything the pipeline computes per record that does not depend on the
//! fitted vocabulary. Missing values stay `None`; nothing here can fail.

use crate::encoding::Category;
use crate::record::VehicleRecord;
use crate::schema;
use crate::tables::{body_class_bucket, series_for_model, EconomicRegion};

/// Numeric and derived columns emitted by [`engineer`], in order.
pub const NUMERIC_COLUMNS: [&str; 22] = [
    schema::MILEAGE,
    schema::NUM_OF_YEARS,
    schema::DISPLACEMENT_L,
    schema::DISPLACEMENT_CI,
    schema::DISPLACEMENT_CC,
    schema::ENGINE_HP,
    schema::DOORS,
    schema::REGION,
    schema::MILEAGE_PER_YEAR,
    schema::POWER_PER_CYLINDER,
    schema::POWER_PER_DISPLACEMENT,
    schema::CYLINDER_SIZE,
    schema::TOTAL_POWER_OUTPUT,
    schema::TOTAL_POWER_CAPACITY,
    "is_xDrive",
    "is_sDrive",
    "is_AWD",
    "28i",
    "35i",
    "28d",
    "35d",
    "50i",
];

/// A record after the stateless steps: named numeric columns in output order plus the
/// raw values of the one-hot columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredRecord {
    /// Numeric and derived columns, in the order they are emitted
    pub numeric: Vec<(&'static str, Option<f64>)>,
    /// Values for [`schema::ONE_HOT_COLUMNS`], same order
    pub categorical: [Option<Category>; 5],
}

impl EngineeredRecord {
    /// Look up a numeric column by name
    pub fn numeric_value(&self, column: &str) -> Option<f64> {
        self.numeric
            .iter()
            .find(|(name, _)| *name == column)
            .and_then(|(_, value)| *value)
    }
}

/// Years-in-service average. Zero years means no averaging.
pub fn mileage_per_year(mileage: f64, num_of_years: u32) -> f64 {
    if num_of_years == 0 {
        mileage
    } else {
        mileage / num_of_years as f64
    }
}

/// Natural log where exactly zero and any non-finite result become missing.
pub fn log_or_missing(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| *v != 0.0)
        .map(f64::ln)
        .filter(|v| v.is_finite())
}

/// Quotient, missing on a missing operand or a zero divisor.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => finite(Some(n / d)),
        _ => None,
    }
}

/// Product, missing on a missing operand.
pub fn product(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => finite(Some(a * b)),
        _ => None,
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn label(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 0/1 flag for a substring of the raw model designator.
fn token_flag(model: &str, token: &str) -> Option<f64> {
    Some(if model.contains(token) { 1.0 } else { 0.0 })
}

/// Apply every vocabulary-independent derivation to one record.
pub fn engineer(record: &VehicleRecord) -> EngineeredRecord {
    let region = EconomicRegion::from_state(&record.state);

    let mileage = finite(Some(record.mileage));
    let per_year = mileage.map(|m| mileage_per_year(m, record.num_of_years));

    let hp = finite(record.engine_hp);
    let cylinders = finite(record.engine_cylinders);
    let displacement = finite(record.displacement_l);

    let mut numeric = vec![
        (schema::MILEAGE, log_or_missing(mileage)),
        (schema::NUM_OF_YEARS, Some(record.num_of_years as f64)),
        (schema::DISPLACEMENT_L, displacement),
        (schema::DISPLACEMENT_CI, finite(record.displacement_ci)),
        (schema::DISPLACEMENT_CC, finite(record.displacement_cc)),
        (schema::ENGINE_HP, hp),
        (schema::DOORS, finite(record.doors)),
        (schema::REGION, Some(region.ordinal() as f64)),
        (schema::MILEAGE_PER_YEAR, log_or_missing(per_year)),
        (schema::POWER_PER_CYLINDER, ratio(hp, cylinders)),
        (schema::POWER_PER_DISPLACEMENT, ratio(hp, displacement)),
        (schema::CYLINDER_SIZE, ratio(displacement, cylinders)),
        (schema::TOTAL_POWER_OUTPUT, product(hp, cylinders)),
        (schema::TOTAL_POWER_CAPACITY, product(displacement, cylinders)),
    ];
    numeric.extend(
        schema::MODEL_TOKENS
            .iter()
            .map(|(column, token)| (*column, token_flag(&record.model, token))),
    );

    let categorical = [
        series_for_model(record.model.trim()).map(Category::label),
        label(record.plant_country.as_deref()).map(Category::label),
        label(record.fuel_type_primary.as_deref()).map(Category::label),
        cylinders.map(Category::Number),
        label(record.body_class.as_deref())
            .map(body_class_bucket)
            .map(Category::label),
    ];

    EngineeredRecord { numeric, categorical }
}
