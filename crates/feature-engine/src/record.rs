//! Vehicle Input Record

use serde::{Deserialize, Serialize};

/// One vehicle row: listing attributes merged with VIN-decoded attributes.
///
/// Serialized field names follow the column names in [`crate::schema`] so
/// training exports and persisted rows read the same as the feature columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// 17-character VIN, join key only
    #[serde(rename = "Vin")]
    pub vin: String,
    /// Model year
    #[serde(rename = "Year")]
    pub year: i32,
    /// Odometer reading
    #[serde(rename = "Mileage")]
    pub mileage: f64,
    #[serde(rename = "City", default)]
    pub city: String,
    /// Two-letter state code, may be empty
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Make", default)]
    pub make: String,
    /// Raw model designator, e.g. `X5xDrive35i`
    #[serde(rename = "Model")]
    pub model: String,
    /// Years in service
    #[serde(rename = "NumOfYears")]
    pub num_of_years: u32,

    // VIN-decoded attributes. `None` means the decode had no usable value.
    #[serde(rename = "EngineCylinders", default)]
    pub engine_cylinders: Option<f64>,
    #[serde(rename = "DisplacementL", default)]
    pub displacement_l: Option<f64>,
    #[serde(rename = "DisplacementCI", default)]
    pub displacement_ci: Option<f64>,
    #[serde(rename = "DisplacementCC", default)]
    pub displacement_cc: Option<f64>,
    #[serde(rename = "FuelTypePrimary", default)]
    pub fuel_type_primary: Option<String>,
    /// Gross vehicle weight rating class, e.g. `Class 1C: 4,001 - 5,000 lb`
    #[serde(rename = "GVWR", default)]
    pub gvwr: Option<String>,
    #[serde(rename = "EngineHP", default)]
    pub engine_hp: Option<f64>,
    #[serde(rename = "Doors", default)]
    pub doors: Option<f64>,
    #[serde(rename = "BodyClass", default)]
    pub body_class: Option<String>,
    /// Model name as reported by the decode
    #[serde(rename = "ModelVIN", default)]
    pub model_vin: Option<String>,
    #[serde(rename = "PlantCountry", default)]
    pub plant_country: Option<String>,
    #[serde(rename = "PlantCity", default)]
    pub plant_city: Option<String>,
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: Option<String>,
    #[serde(rename = "VehicleType", default)]
    pub vehicle_type: Option<String>,
}
