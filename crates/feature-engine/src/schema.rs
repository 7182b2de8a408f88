//! Shared Column Schema
//!
//! Single source of truth for column names used by the VIN adapter (field
//! whitelist, required input schema) and the pipeline (derived columns,
//! drop-lists).

/// Listing columns
pub const VIN: &str = "Vin";
pub const YEAR: &str = "Year";
pub const MILEAGE: &str = "Mileage";
pub const CITY: &str = "City";
pub const STATE: &str = "State";
pub const MAKE: &str = "Make";
pub const MODEL: &str = "Model";
pub const NUM_OF_YEARS: &str = "NumOfYears";
pub const PRICE: &str = "Price";

/// VIN-decode columns
pub const ENGINE_CYLINDERS: &str = "EngineCylinders";
pub const DISPLACEMENT_L: &str = "DisplacementL";
pub const DISPLACEMENT_CI: &str = "DisplacementCI";
pub const DISPLACEMENT_CC: &str = "DisplacementCC";
pub const FUEL_TYPE_PRIMARY: &str = "FuelTypePrimary";
pub const GVWR: &str = "GVWR";
pub const ENGINE_HP: &str = "EngineHP";
pub const DOORS: &str = "Doors";
pub const BODY_CLASS: &str = "BodyClass";
pub const MODEL_VIN: &str = "ModelVIN";
pub const PLANT_COUNTRY: &str = "PlantCountry";
pub const PLANT_CITY: &str = "PlantCity";
pub const MANUFACTURER: &str = "Manufacturer";
pub const VEHICLE_TYPE: &str = "VehicleType";

/// Key carrying the VIN inside a decode payload
pub const DECODE_VIN: &str = "VIN";

/// Key carrying the model inside a decode payload (renamed to `ModelVIN` on merge)
pub const DECODE_MODEL: &str = "Model";

/// Derived columns
pub const REGION: &str = "Region";
pub const MILEAGE_PER_YEAR: &str = "Mileage_per_year";
pub const POWER_PER_CYLINDER: &str = "Power_perCylinder";
pub const POWER_PER_DISPLACEMENT: &str = "Power_perDisplacement";
pub const CYLINDER_SIZE: &str = "CylinderSize";
pub const TOTAL_POWER_OUTPUT: &str = "TotalPowerOutput";
pub const TOTAL_POWER_CAPACITY: &str = "TotalPowerCapacity";

/// Fields supplied by the locally entered listing.
pub const LISTING_FIELDS: [&str; 8] = [VIN, YEAR, MILEAGE, CITY, STATE, MAKE, MODEL, NUM_OF_YEARS];

/// Fields selected from a raw VIN-decode payload.
pub const VIN_DECODE_FIELDS: [&str; 15] = [
    ENGINE_CYLINDERS,
    DISPLACEMENT_L,
    DISPLACEMENT_CI,
    DISPLACEMENT_CC,
    FUEL_TYPE_PRIMARY,
    GVWR,
    ENGINE_HP,
    DOORS,
    BODY_CLASS,
    DECODE_MODEL,
    PLANT_COUNTRY,
    PLANT_CITY,
    DECODE_VIN,
    MANUFACTURER,
    VEHICLE_TYPE,
];

/// Subset of [`VIN_DECODE_FIELDS`] coerced to numbers.
pub const VIN_NUMERIC_FIELDS: [&str; 6] = [
    ENGINE_CYLINDERS,
    DISPLACEMENT_L,
    DISPLACEMENT_CI,
    DISPLACEMENT_CC,
    ENGINE_HP,
    DOORS,
];

/// Input schema the pipeline expects after the listing and decode are merged.
pub const REQUIRED_INPUT_FIELDS: [&str; 22] = [
    VIN,
    YEAR,
    MILEAGE,
    CITY,
    STATE,
    MAKE,
    MODEL,
    NUM_OF_YEARS,
    ENGINE_CYLINDERS,
    DISPLACEMENT_L,
    DISPLACEMENT_CI,
    DISPLACEMENT_CC,
    FUEL_TYPE_PRIMARY,
    GVWR,
    ENGINE_HP,
    DOORS,
    BODY_CLASS,
    MODEL_VIN,
    PLANT_COUNTRY,
    PLANT_CITY,
    MANUFACTURER,
    VEHICLE_TYPE,
];

/// Categorical columns one-hot encoded, in output order.
pub const ONE_HOT_COLUMNS: [&str; 5] = [
    MODEL,
    PLANT_COUNTRY,
    FUEL_TYPE_PRIMARY,
    ENGINE_CYLINDERS,
    BODY_CLASS,
];

/// Model-string tokens and the indicator column each one sets.
pub const MODEL_TOKENS: [(&str, &str); 8] = [
    ("is_xDrive", "xDrive"),
    ("is_sDrive", "sDrive"),
    ("is_AWD", "AWD"),
    ("28i", "28i"),
    ("35i", "35i"),
    ("28d", "28d"),
    ("35d", "35d"),
    ("50i", "50i"),
];

/// Identifier and leakage columns never handed to the model.
pub const IDENTIFIER_COLUMNS: [&str; 6] = [PRICE, VIN, MAKE, CITY, MODEL_VIN, STATE];

/// Intermediate or raw columns dropped after engineering.
pub const INTERMEDIATE_COLUMNS: [&str; 10] = [
    YEAR,
    DOORS,
    "is_xDrive",
    DISPLACEMENT_CC,
    DISPLACEMENT_L,
    DISPLACEMENT_CI,
    ENGINE_HP,
    "Model_1",
    "28d",
    "EngineCylinders_5.0",
];

/// Whether a column survives both drop-lists and the extra exclusions.
pub fn is_kept(column: &str, extra_exclusions: &[String]) -> bool {
    !IDENTIFIER_COLUMNS.contains(&column)
        && !INTERMEDIATE_COLUMNS.contains(&column)
        && !extra_exclusions.iter().any(|c| c == column)
}

/// Name of a one-hot output column.
pub fn one_hot_column(group: &str, category: &str) -> String {
    format!("{group}_{category}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fields_are_whitelisted() {
        for field in VIN_NUMERIC_FIELDS {
            assert!(VIN_DECODE_FIELDS.contains(&field), "{field} not whitelisted");
        }
    }

    #[test]
    fn test_required_fields_are_covered() {
        for field in REQUIRED_INPUT_FIELDS {
            let from_decode = VIN_DECODE_FIELDS.contains(&field) || field == MODEL_VIN;
            assert!(LISTING_FIELDS.contains(&field) || from_decode, "{field} has no source");
        }
    }

    #[test]
    fn test_drop_lists() {
        let extra = vec!["GVWR".to_string()];
        assert!(!is_kept("Vin", &extra));
        assert!(!is_kept("Model_1", &extra));
        assert!(!is_kept("GVWR", &extra));
        assert!(is_kept("Model_X", &extra));
        assert!(is_kept("Region", &[]));
    }
}
