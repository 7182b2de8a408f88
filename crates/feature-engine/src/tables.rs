//! Frozen Lookup Tables
//!
//! State → economic region, body class → coarse bucket, raw model → series.

use serde::{Deserialize, Serialize};

/// Ordinal economic bucket of a U.S. state by GDP rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EconomicRegion {
    NonUs,
    LowestGdp,
    LowerGdp,
    MidRangeGdp,
    HighGdp,
    HighestGdp,
}

const REGION_TABLE: [(EconomicRegion, &[&str]); 5] = [
    (EconomicRegion::HighestGdp, &["CA", "TX", "NY"]),
    (EconomicRegion::HighGdp, &["FL", "IL", "PA", "OH", "GA", "WA", "NJ"]),
    (
        EconomicRegion::MidRangeGdp,
        &["NC", "MA", "VA", "MI", "CO", "MD", "TN", "AZ", "IN", "MN"],
    ),
    (
        EconomicRegion::LowerGdp,
        &["WI", "MO", "CT", "OR", "SC", "LA", "AL", "KY", "UT"],
    ),
    (
        EconomicRegion::LowestGdp,
        &["IA", "NV", "KS", "AR", "NE", "MS", "NM", "ID"],
    ),
];

impl EconomicRegion {
    /// Resolve a state code. Whitespace and case are ignored; anything
    /// outside the table is `NonUs`.
    pub fn from_state(state: &str) -> Self {
        let code = state.trim().to_uppercase();
        REGION_TABLE
            .iter()
            .find(|(_, states)| states.contains(&code.as_str()))
            .map(|(region, _)| *region)
            .unwrap_or(EconomicRegion::NonUs)
    }

    /// GDP ordinal (0 = Non-US, 5 = Highest GDP)
    pub fn ordinal(&self) -> u8 {
        match self {
            EconomicRegion::NonUs => 0,
            EconomicRegion::LowestGdp => 1,
            EconomicRegion::LowerGdp => 2,
            EconomicRegion::MidRangeGdp => 3,
            EconomicRegion::HighGdp => 4,
            EconomicRegion::HighestGdp => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EconomicRegion::NonUs => "Non-US",
            EconomicRegion::LowestGdp => "Lowest GDP",
            EconomicRegion::LowerGdp => "Lower GDP",
            EconomicRegion::MidRangeGdp => "Mid-Range GDP",
            EconomicRegion::HighGdp => "High GDP",
            EconomicRegion::HighestGdp => "Highest GDP",
        }
    }
}

/// Body classes kept as their own bucket. Everything else is [`OTHER_BODY_CLASS`].
pub const CURATED_BODY_CLASSES: [&str; 4] = [
    "Sedan/Saloon",
    "Sport Utility Vehicle (SUV)/Multi-Purpose Vehicle (MPV)",
    "Coupe",
    "Convertible/Cabriolet",
];

pub const OTHER_BODY_CLASS: &str = "Other";

/// Collapse a decoded body class into its coarse bucket.
pub fn body_class_bucket(body_class: &str) -> &'static str {
    CURATED_BODY_CLASSES
        .iter()
        .find(|curated| **curated == body_class)
        .copied()
        .unwrap_or(OTHER_BODY_CLASS)
}

/// Series letters and the raw model strings belonging to each.
///
/// Only full designators are listed; a bare series letter has no series.
pub const SERIES_TABLE: [(&str, &[&str]); 11] = [
    ("1", &["1"]),
    ("2", &["2"]),
    ("3", &["3"]),
    ("4", &["4"]),
    ("5", &["5"]),
    ("6", &["6"]),
    ("7", &["7"]),
    ("M", &["M32dr", "M5Sedan", "M4Coupe"]),
    (
        "X",
        &[
            "X1sDrive28i", "X1xDrive28i", "X1xDrive35i", "X1xDrive", "X1Sports", "X3AWD",
            "X3sDrive28i", "X3xDrive28i", "X3xDrive28d", "X3xDrive35i", "X4xDrive28i", "X5AWD",
            "X5", "X5sDrive35i", "X5xDrive35i", "X5xDrive35d", "X5xDrive50i", "X6AWD",
            "X6xDrive35i",
        ],
    ),
    ("Z", &["Z4Roadster", "Z42dr", "Z4sDrive28i", "Z4sDrive35i"]),
    ("I", &["i3Hatchback"]),
];

/// Map a raw model designator to its series letter. Exact membership only.
pub fn series_for_model(model: &str) -> Option<&'static str> {
    SERIES_TABLE
        .iter()
        .find(|(_, models)| models.contains(&model))
        .map(|(series, _)| *series)
}
