//! Fit / Transform Pipeline
//!
//! [`FeaturePipeline`] is the untrained transformer. Fitting consumes it and
//! returns a [`FittedPipeline`] holding the frozen one-hot vocabulary and
//! output column order; only the fitted type can transform, so transforming
//! an untrained pipeline does not compile. [`PipelineState`] is the runtime
//! holder for places where a fitted artifact may not be available yet.
//!
//! Unknown categorical values at transform time are silently encoded as
//! all-zero blocks. This can hide upstream data-quality problems, so every
//! transform that meets one logs a warning with the count.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::derive::{engineer, NUMERIC_COLUMNS};
use crate::encoding::Vocabulary;
use crate::error::PipelineError;
use crate::features::{EncodedFeatureVector, FeatureMatrix};
use crate::record::VehicleRecord;
use crate::schema;

/// Artifact format version written by this build
pub const ARTIFACT_VERSION: u32 = 1;

/// Pipeline options, persisted with the fitted artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output columns to exclude on top of the built-in drop-lists
    #[serde(default)]
    pub extra_exclusions: Vec<String>,
}

impl PipelineConfig {
    pub fn with_exclusions<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_exclusions: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Untrained feature pipeline
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Learn the one-hot vocabulary from a training set and freeze it.
    pub fn fit(self, records: &[VehicleRecord]) -> Result<FittedPipeline, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }

        debug!("Fitting feature pipeline on {} records", records.len());
        let engineered: Vec<_> = records.iter().map(engineer).collect();
        let vocabulary = Vocabulary::learn(&engineered);

        for column in vocabulary.columns() {
            debug!(
                "Vocabulary {}: {} categories",
                column.column,
                column.categories.len()
            );
        }

        let columns = output_columns(&self.config, &vocabulary);
        info!(
            "Feature pipeline fitted: {} records, {} output columns",
            records.len(),
            columns.len()
        );

        Ok(FittedPipeline {
            version: ARTIFACT_VERSION,
            config: self.config,
            vocabulary,
            columns,
        })
    }
}

/// Full column list before drop-lists, and which of them are kept.
fn candidate_columns(config: &PipelineConfig, vocabulary: &Vocabulary) -> Vec<(String, bool)> {
    NUMERIC_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(vocabulary.feature_names())
        .map(|name| {
            let kept = schema::is_kept(&name, &config.extra_exclusions);
            (name, kept)
        })
        .collect()
}

fn output_columns(config: &PipelineConfig, vocabulary: &Vocabulary) -> Vec<String> {
    candidate_columns(config, vocabulary)
        .into_iter()
        .filter_map(|(name, kept)| kept.then_some(name))
        .collect()
}

/// Fitted pipeline: frozen vocabulary and column order.
///
/// Immutable after fit and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    version: u32,
    config: PipelineConfig,
    vocabulary: Vocabulary,
    columns: Vec<String>,
}

impl FittedPipeline {
    /// Frozen output column order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Encode records against the frozen vocabulary, preserving input order.
    pub fn transform(&self, records: &[VehicleRecord]) -> FeatureMatrix {
        let keep: Vec<bool> = candidate_columns(&self.config, &self.vocabulary)
            .into_iter()
            .map(|(_, kept)| kept)
            .collect();

        let mut unknown = 0;
        let rows = records
            .iter()
            .map(|record| {
                let engineered = engineer(record);
                let encoded = self.vocabulary.encode(&engineered.categorical);
                unknown += encoded.unknown;

                let values = engineered
                    .numeric
                    .iter()
                    .map(|(_, value)| *value)
                    .chain(encoded.indicators.into_iter().map(Some))
                    .zip(keep.iter())
                    .filter_map(|(value, kept)| kept.then_some(value))
                    .collect();

                EncodedFeatureVector {
                    vin: record.vin.clone(),
                    values,
                }
            })
            .collect();

        if unknown > 0 {
            warn!(
                "{} categorical value(s) absent from the fitted vocabulary were encoded as all-zero",
                unknown
            );
        }
        debug!("Transformed {} records", records.len());

        FeatureMatrix {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Transform a single prediction request.
    pub fn transform_one(&self, record: &VehicleRecord) -> EncodedFeatureVector {
        self.transform(std::slice::from_ref(record))
            .rows
            .pop()
            .unwrap_or_else(|| EncodedFeatureVector {
                vin: record.vin.clone(),
                values: Vec::new(),
            })
    }

    /// Serialize the artifact as pretty JSON.
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reload a JSON artifact, verifying it against this build's schema.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let fitted: Self = serde_json::from_str(json)?;
        fitted.verify()?;
        Ok(fitted)
    }

    /// Compact binary artifact
    pub fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let fitted: Self = postcard::from_bytes(bytes)?;
        fitted.verify()?;
        Ok(fitted)
    }

    /// Write the JSON artifact to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| io_error(path, e))?;
        info!("Saved fitted pipeline to {}", path.display());
        Ok(())
    }

    /// Load a JSON artifact from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let fitted = Self::from_json(&json)?;
        info!(
            "Loaded fitted pipeline from {} ({} columns)",
            path.display(),
            fitted.columns.len()
        );
        Ok(fitted)
    }

    fn verify(&self) -> Result<(), PipelineError> {
        if self.version != ARTIFACT_VERSION {
            return Err(PipelineError::CorruptArtifact(format!(
                "artifact version {} is not supported (expected {})",
                self.version, ARTIFACT_VERSION
            )));
        }
        self.vocabulary.validate()?;

        let expected = output_columns(&self.config, &self.vocabulary);
        if expected != self.columns {
            return Err(PipelineError::CorruptArtifact(format!(
                "stored column order ({} columns) does not match the vocabulary ({} columns)",
                self.columns.len(),
                expected.len()
            )));
        }
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Runtime fitted/unfitted holder
#[derive(Debug, Clone)]
pub enum PipelineState {
    Unfitted(FeaturePipeline),
    Fitted(FittedPipeline),
}

impl PipelineState {
    pub fn new(config: PipelineConfig) -> Self {
        PipelineState::Unfitted(FeaturePipeline::new(config))
    }

    /// Fit once. A second fit is rejected rather than overwriting the vocabulary.
    pub fn fit(&mut self, records: &[VehicleRecord]) -> Result<(), PipelineError> {
        let pipeline = match self {
            PipelineState::Unfitted(pipeline) => pipeline.clone(),
            PipelineState::Fitted(_) => return Err(PipelineError::AlreadyFitted),
        };
        *self = PipelineState::Fitted(pipeline.fit(records)?);
        Ok(())
    }

    /// Transform, or `NotFitted` without touching any record.
    pub fn transform(&self, records: &[VehicleRecord]) -> Result<FeatureMatrix, PipelineError> {
        self.fitted()
            .map(|fitted| fitted.transform(records))
            .ok_or(PipelineError::NotFitted)
    }

    pub fn fitted(&self) -> Option<&FittedPipeline> {
        match self {
            PipelineState::Fitted(fitted) => Some(fitted),
            PipelineState::Unfitted(_) => None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted().is_some()
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl From<FittedPipeline> for PipelineState {
    fn from(fitted: FittedPipeline) -> Self {
        PipelineState::Fitted(fitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(vin: &str, model: &str, state: &str, cylinders: f64, body: &str) -> VehicleRecord {
        VehicleRecord {
            vin: vin.to_string(),
            year: 2016,
            mileage: 45000.0,
            city: "Somewhere".to_string(),
            state: state.to_string(),
            make: "BMW".to_string(),
            model: model.to_string(),
            num_of_years: 4,
            engine_cylinders: Some(cylinders),
            displacement_l: Some(cylinders / 2.0),
            engine_hp: Some(cylinders * 50.0),
            fuel_type_primary: Some("Gasoline".to_string()),
            body_class: Some(body.to_string()),
            plant_country: Some("GERMANY".to_string()),
            model_vin: Some("X5".to_string()),
            ..Default::default()
        }
    }

    fn training_set() -> Vec<VehicleRecord> {
        vec![
            record("VIN00000000000001", "X5xDrive35i", "CA", 6.0, "Sport Utility Vehicle (SUV)/Multi-Purpose Vehicle (MPV)"),
            record("VIN00000000000002", "3", "TX", 4.0, "Sedan/Saloon"),
            record("VIN00000000000003", "1", "FL", 4.0, "Coupe"),
            record("VIN00000000000004", "Z4sDrive28i", "ZZ", 5.0, "Roadster"),
            record("VIN00000000000005", "M5Sedan", "", 8.0, "Sedan/Saloon"),
        ]
    }

    fn fitted() -> FittedPipeline {
        FeaturePipeline::default().fit(&training_set()).unwrap()
    }

    #[test]
    fn test_fit_rejects_empty_set() {
        let result = FeaturePipeline::default().fit(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyTrainingSet)));
    }

    #[test]
    fn test_output_columns_apply_drop_lists() {
        let pipeline = fitted();
        let columns = pipeline.columns();

        for dropped in [
            "Vin", "State", "Year", "Doors", "is_xDrive", "DisplacementL", "EngineHP",
            "Model_1", "28d", "EngineCylinders_5.0",
        ] {
            assert!(!columns.iter().any(|c| c == dropped), "{dropped} survived");
        }
        for kept in [
            "Mileage", "NumOfYears", "Region", "Mileage_per_year", "Power_perCylinder",
            "is_sDrive", "35i", "Model_X", "Model_3", "EngineCylinders_6.0", "BodyClass_Other",
            "PlantCountry_GERMANY", "FuelTypePrimary_Gasoline",
        ] {
            assert!(columns.iter().any(|c| c == kept), "{kept} missing");
        }
        assert_eq!(columns[0], "Mileage");
    }

    #[test]
    fn test_x5_scenario() {
        let pipeline = fitted();
        let matrix = pipeline.transform(&training_set()[..1]);
        assert_eq!(matrix.value(0, "Region"), Some(5.0));
        assert_eq!(matrix.value(0, "Model_X"), Some(1.0));
        assert_eq!(matrix.value(0, "Model_3"), Some(0.0));
        assert_eq!(matrix.value(0, "35i"), Some(1.0));
        assert_eq!(matrix.value(0, "is_sDrive"), Some(0.0));
        // is_xDrive is derived, then dropped from the output
        assert_eq!(matrix.column_index("is_xDrive"), None);
    }

    #[test]
    fn test_invalid_state_is_non_us() {
        let pipeline = fitted();
        let matrix = pipeline.transform(&training_set()[3..4]);
        assert_eq!(matrix.value(0, "Region"), Some(0.0));
    }

    #[test]
    fn test_bare_series_letter_encodes_empty_model_block() {
        let pipeline = fitted();
        let bare = VehicleRecord {
            model: "X".to_string(),
            ..training_set()[0].clone()
        };

        let matrix = pipeline.transform(&[bare]);
        let model_columns: Vec<usize> = matrix
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.starts_with("Model_"))
            .map(|(idx, _)| idx)
            .collect();
        assert!(!model_columns.is_empty());
        for idx in model_columns {
            assert_eq!(matrix.rows[0].values[idx], Some(0.0), "{}", matrix.columns[idx]);
        }
    }

    #[test]
    fn test_unseen_categories_encode_to_zero() {
        let pipeline = fitted();
        let unseen = record("VIN00000000000009", "X7xDrive40i", "NY", 12.0, "Pickup");
        let unseen = VehicleRecord {
            plant_country: Some("MEXICO".to_string()),
            fuel_type_primary: None,
            ..unseen
        };

        let matrix = pipeline.transform(&[unseen]);
        assert_eq!(matrix.columns, pipeline.columns());
        for (idx, column) in matrix.columns.iter().enumerate() {
            if column.starts_with("Model_")
                || column.starts_with("PlantCountry_")
                || column.starts_with("FuelTypePrimary_")
                || column.starts_with("EngineCylinders_")
            {
                assert_eq!(matrix.rows[0].values[idx], Some(0.0), "{column}");
            }
        }
        // "Pickup" collapses to Other, which was seen during fit
        assert_eq!(matrix.value(0, "BodyClass_Other"), Some(1.0));
    }

    #[test]
    fn test_zero_mileage_and_years() {
        let pipeline = fitted();
        let zero = VehicleRecord {
            mileage: 0.0,
            num_of_years: 0,
            ..training_set()[1].clone()
        };
        let fresh = VehicleRecord {
            mileage: 1500.0,
            num_of_years: 0,
            ..training_set()[1].clone()
        };

        let matrix = pipeline.transform(&[zero, fresh]);
        assert_eq!(matrix.value(0, "Mileage"), None);
        assert_eq!(matrix.value(0, "Mileage_per_year"), None);
        assert_eq!(
            matrix.value(1, "Mileage_per_year"),
            matrix.value(1, "Mileage")
        );
    }

    #[test]
    fn test_extra_exclusions() {
        let config = PipelineConfig::with_exclusions(["28i", "Region"]);
        let pipeline = FeaturePipeline::new(config).fit(&training_set()).unwrap();
        assert!(!pipeline.columns().iter().any(|c| c == "28i" || c == "Region"));
        let matrix = pipeline.transform(&training_set());
        assert!(matrix.rows.iter().all(|r| r.len() == pipeline.columns().len()));
    }

    #[test]
    fn test_state_not_fitted() {
        let state = PipelineState::default();
        let result = state.transform(&training_set());
        assert!(matches!(result, Err(PipelineError::NotFitted)));
        assert!(!state.is_fitted());
    }

    #[test]
    fn test_state_refit_rejected() {
        let mut state = PipelineState::default();
        state.fit(&training_set()).unwrap();
        let columns = state.fitted().unwrap().columns().to_vec();

        let result = state.fit(&training_set()[..1]);
        assert!(matches!(result, Err(PipelineError::AlreadyFitted)));
        assert_eq!(state.fitted().unwrap().columns(), columns.as_slice());
    }

    #[test]
    fn test_json_artifact_reload() {
        let pipeline = fitted();
        let reloaded = FittedPipeline::from_json(&pipeline.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, pipeline);

        let sample = vec![
            record("VIN00000000000010", "X3xDrive28i", "WA", 4.0, "Wagon"),
            record("VIN00000000000011", "unknown", "", 6.0, "Coupe"),
        ];
        assert_eq!(reloaded.transform(&sample), pipeline.transform(&sample));
    }

    #[test]
    fn test_binary_artifact_reload() {
        let pipeline = fitted();
        let reloaded = FittedPipeline::from_bytes(&pipeline.to_bytes().unwrap()).unwrap();
        assert_eq!(reloaded.transform(&training_set()), pipeline.transform(&training_set()));
    }

    #[test]
    fn test_artifact_file_roundtrip() {
        let pipeline = fitted();
        let path = std::env::temp_dir().join(format!("pipeline-{}.json", std::process::id()));
        pipeline.save(&path).unwrap();
        let loaded = FittedPipeline::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, pipeline);
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let pipeline = fitted();
        let mut json: serde_json::Value = serde_json::from_str(&pipeline.to_json().unwrap()).unwrap();
        json["columns"].as_array_mut().unwrap().pop();
        let result = FittedPipeline::from_json(&json.to_string());
        assert!(matches!(result, Err(PipelineError::CorruptArtifact(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = FittedPipeline::load("/nonexistent/pipeline.json");
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }

    fn arb_record() -> impl Strategy<Value = VehicleRecord> {
        (
            0u32..300_000,
            0u32..30,
            prop::sample::select(vec!["CA", "ny", "ZZ", "", " WI "]),
            prop::sample::select(vec!["X5xDrive35i", "3", "Z4sDrive28i", "i3Hatchback", "Gran Turismo"]),
            prop::option::of(prop::sample::select(vec![0.0, 3.0, 4.0, 6.0, 8.0, 12.0])),
            prop::option::of(0.0f64..600.0),
            prop::option::of(prop::sample::select(vec!["Coupe", "Wagon", "Sedan/Saloon", ""])),
        )
            .prop_map(|(mileage, years, state, model, cylinders, hp, body)| VehicleRecord {
                vin: "VIN0000000000PROP".to_string(),
                year: 2015,
                mileage: mileage as f64,
                state: state.to_string(),
                model: model.to_string(),
                num_of_years: years,
                engine_cylinders: cylinders,
                displacement_l: cylinders.map(|c| c / 2.0),
                engine_hp: hp,
                body_class: body.map(str::to_string),
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn prop_column_order_is_stable(
            train in prop::collection::vec(arb_record(), 1..20),
            a in prop::collection::vec(arb_record(), 1..5),
            b in prop::collection::vec(arb_record(), 1..5),
        ) {
            let pipeline = FeaturePipeline::default().fit(&train).unwrap();
            let first = pipeline.transform(&a);
            let second = pipeline.transform(&b);
            prop_assert_eq!(&first.columns, &second.columns);
            for row in first.rows.iter().chain(second.rows.iter()) {
                prop_assert_eq!(row.len(), pipeline.columns().len());
            }
        }

        #[test]
        fn prop_values_are_finite_or_missing(
            train in prop::collection::vec(arb_record(), 1..10),
            sample in arb_record(),
        ) {
            let pipeline = FeaturePipeline::default().fit(&train).unwrap();
            let vector = pipeline.transform_one(&sample);
            for value in vector.values.iter().flatten() {
                prop_assert!(value.is_finite());
            }
        }
    }
}
