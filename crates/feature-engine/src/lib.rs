//! Vehicle Feature Engineering
//!
//! Turns merged listing + VIN-decode records into the fixed-order numeric
//! feature vectors the price model consumes. Fit once on a training set,
//! then transform any number of records, including single prediction rows,
//! with identical column order.

mod derive;
mod encoding;
mod error;
mod features;
mod pipeline;
mod record;
pub mod schema;
mod tables;

pub use derive::{engineer, log_or_missing, mileage_per_year, EngineeredRecord, NUMERIC_COLUMNS};
pub use encoding::{Category, CategoryColumn, EncodedCategories, Vocabulary};
pub use error::PipelineError;
pub use features::{EncodedFeatureVector, FeatureMatrix};
pub use pipeline::{FeaturePipeline, FittedPipeline, PipelineConfig, PipelineState, ARTIFACT_VERSION};
pub use record::VehicleRecord;
pub use tables::{body_class_bucket, series_for_model, EconomicRegion, SERIES_TABLE};
