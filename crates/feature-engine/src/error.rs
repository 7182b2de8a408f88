//! Pipeline Error Types

use thiserror::Error;

/// Errors raised by the feature pipeline.
///
/// Missing or unknown values inside a record are never errors; only
/// structural problems surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transform requested before any vocabulary was learned or loaded
    #[error("pipeline is not fitted: call fit or load a fitted artifact before transform")]
    NotFitted,

    /// Second fit on an already fitted pipeline
    #[error("pipeline is already fitted; fitted vocabularies are frozen")]
    AlreadyFitted,

    /// Fit called with no rows
    #[error("cannot fit pipeline on an empty training set")]
    EmptyTrainingSet,

    /// Persisted artifact is inconsistent with this build's schema
    #[error("corrupt pipeline artifact: {0}")]
    CorruptArtifact(String),

    /// Artifact (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Artifact file could not be read or written
    #[error("artifact I/O error at {path}: {message}")]
    Io { path: String, message: String },
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<postcard::Error> for PipelineError {
    fn from(err: postcard::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
