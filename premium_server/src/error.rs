use std::path::PathBuf;

use premium_features::ProfileError;
use thiserror::Error;

/// Model artifact could not be turned into a servable model.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Cannot read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode model artifact: {0}")]
    Decode(#[from] bincode::Error),

    #[error("Not a premium model artifact")]
    BadMagic,

    #[error("Unsupported model artifact version {0}")]
    UnsupportedVersion(u32),

    #[error("Model was trained on features {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Malformed model: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid feature vector: {0}")]
    InvalidFeatureVector(String),

    #[error("Model inference failed: {0}")]
    Inference(String),
}

/// Request-time failures, all reported to the caller as `{"error": ..}`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Missing user_data in request body")]
    MissingPayload,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PredictionError {
    /// Whether the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictionError::Model(_))
    }
}
