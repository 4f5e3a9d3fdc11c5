//! Error types for spam-rs

use thiserror::Error;

/// Result type alias for classifier operations
pub type Result<T> = std::result::Result<T, SpamError>;

/// Spam classifier error types
#[derive(Error, Debug)]
pub enum SpamError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset could not be read or split
    #[error("Data error: {0}")]
    Data(String),

    /// Optional augmentation set could not be merged
    #[error("Augmentation error: {0}")]
    Augmentation(String),

    /// A component was used before `fit`
    #[error("{0} is not fitted yet; call fit before using it")]
    NotFitted(&'static str),

    /// Training could not proceed with the given data
    #[error("Training error: {0}")]
    Training(String),

    /// The classifier was fitted without probability support
    #[error("Probability estimates unavailable: {0}")]
    ProbabilityUnavailable(String),

    /// Persisted model could not be written or read
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Single-document prediction failed
    #[error("Prediction error: {0}")]
    Prediction(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for SpamError {
    fn from(err: config::ConfigError) -> Self {
        SpamError::Config(err.to_string())
    }
}

impl From<csv::Error> for SpamError {
    fn from(err: csv::Error) -> Self {
        SpamError::Data(err.to_string())
    }
}

impl From<bincode::Error> for SpamError {
    fn from(err: bincode::Error) -> Self {
        SpamError::Artifact(err.to_string())
    }
}

impl SpamError {
    /// Whether this error belongs to the configuration class (fatal before any data work)
    pub fn is_config(&self) -> bool {
        matches!(self, SpamError::Config(_))
    }
}
