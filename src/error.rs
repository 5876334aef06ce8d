//! Error types for roomservice
//!
//! Defines the error enum covering every fatal failure mode of a run.
//! Benign terminations (no matching repository, unresolvable revision)
//! are reported through [`crate::roomservice::Outcome`] instead.

use thiserror::Error;

/// Result type alias for roomservice operations
pub type Result<T> = std::result::Result<T, RoomserviceError>;

/// Error type for roomservice operations
#[derive(Error, Debug)]
pub enum RoomserviceError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP errors (transport failures, non-success status codes)
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing errors (JSON responses, dependency files, XML)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The primary manifest carries neither a default nor an include
    #[error("Manifest structure error: {0}")]
    ManifestStructure(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl RoomserviceError {
    /// True for failures talking to the search API
    pub fn is_network(&self) -> bool {
        matches!(self, RoomserviceError::Network(_) | RoomserviceError::Http(_))
    }

    /// True for malformed input (responses, dependency files, config)
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            RoomserviceError::Parse(_) | RoomserviceError::Json(_) | RoomserviceError::Yaml(_)
        )
    }
}
