//! Error types for the concept card Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the concept card Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied request is structurally invalid
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Third-party API answered with a non-success status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Transport failure talking to a third-party API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Upstream(_) | Error::Http(_) => 502,
            _ => 500,
        }
    }
}

/// A failed precondition on a caller-supplied request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("templateId is required")]
    MissingTemplateId,

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("topic is required for topic entries")]
    MissingTopic,

    #[error("text must be at least {min} characters (got {actual})")]
    TextTooShort { min: usize, actual: usize },

    #[error("imageUrl is required for image entries")]
    MissingImage,

    #[error("fileUrl is required for file entries")]
    MissingFile,

    #[error("keyword must be at least 2 characters")]
    InvalidKeyword,

    #[error("prompt must be at least 5 characters")]
    InvalidPrompt,

    #[error("record id is required")]
    MissingRecordId,

    #[error("{0}")]
    InvalidField(String),
}
