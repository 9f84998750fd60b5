//! MemeVault error types

use thiserror::Error;

/// MemeVault error type
#[derive(Error, Debug)]
pub enum Error {
    /// Payload with an identical content hash is already stored
    #[error("Duplicate content: {0}")]
    Duplicate(String),

    /// Operation referenced an unknown record id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Recoverable fetch/classify/timeout failure; the attempt is dropped
    #[error("Transient error: {0}")]
    Transient(String),

    /// Classifier returned nothing usable
    #[error("Malformed verdict: {0}")]
    Verdict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for MemeVault operations
pub type Result<T> = std::result::Result<T, Error>;
