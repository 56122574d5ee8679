//! Error types for earthmover-core

use thiserror::Error;

/// Result type alias using earthmover-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in earthmover-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Backend/API error
    #[error(transparent)]
    Api(#[from] crate::api::ApiError),

    /// Booking flow error
    #[error(transparent)]
    Flow(#[from] crate::flow::FlowError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Profile photo error
    #[error(transparent)]
    Photo(#[from] crate::media::PhotoError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
