//! Unified error handling for the client.

use crate::config::ConfigError;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Engine error: {0}")]
    Engine(#[from] docket_engine::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for client calls.
pub type Result<T> = std::result::Result<T, ClientError>;
