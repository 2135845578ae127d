//! Error types for quorum-llm

use thiserror::Error;

/// Provider failure
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials or endpoint missing
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// The provider rejected or failed the call; text is already redacted
    #[error("api error: {0}")]
    Api(String),

    /// The reply could not be used
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
