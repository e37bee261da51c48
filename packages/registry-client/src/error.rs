//! Error types for the registry client.

use thiserror::Error;

/// Result type for registry client operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry client errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the registry
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Pagination metadata header missing or unreadable
    #[error("Search metadata error: {0}")]
    Metadata(String),
}

impl RegistryError {
    /// True for failures of the transport or the remote service, as opposed
    /// to a response we could not make sense of.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }
}
