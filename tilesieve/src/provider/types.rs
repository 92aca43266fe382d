//! Provider error type

use thiserror::Error;

/// Errors that can occur during provider operations.
///
/// `InvalidTemplate`, `InvalidName` and `ClientBuild` are configuration
/// errors raised before any tile is fetched. The rest describe a single
/// failed tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// URL template has unknown placeholders, unbalanced braces or lacks z/x/y
    #[error("Invalid URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Provider name is not usable as a cache directory
    #[error("Invalid provider name '{0}': use letters, digits, '.', '_' or '-'")]
    InvalidName(String),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Request did not complete within the configured timeout
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// Connection or other transport failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body is not a decodable image
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl ProviderError {
    /// Transport failures that may succeed on an immediate retry.
    ///
    /// HTTP status and image errors are never retried within a run.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::Http(_))
    }
}
