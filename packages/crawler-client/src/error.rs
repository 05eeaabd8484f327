//! Error types for the crawler service client.

use thiserror::Error;

/// Result type for crawler client operations.
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Crawler service client errors.
#[derive(Debug, Error)]
pub enum CrawlerError {
    /// Configuration error (missing base URL, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// The request itself could not be completed (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-success response from the crawler service
    #[error("crawler service error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A stream record could not be decoded
    #[error("stream decode error: {0}")]
    Decode(String),
}
