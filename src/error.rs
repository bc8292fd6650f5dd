//! Error types for ServiceNow API operations.
//!
//! Remote and network failures are not errors at this level: the request
//! executor folds them into an [`ApiResponse`](crate::ApiResponse) envelope.
//! `NowError` only carries failures that indicate caller misuse or a local
//! condition the caller must handle.

use thiserror::Error;

use crate::response::ApiError;

/// Errors that can occur while using the ServiceNow client.
#[derive(Debug, Error)]
pub enum NowError {
    /// Configuration is missing or incomplete.
    #[error("ServiceNow configuration required: {0}")]
    ConfigMissing(String),

    /// An OAuth operation was attempted before client id/secret were set.
    #[error("No OAuth client details added")]
    NoClientDetails,

    /// A header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Query parameters could not be flattened into key/value pairs.
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),

    /// HTTP client error (request construction, or a raw transfer).
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization or parsing error.
    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// A Glide date or date-time string could not be parsed.
    #[error("Invalid Glide date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// A call came back as an error envelope and the caller asked for it as
    /// an error via [`ApiResponse::into_result`](crate::ApiResponse::into_result).
    #[error("ServiceNow API error ({status}): {error}")]
    Api { status: i32, error: ApiError },

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ServiceNow operations.
pub type Result<T> = core::result::Result<T, NowError>;
