//! Error types for media-dl
//!
//! This module provides error handling for the library, including:
//! - The request-time taxonomy (invalid input, upstream unavailable)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Failures that happen while a download is streaming are not errors from the
//! caller's point of view: they are folded into the job's `failed` status and
//! are only observable through the progress subscription.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to clients when the provider cannot be reached.
///
/// Raw provider diagnostics are logged, never returned.
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str =
    "the media provider is unavailable or refused the request, try again later";

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed media URL
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The provider refused the request, was unreachable, or answered garbage
    ///
    /// The carried detail is for logs only; `Display` stays generic.
    #[error("upstream unavailable")]
    UpstreamUnavailable {
        /// Internal diagnostic, never surfaced to clients
        detail: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job or resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Failures of a running download
///
/// These never reach the client that requested the download (its response is
/// already sent); they turn the job `failed` and are logged.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The provider stream could not be opened or broke mid-way
    #[error("media stream failed: {0}")]
    Stream(String),

    /// No chunk arrived within the idle timeout
    #[error("media stream stalled for {0:?}")]
    Stalled(std::time::Duration),

    /// Writing to the artifact store failed
    #[error("failed to write artifact: {0}")]
    Write(String),

    /// The download was cancelled (shutdown)
    #[error("download cancelled")]
    Cancelled,
}

impl Error {
    /// Build an `UpstreamUnavailable` error from any diagnostic
    pub fn upstream(detail: impl Into<String>) -> Self {
        Error::UpstreamUnavailable {
            detail: detail.into(),
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_input",
///     "message": "invalid input: unsupported media URL"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_input")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::InvalidInput(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - provider errors
            Error::UpstreamUnavailable { .. } => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::UpstreamUnavailable { .. } => "upstream_unavailable",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::Network(_) => "upstream_unavailable",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // Provider and I/O diagnostics can leak hostnames, paths and provider
        // internals; clients only see a generic message for those.
        let message = match &error {
            Error::UpstreamUnavailable { .. } | Error::Network(_) => {
                UPSTREAM_UNAVAILABLE_MESSAGE.to_string()
            }
            Error::Io(_) => "failed to prepare download storage".to_string(),
            _ => error.to_string(),
        };

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
