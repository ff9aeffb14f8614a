//! Error types for shop API calls.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (connection refused, reset, DNS).
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The request took longer than its timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API answered 2xx but the body carries an `error` field.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built from the base URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A download returned no bytes.
    #[error("Empty response body")]
    EmptyBody,

    /// A download returned something other than what was asked for.
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),
}

impl ApiError {
    /// Whether the failure is worth retrying: network trouble or a timeout.
    ///
    /// Answers from the API, even 5xx ones, are not retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout(_))
    }

    /// Classify a `reqwest` error from sending a request.
    pub(crate) fn from_send(error: reqwest::Error, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(limit) if error.is_timeout() => Self::Timeout(limit),
            _ => Self::Http(error),
        }
    }
}

/// Result alias for API calls.
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: 400,
            message: "Mobile number is required".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 400 - Mobile number is required");

        let err = ApiError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Request timed out after 10s");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(
            !ApiError::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!ApiError::Rejected("out of stock".to_string()).is_transient());
        assert!(!ApiError::Parse("eof".to_string()).is_transient());
    }
}
