//! Transport and HTTP status errors.

use thiserror::Error;

/// Errors from the HTTP transport layer.
///
/// These never reach callers on their own; a [`Connection`](crate::Connection)
/// wraps them in [`ElicitError::Query`](crate::ElicitError::Query) together
/// with the request that failed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed due to network, timeout or protocol error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a failing HTTP status code.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: u16,
        /// The response body, or the status reason when the body was empty.
        message: String,
    },

    /// The absolute request URL could not be built.
    #[error("Invalid request URL {url}: {source}")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// The underlying parse failure.
        source: url::ParseError,
    },
}

impl ClientError {
    /// Returns `true` if the transport gave up waiting for the server.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }

    /// Returns the HTTP status code if the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidUrl { .. } => None,
        }
    }
}
