//! Authentication and authorization errors.

use thiserror::Error;

/// Errors related to API credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the credentials of a connection (HTTP 401).
    #[error("Invalid credentials for connection [{connection}]")]
    InvalidCredentials {
        /// Name of the connection whose credentials were rejected.
        connection: String,
    },

    /// A credential cannot be expressed as an HTTP header value.
    #[error("Credential for {auth} auth contains characters not allowed in a header")]
    InvalidHeaderValue {
        /// The auth kind that produced the header.
        auth: String,
    },
}

impl AuthError {
    /// Returns the connection name for credential rejections.
    pub fn connection(&self) -> Option<&str> {
        match self {
            Self::InvalidCredentials { connection } => Some(connection),
            Self::InvalidHeaderValue { .. } => None,
        }
    }
}
