//! Provider-reported application errors.

use serde_json::Value;
use thiserror::Error;

/// An error the remote API reported inside an otherwise delivered response.
///
/// Detected by [`Connector::check_response`](crate::Connector::check_response)
/// from the configured error field of the parsed body.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Provider error ({code}): {message}")]
pub struct ProviderError {
    /// The provider's error message.
    pub message: String,
    /// The provider's error code, `0` when none was reported.
    pub code: i64,
    /// The full parsed response body.
    pub body: Value,
}

impl ProviderError {
    /// Returns the parsed response body for diagnostics.
    pub fn response_body(&self) -> &Value {
        &self.body
    }
}
