//! Response body parsing errors.

use thiserror::Error;

/// Errors while parsing a response body.
///
/// Only bodies whose content type declares a format fail here; undeclared
/// bodies that do not parse are returned as raw text instead.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A declared JSON body is malformed.
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// A declared XML body is malformed.
    #[error("Failed to parse XML response: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Records could not be converted into the requested type.
    #[error("Failed to hydrate {target}: {source}")]
    Hydrate {
        /// Name of the target type.
        target: &'static str,
        /// The underlying deserialization failure.
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ParseError::Json(json_err);
        assert!(err.to_string().starts_with("Failed to parse JSON response"));
    }
}
