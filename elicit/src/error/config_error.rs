//! Connection configuration errors.

use thiserror::Error;

/// Errors in connection configuration.
///
/// These occur while building connectors and connections, typically on the
/// first use of a connection name. They indicate programmer or deployment
/// mistakes and are never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No connection with the given name is configured or registered.
    #[error("Connection [{name}] is not configured")]
    UnknownConnection {
        /// The requested connection name.
        name: String,
    },

    /// No default connection name is set.
    #[error("No default connection configured")]
    NoDefaultConnection,

    /// The driver key does not name a known connection driver.
    #[error("Unsupported driver [{driver}]")]
    UnsupportedDriver {
        /// The unrecognized driver key.
        driver: String,
    },

    /// The auth key does not name a known authentication scheme.
    #[error("Unsupported auth [{auth}]")]
    UnsupportedAuth {
        /// The unrecognized auth key.
        auth: String,
    },

    /// The dialect key does not name a known response dialect.
    #[error("Unsupported response dialect [{dialect}]")]
    UnsupportedDialect {
        /// The unrecognized dialect key.
        dialect: String,
    },

    /// The body format key does not name a known request body encoding.
    #[error("Unsupported body format [{format}]")]
    UnsupportedBodyFormat {
        /// The unrecognized format key.
        format: String,
    },

    /// A required configuration field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// The selected auth scheme needs credentials that were not provided.
    #[error("{auth} authentication requires {required}")]
    MissingCredentials {
        /// The auth scheme being configured.
        auth: String,
        /// Human readable list of the required credential fields.
        required: &'static str,
    },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A default header name or value is not valid HTTP.
    #[error("Invalid header [{name}]: {message}")]
    InvalidHeader {
        /// The header name as configured.
        name: String,
        /// Why the header was rejected.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A YAML configuration document could not be parsed.
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON configuration document could not be parsed.
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an unknown connection error.
    pub fn unknown_connection(name: impl Into<String>) -> Self {
        Self::UnknownConnection { name: name.into() }
    }
}
