//! Connection configuration and the string-keyed factories built on it.
//!
//! Configuration is usually loaded from YAML:
//!
//! ```yaml
//! default: shop
//! connections:
//!   shop:
//!     driver: fractal
//!     host: https://api.example.com
//!     auth: basic-auth
//!     identifier: user
//!     secret: pass
//!     headers:
//!       Accept: application/json
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::connection::Connection;
use crate::connector::{Auth, AuthKind, BodyFormat, Connector};
use crate::error::ConfigError;
use crate::query::{Processor, ResponseDialect};

/// The driver named by a connection's `driver` key.
///
/// `basic` is accepted as an alias of `generic`, and `fractal` as an alias
/// of `enveloped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Driver {
    /// Bare records.
    #[default]
    Generic,
    /// `data` enveloped payloads.
    Enveloped,
}

impl Driver {
    /// Returns the response dialect this driver speaks.
    pub fn dialect(&self) -> ResponseDialect {
        match self {
            Self::Generic => ResponseDialect::Generic,
            Self::Enveloped => ResponseDialect::Enveloped,
        }
    }

    /// Returns the canonical configuration key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Enveloped => "enveloped",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "basic" => Ok(Self::Generic),
            "enveloped" | "fractal" => Ok(Self::Enveloped),
            _ => Err(ConfigError::UnsupportedDriver {
                driver: s.to_string(),
            }),
        }
    }
}

fn default_driver() -> String {
    Driver::default().to_string()
}

fn default_auth() -> String {
    AuthKind::default().to_string()
}

/// Settings for one named connection.
///
/// Keys are strings so unknown drivers and auth schemes surface as
/// [`ConfigError`]s from the factories rather than as parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Driver key, see [`Driver`].
    pub driver: String,
    /// Base URL of the API.
    pub host: Option<String>,
    /// Auth key, see [`AuthKind`].
    pub auth: String,
    /// Basic auth identifier.
    pub identifier: Option<String>,
    /// Basic auth secret.
    pub secret: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Overrides the dialect implied by the driver.
    pub dialect: Option<String>,
    /// Body field holding a provider error message.
    pub response_error: Option<String>,
    /// Body field holding a provider error code.
    pub response_code: Option<String>,
    /// Envelope key for the enveloped dialect.
    pub envelope_key: Option<String>,
    /// Write body encoding, `json` or `form`.
    pub body_format: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            host: None,
            auth: default_auth(),
            identifier: None,
            secret: None,
            token: None,
            headers: BTreeMap::new(),
            dialect: None,
            response_error: None,
            response_code: None,
            envelope_key: None,
            body_format: None,
            timeout_ms: None,
        }
    }
}

impl ConnectionConfig {
    /// Creates a configuration for a host with every other setting defaulted.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }
}

/// The full configuration: a default name and the named connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElicitConfig {
    /// Name of the connection used when none is given.
    pub default: Option<String>,
    /// Connection settings by name.
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl ElicitConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the settings for a connection name.
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.get(name)
    }

    /// Returns the default connection name.
    pub fn default_name(&self) -> Result<&str, ConfigError> {
        self.default.as_deref().ok_or(ConfigError::NoDefaultConnection)
    }
}

/// Builds the connector described by a configuration.
///
/// ## Errors
///
/// - [`ConfigError::MissingField`] without a `host`
/// - [`ConfigError::UnsupportedAuth`] for an unknown auth key
/// - [`ConfigError::MissingCredentials`] when the auth scheme lacks fields
/// - [`ConfigError::UnsupportedBodyFormat`], [`ConfigError::InvalidHeader`]
///   and [`ConfigError::InvalidUrl`] for malformed settings
pub fn create_connector(config: &ConnectionConfig) -> Result<Connector, ConfigError> {
    let host = config
        .host
        .as_deref()
        .filter(|host| !host.trim().is_empty())
        .ok_or_else(|| ConfigError::missing_field("host"))?;
    let base_url = Url::parse(host)?;

    let kind: AuthKind = config.auth.parse()?;
    let auth = Auth::from_config(
        kind,
        config.identifier.as_deref(),
        config.secret.as_deref(),
        config.token.as_deref(),
    )?;

    let mut builder = Connector::builder(base_url).auth(auth);
    for (name, value) in &config.headers {
        builder = builder.default_header(name, value)?;
    }
    if let Some(timeout_ms) = config.timeout_ms {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(format) = &config.body_format {
        let format: BodyFormat = format
            .parse()
            .map_err(|_| ConfigError::UnsupportedBodyFormat {
                format: format.clone(),
            })?;
        builder = builder.body_format(format);
    }
    if let Some(field) = &config.response_error {
        builder = builder.response_error(field);
    }
    if let Some(field) = &config.response_code {
        builder = builder.response_code(field);
    }

    builder.build()
}

/// Wraps a connector in a connection for the given driver key.
///
/// ## Errors
///
/// - [`ConfigError::UnsupportedDriver`] for an unknown driver key
/// - [`ConfigError::UnsupportedDialect`] for an unknown dialect override
pub fn create_connection(
    name: &str,
    driver: &str,
    connector: Connector,
    config: &ConnectionConfig,
) -> Result<Connection, ConfigError> {
    let driver: Driver = driver.parse()?;

    let dialect = match &config.dialect {
        Some(dialect) => dialect
            .parse::<ResponseDialect>()
            .map_err(|_| ConfigError::UnsupportedDialect {
                dialect: dialect.clone(),
            })?,
        None => driver.dialect(),
    };
    let mut processor = Processor::new(dialect);
    if let Some(key) = &config.envelope_key {
        processor = processor.with_envelope_key(key);
    }

    Ok(Connection::new(name, connector)
        .with_driver(driver)
        .with_processor(processor))
}
