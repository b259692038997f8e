//! Authentication schemes for connectors.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::{AuthError, ConfigError};

/// The authentication scheme named by a connection's `auth` key.
///
/// | Key | Scheme |
/// |---|---|
/// | `none`, `plain`, `basic` | no authentication |
/// | `basic-auth` | HTTP Basic |
/// | `bearer` | bearer token |
///
/// `basic` names the plain connector, not HTTP Basic; existing
/// configurations rely on that spelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AuthKind {
    /// Requests are sent without credentials.
    #[default]
    None,
    /// HTTP Basic with an identifier and a secret.
    Basic,
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthKind {
    /// Returns the canonical configuration key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic-auth",
            Self::Bearer => "bearer",
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "plain" | "basic" => Ok(Self::None),
            "basic-auth" | "basic_auth" => Ok(Self::Basic),
            "bearer" => Ok(Self::Bearer),
            _ => Err(ConfigError::UnsupportedAuth {
                auth: s.to_string(),
            }),
        }
    }
}

/// Credentials a connector attaches to every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Auth {
    /// No credentials.
    #[default]
    None,
    /// HTTP Basic credentials.
    Basic {
        /// The user name or client identifier.
        identifier: String,
        /// The password or client secret.
        secret: String,
    },
    /// A bearer token.
    Bearer {
        /// The token, without the `Bearer ` prefix.
        token: String,
    },
}

impl Auth {
    /// Creates HTTP Basic credentials.
    pub fn basic(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::Basic {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Creates bearer credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Builds credentials for `kind` from optional configuration fields.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] when the scheme needs a
    /// field that is absent or empty.
    pub fn from_config(
        kind: AuthKind,
        identifier: Option<&str>,
        secret: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, ConfigError> {
        fn present(field: Option<&str>) -> Option<&str> {
            field.filter(|value| !value.is_empty())
        }

        match kind {
            AuthKind::None => Ok(Self::None),
            AuthKind::Basic => match (present(identifier), present(secret)) {
                (Some(identifier), Some(secret)) => Ok(Self::basic(identifier, secret)),
                _ => Err(ConfigError::MissingCredentials {
                    auth: kind.to_string(),
                    required: "an identifier and a secret",
                }),
            },
            AuthKind::Bearer => present(token)
                .map(Self::bearer)
                .ok_or_else(|| ConfigError::MissingCredentials {
                    auth: kind.to_string(),
                    required: "a token",
                }),
        }
    }

    /// Returns the scheme of these credentials.
    pub fn kind(&self) -> AuthKind {
        match self {
            Self::None => AuthKind::None,
            Self::Basic { .. } => AuthKind::Basic,
            Self::Bearer { .. } => AuthKind::Bearer,
        }
    }

    /// Returns the token carried in the `Authorization` header.
    ///
    /// For Basic this is the base64 encoding of `identifier:secret`.
    pub fn access_token(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Basic { identifier, secret } => {
                Some(STANDARD.encode(format!("{identifier}:{secret}")))
            }
            Self::Bearer { token } => Some(token.clone()),
        }
    }

    /// Returns the headers to merge into each request.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::InvalidHeaderValue`] when a credential contains
    /// characters that are not allowed in a header.
    pub fn headers(&self) -> Result<HeaderMap, AuthError> {
        let mut headers = HeaderMap::new();

        let scheme = match self {
            Self::None => return Ok(headers),
            Self::Basic { .. } => "Basic",
            Self::Bearer { .. } => "Bearer",
        };
        let token = self.access_token().unwrap_or_default();

        let mut value = HeaderValue::try_from(format!("{scheme} {token}")).map_err(|_| {
            AuthError::InvalidHeaderValue {
                auth: self.kind().to_string(),
            }
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        Ok(headers)
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { identifier, .. } => f
                .debug_struct("Basic")
                .field("identifier", identifier)
                .field("secret", &"[redacted]")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[redacted]")
                .finish(),
        }
    }
}
