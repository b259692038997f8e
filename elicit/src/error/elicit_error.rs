//! Top-level error type.

use super::{AuthError, ClientError, CompileError, ConfigError, ParseError, ProviderError};
use crate::query::RequestDescriptor;
use thiserror::Error;

/// Top-level error type for all elicit operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use elicit::ElicitError;
///
/// match builder.get().await {
///     Ok(records) => println!("{} records", records.len()),
///     Err(ElicitError::Auth(e)) => eprintln!("Check your credentials: {e}"),
///     Err(ElicitError::Provider(e)) => eprintln!("API said no: {}", e.message),
///     Err(e) => eprintln!("Query failed: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum ElicitError {
    /// Configuration or factory failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The query could not be compiled into a request.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Credentials were rejected or could not be applied.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The response body could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The provider reported an application error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The request failed in transport or with a failing HTTP status.
    #[error("Query failed for {} {}: {source}", request.method, request.path)]
    Query {
        /// The compiled request that failed.
        request: Box<RequestDescriptor>,
        /// The underlying transport failure.
        source: ClientError,
    },

    /// A resource lookup found no record.
    #[error("No query results for resource [{resource}] with key [{key}]")]
    NotFound {
        /// The resource name.
        resource: String,
        /// The key that was looked up.
        key: String,
    },
}

impl ElicitError {
    /// Wraps a transport failure with the request that caused it.
    pub fn query(request: &RequestDescriptor, source: ClientError) -> Self {
        Self::Query {
            request: Box::new(request.clone()),
            source,
        }
    }

    /// Returns `true` for rejected credentials.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::Auth(AuthError::InvalidCredentials { .. }))
    }

    /// Returns `true` for the resource layer's not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
