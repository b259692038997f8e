//! Query compilation errors.

use thiserror::Error;

/// Errors raised while turning builder state into a request.
///
/// Compilation is pure, so every one of these surfaces before any network
/// traffic happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The query has no target and no default could be derived.
    #[error("No target set for the query")]
    MissingTarget,

    /// A required `{name}` placeholder had no matching filter.
    #[error("Named parameter [{name}] missing from request path [{path}]")]
    MissingNamedParameter {
        /// The placeholder name.
        name: String,
        /// The path template being resolved.
        path: String,
    },

    /// The path template is malformed.
    #[error("Invalid path template [{path}]: {message}")]
    InvalidPathTemplate {
        /// The offending template.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// A dynamic call does not match the `where<Field>` pattern.
    #[error("Call to undefined method {builder}::{method}()")]
    UnsupportedMethod {
        /// The builder type name.
        builder: &'static str,
        /// The requested method name.
        method: String,
    },

    /// A dynamic filter received a different number of values than fields.
    #[error("Dynamic method {method}() expects {expected} value(s), {given} given")]
    DynamicArity {
        /// The requested method name.
        method: String,
        /// Number of field segments parsed from the name.
        expected: usize,
        /// Number of values supplied.
        given: usize,
    },
}

impl CompileError {
    pub(crate) fn invalid_path(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidPathTemplate {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
