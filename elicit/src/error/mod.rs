//! Layered error types for the elicit crate.
//!
//! The error hierarchy mirrors the stages of a query run:
//! - [`ElicitError`] - Top-level error type returned by every fallible operation
//! - [`ConfigError`] - Connection configuration and factory errors
//! - [`CompileError`] - Errors raised while compiling a query, before any I/O
//! - [`ClientError`] - Transport and HTTP status errors
//! - [`AuthError`] - Credential and authorization errors
//! - [`ParseError`] - Response body parsing errors
//! - [`ProviderError`] - Application errors reported inside a response body

mod auth_error;
mod client_error;
mod compile_error;
mod config_error;
mod elicit_error;
mod parse_error;
mod provider_error;

pub use auth_error::AuthError;
pub use client_error::ClientError;
pub use compile_error::CompileError;
pub use config_error::ConfigError;
pub use elicit_error::ElicitError;
pub use parse_error::ParseError;
pub use provider_error::ProviderError;
