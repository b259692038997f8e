//! ORM-style query builder for REST APIs.
//!
//! The `elicit` crate lets an application treat a remote REST API the way an
//! ORM treats a database: queries are accumulated on a fluent [`Builder`],
//! compiled by a [`Grammar`] into a [`RequestDescriptor`], executed by a
//! [`Connection`] through its [`Connector`], and normalized by a
//! [`Processor`] into records.
//!
//! ## Features
//!
//! - **Fluent query building**: filters, nested filter groups, dynamic
//!   `whereFooAndBar` style filters and write bodies
//! - **Named path parameters**: `/widgets/{id}` is filled from the filters,
//!   consumed filters never reach the query-string
//! - **Content-type aware parsing**: JSON, URL-encoded, XML and raw text
//! - **Status mapping**: 401 becomes a credentials error, 404 an empty result
//! - **Response dialects**: plain records or `data` enveloped payloads
//! - **Lazy, memoized connections** resolved by name from configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use elicit::{ConnectionRegistry, ElicitConfig, RestMethod, Target};
//!
//! let config = ElicitConfig::from_yaml_str(r#"
//! default: shop
//! connections:
//!   shop:
//!     driver: fractal
//!     host: https://api.example.com
//!     auth: bearer
//!     token: sk-xxx
//! "#)?;
//!
//! let registry = Arc::new(ConnectionRegistry::new(config));
//! let connection = registry.default_connection()?;
//!
//! let widget = connection
//!     .query()
//!     .from(Target::new(RestMethod::Get, "/widgets/{id}"))
//!     .find(42)
//!     .await?;
//! ```

pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod method;
pub mod query;
pub mod registry;
pub mod resource;

// Re-exports for convenience
pub use config::{ConnectionConfig, Driver, ElicitConfig};
pub use connection::{Connection, QueryEvent, QueryListener};
pub use connector::{Auth, AuthKind, BodyFormat, Connector, ConnectorBuilder, HttpResponse};
pub use error::{
    AuthError, ClientError, CompileError, ConfigError, ElicitError, ParseError, ProviderError,
};
pub use method::RestMethod;
pub use query::{
    Builder, Filter, Grammar, Processor, QueryState, RequestDescriptor, ResponseDialect, Target,
};
pub use registry::ConnectionRegistry;
pub use resource::{Action, ActionPath, PathMap, Resource};
