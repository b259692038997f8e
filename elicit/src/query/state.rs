//! Accumulated query state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::method::RestMethod;

/// The HTTP method and path template a query executes against.
///
/// ## Examples
///
/// ```rust
/// use elicit::{RestMethod, Target};
///
/// let target = Target::new(RestMethod::Get, "/widgets/{id}");
/// assert_eq!(target.method, RestMethod::Get);
/// assert_eq!(target.path, "/widgets/{id}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// HTTP method for the request.
    pub method: RestMethod,
    /// Path template, may contain `{name}` and `{name?}` placeholders.
    pub path: String,
}

impl Target {
    /// Creates a target from a method and a path template.
    pub fn new(method: RestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Shorthand for a `GET` target.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(RestMethod::Get, path)
    }
}

/// An accumulated key/value constraint.
///
/// A filter either fills a path placeholder of the same name or becomes a
/// query-string parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// The filter key.
    pub key: String,
    /// The filter value; arrays expand to repeated query parameters.
    pub value: Value,
}

/// An accumulated key/value pair for a write request's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyField {
    /// The field name.
    pub key: String,
    /// The field value.
    pub value: Value,
}

/// Everything a builder has accumulated for one logical request.
///
/// Filters and body fields are kept in insertion order and may repeat keys.
/// The state is a plain value: nested builders work on their own copy and
/// are folded back in through [`merge_filters`](Self::merge_filters) and
/// [`merge_body`](Self::merge_body).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// The request target, once set.
    pub target: Option<Target>,
    /// Filters in insertion order.
    pub filters: Vec<Filter>,
    /// Body fields in insertion order.
    pub body: Vec<BodyField>,
}

impl QueryState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn push_filter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.filters.push(Filter {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Appends a body field.
    pub fn push_body(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.body.push(BodyField {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Appends another state's filters after this state's filters.
    pub fn merge_filters(&mut self, other: QueryState) {
        self.filters.extend(other.filters);
    }

    /// Appends another state's body fields after this state's body fields.
    pub fn merge_body(&mut self, other: QueryState) {
        self.body.extend(other.body);
    }
}

/// Renders a scalar value the way it appears on the wire.
///
/// Strings are used verbatim, `null` becomes the empty string and nested
/// structures fall back to their JSON text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
