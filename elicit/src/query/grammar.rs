//! Compilation of query state into request descriptors.

use percent_encoding::utf8_percent_encode;
use serde_json::{Map, Value};

use super::state::{value_text, BodyField, Filter, QueryState, Target};
use super::template::{self, UNRESERVED};
use crate::error::CompileError;
use crate::method::RestMethod;

/// A fully compiled request, ready for a connector.
///
/// Every placeholder in `path` has been resolved. `query` holds the encoded
/// query-string without a leading `?` and is empty when there are no
/// parameters; `body` is empty when no body fields were set.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: RestMethod,
    /// Resolved request path.
    pub path: String,
    /// Encoded query-string.
    pub query: String,
    /// Body fields in insertion order.
    pub body: Map<String, Value>,
}

impl RequestDescriptor {
    /// Decodes the query-string back into key/value pairs, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Returns the path with the query-string appended when there is one.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// Compiles [`QueryState`] into a [`RequestDescriptor`].
///
/// The grammar is stateless: consumption of filters by path parameters is
/// tracked per compilation, so one grammar can serve any number of queries.
///
/// ## Examples
///
/// ```rust
/// use elicit::{Grammar, QueryState, Target};
///
/// let mut state = QueryState::new();
/// state.target = Some(Target::get("/widgets/{id}"));
/// state.push_filter("id", 42);
/// state.push_filter("expand", "parts");
///
/// let request = Grammar.compile_request(&state).unwrap();
/// assert_eq!(request.path, "/widgets/42");
/// assert_eq!(request.query, "expand=parts");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grammar;

impl Grammar {
    /// Compiles the query state.
    ///
    /// ## Errors
    ///
    /// - [`CompileError::MissingTarget`] when no target was set
    /// - [`CompileError::MissingNamedParameter`] when a required path
    ///   placeholder has no matching filter
    /// - [`CompileError::InvalidPathTemplate`] for malformed path templates
    pub fn compile_request(&self, query: &QueryState) -> Result<RequestDescriptor, CompileError> {
        let target = query.target.as_ref().ok_or(CompileError::MissingTarget)?;
        let mut consumed = vec![false; query.filters.len()];

        let path = self.compile_path(target, &query.filters, &mut consumed)?;
        let query_string = self.compile_filters(&query.filters, &consumed);
        let body = self.compile_body(&query.body);

        Ok(RequestDescriptor {
            method: target.method,
            path,
            query: query_string,
            body,
        })
    }

    fn compile_path(
        &self,
        target: &Target,
        filters: &[Filter],
        consumed: &mut [bool],
    ) -> Result<String, CompileError> {
        if !template::has_named_parameters(&target.path) {
            // Stray braces still need validating.
            template::placeholders(&target.path)?;
            return Ok(target.path.clone());
        }
        template::resolve(&target.path, filters, consumed)
    }

    /// Builds the query-string from the filters not used by the path.
    ///
    /// Array values repeat their key once per element, which some APIs use
    /// for multi-valued parameters.
    fn compile_filters(&self, filters: &[Filter], consumed: &[bool]) -> String {
        let mut pairs = Vec::new();

        for (filter, _) in filters.iter().zip(consumed).filter(|(_, used)| !**used) {
            match &filter.value {
                Value::Array(values) => {
                    for value in values {
                        pairs.push(self.build_pair(&filter.key, value));
                    }
                }
                value => pairs.push(self.build_pair(&filter.key, value)),
            }
        }

        pairs.join("&")
    }

    /// Collects body fields; a repeated key keeps its first position and its
    /// last value.
    fn compile_body(&self, body: &[BodyField]) -> Map<String, Value> {
        let mut compiled = Map::new();
        for field in body {
            compiled.insert(field.key.clone(), field.value.clone());
        }
        compiled
    }

    fn build_pair(&self, key: &str, value: &Value) -> String {
        format!(
            "{}={}",
            utf8_percent_encode(key, UNRESERVED),
            utf8_percent_encode(&value_text(value), UNRESERVED)
        )
    }
}
