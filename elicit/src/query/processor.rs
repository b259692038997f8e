//! Normalization of parsed response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Key under which enveloped APIs place their payload.
pub const DEFAULT_ENVELOPE_KEY: &str = "data";

/// Polarity of [`Processor::process_delete`]: an empty body (the 204 No
/// Content convention) means the delete succeeded.
pub const EMPTY_DELETE_BODY_IS_SUCCESS: bool = true;

/// The response shape a connection's API speaks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResponseDialect {
    /// Records are returned bare: one object, or a list of objects.
    #[default]
    Generic,
    /// Collections are wrapped as `{"data": [...], "meta": {...}}`.
    Enveloped,
}

/// Reshapes parsed bodies into records, per [`ResponseDialect`].
///
/// ## Examples
///
/// ```rust
/// use elicit::Processor;
/// use serde_json::json;
///
/// let processor = Processor::enveloped();
///
/// let records = processor.process_show(json!({"data": [{"id": 1}], "meta": {"total": 1}}));
/// assert_eq!(records, vec![json!({"id": 1})]);
///
/// let records = processor.process_show(json!({"id": 1}));
/// assert_eq!(records, vec![json!({"id": 1})]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processor {
    dialect: ResponseDialect,
    envelope_key: String,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(ResponseDialect::default())
    }
}

impl Processor {
    /// Creates a processor for the given dialect.
    pub fn new(dialect: ResponseDialect) -> Self {
        Self {
            dialect,
            envelope_key: DEFAULT_ENVELOPE_KEY.to_string(),
        }
    }

    /// Creates a processor for bare records.
    pub fn generic() -> Self {
        Self::new(ResponseDialect::Generic)
    }

    /// Creates a processor for `data` enveloped payloads.
    pub fn enveloped() -> Self {
        Self::new(ResponseDialect::Enveloped)
    }

    /// Overrides the envelope key (only used by the enveloped dialect).
    pub fn with_envelope_key(mut self, key: impl Into<String>) -> Self {
        self.envelope_key = key.into();
        self
    }

    /// Returns the dialect this processor handles.
    pub fn dialect(&self) -> ResponseDialect {
        self.dialect
    }

    /// Returns the envelope key.
    pub fn envelope_key(&self) -> &str {
        &self.envelope_key
    }

    /// Normalizes the body of a "show" request into a list of records.
    ///
    /// A single object becomes a one-element list, a list is returned as
    /// is, and an empty body yields an empty list.
    pub fn process_show(&self, body: Value) -> Vec<Value> {
        into_records(self.unwrap_envelope(body))
    }

    /// Normalizes the body of an "index" request into a list of records.
    pub fn process_index(&self, body: Value) -> Vec<Value> {
        self.process_show(body)
    }

    /// Normalizes the body of a "create" request.
    pub fn process_create(&self, body: Value) -> Value {
        self.unwrap_envelope(body)
    }

    /// Normalizes the body of an "update" request.
    pub fn process_update(&self, body: Value) -> Value {
        self.unwrap_envelope(body)
    }

    /// Interprets the body of a "delete" request.
    ///
    /// See [`EMPTY_DELETE_BODY_IS_SUCCESS`]. A non-empty body is reported as
    /// `false`, not as an error.
    pub fn process_delete(&self, body: &Value) -> bool {
        is_empty_body(body) == EMPTY_DELETE_BODY_IS_SUCCESS
    }

    fn unwrap_envelope(&self, body: Value) -> Value {
        match (self.dialect, body) {
            (ResponseDialect::Enveloped, Value::Object(mut map))
                if map.len() > 1 && map.contains_key(&self.envelope_key) =>
            {
                map.remove(&self.envelope_key).unwrap_or(Value::Null)
            }
            (_, body) => body,
        }
    }
}

/// Returns `true` for bodies that carry no content.
///
/// `null`, the empty string and empty arrays or objects count as empty.
pub fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn into_records(body: Value) -> Vec<Value> {
    if is_empty_body(&body) {
        return Vec::new();
    }
    match body {
        Value::Array(items) => items,
        record => vec![record],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generic_wraps_single_record() {
        let records = Processor::generic().process_show(json!({"id": 1}));
        assert_eq!(records, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_generic_passes_lists_through() {
        let body = json!([{"id": 1}, {"id": 2}]);
        let records = Processor::generic().process_index(body);
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn test_generic_does_not_unwrap_envelopes() {
        let body = json!({"data": [{"id": 1}], "meta": {}});
        let records = Processor::generic().process_show(body.clone());
        assert_eq!(records, vec![body]);
    }

    #[test]
    fn test_empty_bodies_yield_no_records() {
        let processor = Processor::generic();
        assert!(processor.process_show(Value::Null).is_empty());
        assert!(processor.process_show(json!([])).is_empty());
        assert!(processor.process_show(json!({})).is_empty());
        assert!(processor.process_show(json!("")).is_empty());
    }

    #[test]
    fn test_enveloped_unwraps_data_next_to_metadata() {
        let body = json!({"data": [{"id": 1}], "meta": {"pagination": {"total": 1}}});
        let records = Processor::enveloped().process_show(body);
        assert_eq!(records, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_enveloped_wraps_single_record() {
        let records = Processor::enveloped().process_show(json!({"id": 1}));
        assert_eq!(records, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_enveloped_passes_lists_through() {
        let body = json!([{"id": 1}, {"id": 2}]);
        let records = Processor::enveloped().process_show(body);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_enveloped_leaves_lone_data_key_alone() {
        let body = json!({"data": {"id": 1}});
        let records = Processor::enveloped().process_show(body.clone());
        assert_eq!(records, vec![body]);
    }

    #[test]
    fn test_enveloped_unwrap_is_idempotent() {
        let processor = Processor::enveloped();
        let once = processor.process_create(json!({"data": {"id": 1}, "meta": {}}));
        let twice = processor.process_create(once.clone());
        assert_eq!(once, json!({"id": 1}));
        assert_eq!(twice, once);
    }

    #[test]
    fn test_custom_envelope_key() {
        let processor = Processor::enveloped().with_envelope_key("items");
        let records = processor.process_index(json!({"items": [{"id": 3}], "count": 1}));
        assert_eq!(records, vec![json!({"id": 3})]);
    }

    #[test]
    fn test_create_and_update_are_not_list_wrapped() {
        let processor = Processor::generic();
        assert_eq!(processor.process_create(json!({"id": 9})), json!({"id": 9}));
        assert_eq!(
            processor.process_update(json!({"id": 9, "name": "Nut"})),
            json!({"id": 9, "name": "Nut"})
        );
    }

    #[test]
    fn test_delete_succeeds_on_empty_body() {
        assert!(EMPTY_DELETE_BODY_IS_SUCCESS);
        for processor in [Processor::generic(), Processor::enveloped()] {
            assert!(processor.process_delete(&Value::Null));
            assert!(processor.process_delete(&json!("")));
            assert!(processor.process_delete(&json!({})));
        }
    }

    #[test]
    fn test_delete_fails_on_non_empty_body() {
        for processor in [Processor::generic(), Processor::enveloped()] {
            assert!(!processor.process_delete(&json!({"deleted": false})));
            assert!(!processor.process_delete(&json!("refused")));
        }
    }

    #[test]
    fn test_dialect_parsing() {
        assert_eq!(
            "Enveloped".parse::<ResponseDialect>().unwrap(),
            ResponseDialect::Enveloped
        );
        assert_eq!(ResponseDialect::Generic.to_string(), "generic");
        assert!("soap".parse::<ResponseDialect>().is_err());
    }
}
