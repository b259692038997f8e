//! Named path parameter resolution.
//!
//! Path templates name their parameters in braces: `/users/{user_id}/posts/{id}`.
//! A trailing `?` marks a parameter optional: `/widgets/{id?}`. Parameters are
//! filled from the query's filters; every filter used this way is marked
//! consumed so the grammar leaves it out of the query-string.
//!
//! A required parameter without a matching filter is an error. An optional
//! parameter without a match is dropped, and when it was a whole path segment
//! the segment's leading `/` goes with it, so `/widgets/{id?}` resolves to
//! `/widgets`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::state::{value_text, Filter};
use crate::error::CompileError;

/// Everything except RFC 3986 unreserved characters gets encoded.
pub(crate) const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A placeholder found in a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The parameter name, without braces or `?`.
    pub name: &'a str,
    /// Whether the placeholder was written as `{name?}`.
    pub optional: bool,
    /// Byte offset of the opening brace.
    start: usize,
    /// Byte offset one past the closing brace.
    end: usize,
}

/// Extracts the placeholders of a path template in order of appearance.
///
/// ## Errors
///
/// Returns [`CompileError::InvalidPathTemplate`] for unclosed, nested or
/// empty braces.
pub fn placeholders(path: &str) -> Result<Vec<Placeholder<'_>>, CompileError> {
    let mut found = Vec::new();
    let mut offset = 0;

    while let Some(open) = path[offset..].find('{') {
        let start = offset + open;
        let Some(close) = path[start + 1..].find('}') else {
            return Err(CompileError::invalid_path(path, "unclosed '{'"));
        };
        let end = start + 1 + close + 1;
        let inner = &path[start + 1..end - 1];

        if inner.contains('{') {
            return Err(CompileError::invalid_path(path, "nested '{'"));
        }

        let (name, optional) = match inner.strip_suffix('?') {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if name.is_empty() {
            return Err(CompileError::invalid_path(path, "empty parameter name"));
        }

        found.push(Placeholder {
            name,
            optional,
            start,
            end,
        });
        offset = end;
    }

    Ok(found)
}

/// Returns `true` if the path contains at least one `{...}` placeholder.
pub fn has_named_parameters(path: &str) -> bool {
    path.find('{')
        .is_some_and(|open| path[open..].contains('}'))
}

/// Resolves every placeholder in `path` from `filters`.
///
/// Each placeholder takes the first filter with an equal key whose entry in
/// `consumed` is still `false`, and flips that entry to `true`. Values are
/// percent-encoded as a single path segment.
///
/// ## Errors
///
/// - [`CompileError::MissingNamedParameter`] when a required placeholder has
///   no unconsumed filter.
/// - [`CompileError::InvalidPathTemplate`] for malformed templates.
///
/// ## Examples
///
/// ```rust
/// use elicit::query::template::resolve;
/// use elicit::Filter;
///
/// let filters = vec![Filter { key: "id".into(), value: 42.into() }];
/// let mut consumed = vec![false];
///
/// let path = resolve("/widgets/{id}", &filters, &mut consumed).unwrap();
/// assert_eq!(path, "/widgets/42");
/// assert_eq!(consumed, vec![true]);
/// ```
pub fn resolve(path: &str, filters: &[Filter], consumed: &mut [bool]) -> Result<String, CompileError> {
    debug_assert_eq!(filters.len(), consumed.len());

    let found = placeholders(path)?;
    if found.is_empty() {
        return Ok(path.to_string());
    }

    let mut resolved = String::with_capacity(path.len());
    let mut cursor = 0;

    for placeholder in found {
        resolved.push_str(&path[cursor..placeholder.start]);
        cursor = placeholder.end;

        let matched = filters
            .iter()
            .enumerate()
            .find(|(index, filter)| !consumed[*index] && filter.key == placeholder.name);

        match matched {
            Some((index, filter)) => {
                consumed[index] = true;
                let text = value_text(&filter.value);
                resolved.extend(utf8_percent_encode(&text, UNRESERVED));
            }
            None if placeholder.optional => {
                let whole_segment = resolved.ends_with('/')
                    && path[placeholder.end..]
                        .chars()
                        .next()
                        .map_or(true, |next| next == '/');
                if whole_segment {
                    resolved.pop();
                }
            }
            None => {
                return Err(CompileError::MissingNamedParameter {
                    name: placeholder.name.to_string(),
                    path: path.to_string(),
                });
            }
        }
    }

    resolved.push_str(&path[cursor..]);
    Ok(resolved)
}
