//! Parser for dynamic `where<Field>` filter names.
//!
//! `whereEmailAndLastName` names two filters, `email` and `last_name`. The
//! name is split on an `And` that is directly followed by an uppercase
//! letter, so `whereBrandName` and `whereAndroidId` each stay a single field.

use crate::error::CompileError;

const PREFIX: &str = "where";
const CONNECTOR: &str = "And";

/// Parses a dynamic filter name into its snake_case field keys.
///
/// ## Errors
///
/// Returns [`CompileError::UnsupportedMethod`] naming `builder` when `method`
/// does not start with `where` followed by an uppercase field name, or
/// names no fields.
///
/// ## Examples
///
/// ```rust
/// use elicit::query::dynamic::parse_dynamic_filter;
///
/// let fields = parse_dynamic_filter("Builder", "whereEmailAndLastName").unwrap();
/// assert_eq!(fields, vec!["email", "last_name"]);
/// ```
pub fn parse_dynamic_filter(builder: &'static str, method: &str) -> Result<Vec<String>, CompileError> {
    let unsupported = || CompileError::UnsupportedMethod {
        builder,
        method: method.to_string(),
    };

    let finder = method.strip_prefix(PREFIX).ok_or_else(unsupported)?;
    if !finder.chars().next().is_some_and(char::is_uppercase) {
        return Err(unsupported());
    }

    split_segments(finder)
        .into_iter()
        .map(|segment| {
            if segment.is_empty() {
                Err(unsupported())
            } else {
                Ok(to_snake_case(segment))
            }
        })
        .collect()
}

/// Splits on every `And` that is followed by an uppercase letter.
fn split_segments(finder: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut segment_start = 0;
    let mut search_from = 0;

    while let Some(found) = finder[search_from..].find(CONNECTOR) {
        let at = search_from + found;
        let after = at + CONNECTOR.len();
        let boundary = finder[after..]
            .chars()
            .next()
            .is_some_and(char::is_uppercase);

        if boundary {
            segments.push(&finder[segment_start..at]);
            segment_start = after;
        }
        search_from = after;
    }

    segments.push(&finder[segment_start..]);
    segments
}

/// Converts a PascalCase segment into a snake_case filter key.
pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lowercase = false;

    for ch in s.chars() {
        if ch.is_uppercase() {
            if prev_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_lowercase = false;
        } else {
            result.push(ch);
            prev_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field() {
        assert_eq!(parse_dynamic_filter("Builder", "whereName").unwrap(), vec!["name"]);
    }

    #[test]
    fn test_split_on_and_boundary() {
        assert_eq!(
            parse_dynamic_filter("Builder", "whereShopIdAndStatusAndTag").unwrap(),
            vec!["shop_id", "status", "tag"]
        );
    }

    #[test]
    fn test_and_inside_a_word_is_not_a_boundary() {
        assert_eq!(
            parse_dynamic_filter("Builder", "whereBrandName").unwrap(),
            vec!["brand_name"]
        );
        assert_eq!(
            parse_dynamic_filter("Builder", "whereAndroidId").unwrap(),
            vec!["android_id"]
        );
        assert_eq!(
            parse_dynamic_filter("Builder", "whereLandAndSea").unwrap(),
            vec!["land", "sea"]
        );
    }

    #[test]
    fn test_non_where_method_is_unsupported() {
        let err = parse_dynamic_filter("Builder", "orderByName").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedMethod {
                builder: "Builder",
                method: "orderByName".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_segments_are_unsupported() {
        assert!(parse_dynamic_filter("Builder", "where").is_err());
        assert!(parse_dynamic_filter("Builder", "whereAndName").is_err());
    }

    #[test]
    fn test_lowercase_after_where_is_unsupported() {
        let err = parse_dynamic_filter("Builder", "wherever").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedMethod {
                builder: "Builder",
                method: "wherever".to_string(),
            }
        );
        assert!(parse_dynamic_filter("Builder", "where_name").is_err());
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("FirstName"), "first_name");
        assert_eq!(to_snake_case("Id"), "id");
        assert_eq!(to_snake_case("Page2Size"), "page2_size");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }
}
