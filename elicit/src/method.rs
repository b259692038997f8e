//! HTTP verbs a query can target.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// HTTP methods for resource targets.
///
/// Parsing is case-insensitive so configuration files can spell verbs the
/// way they appear in API documentation.
///
/// ## Examples
///
/// ```rust
/// use elicit::RestMethod;
///
/// let parsed: RestMethod = "delete".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Delete);
/// assert_eq!(parsed.to_string(), "DELETE");
/// assert!(parsed.has_body());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestMethod {
    /// Read one or many records.
    Get,
    /// Create a record.
    Post,
    /// Replace a record.
    Put,
    /// Partially update a record.
    Patch,
    /// Remove a record.
    Delete,
    /// Headers only.
    Head,
    /// Query supported methods.
    Options,
}

impl RestMethod {
    /// Returns `true` when a request with this verb carries the accumulated
    /// body fields.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display_is_uppercase() {
        assert_eq!(RestMethod::Get.to_string(), "GET");
        assert_eq!(RestMethod::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!("GET".parse::<RestMethod>().unwrap(), RestMethod::Get);
        assert_eq!("put".parse::<RestMethod>().unwrap(), RestMethod::Put);
        assert_eq!("Patch".parse::<RestMethod>().unwrap(), RestMethod::Patch);
        assert!("FETCH".parse::<RestMethod>().is_err());
    }

    #[test]
    fn test_has_body() {
        assert!(!RestMethod::Get.has_body());
        assert!(RestMethod::Post.has_body());
        assert!(RestMethod::Put.has_body());
        assert!(RestMethod::Delete.has_body());
        assert!(!RestMethod::Options.has_body());
    }

    #[test]
    fn test_body_carrying_methods() {
        let with_body: Vec<_> = RestMethod::iter().filter(RestMethod::has_body).collect();
        assert_eq!(
            with_body,
            vec![
                RestMethod::Post,
                RestMethod::Put,
                RestMethod::Patch,
                RestMethod::Delete
            ]
        );
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&RestMethod::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
        let back: RestMethod = serde_json::from_str("\"POST\"").unwrap();
        assert_eq!(back, RestMethod::Post);
    }

    #[test]
    fn test_to_reqwest() {
        assert_eq!(RestMethod::Get.to_reqwest(), reqwest::Method::GET);
        assert_eq!(RestMethod::Delete.to_reqwest(), reqwest::Method::DELETE);
    }
}
