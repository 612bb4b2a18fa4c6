//! Field converters
//!
//! A chain-of-responsibility set of converters applied to each raw JSON
//! field during materialization. A converter returns `None` when it does
//! not recognize the field, letting the next one try; the first `Some`
//! wins. The chain never fails: unrecognized fields fall through to the
//! identity JSON conversion.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use tessera_core::{Link, PropertyValue};

use crate::kind::ResourceKind;

/// Converts one raw JSON field into a typed property value.
pub trait FieldConverter: Send + Sync {
    /// Attempt the conversion. `None` means "not mine" and falls through.
    fn convert(&self, name: &str, raw: &Value, kind: ResourceKind) -> Option<PropertyValue>;
}

/// Materializes `{"href": ...}`-shaped objects into link references.
///
/// Only objects whose sole key is `href` collapse to links; richer
/// objects (expanded sub-resources) are left to the identity conversion
/// so their inlined data survives.
pub struct LinkConverter;

impl FieldConverter for LinkConverter {
    fn convert(&self, _name: &str, raw: &Value, _kind: ResourceKind) -> Option<PropertyValue> {
        let object = raw.as_object()?;
        if object.len() != 1 {
            return None;
        }
        let href = object.get("href")?.as_str()?;
        Some(PropertyValue::Link(Link::new(href)))
    }
}

/// Normalizes one resource kind's status fields against its vocabulary.
///
/// Matches only fields whose name ends in `status` (case-insensitive) on
/// its own kind; raw values that are not strings, or strings outside the
/// vocabulary, fall through rather than erroring.
pub struct StatusConverter {
    kind: ResourceKind,
}

impl StatusConverter {
    /// Create a converter for one resource kind.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

impl FieldConverter for StatusConverter {
    fn convert(&self, name: &str, raw: &Value, kind: ResourceKind) -> Option<PropertyValue> {
        if kind != self.kind {
            return None;
        }
        if !name.to_lowercase().ends_with("status") {
            return None;
        }
        let raw = raw.as_str()?;
        let normalized = self.kind.normalize_status(raw)?;
        Some(PropertyValue::from(normalized))
    }
}

/// Parses RFC 3339 strings on timestamp-named fields (`createdAt`,
/// `modifiedAt`, `passwordModifiedAt`, ...).
pub struct TimestampConverter;

impl FieldConverter for TimestampConverter {
    fn convert(&self, name: &str, raw: &Value, _kind: ResourceKind) -> Option<PropertyValue> {
        if !name.ends_with("At") {
            return None;
        }
        let raw = raw.as_str()?;
        let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
        Some(PropertyValue::Timestamp(parsed.with_timezone(&Utc)))
    }
}

/// The ordered converter chain used during materialization.
#[derive(Clone)]
pub struct ConverterChain {
    converters: Vec<Arc<dyn FieldConverter>>,
}

impl ConverterChain {
    /// Build the default chain: links, per-kind statuses, timestamps.
    #[must_use]
    pub fn default_chain() -> Self {
        let mut converters: Vec<Arc<dyn FieldConverter>> = vec![Arc::new(LinkConverter)];
        for kind in ResourceKind::all() {
            if !kind.status_values().is_empty() {
                converters.push(Arc::new(StatusConverter::new(*kind)));
            }
        }
        converters.push(Arc::new(TimestampConverter));
        Self { converters }
    }

    /// Build an empty chain (identity conversion only).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Append a converter, preserving order.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn FieldConverter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Convert one field, falling through to the identity conversion.
    #[must_use]
    pub fn convert(&self, name: &str, raw: &Value, kind: ResourceKind) -> PropertyValue {
        for converter in &self.converters {
            if let Some(value) = converter.convert(name, raw, kind) {
                return value;
            }
        }
        PropertyValue::from_json(raw)
    }

    /// Materialize a full JSON object into a property map.
    #[must_use]
    pub fn materialize(
        &self,
        raw: &serde_json::Map<String, Value>,
        kind: ResourceKind,
    ) -> HashMap<String, PropertyValue> {
        raw.iter()
            .map(|(name, value)| (name.clone(), self.convert(name, value, kind)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> ConverterChain {
        ConverterChain::default_chain()
    }

    #[test]
    fn test_link_materialization() {
        let raw = json!({ "href": "https://api.example.com/directories/d1" });
        let value = chain().convert("directory", &raw, ResourceKind::Account);
        assert_eq!(
            value.as_link().unwrap().href,
            "https://api.example.com/directories/d1"
        );
    }

    #[test]
    fn test_rich_object_not_collapsed_to_link() {
        let raw = json!({ "href": "https://api.example.com/accounts?limit=25", "items": [] });
        let value = chain().convert("accounts", &raw, ResourceKind::Directory);
        assert!(value.as_link().is_none());
        assert!(value.as_map().is_some());
    }

    #[test]
    fn test_status_normalized_for_own_kind() {
        let value = chain().convert("status", &json!("enabled"), ResourceKind::Account);
        assert_eq!(value.as_str(), Some("ENABLED"));
    }

    #[test]
    fn test_status_field_suffix_match_case_insensitive() {
        let value = chain().convert(
            "emailVerificationStatus",
            &json!("unverified"),
            ResourceKind::Account,
        );
        assert_eq!(value.as_str(), Some("UNVERIFIED"));
    }

    #[test]
    fn test_email_template_status_has_its_own_converter() {
        let value = chain().convert("status", &json!("enabled"), ResourceKind::EmailTemplate);
        assert_eq!(value.as_str(), Some("ENABLED"));
        // The account-only value is outside the email vocabulary.
        let value = chain().convert("status", &json!("unverified"), ResourceKind::EmailTemplate);
        assert_eq!(value.as_str(), Some("unverified"));
    }

    #[test]
    fn test_status_type_mismatch_falls_through() {
        // Non-string status fields are not the status converter's problem.
        let value = chain().convert("status", &json!(42), ResourceKind::Account);
        assert_eq!(value.as_int(), Some(42));
    }

    #[test]
    fn test_timestamp_parsing() {
        let value = chain().convert(
            "createdAt",
            &json!("2015-01-01T12:30:00.000Z"),
            ResourceKind::Account,
        );
        let timestamp = value.as_timestamp().unwrap();
        assert_eq!(timestamp.to_rfc3339(), "2015-01-01T12:30:00+00:00");
    }

    #[test]
    fn test_unparseable_timestamp_falls_through() {
        let value = chain().convert("createdAt", &json!("not a date"), ResourceKind::Account);
        assert_eq!(value.as_str(), Some("not a date"));
    }

    #[test]
    fn test_plain_fields_identity_converted() {
        let value = chain().convert("email", &json!("tk421@empire.gov"), ResourceKind::Account);
        assert_eq!(value.as_str(), Some("tk421@empire.gov"));
    }

    #[test]
    fn test_materialize_full_object() {
        let raw = json!({
            "href": "https://api.example.com/accounts/a1",
            "email": "tk421@empire.gov",
            "status": "ENABLED",
            "directory": { "href": "https://api.example.com/directories/d1" },
            "createdAt": "2015-01-01T00:00:00.000Z",
        });
        let map = chain().materialize(raw.as_object().unwrap(), ResourceKind::Account);
        assert_eq!(map["email"].as_str(), Some("tk421@empire.gov"));
        assert!(map["directory"].as_link().is_some());
        assert!(map["createdAt"].as_timestamp().is_some());
    }
}
