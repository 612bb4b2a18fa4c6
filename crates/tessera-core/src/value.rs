//! Property value model
//!
//! Types for the raw property bag backing every materialized resource.
//! A [`PropertyValue`] is the typed form a raw JSON field takes after
//! materialization: primitives stay primitives, `{"href": ...}` objects
//! become [`Link`]s, and RFC 3339 strings on timestamp fields become
//! [`PropertyValue::Timestamp`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Property names owned by the server. These can never be user-set on
/// custom-data-shaped structures.
pub const RESERVED_PROPERTY_NAMES: &[&str] = &[
    "href",
    "createdAt",
    "modifiedAt",
    "meta",
    "spMeta",
    "sp_http_status",
    "ionmeta",
    "ionMeta",
];

/// Whether a property name is reserved for the server. Names are
/// case-sensitive, matching the wire format.
#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_PROPERTY_NAMES.contains(&name)
}

/// A reference to another resource, materialized from an `{"href": ...}`
/// shaped JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute href of the linked resource.
    pub href: String,
}

impl Link {
    /// Create a link to the given href.
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// A typed property value.
///
/// The variant set mirrors what the wire format can carry: JSON primitives,
/// nested objects/arrays, plus the two materialized forms ([`Link`] and
/// [`PropertyValue::Timestamp`]) produced by the field-converter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// JSON null.
    Null,
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A string value.
    String(String),
    /// A parsed RFC 3339 timestamp.
    Timestamp(DateTime<Utc>),
    /// A reference to another resource.
    Link(Link),
    /// An array of values.
    Array(Vec<PropertyValue>),
    /// A nested object.
    Map(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Check if this is a null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get as a string if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a float if this is a floating-point value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as a link if this is a link value.
    #[must_use]
    pub fn as_link(&self) -> Option<&Link> {
        match self {
            PropertyValue::Link(l) => Some(l),
            _ => None,
        }
    }

    /// Get as a timestamp if this is a timestamp value.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Get as a nested map if this is an object value.
    #[must_use]
    pub fn as_map(&self) -> Option<&HashMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this value belongs to the primitive family accepted by
    /// custom data: booleans, integers, floats, and strings. Nulls,
    /// timestamps, links, arrays, and nested objects do not qualify.
    #[must_use]
    pub fn is_custom_data_primitive(&self) -> bool {
        matches!(
            self,
            PropertyValue::Bool(_)
                | PropertyValue::Int(_)
                | PropertyValue::Float(_)
                | PropertyValue::String(_)
        )
    }

    /// Validate a key/value pair for custom-data storage.
    ///
    /// Rejects reserved key names and non-primitive values with
    /// [`Error::ValueOutOfRange`].
    pub fn validate_custom_data_entry(name: &str, value: &PropertyValue) -> Result<()> {
        if is_reserved_name(name) {
            return Err(Error::out_of_range(
                name,
                "property name is reserved and cannot be set on custom data",
            ));
        }
        if !value.is_custom_data_primitive() {
            return Err(Error::out_of_range(
                name,
                "custom data values must be primitive (bool, integer, float, or string)",
            ));
        }
        Ok(())
    }

    /// Convert a raw JSON value into a property value.
    ///
    /// This is the identity conversion: link and timestamp materialization
    /// is the field-converter chain's job, not this function's.
    #[must_use]
    pub fn from_json(value: &Value) -> PropertyValue {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Int(i)
                } else {
                    PropertyValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => PropertyValue::String(s.clone()),
            Value::Array(items) => {
                PropertyValue::Array(items.iter().map(PropertyValue::from_json).collect())
            }
            Value::Object(map) => PropertyValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert this property value back to raw JSON for the wire.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::from(*i),
            PropertyValue::Float(f) => Value::from(*f),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::Timestamp(t) => {
                Value::String(t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            }
            PropertyValue::Link(l) => serde_json::json!({ "href": l.href }),
            PropertyValue::Array(items) => {
                Value::Array(items.iter().map(PropertyValue::to_json).collect())
            }
            PropertyValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i8> for PropertyValue {
    fn from(i: i8) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<i16> for PropertyValue {
    fn from(i: i16) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<u8> for PropertyValue {
    fn from(i: u8) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<u16> for PropertyValue {
    fn from(i: u16) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<u32> for PropertyValue {
    fn from(i: u32) -> Self {
        PropertyValue::Int(i64::from(i))
    }
}

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        PropertyValue::Float(f64::from(f))
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<char> for PropertyValue {
    fn from(c: char) -> Self {
        PropertyValue::String(c.to_string())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(t: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(t)
    }
}

impl From<Link> for PropertyValue {
    fn from(l: Link) -> Self {
        PropertyValue::Link(l)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(vec: Vec<T>) -> Self {
        PropertyValue::Array(vec.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(PropertyValue::from(42i32).as_int(), Some(42));
        assert_eq!(PropertyValue::from(7u8).as_int(), Some(7));
        assert_eq!(PropertyValue::from(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::from('x').as_str(), Some("x"));
        assert_eq!(PropertyValue::from(2.5f32).as_float(), Some(2.5));
    }

    #[test]
    fn test_custom_data_primitive_gate_accepts() {
        for value in [
            PropertyValue::from(1i8),
            PropertyValue::from(1i16),
            PropertyValue::from(1i32),
            PropertyValue::from(1i64),
            PropertyValue::from(1u8),
            PropertyValue::from(1.0f32),
            PropertyValue::from(1.0f64),
            PropertyValue::from(true),
            PropertyValue::from("text"),
            PropertyValue::from('c'),
        ] {
            assert!(
                PropertyValue::validate_custom_data_entry("favoriteColor", &value).is_ok(),
                "rejected {value:?}"
            );
        }
    }

    #[test]
    fn test_custom_data_primitive_gate_rejects() {
        let timestamp = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        for value in [
            PropertyValue::Null,
            PropertyValue::Timestamp(timestamp),
            PropertyValue::Link(Link::new("https://api.example.com/accounts/a1")),
            PropertyValue::Array(vec![PropertyValue::Int(1)]),
            PropertyValue::Map(HashMap::new()),
        ] {
            let result = PropertyValue::validate_custom_data_entry("thing", &value);
            assert!(
                matches!(result, Err(Error::ValueOutOfRange { .. })),
                "accepted {value:?}"
            );
        }
    }

    #[test]
    fn test_reserved_names_rejected() {
        for name in [
            "href",
            "createdAt",
            "modifiedAt",
            "meta",
            "spMeta",
            "sp_http_status",
        ] {
            let result =
                PropertyValue::validate_custom_data_entry(name, &PropertyValue::from("v"));
            assert!(matches!(result, Err(Error::ValueOutOfRange { .. })));
        }
        // Case-sensitive: "HREF" is not reserved.
        assert!(
            PropertyValue::validate_custom_data_entry("HREF", &PropertyValue::from("v")).is_ok()
        );
    }

    #[test]
    fn test_json_round_trip() {
        let raw = serde_json::json!({
            "givenName": "Luke",
            "age": 23,
            "active": true,
            "score": 9.5,
            "tags": ["jedi", "pilot"],
        });
        let value = PropertyValue::from_json(&raw);
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn test_link_to_json() {
        let link = PropertyValue::Link(Link::new("https://api.example.com/tenants/t1"));
        assert_eq!(
            link.to_json(),
            serde_json::json!({ "href": "https://api.example.com/tenants/t1" })
        );
    }

    #[test]
    fn test_timestamp_to_json_is_rfc3339() {
        let timestamp = Utc.with_ymd_and_hms(2015, 1, 1, 12, 30, 0).unwrap();
        let json = PropertyValue::Timestamp(timestamp).to_json();
        assert_eq!(json, Value::String("2015-01-01T12:30:00.000Z".to_string()));
    }
}
