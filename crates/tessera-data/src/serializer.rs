//! Serializer capability
//!
//! JSON body encoding/decoding is injectable; [`JsonSerializer`] is the
//! serde_json default used by the terminal filter.

use serde::de::Error as _;
use serde_json::{Map, Value};

use tessera_core::{Error, Result};

/// Bidirectional JSON string <-> property-map conversion.
pub trait Serializer: Send + Sync {
    /// Render a property map as a JSON object string.
    fn to_string(&self, properties: &Map<String, Value>) -> Result<String>;

    /// Parse a JSON object string into a property map.
    fn parse(&self, body: &str) -> Result<Map<String, Value>>;
}

/// Default serializer over serde_json.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn to_string(&self, properties: &Map<String, Value>) -> Result<String> {
        Ok(serde_json::to_string(properties)?)
    }

    fn parse(&self, body: &str) -> Result<Map<String, Value>> {
        let value: Value = serde_json::from_str(body)?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(Error::Serialization(serde_json::Error::custom(format!(
                "expected a JSON object in the response body, got {}",
                json_type_name(&other)
            )))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let serializer = JsonSerializer;
        let mut map = Map::new();
        map.insert("email".to_string(), json!("tk421@empire.gov"));
        let body = serializer.to_string(&map).unwrap();
        let parsed = serializer.parse(&body).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_non_object_body_rejected() {
        let serializer = JsonSerializer;
        assert!(serializer.parse("[1,2,3]").is_err());
        assert!(serializer.parse("not json").is_err());
    }
}
