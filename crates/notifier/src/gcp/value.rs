//! Decoding of Firestore's typed JSON values.
//!
//! The REST API and trigger payloads wrap every value in a single-key object
//! naming its type:
//!
//! ```text
//! {"stringValue": "a"}            -> "a"
//! {"integerValue": "42"}          -> 42
//! {"mapValue": {"fields": {..}}}  -> {..}
//! {"arrayValue": {"values": [..]}} -> [..]
//! ```
//!
//! Timestamps, references and bytes decode to their string form. Geo points
//! decode to `{"latitude", "longitude"}`. Anything unrecognised decodes to
//! `null`, which every reader in this crate treats as absent.

use serde_json::{Map, Number, Value};

/// Decode a Firestore `fields` map.
#[must_use]
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Decode one typed value.
#[must_use]
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map_or_else(|| Value::Object(Map::new()), |f| Value::Object(decode_fields(f))),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "geoPointValue" => {
            let mut point = Map::new();
            for axis in ["latitude", "longitude"] {
                point.insert(
                    axis.to_string(),
                    inner.get(axis).cloned().unwrap_or(Value::from(0.0)),
                );
            }
            Value::Object(point)
        }
        _ => Value::Null,
    }
}

/// Integers arrive as decimal strings to survive JSON's 53-bit limit.
fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map_or_else(|_| inner.clone(), |n| Value::Number(n.into())),
        Value::Number(_) => inner.clone(),
        _ => Value::Null,
    }
}

/// Doubles arrive as numbers, or as `"NaN"`/`"Infinity"` strings that JSON
/// cannot carry; those decode to `null`.
fn decode_double(inner: &Value) -> Value {
    inner
        .as_f64()
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(decode_value(&json!({"stringValue": "hi"})), json!("hi"));
        assert_eq!(decode_value(&json!({"booleanValue": true})), json!(true));
        assert_eq!(decode_value(&json!({"integerValue": "42"})), json!(42));
        assert_eq!(decode_value(&json!({"doubleValue": 1.5})), json!(1.5));
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
        assert_eq!(
            decode_value(&json!({"timestampValue": "2026-01-01T00:00:00Z"})),
            json!("2026-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_special_doubles_are_null() {
        assert_eq!(decode_value(&json!({"doubleValue": "NaN"})), Value::Null);
        assert_eq!(decode_value(&json!({"doubleValue": "Infinity"})), Value::Null);
    }

    #[test]
    fn test_oversized_integer_kept_as_string() {
        assert_eq!(
            decode_value(&json!({"integerValue": "99999999999999999999"})),
            json!("99999999999999999999")
        );
    }

    #[test]
    fn test_nested_map_and_array() {
        let value = json!({
            "mapValue": {"fields": {
                "email": {"booleanValue": false},
                "tags": {"arrayValue": {"values": [
                    {"stringValue": "a"},
                    {"integerValue": "1"}
                ]}}
            }}
        });
        assert_eq!(decode_value(&value), json!({"email": false, "tags": ["a", 1]}));
    }

    #[test]
    fn test_empty_map_and_array() {
        assert_eq!(decode_value(&json!({"mapValue": {}})), json!({}));
        assert_eq!(decode_value(&json!({"arrayValue": {}})), json!([]));
    }

    #[test]
    fn test_geo_point() {
        let value = json!({"geoPointValue": {"latitude": 7.1, "longitude": 125.6}});
        assert_eq!(
            decode_value(&value),
            json!({"latitude": 7.1, "longitude": 125.6})
        );
    }

    #[test]
    fn test_unknown_or_malformed() {
        assert_eq!(decode_value(&json!({"vectorValue": {}})), Value::Null);
        assert_eq!(decode_value(&json!("bare string")), Value::Null);
        assert_eq!(decode_value(&json!({})), Value::Null);
    }

    #[test]
    fn test_decode_fields() {
        let fields = json!({
            "email": {"stringValue": "admin@example.com"},
            "age": {"integerValue": "30"}
        });
        let decoded = decode_fields(fields.as_object().expect("object"));
        assert_eq!(
            Value::Object(decoded),
            json!({"email": "admin@example.com", "age": 30})
        );
    }
}
