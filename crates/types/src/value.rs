//! Dynamically typed values exchanged between the bridge and script code.
//!
//! [`Value`] is a closed sum type. Script hosts convert their native values into it before
//! calling the binding surface, and every value that leaves a step travels as JSON. Integers
//! and finite doubles survive the JSON round trip unchanged. Non-finite doubles are rejected by
//! [`Value::to_json`] and by the `Serialize` impl instead of being silently turned into `null`,
//! and integers outside the `i64` range are rejected on the way in.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use thiserror::Error;

/// Ordered name → value mapping used for inputs, state, and outputs.
pub type ValueMap = IndexMap<String, Value>;

/// A scalar or structured datum visible to script code.
///
/// Serializes as plain JSON-shaped data. Unsigned integers above `i64::MAX` fail to
/// deserialize rather than widening to a lossy double.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE-754 double.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// String-keyed mapping preserving insertion order.
    Mapping(ValueMap),
}

/// Error raised when a [`Value`] cannot be represented on the wire.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("non-finite number {value} at '{path}' has no wire representation")]
    NonFinite { path: String, value: f64 },

    #[error("integer {value} at '{path}' does not fit in a signed 64-bit integer")]
    IntegerOutOfRange { path: String, value: u64 },

    #[error("value encoding failed: {message}")]
    Encoding { message: String },
}

impl ValueError {
    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding { message: message.into() }
    }
}

impl Value {
    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the integer payload. Floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the numeric payload as a double, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(number) => Some(*number as f64),
            Value::Float(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ValueMap> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Converts into a JSON value, rejecting anything JSON cannot carry losslessly.
    pub fn to_json(&self) -> Result<JsonValue, ValueError> {
        to_json_at(self, "$")
    }

    /// Converts a JSON value, rejecting integers that would lose precision.
    pub fn from_json(json: JsonValue) -> Result<Self, ValueError> {
        from_json_at(json, "$")
    }

    /// Encodes as a compact JSON string.
    pub fn encode(&self) -> Result<String, ValueError> {
        let json = self.to_json()?;
        serde_json::to_string(&json).map_err(|error| ValueError::encoding(error.to_string()))
    }

    /// Decodes a JSON string produced by [`Value::encode`] or any other JSON writer.
    pub fn decode(text: &str) -> Result<Self, ValueError> {
        let json: JsonValue = serde_json::from_str(text).map_err(|error| ValueError::encoding(error.to_string()))?;
        Value::from_json(json)
    }
}

fn to_json_at(value: &Value, path: &str) -> Result<JsonValue, ValueError> {
    let json = match value {
        Value::Null => JsonValue::Null,
        Value::Bool(flag) => JsonValue::Bool(*flag),
        Value::Int(number) => JsonValue::Number(Number::from(*number)),
        Value::Float(number) => {
            let number = Number::from_f64(*number).ok_or_else(|| ValueError::NonFinite {
                path: path.to_string(),
                value: *number,
            })?;
            JsonValue::Number(number)
        }
        Value::String(text) => JsonValue::String(text.clone()),
        Value::Sequence(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                converted.push(to_json_at(item, &format!("{path}[{index}]"))?);
            }
            JsonValue::Array(converted)
        }
        Value::Mapping(map) => {
            let mut converted = JsonMap::with_capacity(map.len());
            for (key, item) in map {
                converted.insert(key.clone(), to_json_at(item, &format!("{path}.{key}"))?);
            }
            JsonValue::Object(converted)
        }
    };
    Ok(json)
}

fn from_json_at(json: JsonValue, path: &str) -> Result<Value, ValueError> {
    let value = match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(flag) => Value::Bool(flag),
        JsonValue::Number(number) => number_to_value(&number, path)?,
        JsonValue::String(text) => Value::String(text),
        JsonValue::Array(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                converted.push(from_json_at(item, &format!("{path}[{index}]"))?);
            }
            Value::Sequence(converted)
        }
        JsonValue::Object(map) => {
            let mut converted = ValueMap::with_capacity(map.len());
            for (key, item) in map {
                let item = from_json_at(item, &format!("{path}.{key}"))?;
                converted.insert(key, item);
            }
            Value::Mapping(converted)
        }
    };
    Ok(value)
}

fn number_to_value(number: &Number, path: &str) -> Result<Value, ValueError> {
    if let Some(integer) = number.as_i64() {
        return Ok(Value::Int(integer));
    }
    if let Some(unsigned) = number.as_u64() {
        return Err(ValueError::IntegerOutOfRange {
            path: path.to_string(),
            value: unsigned,
        });
    }
    number
        .as_f64()
        .map(Value::Float)
        .ok_or_else(|| ValueError::encoding(format!("unsupported number {number} at '{path}'")))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(flag) => serializer.serialize_bool(*flag),
            Value::Int(number) => serializer.serialize_i64(*number),
            Value::Float(number) if number.is_finite() => serializer.serialize_f64(*number),
            Value::Float(number) => Err(ser::Error::custom(format!(
                "non-finite number {number} has no wire representation"
            ))),
            Value::String(text) => serializer.serialize_str(text),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Mapping(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a null, boolean, number, string, sequence or string-keyed mapping")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, flag: bool) -> Result<Value, E> {
        Ok(Value::Bool(flag))
    }

    fn visit_i64<E: de::Error>(self, number: i64) -> Result<Value, E> {
        Ok(Value::Int(number))
    }

    fn visit_u64<E: de::Error>(self, number: u64) -> Result<Value, E> {
        i64::try_from(number)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {number} does not fit in a signed 64-bit integer")))
    }

    fn visit_f64<E: de::Error>(self, number: f64) -> Result<Value, E> {
        Ok(Value::Float(number))
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Value, E> {
        Ok(Value::String(text.to_string()))
    }

    fn visit_string<E: de::Error>(self, text: String) -> Result<Value, E> {
        Ok(Value::String(text))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = ValueMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Mapping(map))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = ValueError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Value::from_json(json)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Int(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Int(i64::from(number))
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Float(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use serde_json::json;

    #[test]
    fn integers_and_doubles_survive_encoding() {
        let value = Value::Sequence(vec![
            Value::Int(i64::MAX),
            Value::Int(i64::MIN),
            Value::Float(0.1 + 0.2),
            Value::Float(1.0),
        ]);

        let encoded = value.encode().expect("encode");
        let decoded = Value::decode(&encoded).expect("decode");

        assert_eq!(decoded, value);
    }

    #[test]
    fn float_with_integral_value_stays_float() {
        let decoded = Value::decode(&Value::Float(3.0).encode().unwrap()).unwrap();
        assert_eq!(decoded, Value::Float(3.0));
        assert_ne!(decoded, Value::Int(3));
    }

    #[test]
    fn non_finite_numbers_are_rejected_with_path() {
        let value = Value::Mapping(indexmap! {
            "metrics".to_string() => Value::Sequence(vec![Value::Int(1), Value::Float(f64::NAN)]),
        });

        let error = value.to_json().expect_err("NaN must not encode");
        match error {
            ValueError::NonFinite { path, .. } => assert_eq!(path, "$.metrics[1]"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(Value::Float(f64::INFINITY).encode().is_err());
    }

    #[test]
    fn mapping_preserves_insertion_order() {
        let decoded = Value::decode(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = decoded.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn serde_representation_is_plain_json() {
        let value = Value::Mapping(indexmap! {
            "name".to_string() => Value::from("abc"),
            "count".to_string() => Value::from(2),
            "ratio".to_string() => Value::from(0.5),
            "tags".to_string() => Value::Sequence(vec![Value::Bool(true), Value::Null]),
        });

        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json, json!({"name": "abc", "count": 2, "ratio": 0.5, "tags": [true, null]}));

        let back: Value = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, value);
    }

    #[test]
    fn yaml_documents_map_onto_the_same_variants() {
        let value: Value = serde_yaml::from_str("a: 10\nb: [x, 1.5]\nc: ~\n").expect("yaml");
        assert_eq!(value.get("a"), Some(&Value::Int(10)));
        assert_eq!(value.get("b").and_then(Value::as_sequence).map(<[Value]>::len), Some(2));
        assert_eq!(value.get("c"), Some(&Value::Null));
    }

    #[test]
    fn serializer_rejects_non_finite_numbers() {
        assert!(serde_json::to_string(&Value::Float(f64::NAN)).is_err());
        assert!(serde_json::to_value(Value::Sequence(vec![Value::Int(1), Value::Float(f64::NEG_INFINITY)])).is_err());
        assert!(serde_yaml::to_string(&Value::Float(f64::INFINITY)).is_err());
        assert_eq!(serde_json::to_string(&Value::Float(-0.5)).unwrap(), "-0.5");
    }

    #[test]
    fn oversized_unsigned_integers_are_rejected() {
        let error = Value::from_json(json!({"ids": [1, u64::MAX]})).expect_err("u64::MAX must not widen");
        assert_eq!(
            error,
            ValueError::IntegerOutOfRange {
                path: "$.ids[1]".into(),
                value: u64::MAX,
            }
        );
        assert!(Value::decode(&u64::MAX.to_string()).is_err());
        assert!(serde_json::from_str::<Value>("18446744073709551615").is_err());
        assert_eq!(Value::decode(&i64::MAX.to_string()).unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Value::from(10).as_i64(), Some(10));
        assert_eq!(Value::from(10).as_f64(), Some(10.0));
        assert_eq!(Value::from(2.5).as_i64(), None);
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(true).type_name(), "boolean");
    }
}
