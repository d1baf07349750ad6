use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::{
    CanonicalizeError, Delta, DeltaError, DiffOptions, Number, RenderConfig,
};

/// Represents the JSON data model shared by the diff engine, the patch
/// applier and the udiff renderer and parser.
///
/// Object members are kept in a [`BTreeMap`]; member order carries no
/// meaning and iteration is always ascending by name.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number represented as IEEE-754 double precision.
    Number(Number),
    /// JSON string.
    String(String),
    /// JSON array.
    Array(Vec<Value>),
    /// JSON object.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Parses a JSON string into a [`Value`].
    ///
    /// ```
    /// # use json_delta_core::Value;
    /// let value = Value::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(value, Value::Object(_)));
    /// # Ok::<(), json_delta_core::CanonicalizeError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, CanonicalizeError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Converts a serde JSON value into a [`Value`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, CanonicalizeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                let text = num.to_string();
                let Some(as_f64) = num.as_f64() else {
                    return Err(CanonicalizeError::NumberOutOfRange { value: text });
                };
                Ok(Self::Number(Number::new(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Array(items))
            }
            JsonValue::Object(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    object.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    /// Converts the value into a serde JSON value.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Number(n) => JsonValue::Number(n.to_json_number()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(values) => JsonValue::Array(values.iter().map(Self::to_json_value).collect()),
            Self::Object(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(object)
            }
        }
    }

    /// Encodes the value as compact JSON with members in ascending order.
    ///
    /// ```
    /// # use json_delta_core::Value;
    /// let value = Value::from_json_str("{ \"b\": [1, 2.5], \"a\": null }")?;
    /// assert_eq!(value.to_json_string(), "{\"a\":null,\"b\":[1,2.5]}");
    /// # Ok::<(), json_delta_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_string()
    }

    /// Returns a short name for the kind of value, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Returns `true` for arrays and objects.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    /// Computes the delta that turns this value into `other`.
    ///
    /// ```
    /// # use json_delta_core::{DiffOptions, Value};
    /// let lhs = Value::from_json_str("[1,2,3]")?;
    /// let rhs = Value::from_json_str("[1,3]")?;
    /// let delta = lhs.diff(&rhs, &DiffOptions::default())?;
    /// assert_eq!(delta.to_json_string(), "[[[1]]]");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn diff(&self, other: &Self, options: &DiffOptions) -> Result<Delta, DeltaError> {
        crate::diff::diff(self, other, options)
    }

    /// Applies a delta to a copy of this value, returning the patched copy.
    ///
    /// ```
    /// # use json_delta_core::{DiffOptions, Value};
    /// let base = Value::from_json_str("[1,2,3]")?;
    /// let target = Value::from_json_str("[1,4,3]")?;
    /// let delta = base.diff(&target, &DiffOptions::default())?;
    /// let patched = base.apply_patch(&delta)?;
    /// assert_eq!(patched, target);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn apply_patch(&self, delta: &Delta) -> Result<Self, DeltaError> {
        crate::patch::apply(self, delta)
    }

    /// Renders the udiff between this value and `other`.
    ///
    /// ```
    /// # use json_delta_core::{RenderConfig, Value};
    /// let lhs = Value::from_json_str("{\"foo\":\"bar\"}")?;
    /// let rhs = Value::from_json_str("{\"foo\":\"baz\"}")?;
    /// let lines = lhs.udiff(&rhs, &RenderConfig::default())?;
    /// assert_eq!(lines.join("\n"), " {\n  \"foo\":\n-  \"bar\"\n+  \"baz\"\n }");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn udiff(&self, other: &Self, config: &RenderConfig) -> Result<Vec<String>, DeltaError> {
        crate::udiff::render(self, other, None, config)
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = CanonicalizeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json_value(value)
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        value.to_json_value()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Value::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Value {
    /// Writes compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::{
        collection::{btree_map, vec},
        prelude::*,
        string::string_regex,
    };

    pub(crate) fn arb_json_value() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::Bool),
            (-1000i64..1000).prop_map(|n| JsonValue::Number(n.into())),
            (-1000i32..1000).prop_filter_map("finite", |n| {
                serde_json::Number::from_f64(f64::from(n) / 8.0).map(JsonValue::Number)
            }),
            any::<f64>().prop_filter_map("finite", |f| {
                serde_json::Number::from_f64(f).map(JsonValue::Number)
            }),
            string_regex("[a-zA-Z0-9 ,\"\\\\\\[\\]{}.]{0,8}").unwrap().prop_map(JsonValue::String),
        ];
        leaf.prop_recursive(4, 24, 5, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..5).prop_map(JsonValue::Array),
                btree_map(string_regex("[a-z0-9\"]{1,6}").unwrap(), inner, 0..5).prop_map(|map| {
                    let mut object = serde_json::Map::new();
                    for (k, v) in map {
                        object.insert(k, v);
                    }
                    JsonValue::Object(object)
                }),
            ]
        })
    }

    pub(crate) fn arb_value() -> impl Strategy<Value = Value> {
        arb_json_value().prop_map(|json| Value::from_json_value(json).unwrap())
    }

    #[test]
    fn json_object_roundtrip() {
        let value = Value::from_json_str("{\"a\":1,\"b\":true}").unwrap();
        let json = value.to_json_value();
        assert_eq!(json["a"].as_f64().unwrap(), 1.0);
        assert!(json["b"].as_bool().unwrap());
    }

    #[test]
    fn json_number_out_of_range_yields_error() {
        let err = Value::from_json_str("1e400").unwrap_err();
        match err {
            CanonicalizeError::NumberOutOfRange { .. } | CanonicalizeError::Json(_) => {}
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn compact_encoding_escapes_member_names() {
        let value = Value::from_json_str("{\"a\\\"b\":[1.5,\"x\\ny\"]}").unwrap();
        assert_eq!(value.to_json_string(), "{\"a\\\"b\":[1.5,\"x\\ny\"]}");
    }

    #[test]
    fn decimals_survive_reencoding() {
        for text in ["-1.4209609014401803", "0.1", "2.2250738585072014e-308", "1.7976931348623157e308"] {
            let value = Value::from_json_str(text).unwrap();
            assert_eq!(Value::from_json_str(&value.to_json_string()).unwrap(), value, "{text}");
        }
    }

    #[test]
    fn kinds_name_every_variant() {
        let kinds: Vec<_> = ["null", "true", "1", "\"s\"", "[]", "{}"]
            .iter()
            .map(|text| Value::from_json_str(text).unwrap().kind())
            .collect();
        assert_eq!(kinds, ["null", "boolean", "number", "string", "array", "object"]);
    }

    proptest! {
        #[test]
        fn json_roundtrips_through_value(json in arb_json_value()) {
            let value = Value::from_json_value(json).unwrap();
            let reparsed = Value::from_json_str(&value.to_json_string()).unwrap();
            prop_assert_eq!(reparsed, value);
        }
    }
}
