use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Field values keyed by field name, in form order.
pub type FormValues = IndexMap<String, FieldValue>;

/// Dynamic value held by a field.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Null, the empty string and `false` are empty. Everything else,
    /// including zero and empty lists, counts as a value.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null | FieldValue::Bool(false) => true,
            FieldValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Truthiness used when deciding whether a remote value may replace a
    /// field default. Zero is falsy, containers are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(value) => *value,
            FieldValue::Number(number) => !number.is_zero(),
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::List(_) | FieldValue::Map(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Trimmed textual form for pattern checks. Numbers are rendered,
    /// other kinds have no textual form.
    pub fn pattern_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text.trim().to_string()),
            FieldValue::Number(number) => Some(number.normalize().to_string()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::Bool(value) => JsonValue::Bool(*value),
            FieldValue::Number(number) => decimal_to_json(*number),
            FieldValue::Text(text) => JsonValue::String(text.clone()),
            FieldValue::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn decimal_to_json(number: Decimal) -> JsonValue {
    if number.fract().is_zero() {
        if let Some(integer) = number.to_i64() {
            return JsonValue::from(integer);
        }
    }
    number
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(number.to_string()))
}

fn json_number_to_value(number: &serde_json::Number) -> FieldValue {
    number
        .as_i64()
        .map(Decimal::from)
        .or_else(|| number.as_u64().map(Decimal::from))
        .or_else(|| number.as_f64().and_then(Decimal::from_f64))
        .map(FieldValue::Number)
        .unwrap_or_else(|| FieldValue::Text(number.to_string()))
}

impl From<JsonValue> for FieldValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(value) => FieldValue::Bool(value),
            JsonValue::Number(number) => json_number_to_value(&number),
            JsonValue::String(text) => FieldValue::Text(text),
            JsonValue::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            JsonValue::Object(entries) => FieldValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&FieldValue> for JsonValue {
    fn from(value: &FieldValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Number(number) => write!(f, "{}", number.normalize()),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(_) | FieldValue::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        JsonValue::deserialize(deserializer).map(FieldValue::from)
    }
}
