//! Recursive message content.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Content of a message as callers hand it to us.
///
/// Callers produce plain strings, typed text blocks, lists mixing both and
/// arbitrary provider-specific mappings. All of them flatten to a string via
/// [`crate::normalize::extract`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    PlainText(String),
    /// A `{"type": "text", "text": ...}` block.
    TextBlock(String),
    Sequence(Vec<ContentValue>),
    RawMapping(Map<String, Value>),
}

impl ContentValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self::PlainText(text.into())
    }

    pub fn block(text: impl Into<String>) -> Self {
        Self::TextBlock(text.into())
    }
}

impl From<&str> for ContentValue {
    fn from(text: &str) -> Self {
        Self::PlainText(text.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(text: String) -> Self {
        Self::PlainText(text)
    }
}

impl From<Vec<ContentValue>> for ContentValue {
    fn from(items: Vec<ContentValue>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Value> for ContentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::PlainText(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                let is_text_block = map.get("type").and_then(Value::as_str) == Some("text");
                match map.get("text") {
                    Some(Value::String(text)) if is_text_block => Self::TextBlock(text.clone()),
                    _ => Self::RawMapping(map),
                }
            }
            Value::Null => Self::PlainText(String::new()),
            other => Self::PlainText(other.to_string()),
        }
    }
}

impl From<&ContentValue> for Value {
    fn from(content: &ContentValue) -> Self {
        match content {
            ContentValue::PlainText(text) => Value::String(text.clone()),
            ContentValue::TextBlock(text) => serde_json::json!({ "type": "text", "text": text }),
            ContentValue::Sequence(items) => Value::Array(items.iter().map(Value::from).collect()),
            ContentValue::RawMapping(map) => Value::Object(map.clone()),
        }
    }
}

impl Serialize for ContentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}
