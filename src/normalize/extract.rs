//! Content flattening.

use serde_json::Value;

use crate::types::ContentValue;

/// Flatten any [`ContentValue`] into plain text.
///
/// Sequences are joined with a single space. A mapping contributes its
/// `"text"` entry when it has one and its JSON form otherwise. Total: every
/// input yields a string.
pub fn extract(content: &ContentValue) -> String {
    match content {
        ContentValue::TextBlock(text) | ContentValue::PlainText(text) => text.clone(),
        ContentValue::Sequence(items) => items.iter().map(extract).collect::<Vec<_>>().join(" "),
        ContentValue::RawMapping(map) => match map.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(map.clone()).to_string(),
        },
    }
}
