//! Canonical request produced by the normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One message in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Sampling options. `extra` entries are passed to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// A request ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub model: String,
    pub wire_messages: Vec<WireMessage>,
    pub options: RequestOptions,
    /// Ask the backend for NDJSON streaming.
    pub stream: bool,
    pub keep_alive: Option<String>,
    pub think: Option<bool>,
}
