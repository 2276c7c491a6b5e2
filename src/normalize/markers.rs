//! Marker strings for structured-output mode.

/// Literal markers that identify structured-output requests and wrap the
/// structured payload in responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredOutputMarkers {
    /// Opening tag of the agent's action-description block.
    pub action_marker: String,
    pub sentinel_open: String,
    pub sentinel_close: String,
    /// Instruction phrase that on its own mandates JSON responses.
    pub json_mandate: String,
}

impl Default for StructuredOutputMarkers {
    fn default() -> Self {
        Self {
            action_marker: "<available_actions>".to_string(),
            sentinel_open: "<output>".to_string(),
            sentinel_close: "</output>".to_string(),
            json_mandate: "Your response must always be in JSON format".to_string(),
        }
    }
}

impl StructuredOutputMarkers {
    /// Wrap `payload` in the sentinel tags.
    pub fn wrap(&self, payload: &str) -> String {
        format!("{}{}{}", self.sentinel_open, payload, self.sentinel_close)
    }

    /// Text of the synthetic system message sent in structured-output mode.
    pub fn directive(&self) -> String {
        format!(
            "Respond with exactly one valid JSON object containing at least the \"thought\" and \
             \"action\" fields, wrapped in {open}{close} tags. Do not write anything outside the \
             {open} tags.",
            open = self.sentinel_open,
            close = self.sentinel_close,
        )
    }
}
