//! Canonical wire message construction.

use serde_json::Value;

use super::{StructuredOutputMarkers, extract, is_structured_output_mode};
use crate::config::OllamaConfig;
use crate::types::{Message, NormalizedRequest, RequestOptions, Role, WireMessage};

/// Map caller messages to wire messages.
///
/// State messages are dropped. In structured-output mode a synthetic system
/// directive is prepended. Roles outside system/user/assistant go out as
/// `user`.
pub fn normalize(
    messages: &[Message],
    structured: bool,
    markers: &StructuredOutputMarkers,
) -> Vec<WireMessage> {
    let directive = structured.then(|| WireMessage::new("system", markers.directive()));

    directive
        .into_iter()
        .chain(
            messages
                .iter()
                .filter(|message| !message.is_state_message)
                .map(|message| WireMessage::new(wire_role(&message.role), extract(&message.content))),
        )
        .collect()
}

fn wire_role(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::Assistant => "assistant",
        Role::User | Role::Other(_) => "user",
    }
}

/// Build the full request for `messages` under `config`.
///
/// Returns the request together with the detected structured-output flag so
/// the caller can decide whether the reply needs repairing.
pub fn build_request(messages: &[Message], config: &OllamaConfig) -> (NormalizedRequest, bool) {
    let structured = is_structured_output_mode(messages, &config.markers);
    let wire_messages = normalize(messages, structured, &config.markers);

    let mut extra = config.options.clone();
    if config.think {
        extra
            .entry("thinking_budget")
            .or_insert_with(|| Value::from(config.thinking_budget));
    }

    let request = NormalizedRequest {
        model: config.model.clone(),
        wire_messages,
        options: RequestOptions {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            extra,
        },
        stream: config.stream,
        keep_alive: config.keep_alive.clone(),
        think: config.think.then_some(true),
    };
    (request, structured)
}
