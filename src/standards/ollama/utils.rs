//! Ollama utility functions (protocol layer)
//!
//! Common utility functions for building Ollama request payloads and reading
//! response metadata.

use serde_json::{Map, Value};

use super::types::*;
use crate::types::{NormalizedRequest, RequestOptions, Usage, WireMessage};

/// Build the `options` object: temperature, `max_tokens` as `num_predict`,
/// then extra options verbatim.
pub fn build_model_options(options: &RequestOptions) -> Map<String, Value> {
    let mut out = Map::new();

    out.insert(
        "temperature".to_string(),
        serde_json::Number::from_f64(options.temperature)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0)),
    );

    if let Some(max_tokens) = options.max_tokens {
        out.insert("num_predict".to_string(), Value::from(max_tokens));
    }

    for (key, value) in &options.extra {
        out.insert(key.clone(), value.clone());
    }

    out
}

/// Convert a wire message to Ollama format
pub fn convert_wire_message(message: &WireMessage) -> OllamaChatMessage {
    OllamaChatMessage {
        role: message.role.clone(),
        content: message.content.clone(),
    }
}

/// Build an Ollama `/api/chat` request body.
pub fn build_chat_request(request: &NormalizedRequest) -> OllamaChatRequest {
    OllamaChatRequest {
        model: request.model.clone(),
        messages: request.wire_messages.iter().map(convert_wire_message).collect(),
        stream: request.stream,
        options: build_model_options(&request.options),
        keep_alive: request.keep_alive.clone(),
        think: request.think,
    }
}

/// Build an Ollama `/api/generate` request body for a single-turn prompt.
pub fn build_generate_request(
    request: &NormalizedRequest,
    prompt: String,
    system: Option<String>,
) -> OllamaGenerateRequest {
    OllamaGenerateRequest {
        model: request.model.clone(),
        prompt,
        system,
        stream: request.stream,
        options: build_model_options(&request.options),
        keep_alive: request.keep_alive.clone(),
        think: request.think,
    }
}

/// The text a generate request puts in front of the model, in wire form:
/// the system field (if any) followed by the prompt.
pub fn generate_prompt_messages(request: &OllamaGenerateRequest) -> Vec<WireMessage> {
    request
        .system
        .iter()
        .map(|system| WireMessage::new("system", system.as_str()))
        .chain(std::iter::once(WireMessage::new("user", request.prompt.as_str())))
        .collect()
}

/// Whether a response content type announces newline-delimited JSON.
pub fn is_ndjson_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("ndjson"))
        .unwrap_or(false)
}

/// Usage reported by the backend in its final response object, if complete.
pub fn reported_usage(metadata: &Value) -> Option<Usage> {
    let counts: OllamaEvalCounts = serde_json::from_value(metadata.clone()).ok()?;
    match (counts.prompt_eval_count, counts.eval_count) {
        (Some(prompt), Some(completion)) => Some(Usage::new(prompt, completion)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> NormalizedRequest {
        let mut extra = Map::new();
        extra.insert("top_k".to_string(), json!(40));
        extra.insert("stop".to_string(), json!(["</output>"]));
        NormalizedRequest {
            model: "qwen2.5".to_string(),
            wire_messages: vec![
                WireMessage::new("system", "be brief"),
                WireMessage::new("user", "hi"),
            ],
            options: RequestOptions {
                temperature: 0.5,
                max_tokens: Some(256),
                extra,
            },
            stream: true,
            keep_alive: Some("5m".to_string()),
            think: None,
        }
    }

    #[test]
    fn chat_body_matches_wire_protocol() {
        let body = serde_json::to_value(build_chat_request(&request())).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "qwen2.5",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": true,
                "options": {
                    "temperature": 0.5,
                    "num_predict": 256,
                    "top_k": 40,
                    "stop": ["</output>"]
                },
                "keep_alive": "5m"
            })
        );
    }

    #[test]
    fn max_tokens_is_omitted_when_unset() {
        let mut req = request();
        req.options.max_tokens = None;
        let options = build_model_options(&req.options);
        assert!(!options.contains_key("num_predict"));
        assert!(!options.contains_key("max_tokens"));
    }

    #[test]
    fn generate_body_carries_prompt_and_system() {
        let body = serde_json::to_value(build_generate_request(
            &request(),
            "hi".to_string(),
            Some("directive".to_string()),
        ))
        .unwrap();
        assert_eq!(body["prompt"], "hi");
        assert_eq!(body["system"], "directive");
        assert_eq!(body["options"]["num_predict"], 256);
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn ndjson_detection() {
        assert!(is_ndjson_content_type(Some("application/x-ndjson")));
        assert!(is_ndjson_content_type(Some("application/x-ndjson; charset=utf-8")));
        assert!(!is_ndjson_content_type(Some("application/json; charset=utf-8")));
        assert!(!is_ndjson_content_type(None));
    }

    #[test]
    fn reported_usage_requires_both_counts() {
        assert_eq!(
            reported_usage(&json!({"done": true, "prompt_eval_count": 26, "eval_count": 298})),
            Some(Usage::new(26, 298))
        );
        assert_eq!(reported_usage(&json!({"done": false, "eval_count": 3})), None);
        assert_eq!(reported_usage(&json!({})), None);
    }

    #[test]
    fn generate_prompt_messages_follow_the_request_body() {
        let body = build_generate_request(&request(), "why?".to_string(), Some("be brief".to_string()));
        assert_eq!(
            generate_prompt_messages(&body),
            vec![WireMessage::new("system", "be brief"), WireMessage::new("user", "why?")]
        );

        let body = build_generate_request(&request(), "why?".to_string(), None);
        assert_eq!(generate_prompt_messages(&body), vec![WireMessage::new("user", "why?")]);
    }
}
