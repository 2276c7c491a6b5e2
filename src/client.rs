//! Ollama client
//!
//! Runs one exchange per call: normalize the messages, dispatch to the
//! backend, reconcile the output, repair it in structured-output mode and
//! attach usage.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::OllamaConfig;
use crate::error::LlmError;
use crate::execution::{Dispatcher, HttpTransport, ReqwestTransport};
use crate::normalize::{build_request, select_prompt};
use crate::reconcile::{Reconciled, ResponseReconciler};
use crate::repair::repair;
use crate::standards::ollama::Endpoint;
use crate::standards::ollama::utils::{
    build_chat_request, build_generate_request, generate_prompt_messages, reported_usage,
};
use crate::types::{Message, NormalizedRequest, ReconciledResponse, WireMessage};
use crate::usage;

/// Client for a local Ollama backend.
///
/// Cheap to clone; holds no per-call state.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    config: OllamaConfig,
    dispatcher: Dispatcher,
}

impl OllamaClient {
    /// Creates a client that talks HTTP through `reqwest`.
    pub fn new(config: OllamaConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Creates a client with a custom transport.
    pub fn with_transport(config: OllamaConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            dispatcher: Dispatcher::new(transport),
        }
    }

    /// Default configuration, honoring `OLLAMA_HOST`.
    pub fn from_env() -> Result<Self, LlmError> {
        Ok(Self::new(OllamaConfig::from_env()?))
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Normalize `messages` without sending anything. The flag reports
    /// whether structured output mode was detected.
    pub fn prepare(&self, messages: &[Message]) -> (NormalizedRequest, bool) {
        build_request(messages, &self.config)
    }

    /// Multi-turn exchange over `/api/chat`.
    pub async fn chat(&self, messages: &[Message]) -> Result<ReconciledResponse, LlmError> {
        let (request, structured) = self.prepare(messages);
        let body = serde_json::to_value(build_chat_request(&request))?;

        tracing::debug!(
            model = %request.model,
            messages = request.wire_messages.len(),
            structured,
            stream = request.stream,
            "sending chat request"
        );

        let raw = self
            .dispatcher
            .dispatch(&self.config.endpoint_url(Endpoint::Chat.path()), body)
            .await?;
        let reconciled = ResponseReconciler::for_endpoint(Endpoint::Chat).reconcile(raw);

        Ok(self.finalize(&request.wire_messages, structured, reconciled))
    }

    /// Like [`chat`](Self::chat), but gives up with [`LlmError::Cancelled`]
    /// as soon as `token` fires. No partial text is returned.
    pub async fn chat_with_cancel(
        &self,
        messages: &[Message],
        token: &CancellationToken,
    ) -> Result<ReconciledResponse, LlmError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("chat request cancelled");
                Err(LlmError::Cancelled)
            }
            result = self.chat(messages) => result,
        }
    }

    /// Single-turn exchange over `/api/generate`.
    ///
    /// The prompt is the user message picked by the configured
    /// [`PromptSelection`](crate::normalize::PromptSelection). System messages,
    /// including the JSON directive in structured-output mode, are joined into
    /// the `system` field.
    pub async fn generate(&self, messages: &[Message]) -> Result<ReconciledResponse, LlmError> {
        let prompt = select_prompt(messages, self.config.prompt_selection).ok_or_else(|| {
            LlmError::InvalidInput("generate requires at least one user message".to_string())
        })?;
        let (request, structured) = self.prepare(messages);

        let system_parts: Vec<&str> = request
            .wire_messages
            .iter()
            .filter(|message| message.role == "system")
            .map(|message| message.content.as_str())
            .collect();
        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

        let generate = build_generate_request(&request, prompt, system);
        let sent = generate_prompt_messages(&generate);
        let body = serde_json::to_value(&generate)?;
        tracing::debug!(model = %request.model, structured, "sending generate request");

        let raw = self
            .dispatcher
            .dispatch(&self.config.endpoint_url(Endpoint::Generate.path()), body)
            .await?;
        let reconciled = ResponseReconciler::for_endpoint(Endpoint::Generate).reconcile(raw);

        Ok(self.finalize(&sent, structured, reconciled))
    }

    fn finalize(
        &self,
        prompt_messages: &[WireMessage],
        structured: bool,
        reconciled: Reconciled,
    ) -> ReconciledResponse {
        let usage = reported_usage(&reconciled.last_metadata)
            .unwrap_or_else(|| usage::estimate(prompt_messages, &reconciled.text));

        let (text, repair_step) = if structured {
            let repaired = repair(&reconciled.text, &self.config.markers);
            (repaired.text, Some(repaired.step))
        } else {
            (reconciled.text, None)
        };

        ReconciledResponse {
            text,
            last_metadata: reconciled.last_metadata,
            usage,
            outcome: reconciled.outcome,
            repair: repair_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{HttpTransportRequest, HttpTransportResponse};
    use crate::types::ReconcileOutcome;
    use async_trait::async_trait;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    struct Recorder {
        content_type: &'static str,
        body: String,
        requests: Mutex<Vec<HttpTransportRequest>>,
    }

    impl Recorder {
        fn replying(content_type: &'static str, body: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                content_type,
                body: body.into(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_body(&self) -> Value {
            self.requests.lock().unwrap().last().unwrap().body.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn execute_json(
            &self,
            request: HttpTransportRequest,
        ) -> Result<HttpTransportResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
            Ok(HttpTransportResponse::from_chunks(
                200,
                headers,
                vec![self.body.clone()],
            ))
        }
    }

    /// One good NDJSON line, then a dropped connection.
    struct DroppedStream;

    #[async_trait]
    impl HttpTransport for DroppedStream {
        async fn execute_json(
            &self,
            _request: HttpTransportRequest,
        ) -> Result<HttpTransportResponse, LlmError> {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
            let chunks = vec![
                Ok(bytes::Bytes::from_static(
                    b"{\"message\":{\"content\":\"half an ans\"}}\n",
                )),
                Err(LlmError::HttpError("connection reset".to_string())),
            ];
            Ok(HttpTransportResponse {
                status: 200,
                headers,
                body: Box::pin(futures::stream::iter(chunks)),
            })
        }
    }

    fn client(transport: Arc<Recorder>) -> OllamaClient {
        OllamaClient::with_transport(OllamaConfig::default(), transport)
    }

    #[tokio::test]
    async fn plain_chat_estimates_usage_without_repair() {
        let transport = Recorder::replying(
            "application/json",
            json!({"message": {"role": "assistant", "content": "d e"}, "done": true}).to_string(),
        );
        let response = client(transport.clone())
            .chat(&[Message::user("a b c")])
            .await
            .unwrap();

        assert_eq!(response.text, "d e");
        assert_eq!(response.repair, None);
        assert!(!response.is_degraded());
        assert_eq!(response.usage.prompt_tokens, 3);
        assert_eq!(response.usage.completion_tokens, 2);
        assert_eq!(response.usage.total_tokens, 5);

        let body = transport.last_body();
        assert_eq!(body["model"], "qwen2.5");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"], json!([{"role": "user", "content": "a b c"}]));
    }

    #[tokio::test]
    async fn structured_stream_is_reconciled_then_repaired() {
        let lines = [
            json!({"message": {"content": "Sure! {\"thought\":"}}).to_string(),
            json!({"message": {"content": "\"x\",\"action\":\"y\"}"}}).to_string(),
            json!({"message": {"content": " done."}, "done": true}).to_string(),
        ]
        .join("\n");
        let transport = Recorder::replying("application/x-ndjson", lines);
        let messages = vec![
            Message::system("<available_actions>click</available_actions> reply in <output>"),
            Message::user("go"),
        ];

        let response = client(transport.clone()).chat(&messages).await.unwrap();
        assert_eq!(
            response.text,
            r#"<output>{"thought":"x","action":"y"}</output>"#
        );
        assert_eq!(response.outcome, ReconcileOutcome::Done);
        assert!(!response.is_degraded());

        let body = transport.last_body();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(
            body["messages"][0]["content"],
            crate::normalize::StructuredOutputMarkers::default().directive()
        );
    }

    #[tokio::test]
    async fn generate_sends_selected_prompt_and_system() {
        let transport = Recorder::replying(
            "application/json",
            json!({"response": "Paris", "done": true, "prompt_eval_count": 11, "eval_count": 1})
                .to_string(),
        );
        let messages = vec![
            Message::system("be brief"),
            Message::user("capital of Spain?"),
            Message::assistant("Madrid"),
            Message::user("capital of France?"),
        ];
        let response = client(transport.clone()).generate(&messages).await.unwrap();

        assert_eq!(response.text, "Paris");
        assert_eq!(response.usage.prompt_tokens, 11);
        assert_eq!(response.usage.completion_tokens, 1);

        let request = transport.requests.lock().unwrap()[0].clone();
        assert!(request.url.ends_with("/api/generate"));
        assert_eq!(request.body["prompt"], "capital of France?");
        assert_eq!(request.body["system"], "be brief");
    }

    #[tokio::test]
    async fn generate_without_user_message_is_invalid_input() {
        let transport = Recorder::replying("application/json", "{}");
        let err = client(transport.clone())
            .generate(&[Message::system("only system")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidInput(_)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let transport = Recorder::replying("application/json", "{}");
        let token = CancellationToken::new();
        token.cancel();
        let err = client(transport)
            .chat_with_cancel(&[Message::user("hi")], &token)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Cancelled));
    }

    #[tokio::test]
    async fn stream_dropped_midway_fails_without_partial_text() {
        let client = OllamaClient::with_transport(OllamaConfig::default(), Arc::new(DroppedStream));
        let result = client.chat(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(LlmError::HttpError(_))));
    }

    #[tokio::test]
    async fn generate_estimates_usage_from_the_sent_fields() {
        let transport = Recorder::replying(
            "application/json",
            json!({"response": "blue", "done": true}).to_string(),
        );
        let messages = vec![Message::system("be brief"), Message::user("sky colour now")];
        let response = client(transport.clone()).generate(&messages).await.unwrap();

        let body = transport.last_body();
        let sent_words = ["system", "prompt"]
            .iter()
            .map(|field| body[field].as_str().unwrap().split_whitespace().count() as u32)
            .sum::<u32>();
        assert_eq!(response.usage.prompt_tokens, sent_words);
        assert_eq!(response.usage.prompt_tokens, 5);
        assert_eq!(response.usage.completion_tokens, 1);
    }
}
