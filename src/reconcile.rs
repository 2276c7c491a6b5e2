//! Response reconciliation.
//!
//! Reduces raw backend output to one accumulated text plus the metadata of
//! the last object seen. Stream chunks are fed strictly in arrival order; a
//! chunk that does not parse is skipped and logged, never escalated.

use serde_json::{Map, Value};

use crate::standards::ollama::Endpoint;
use crate::types::{RawBackendOutput, ReconcileOutcome};

/// Reconciler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    AwaitingFirstChunk,
    Accumulating,
    Done,
    Empty,
}

/// Result of reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub text: String,
    pub last_metadata: Value,
    pub outcome: ReconcileOutcome,
    /// Stream chunks that failed to parse and were skipped.
    pub skipped_chunks: usize,
}

/// Per-call reconciliation state machine.
#[derive(Debug)]
pub struct ResponseReconciler {
    state: ReconcileState,
    text: String,
    last_metadata: Value,
    content_pointer: &'static str,
    chunks_seen: usize,
    skipped_chunks: usize,
}

impl Default for ResponseReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseReconciler {
    /// Reconciler for `/api/chat` responses.
    pub fn new() -> Self {
        Self::for_endpoint(Endpoint::Chat)
    }

    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        Self {
            state: ReconcileState::AwaitingFirstChunk,
            text: String::new(),
            last_metadata: Value::Object(Map::new()),
            content_pointer: endpoint.content_pointer(),
            chunks_seen: 0,
            skipped_chunks: 0,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Reconcile a complete backend output.
    pub fn reconcile(mut self, raw: RawBackendOutput) -> Reconciled {
        match raw {
            RawBackendOutput::Batch(object) => self.accept_batch(object),
            RawBackendOutput::Stream(chunks) => {
                for chunk in &chunks {
                    self.feed(chunk);
                }
            }
        }
        self.finish()
    }

    fn accept_batch(&mut self, object: Value) {
        self.text = self.delta_of(&object).to_string();
        self.last_metadata = object;
        self.state = ReconcileState::Done;
    }

    /// Feed one stream chunk.
    pub fn feed(&mut self, chunk: &str) {
        self.chunks_seen += 1;
        let object = match serde_json::from_str::<Value>(chunk.trim()) {
            Ok(object) => object,
            Err(e) => {
                self.skipped_chunks += 1;
                tracing::warn!(
                    chunk_index = self.chunks_seen - 1,
                    error = %e,
                    "skipping unparseable stream chunk"
                );
                return;
            }
        };

        let delta = self.delta_of(&object).to_string();
        self.text.push_str(&delta);
        self.last_metadata = object;
        if self.state == ReconcileState::AwaitingFirstChunk {
            self.state = ReconcileState::Accumulating;
        }
    }

    /// Close the stream and produce the result.
    pub fn finish(mut self) -> Reconciled {
        let outcome = match self.state {
            ReconcileState::AwaitingFirstChunk | ReconcileState::Empty => {
                self.state = ReconcileState::Empty;
                self.text.clear();
                self.last_metadata = Value::Object(Map::new());
                ReconcileOutcome::Empty
            }
            ReconcileState::Accumulating | ReconcileState::Done => {
                self.state = ReconcileState::Done;
                ReconcileOutcome::Done
            }
        };

        tracing::debug!(
            chunks = self.chunks_seen,
            skipped = self.skipped_chunks,
            text_len = self.text.len(),
            outcome = ?outcome,
            "reconciled backend output"
        );

        Reconciled {
            text: self.text,
            last_metadata: self.last_metadata,
            outcome,
            skipped_chunks: self.skipped_chunks,
        }
    }

    fn delta_of<'a>(&self, object: &'a Value) -> &'a str {
        object
            .pointer(self.content_pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Reconcile `/api/chat` output.
pub fn reconcile(raw: RawBackendOutput) -> Reconciled {
    ResponseReconciler::new().reconcile(raw)
}
