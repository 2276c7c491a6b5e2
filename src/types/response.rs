//! Raw and reconciled backend responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repair::RepairStep;

/// How the backend answered, decided once from the response content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Batch,
    Stream,
}

/// Backend output before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBackendOutput {
    /// A single JSON object.
    Batch(Value),
    /// NDJSON lines in arrival order, unparsed.
    Stream(Vec<String>),
}

impl RawBackendOutput {
    pub fn mode(&self) -> ResponseMode {
        match self {
            Self::Batch(_) => ResponseMode::Batch,
            Self::Stream(_) => ResponseMode::Stream,
        }
    }
}

/// Token usage. Estimated unless the backend reported counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Terminal state of the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Done,
    /// A stream ended without a single parseable chunk.
    Empty,
}

/// Final response record handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledResponse {
    pub text: String,
    pub last_metadata: Value,
    pub usage: Usage,
    pub outcome: ReconcileOutcome,
    /// Which repair step produced `text`, when structured output mode was on.
    pub repair: Option<RepairStep>,
}

impl ReconciledResponse {
    /// True when the text went out through the unvalidated repair fallback.
    pub fn is_degraded(&self) -> bool {
        self.repair.is_some_and(|step| step.is_degraded())
    }
}
