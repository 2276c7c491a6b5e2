//! ollama-bridge
//!
//! Adapter between agent frameworks and a local Ollama backend: normalizes
//! heterogeneous message content into the Ollama wire format, reconciles
//! batch and NDJSON streamed replies into one text, and repairs structured
//! (sentinel-wrapped JSON) output when the conversation asks for it.
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod execution;
pub mod normalize;
pub mod observability;
pub mod reconcile;
pub mod repair;
pub mod standards;
pub mod types;
pub mod usage;

pub use client::OllamaClient;
pub use config::{OllamaConfig, OllamaConfigBuilder};
pub use error::{ErrorCategory, LlmError};
pub use normalize::{PromptSelection, StructuredOutputMarkers};
pub use repair::{RepairStep, Repaired};
pub use types::{ContentValue, Message, ReconciledResponse, Role, Usage, WireMessage};

/// Commonly used items.
pub mod prelude {
    pub use crate::client::OllamaClient;
    pub use crate::config::OllamaConfig;
    pub use crate::error::LlmError;
    pub use crate::types::{ContentValue, Message, ReconciledResponse, Role};
}
