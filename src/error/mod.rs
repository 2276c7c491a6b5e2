//! Error handling types for ollama-bridge.
//!
//! Only unrecoverable conditions become an [`LlmError`]. Malformed stream
//! chunks and invalid JSON candidates during repair are handled as data by
//! the reconciler and the repairer and never surface here.

mod conversions;
pub mod types;

pub use types::*;
