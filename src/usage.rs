//! Approximate token usage.
//!
//! Counts whitespace-delimited words. This is not tokenizer-accurate; it
//! only exists because Ollama does not always report real counts.

use crate::types::{Usage, WireMessage};

fn count_tokens(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Estimate usage from the prompt messages and the completion text.
pub fn estimate(wire_messages: &[WireMessage], completion: &str) -> Usage {
    let prompt_tokens = wire_messages
        .iter()
        .map(|message| count_tokens(&message.content))
        .fold(0u32, u32::saturating_add);
    Usage::new(prompt_tokens, count_tokens(completion))
}
