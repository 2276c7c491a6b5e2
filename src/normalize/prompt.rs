//! Single-turn prompt selection.

use super::extract;
use crate::types::{Message, Role};

/// Which user message counts as "the prompt" when a conversation is reduced
/// to a single-turn call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptSelection {
    /// The most recent user message.
    #[default]
    LastUser,
    FirstUser,
}

/// Extract the prompt text from `messages`, ignoring state messages.
///
/// Returns `None` when there is no user message at all.
pub fn select_prompt(messages: &[Message], selection: PromptSelection) -> Option<String> {
    let mut users = messages
        .iter()
        .filter(|message| !message.is_state_message && message.role == Role::User);

    let chosen = match selection {
        PromptSelection::LastUser => users.next_back(),
        PromptSelection::FirstUser => users.next(),
    };
    chosen.map(|message| extract(&message.content))
}
