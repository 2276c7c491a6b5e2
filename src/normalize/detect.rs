//! Structured-output mode detection.

use super::{StructuredOutputMarkers, extract};
use crate::types::Message;

/// Whether the conversation expects a machine-parseable JSON reply.
///
/// A message qualifies when its text carries both the action-description
/// marker and the sentinel open tag, or the JSON-mandate phrase. Messages are
/// checked in order and the first hit wins; roles are ignored.
pub fn is_structured_output_mode(messages: &[Message], markers: &StructuredOutputMarkers) -> bool {
    messages.iter().any(|message| {
        let text = extract(&message.content);
        (text.contains(&markers.action_marker) && text.contains(&markers.sentinel_open))
            || text.contains(&markers.json_mandate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> StructuredOutputMarkers {
        StructuredOutputMarkers::default()
    }

    #[test]
    fn detects_action_block_with_sentinel() {
        let messages = vec![Message::system(
            "You are an agent.\n<available_actions>click, type</available_actions>\n\
             Reply inside <output></output>.",
        )];
        assert!(is_structured_output_mode(&messages, &markers()));
    }

    #[test]
    fn action_block_alone_is_not_enough() {
        let messages = vec![Message::system("<available_actions>click</available_actions>")];
        assert!(!is_structured_output_mode(&messages, &markers()));
    }

    #[test]
    fn detects_json_mandate_in_any_role() {
        let messages = vec![
            Message::user("hello"),
            Message::assistant("Your response must always be in JSON format."),
        ];
        assert!(is_structured_output_mode(&messages, &markers()));
    }

    #[test]
    fn plain_exchange_is_not_structured() {
        let messages = vec![Message::user("What is Rust?"), Message::assistant("A language.")];
        assert!(!is_structured_output_mode(&messages, &markers()));
    }

    #[test]
    fn markers_split_across_messages_do_not_match() {
        let messages = vec![
            Message::system("<available_actions>click</available_actions>"),
            Message::user("wrap it in <output>"),
        ];
        assert!(!is_structured_output_mode(&messages, &markers()));
    }
}
