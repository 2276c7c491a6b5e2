//! Message normalization.
//!
//! Turns the caller's message list into the canonical wire form:
//! - [`extract`] flattens nested content to text
//! - [`detect`] decides whether structured output is expected
//! - [`messages`] filters, maps roles and injects the JSON directive
//! - [`prompt`] reduces a conversation to a single-turn prompt

pub mod detect;
pub mod extract;
pub mod markers;
pub mod messages;
pub mod prompt;

pub use detect::is_structured_output_mode;
pub use extract::extract;
pub use markers::StructuredOutputMarkers;
pub use messages::{build_request, normalize};
pub use prompt::{PromptSelection, select_prompt};
