//! Ollama API protocol implementation
//!
//! Wire types and body builders for the `/api/chat` and `/api/generate`
//! endpoints.

pub mod types;
pub mod utils;

/// Backend endpoints this adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Multi-turn `/api/chat`.
    #[default]
    Chat,
    /// Single-turn `/api/generate`.
    Generate,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Chat => "api/chat",
            Self::Generate => "api/generate",
        }
    }

    /// JSON pointer of the text (or text delta) in a response object.
    pub fn content_pointer(self) -> &'static str {
        match self {
            Self::Chat => "/message/content",
            Self::Generate => "/response",
        }
    }
}
