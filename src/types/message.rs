//! Caller-side chat messages.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ContentValue;

/// Message role as supplied by the caller.
///
/// Unknown roles are kept as-is so nothing is lost on input; the normalizer
/// decides how they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Other(role) => role,
        }
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        match role {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let role = String::deserialize(deserializer)?;
        Ok(Self::from(role.as_str()))
    }
}

/// A single message in the caller's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: ContentValue,
    /// Internal bookkeeping message (agent state dumps and the like).
    /// Never sent to the backend.
    #[serde(default)]
    pub is_state_message: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<ContentValue>) -> Self {
        Self {
            role,
            content: content.into(),
            is_state_message: false,
        }
    }

    pub fn system(content: impl Into<ContentValue>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<ContentValue>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<ContentValue>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Mark this message as internal state.
    pub fn as_state(mut self) -> Self {
        self.is_state_message = true;
        self
    }
}
