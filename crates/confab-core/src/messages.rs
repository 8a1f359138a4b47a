//! Transcript message types.

use serde::{Deserialize, Serialize};

/// Role of a conversation message.
///
/// The protocol treats roles as open strings. The roles this client acts on
/// get named variants; anything else round-trips verbatim through
/// [`Role::Other`] rather than failing to decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input.
    User,
    /// Agent output.
    #[default]
    Assistant,
    /// System-originated content.
    System,
    /// Tool result content.
    Tool,
    /// Any role string this client does not know about.
    #[serde(untagged)]
    Other(String),
}

impl Role {
    /// Wire spelling of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
            Role::Other(role) => role,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity within a session.
    ///
    /// Absent for locally originated user messages that are appended
    /// optimistically before the transport confirms them; an id-less message
    /// is never a target of content-delta merging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Message role.
    pub role: Role,
    /// Accumulated text content.
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Create an id-less user message (optimistic local append).
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an empty assistant message with the given id.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Role::Assistant,
            content: String::new(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::System,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
