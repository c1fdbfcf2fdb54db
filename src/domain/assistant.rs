//! Types exchanged with the AI assistant.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::community::Community;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[schema(example = "Which hiking groups meet on weekends?")]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Outcome of screening a piece of content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModerationVerdict {
    pub flagged: bool,
    /// Policy categories the content falls under, e.g. `harassment`
    #[serde(default)]
    #[schema(example = json!(["spam"]))]
    pub categories: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ModerationVerdict {
    /// Verdict used when the model cannot be consulted or its reply is unusable
    pub fn allowed() -> Self {
        Self::default()
    }
}

/// A community suggested to the user
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Recommendation {
    pub community: Community,
    #[schema(example = "Matches your interest in trail running")]
    pub reason: String,
}
