use serde::{Deserialize, Serialize};
use super::content::Content;

/// Conversation turn as sent upstream
///
/// System instructions travel separately in the request, so only user and
/// assistant turns exist here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        content: Content,
    },

    Assistant {
        content: Content,
    },
}

impl Message {
    /// Create user message
    pub fn user(content: impl Into<Content>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create assistant message
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &Content {
        match self {
            Self::User { content } | Self::Assistant { content } => content,
        }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }
}
