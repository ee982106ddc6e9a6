use anyhow::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Stop reason reported by the provider when the model wants tools executed
pub const STOP_REASON_TOOL_USE: &str = "tool_use";

/// Typed event decoded from the provider's wire stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental fragment of generated text
    TokenDelta {
        text: String,
    },

    /// Model opened a tool-use block
    ToolUseStart {
        id: String,
        name: String,
    },

    /// Fragment of a tool-use block's JSON input
    ToolInputDelta {
        id: String,
        partial_json: String,
    },

    /// Tool-use block closed; its input is complete
    ToolUseStop {
        id: String,
    },

    /// Model finished this message
    MessageStop {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },

    /// Provider reported an in-band error
    Error {
        message: String,
    },
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        Self::TokenDelta { text: text.into() }
    }

    pub fn tool_start(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ToolUseStart {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn tool_input(id: impl Into<String>, partial_json: impl Into<String>) -> Self {
        Self::ToolInputDelta {
            id: id.into(),
            partial_json: partial_json.into(),
        }
    }

    pub fn tool_stop(id: impl Into<String>) -> Self {
        Self::ToolUseStop { id: id.into() }
    }

    pub fn stop(stop_reason: Option<&str>) -> Self {
        Self::MessageStop {
            stop_reason: stop_reason.map(str::to_string),
        }
    }

    /// True for a `MessageStop` asking for tool execution
    pub fn requests_tools(&self) -> bool {
        matches!(
            self,
            Self::MessageStop { stop_reason: Some(reason) } if reason == STOP_REASON_TOOL_USE
        )
    }
}

/// Boxed stream of decoded events; `Err` items are transport failures
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;
