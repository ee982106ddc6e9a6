use serde::{Deserialize, Serialize};

use crate::response::ParsedResponse;
use crate::source::Source;

/// Event emitted by one controller run towards the client relay
///
/// A run emits any number of `Token` / `Sources` events followed by exactly
/// one terminal `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// Text fragment from the model, forwarded as soon as it arrives
    Token {
        text: String,
        /// Best-effort reply extracted from everything streamed so far
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<String>,
    },

    /// Ranked sources gathered so far
    Sources {
        sources: Vec<Source>,
    },

    /// Run completed with a validated reply
    Done {
        response: ParsedResponse,
        sources: Vec<Source>,
    },

    /// Run failed; `message` is safe to show to the user
    Error {
        message: String,
    },
}

impl LoopEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
