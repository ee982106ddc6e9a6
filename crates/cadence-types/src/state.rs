use cadence_llm::{Content, ContentBlock, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::source::Source;
use crate::tool::{ToolCall, ToolResult};

/// One prior turn as supplied by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl HistoryTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Append-only conversation log for one request
///
/// Turns are never removed or rewritten; a tool round always lands as an
/// assistant turn with tool-use blocks immediately followed by a user turn
/// carrying the matching tool results.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Build the opening conversation from client history plus the new message
    ///
    /// Unknown roles and blank turns are dropped, consecutive turns of the same
    /// role are merged and leading assistant turns removed, so the upstream
    /// always sees a user-first, strictly alternating log.
    pub fn from_history(history: &[HistoryTurn], user_message: &str) -> Self {
        let mut turns: Vec<(bool, String)> = Vec::new();

        let incoming = history
            .iter()
            .filter_map(|turn| {
                let is_user = match turn.role.trim().to_ascii_lowercase().as_str() {
                    "user" => true,
                    "assistant" => false,
                    other => {
                        tracing::debug!(role = %other, "Dropping history turn with unknown role");
                        return None;
                    }
                };
                Some((is_user, turn.content.trim()))
            })
            .chain(std::iter::once((true, user_message.trim())));

        for (is_user, text) in incoming {
            if text.is_empty() {
                continue;
            }
            match turns.last_mut() {
                Some((last_is_user, last_text)) if *last_is_user == is_user => {
                    last_text.push_str("\n\n");
                    last_text.push_str(text);
                }
                None if !is_user => {}
                _ => turns.push((is_user, text.to_string())),
            }
        }

        let messages = turns
            .into_iter()
            .map(|(is_user, text)| {
                if is_user {
                    Message::user(text)
                } else {
                    Message::assistant(text)
                }
            })
            .collect();

        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append one completed tool round
    ///
    /// Results are matched to calls by id and emitted in call order; a call
    /// without a result gets an explicit failure block so the log stays
    /// well-formed.
    pub fn push_tool_round(&mut self, assistant_text: &str, calls: &[ToolCall], results: &[ToolResult]) {
        let mut assistant_blocks = Vec::with_capacity(calls.len() + 1);
        if !assistant_text.trim().is_empty() {
            assistant_blocks.push(ContentBlock::Text {
                text: assistant_text.to_string(),
            });
        }
        assistant_blocks.extend(calls.iter().map(|call| ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: Value::Object(call.input.clone()),
        }));

        let result_blocks = calls
            .iter()
            .map(|call| match results.iter().find(|r| r.tool_call_id == call.id) {
                Some(result) => ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: result.text.clone(),
                    is_error: result.is_error,
                },
                None => ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: "Tool result unavailable".to_string(),
                    is_error: true,
                },
            })
            .collect::<Vec<_>>();

        self.messages.push(Message::assistant(Content::Blocks(assistant_blocks)));
        self.messages.push(Message::user(Content::Blocks(result_blocks)));
    }

    /// True when the last turn asks for tools that have no results yet
    pub fn has_pending_tool_use(&self) -> bool {
        match self.messages.last() {
            Some(Message::Assistant { content }) => !content.tool_use_ids().is_empty(),
            _ => false,
        }
    }
}

/// Mutable state owned by one controller run
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub conversation: Conversation,
    /// Text from every turn, in order; input to the final reduction
    pub reduction_buffer: String,
    /// Sources from every tool result, in arrival order (not deduplicated)
    pub sources: Vec<Source>,
    /// Completed tool round trips
    pub rounds: usize,
}

impl RunState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            conversation,
            reduction_buffer: String::new(),
            sources: Vec::new(),
            rounds: 0,
        }
    }

    pub fn append_text(&mut self, text: &str) {
        self.reduction_buffer.push_str(text);
    }

    pub fn add_sources(&mut self, sources: &[Source]) {
        self.sources.extend_from_slice(sources);
    }
}
