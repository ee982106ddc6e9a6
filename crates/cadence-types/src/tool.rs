use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::Source;

/// Tool call whose JSON input is still arriving
#[derive(Debug, Clone, PartialEq)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    pub input_buffer: String,
}

impl PendingToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input_buffer: String::new(),
        }
    }

    pub fn push_input(&mut self, fragment: &str) {
        self.input_buffer.push_str(fragment);
    }

    /// Parse the buffered input; an empty buffer means "no arguments"
    pub fn complete(self) -> Result<ToolCall, serde_json::Error> {
        let input = if self.input_buffer.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str::<Map<String, Value>>(&self.input_buffer)?
        };

        Ok(ToolCall {
            id: self.id,
            name: self.name,
            input,
        })
    }
}

/// Fully-formed tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// String-valued input argument
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(Value::as_str)
    }
}

/// Normalized output of one tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub text: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            text: text.into(),
            sources,
            is_error: false,
        }
    }

    pub fn failure(tool_call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            text: text.into(),
            sources: Vec::new(),
            is_error: true,
        }
    }
}
