use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::HistoryTurn;

/// Everything one run needs from the incoming request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    pub message: String,
    /// Free-form user context, either a string or a JSON object
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

impl RunInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            history: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }
}
