pub mod config;
pub mod events;
pub mod input;
pub mod response;
pub mod source;
pub mod state;
pub mod tool;

pub use config::{LLMConfig, LoopConfig};
pub use events::LoopEvent;
pub use input::RunInput;
pub use response::{Action, ActionKind, ParseTier, ParsedResponse};
pub use source::Source;
pub use state::{Conversation, HistoryTurn, RunState};
pub use tool::{PendingToolCall, ToolCall, ToolResult};
