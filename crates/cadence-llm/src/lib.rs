pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod anthropic;

pub use traits::{ChatClient, ChatOptions, ChatRequest};

pub use streaming::{EventStream, StreamEvent, STOP_REASON_TOOL_USE};
pub use buffer_utils::{parse_sse_stream, CircularLineBuffer, SseDecoder, SseLineParser};
pub use anthropic::{AnthropicClient, AnthropicConfig, AnthropicLineParser};
pub use types::{Content, ContentBlock, Message, Tool};
