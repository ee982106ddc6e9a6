//! Prelude module for convenient imports
//!
//! ```rust
//! use cadence::prelude::*;
//! ```

pub use crate::{
    AnthropicClient, ChatClient, Controller, ControllerBuilder, LLMConfig, LoopConfig, LoopError,
    LoopEvent, Message, ParsedResponse, RunHandle, RunInput, Source, SourceRanker, TavilySearch,
    ToolExecutor, WebSearchExecutor,
};
