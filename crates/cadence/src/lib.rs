//! # Cadence
//!
//! Streaming agentic loop that sits between a chat client and an upstream
//! model provider.
//!
//! A run streams the model's tokens to the client as they arrive, executes
//! web searches the model asks for, feeds the results back, and finally
//! reduces everything the model wrote into a validated reply: a message,
//! typed follow-up actions and a short list of ranked sources.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cadence::prelude::*;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(AnthropicClient::new(std::env::var("ANTHROPIC_API_KEY")?)?);
//!     let search = Arc::new(TavilySearch::new(std::env::var("SEARCH_API_KEY")?)?);
//!
//!     let controller = Controller::builder()
//!         .client(client)
//!         .executor(Arc::new(WebSearchExecutor::new(search)))
//!         .build()?;
//!
//!     let mut run = controller.spawn_run(RunInput::new("When is the tax deadline?"));
//!     while let Some(event) = run.next().await {
//!         match event {
//!             LoopEvent::Token { text, .. } => print!("{text}"),
//!             LoopEvent::Done { response, .. } => println!("\n{}", response.message),
//!             LoopEvent::Error { message } => eprintln!("{message}"),
//!             LoopEvent::Sources { .. } => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`cadence-llm`**: provider types, incremental SSE decoder, Anthropic client
//! - **`cadence-types`**: events, tool calls, sources, replies, configuration
//! - **`cadence-reduce`**: partial/full reply parser, schema validation, source ranking
//! - **`cadence-search`**: tool executor trait and the web search tool
//! - **`cadence-agent`**: the loop controller

pub mod prelude;

pub use cadence_agent::{
    Controller, ControllerBuilder, EventSender, LoopError, LoopState, RunHandle, RunOutcome,
    SimpleRouter, ToolCallTracker, ToolRunner, TurnOutcome,
};

pub use cadence_llm::{
    AnthropicClient, AnthropicConfig, ChatClient, ChatOptions, ChatRequest, Content, ContentBlock,
    EventStream, Message, StreamEvent, Tool,
};

pub use cadence_types::{
    Action, ActionKind, Conversation, HistoryTurn, LLMConfig, LoopConfig, LoopEvent, ParseTier,
    ParsedResponse, RunInput, RunState, Source, ToolCall, ToolResult,
};

pub use cadence_reduce::{
    parse_full, parse_partial, rank_sources, reduce, validate, validate_text, ChatReply,
    DomainPolicy, EmailClassification, Extraction, Schema, SourceRanker, TaskBreakdown,
    WeeklyDigest,
};

pub use cadence_search::{
    NoTools, SearchHit, SearchProvider, SearchResponse, TavilyConfig, TavilySearch, ToolExecutor,
    WebSearchExecutor,
};
