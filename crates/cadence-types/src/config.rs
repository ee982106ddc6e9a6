use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Maximum tool round trips per request
    pub max_iterations: usize,
    /// Overall deadline for one request
    pub request_timeout: Duration,
    /// Number of ranked sources surfaced to the client
    pub top_sources: usize,
    /// Attach a partial-parse preview to every token event
    pub live_preview: bool,
    /// Capacity of the event channel between controller and relay
    pub event_buffer: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            request_timeout: Duration::from_secs(30),
            top_sources: 3,
            live_preview: true,
            event_buffer: 64,
        }
    }
}

impl LoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_top_sources(mut self, top: usize) -> Self {
        self.top_sources = top;
        self
    }

    pub fn with_live_preview(mut self, enabled: bool) -> Self {
        self.live_preview = enabled;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LLMConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-latest".to_string(),
            temperature: None,
            max_tokens: Some(1024),
        }
    }
}
