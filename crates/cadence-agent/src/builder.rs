use std::sync::Arc;

use anyhow::{anyhow, Result};
use cadence_llm::ChatClient;
use cadence_reduce::SourceRanker;
use cadence_search::{NoTools, ToolExecutor};
use cadence_types::{LLMConfig, LoopConfig};

use crate::controller::Controller;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;

/// Builder for constructing a Controller with optional components
pub struct ControllerBuilder {
    client: Option<Arc<dyn ChatClient>>,
    executor: Option<Arc<dyn ToolExecutor>>,
    ranker: SourceRanker,
    llm_config: LLMConfig,
    config: LoopConfig,
    system_prompt: String,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            executor: None,
            ranker: SourceRanker::default(),
            llm_config: LLMConfig::default(),
            config: LoopConfig::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Set the upstream chat client
    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the tool executor (defaults to no tools)
    pub fn executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn ranker(mut self, ranker: SourceRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn llm_config(mut self, llm_config: LLMConfig) -> Self {
        self.llm_config = llm_config;
        self
    }

    pub fn config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Build the Controller
    pub fn build(self) -> Result<Controller> {
        let client = self.client.ok_or_else(|| anyhow!("Chat client is required"))?;
        if self.config.max_iterations == 0 {
            tracing::warn!("max_iterations is 0, tool calls will always end the run with an error");
        }
        let executor = self.executor.unwrap_or_else(|| Arc::new(NoTools));

        Ok(Controller::new(
            client,
            executor,
            self.ranker,
            self.llm_config,
            self.config,
            self.system_prompt,
        ))
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
