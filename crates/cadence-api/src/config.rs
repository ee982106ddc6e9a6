use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cadence_llm::AnthropicConfig;
use cadence_reduce::{DomainPolicy, SourceRanker};
use cadence_search::TavilyConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub anthropic_api_key: String,
    #[serde(default)]
    pub search_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Hard limit for any HTTP request, streaming responses included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    /// Override for the provider endpoint (proxies, local mocks)
    #[serde(default)]
    pub base_url: Option<String>,
    /// `anthropic-version` header override
    #[serde(default)]
    pub api_version: Option<String>,
}

impl LlmConfig {
    pub fn anthropic(&self, api_key: &str) -> AnthropicConfig {
        let mut anthropic = AnthropicConfig::new(api_key);
        if let Some(base_url) = &self.base_url {
            anthropic = anthropic.with_base_url(base_url.clone());
        }
        if let Some(version) = &self.api_version {
            anthropic = anthropic.with_api_version(version.clone());
        }
        anthropic
    }
}

impl From<LlmConfig> for cadence_types::LLMConfig {
    fn from(config: LlmConfig) -> Self {
        Self {
            model: config.model,
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub request_timeout_secs: u64,
    pub top_sources: usize,
    #[serde(default = "default_true")]
    pub live_preview: bool,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_true() -> bool {
    true
}

fn default_event_buffer() -> usize {
    64
}

impl From<&AgentConfig> for cadence_types::LoopConfig {
    fn from(config: &AgentConfig) -> Self {
        Self::new()
            .with_max_iterations(config.max_iterations)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_top_sources(config.top_sources)
            .with_live_preview(config.live_preview)
            .with_event_buffer(config.event_buffer)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    pub max_results: u32,
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn tavily(&self, api_key: &str) -> TavilyConfig {
        let mut tavily = TavilyConfig::new(api_key)
            .with_max_results(self.max_results)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(base_url) = &self.base_url {
            tavily = tavily.with_base_url(base_url.clone());
        }
        tavily
    }
}

/// Extra domains merged into the built-in ranking lists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub authoritative: Vec<String>,
    #[serde(default)]
    pub low_quality: Vec<String>,
    #[serde(default)]
    pub denied: Vec<String>,
}

impl RankingConfig {
    pub fn ranker(&self, top_n: usize) -> SourceRanker {
        let policy = DomainPolicy::default()
            .with_authoritative(&self.authoritative)
            .with_low_quality(&self.low_quality)
            .with_denied(&self.denied);
        SourceRanker::new(Arc::new(policy), top_n)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables shaped `CADENCE_<SECTION>__<KEY>`, e.g. `CADENCE_SERVER__PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CADENCE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ConfigError::Message("ANTHROPIC_API_KEY environment variable is required".to_string())
        })?;
        cfg.search_api_key = std::env::var("SEARCH_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn search_enabled(&self) -> bool {
        self.search_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [llm]
        model = "claude-3-5-sonnet-latest"
        max_tokens = 1024

        [agent]
        max_iterations = 5
        request_timeout_secs = 30
        top_sources = 3

        [search]
        max_results = 5
        timeout_secs = 10

        [logging]
        level = "info"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.request_timeout_secs, 60);
        assert!(config.agent.live_preview);
        assert_eq!(config.agent.event_buffer, 64);
        assert!(config.ranking.denied.is_empty());
        assert!(!config.search_enabled());

        let loop_config = cadence_types::LoopConfig::from(&config.agent);
        assert_eq!(loop_config.max_iterations, 5);
        assert_eq!(loop_config.request_timeout, Duration::from_secs(30));

        let anthropic = config.llm.anthropic("key");
        assert_eq!(anthropic.api_key, "key");
        assert_eq!(anthropic.base_url, None);
        assert_eq!(anthropic.api_version, None);

        let llm: cadence_types::LLMConfig = config.llm.into();
        assert_eq!(llm.max_tokens, Some(1024));
        assert_eq!(llm.temperature, None);
    }

    #[test]
    fn test_llm_overrides_reach_provider_config() {
        let sample = SAMPLE.replace(
            "max_tokens = 1024",
            "max_tokens = 1024\n        base_url = \"http://localhost:9000\"\n        api_version = \"2024-01-01\"",
        );
        let config: Config = toml::from_str(&sample).unwrap();
        let anthropic = config.llm.anthropic("key");
        assert_eq!(anthropic.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(anthropic.api_version.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_ranking_extensions_apply() {
        let ranking = RankingConfig {
            authoritative: vec!["gp-surgery.example.org".to_string()],
            low_quality: vec![],
            denied: vec!["spam.example.com".to_string()],
        };
        let ranker = ranking.ranker(2);
        assert_eq!(ranker.top_n(), 2);
        assert_eq!(ranker.policy().score("https://gp-surgery.example.org/hours"), Some(3));
        assert_eq!(ranker.policy().score("https://spam.example.com/a"), None);
        // built-in lists stay in effect
        assert_eq!(ranker.policy().score("https://www.reddit.com/r/x"), Some(0));
    }
}
