// Anthropic Messages API client (HTTP direct, no SDK)

use crate::anthropic::parser::AnthropicLineParser;
use crate::buffer_utils::parse_sse_stream;
use crate::streaming::EventStream;
use crate::traits::{ChatClient, ChatOptions, ChatRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Connection settings for the Anthropic provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    /// Base URL (optional, defaults to https://api.anthropic.com)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            api_version: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }
}

pub struct AnthropicClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(AnthropicConfig::new(api_key))
    }

    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&config.api_key).context("Invalid API key format")?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(config.api_version.as_deref().unwrap_or(ANTHROPIC_VERSION))
                .context("Invalid API version")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Build the streaming messages payload
    pub fn build_payload(request: &ChatRequest) -> Result<Value> {
        let ChatOptions {
            temperature,
            max_tokens,
            tools,
        } = &request.options;

        let mut payload = MessagesPayload {
            model: &request.model,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.as_deref(),
            temperature: *temperature,
            tools: None,
            messages: &request.messages,
            stream: true,
        };
        if let Some(tools) = tools.as_ref().filter(|t| !t.is_empty()) {
            payload.tools = Some(tools);
        }

        serde_json::to_value(payload).context("Failed to serialize request")
    }
}

#[derive(Serialize)]
struct MessagesPayload<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a Vec<crate::types::Tool>>,
    messages: &'a [crate::types::Message],
    stream: bool,
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = Self::build_payload(&request)?;

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Opening upstream stream"
        );

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        Ok(parse_sse_stream(
            response.bytes_stream(),
            AnthropicLineParser::new(),
        ))
    }
}
