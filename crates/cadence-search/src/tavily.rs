// Tavily search API client (HTTP direct)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::provider::{SearchProvider, SearchResponse};

const TAVILY_API_BASE: &str = "https://api.tavily.com";
const DEFAULT_MAX_RESULTS: u32 = 5;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyConfig {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub max_results: u32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl TavilyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct TavilySearch {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_results: u32,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(TavilyConfig::new(api_key))
    }

    pub fn from_config(config: TavilyConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| TAVILY_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http_client,
            api_key: config.api_key,
            base_url,
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let url = format!("{}/search", self.base_url);
        let payload = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "include_answer": true,
            "search_depth": "basic",
        });

        tracing::debug!(query = %query, "Sending search request");

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send search request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search API error ({}): {}", status, body);
        }

        response
            .json::<SearchResponse>()
            .await
            .context("Failed to decode search response")
    }
}
