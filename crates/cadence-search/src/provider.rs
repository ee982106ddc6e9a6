use anyhow::Result;
use async_trait::async_trait;
use cadence_types::Source;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default, alias = "content")]
    pub snippet: String,
}

/// Answer and hits returned by a search backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn sources(&self) -> Vec<Source> {
        self.results
            .iter()
            .map(|hit| Source::new(&hit.title, &hit.url))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.answer.as_deref().map_or(true, |a| a.trim().is_empty()) && self.results.is_empty()
    }
}

/// Web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse>;
}
