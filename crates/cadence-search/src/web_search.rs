use std::sync::Arc;

use async_trait::async_trait;
use cadence_llm::Tool;
use cadence_types::{ToolCall, ToolResult};
use serde_json::json;

use crate::executor::ToolExecutor;
use crate::provider::{SearchProvider, SearchResponse};

pub const WEB_SEARCH_TOOL: &str = "web_search";

const MAX_SNIPPET_CHARS: usize = 600;

/// Exposes a [`SearchProvider`] to the model as the `web_search` tool
pub struct WebSearchExecutor {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchExecutor {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub fn tool() -> Tool {
        Tool::new(
            WEB_SEARCH_TOOL,
            "Search the web for current, factual information. Use it when the answer depends on \
             recent events, official rules, prices, opening hours or anything you are not sure about.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        )
    }
}

#[async_trait]
impl ToolExecutor for WebSearchExecutor {
    fn tools(&self) -> Vec<Tool> {
        vec![Self::tool()]
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        if call.name != WEB_SEARCH_TOOL {
            tracing::warn!(tool = %call.name, "Unknown tool requested");
            return ToolResult::failure(&call.id, format!("Unknown tool: {}", call.name));
        }

        let query = match call.str_arg("query").map(str::trim) {
            Some(query) if !query.is_empty() => query,
            _ => {
                tracing::warn!(tool_call_id = %call.id, "web_search called without a query");
                return ToolResult::failure(&call.id, "Search failed: no query was provided.");
            }
        };

        tracing::info!(tool_call_id = %call.id, query = %query, "Running web search");

        match self.provider.search(query).await {
            Ok(response) => {
                tracing::debug!(results = response.results.len(), "Web search completed");
                ToolResult::success(&call.id, render_results(query, &response), response.sources())
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "Web search failed");
                ToolResult::failure(
                    &call.id,
                    "Search failed: the search service is unavailable right now. Answer from what you already know.",
                )
            }
        }
    }
}

/// Text handed back to the model as the tool result
fn render_results(query: &str, response: &SearchResponse) -> String {
    if response.is_empty() {
        return format!("No results found for \"{query}\".");
    }

    let mut text = String::new();
    if let Some(answer) = response.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        text.push_str("Summary: ");
        text.push_str(answer.trim());
        text.push_str("\n\n");
    }

    for (i, hit) in response.results.iter().enumerate() {
        text.push_str(&format!("[{}] {}\n{}\n", i + 1, hit.title, hit.url));
        let snippet = hit.snippet.trim();
        if !snippet.is_empty() {
            text.extend(snippet.chars().take(MAX_SNIPPET_CHARS));
            text.push('\n');
        }
        text.push('\n');
    }

    text.trim_end().to_string()
}
