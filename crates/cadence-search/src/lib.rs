pub mod executor;
pub mod provider;
pub mod tavily;
pub mod web_search;

pub use executor::{NoTools, ToolExecutor};
pub use provider::{SearchHit, SearchProvider, SearchResponse};
pub use tavily::{TavilyConfig, TavilySearch};
pub use web_search::{WebSearchExecutor, WEB_SEARCH_TOOL};
