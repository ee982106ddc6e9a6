mod client;
mod parser;

pub use client::{AnthropicClient, AnthropicConfig};
pub use parser::AnthropicLineParser;
