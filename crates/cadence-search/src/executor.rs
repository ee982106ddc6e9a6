use async_trait::async_trait;
use cadence_llm::Tool;
use cadence_types::{ToolCall, ToolResult};

/// Executes model-requested tool calls
///
/// Execution is infallible from the caller's side: provider failures come
/// back as a [`ToolResult`] with `is_error` set and a text the model can
/// read, so the conversation can continue without the tool output.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools declared to the model
    fn tools(&self) -> Vec<Tool>;

    async fn execute(&self, call: &ToolCall) -> ToolResult;
}

/// Executor that declares no tools
pub struct NoTools;

#[async_trait]
impl ToolExecutor for NoTools {
    fn tools(&self) -> Vec<Tool> {
        Vec::new()
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        tracing::warn!(tool = %call.name, "Tool requested but no tools are available");
        ToolResult::failure(&call.id, format!("Unknown tool: {}", call.name))
    }
}
