use std::sync::Arc;
use std::time::Instant;

use cadence_reduce::SourceRanker;
use cadence_search::ToolExecutor;
use cadence_types::{LoopEvent, RunState, ToolCall, ToolResult};

use crate::controller::{emit, EventSender};
use crate::error::LoopError;

/// Runs the tool calls of one turn, one after another
pub struct ToolRunner {
    executor: Arc<dyn ToolExecutor>,
    ranker: SourceRanker,
}

impl ToolRunner {
    pub fn new(executor: Arc<dyn ToolExecutor>, ranker: SourceRanker) -> Self {
        Self { executor, ranker }
    }

    /// Execute `calls` in request order
    ///
    /// Sources from each result join the run's running list, and whenever a
    /// call contributes sources the ranked list is sent to the client.
    pub async fn run(
        &self,
        calls: &[ToolCall],
        state: &mut RunState,
        events: &EventSender,
    ) -> Result<Vec<ToolResult>, LoopError> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let start = Instant::now();
            let result = self.executor.execute(call).await;

            if result.is_error {
                tracing::warn!(
                    tool_call_id = %call.id,
                    tool = %call.name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call failed"
                );
            } else {
                tracing::debug!(
                    tool_call_id = %call.id,
                    tool = %call.name,
                    sources = result.sources.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call completed"
                );
            }

            if !result.sources.is_empty() {
                state.add_sources(&result.sources);
                let sources = self.ranker.rank(&state.sources);
                emit(events, LoopEvent::Sources { sources }).await?;
            }

            results.push(result);
        }

        Ok(results)
    }
}
