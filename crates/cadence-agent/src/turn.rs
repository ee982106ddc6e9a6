use std::collections::HashMap;

use cadence_llm::{EventStream, StreamEvent, STOP_REASON_TOOL_USE};
use cadence_reduce::parse_partial;
use cadence_types::{LoopEvent, PendingToolCall, RunState, ToolCall};
use futures::StreamExt;

use crate::controller::{emit, EventSender};
use crate::error::LoopError;

/// What one upstream turn produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Text streamed during this turn only
    pub text: String,
    /// Completed tool calls, in the order they were opened
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: Option<String>,
}

impl TurnOutcome {
    pub fn requests_tools(&self) -> bool {
        self.stop_reason.as_deref() == Some(STOP_REASON_TOOL_USE) && !self.tool_calls.is_empty()
    }
}

/// Assembles tool calls from start/input/stop events of one turn
///
/// Events for ids that were never opened are ignored. A call whose input is
/// not a JSON object is discarded, and so is any call still open when the
/// turn ends.
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    pending: HashMap<String, (usize, PendingToolCall)>,
    completed: Vec<(usize, ToolCall)>,
    opened: usize,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, id: String, name: String) {
        let seq = self.opened;
        self.opened += 1;
        if self
            .pending
            .insert(id.clone(), (seq, PendingToolCall::new(id.clone(), name)))
            .is_some()
        {
            tracing::warn!(tool_call_id = %id, "Tool call reopened, discarding earlier input");
        }
    }

    pub fn input(&mut self, id: &str, fragment: &str) {
        match self.pending.get_mut(id) {
            Some((_, call)) => call.push_input(fragment),
            None => tracing::debug!(tool_call_id = %id, "Dropping input for unknown tool call"),
        }
    }

    pub fn stop(&mut self, id: &str) {
        let Some((seq, call)) = self.pending.remove(id) else {
            tracing::debug!(tool_call_id = %id, "Ignoring stop for unknown tool call");
            return;
        };

        let name = call.name.clone();
        match call.complete() {
            Ok(call) => self.completed.push((seq, call)),
            Err(e) => {
                tracing::warn!(tool_call_id = %id, tool = %name, error = %e, "Discarding tool call with invalid input");
            }
        }
    }

    pub fn finish(mut self) -> Vec<ToolCall> {
        for (id, (_, call)) in self.pending.drain() {
            tracing::warn!(tool_call_id = %id, tool = %call.name, "Discarding tool call that never finished");
        }
        self.completed.sort_by_key(|(seq, _)| *seq);
        self.completed.into_iter().map(|(_, call)| call).collect()
    }
}

/// Consume one upstream stream, forwarding tokens as they arrive
///
/// Each token is handed to the relay before the next upstream read. A stream
/// that ends without a stop event counts as a stop with no reason.
pub async fn stream_turn(
    mut stream: EventStream,
    state: &mut RunState,
    events: &EventSender,
    live_preview: bool,
) -> Result<TurnOutcome, LoopError> {
    let mut text = String::new();
    let mut tracker = ToolCallTracker::new();
    let mut stop_reason = None;
    let mut stopped = false;

    while let Some(item) = stream.next().await {
        let event = item.map_err(LoopError::transport)?;

        match event {
            StreamEvent::TokenDelta { text: delta } => {
                if delta.is_empty() {
                    continue;
                }
                text.push_str(&delta);
                state.append_text(&delta);
                let preview = live_preview.then(|| parse_partial(&state.reduction_buffer));
                emit(events, LoopEvent::Token { text: delta, preview }).await?;
            }
            StreamEvent::ToolUseStart { id, name } => {
                tracing::debug!(tool_call_id = %id, tool = %name, "Tool call started");
                tracker.start(id, name);
            }
            StreamEvent::ToolInputDelta { id, partial_json } => tracker.input(&id, &partial_json),
            StreamEvent::ToolUseStop { id } => tracker.stop(&id),
            StreamEvent::MessageStop { stop_reason: reason } => {
                stop_reason = reason;
                stopped = true;
                break;
            }
            StreamEvent::Error { message } => return Err(LoopError::Upstream(message)),
        }
    }

    if !stopped {
        tracing::debug!(run_id = %state.run_id, "Upstream stream ended without a stop event");
    }

    Ok(TurnOutcome {
        text,
        tool_calls: tracker.finish(),
        stop_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_assembles_calls_in_open_order() {
        let mut tracker = ToolCallTracker::new();
        tracker.start("a".into(), "web_search".into());
        tracker.start("b".into(), "web_search".into());
        tracker.input("b", r#"{"query":"second"}"#);
        tracker.input("a", r#"{"query":"#);
        tracker.input("a", r#""first"}"#);
        tracker.stop("b");
        tracker.stop("a");

        let calls = tracker.finish();
        let queries: Vec<_> = calls.iter().map(|c| c.str_arg("query").unwrap()).collect();
        assert_eq!(queries, vec!["first", "second"]);
    }

    #[test]
    fn test_tracker_ignores_unknown_and_discards_invalid() {
        let mut tracker = ToolCallTracker::new();
        tracker.input("ghost", "{}");
        tracker.stop("ghost");

        tracker.start("bad".into(), "web_search".into());
        tracker.input("bad", r#"{"query": "unterminated"#);
        tracker.stop("bad");

        tracker.start("open".into(), "web_search".into());

        assert!(tracker.finish().is_empty());
    }

    #[test]
    fn test_requests_tools_needs_reason_and_calls() {
        let mut outcome = TurnOutcome {
            stop_reason: Some("tool_use".into()),
            ..Default::default()
        };
        assert!(!outcome.requests_tools());

        outcome.tool_calls.push(ToolCall::new("a", "web_search", Default::default()));
        assert!(outcome.requests_tools());

        outcome.stop_reason = Some("end_turn".into());
        assert!(!outcome.requests_tools());
    }
}
