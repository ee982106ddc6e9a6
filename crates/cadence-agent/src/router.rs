use crate::error::LoopError;
use crate::turn::TurnOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Streaming,
    ExecutingTools,
    Continuing,
    Reducing,
    Done,
}

/// Decides the next loop state:
/// Streaming -> ExecutingTools (if tools requested) -> Continuing -> Streaming -> ... -> Reducing -> Done
#[derive(Debug, Clone, Copy)]
pub struct SimpleRouter {
    max_iterations: usize,
}

impl SimpleRouter {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// `rounds` is the number of tool round trips already completed
    pub fn next(
        &self,
        current: LoopState,
        turn: Option<&TurnOutcome>,
        rounds: usize,
    ) -> Result<LoopState, LoopError> {
        match current {
            LoopState::Streaming => match turn {
                Some(turn) if turn.requests_tools() => {
                    if rounds >= self.max_iterations {
                        Err(LoopError::IterationLimit(self.max_iterations))
                    } else {
                        Ok(LoopState::ExecutingTools)
                    }
                }
                Some(turn) => {
                    if !turn.tool_calls.is_empty() {
                        tracing::debug!(
                            stop_reason = ?turn.stop_reason,
                            "Ignoring tool calls from a turn that did not stop for tools"
                        );
                    }
                    Ok(LoopState::Reducing)
                }
                None => Ok(LoopState::Reducing),
            },
            LoopState::ExecutingTools => Ok(LoopState::Continuing),
            LoopState::Continuing => Ok(LoopState::Streaming),
            LoopState::Reducing | LoopState::Done => Ok(LoopState::Done),
        }
    }
}
