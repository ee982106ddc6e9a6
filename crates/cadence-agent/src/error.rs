use std::time::Duration;

use thiserror::Error;

/// Reasons a run ends without a reply
#[derive(Debug, Error)]
pub enum LoopError {
    /// Upstream call could not be made or its byte stream broke
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// Upstream delivered an explicit error event
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("model still requested tools after {0} round trips")]
    IterationLimit(usize),

    #[error("run exceeded its deadline of {0:?}")]
    Timeout(Duration),

    #[error("client disconnected")]
    ClientDisconnected,
}

impl LoopError {
    /// Text safe to show the end user
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::Upstream(_) => {
                "Something went wrong while generating a reply. Please try again."
            }
            Self::IterationLimit(_) => {
                "I couldn't finish looking that up. Try asking in a slightly different way."
            }
            Self::Timeout(_) => "That took longer than expected. Please try again.",
            Self::ClientDisconnected => "The request was cancelled.",
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_details() {
        let err = LoopError::transport("connection reset by peer at 10.0.0.3:443");
        assert!(!err.user_message().contains("10.0.0.3"));
        assert!(err.to_string().contains("10.0.0.3"));
    }
}
