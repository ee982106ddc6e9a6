pub mod builder;
pub mod controller;
pub mod error;
pub mod prompt;
pub mod router;
pub mod tools;
pub mod turn;

pub use builder::ControllerBuilder;
pub use controller::{Controller, EventSender, RunHandle, RunOutcome};
pub use error::LoopError;
pub use router::{LoopState, SimpleRouter};
pub use tools::ToolRunner;
pub use turn::{ToolCallTracker, TurnOutcome};

// Re-export key types from cadence-types
pub use cadence_types::{LLMConfig, LoopConfig, LoopEvent, RunInput};
