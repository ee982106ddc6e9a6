pub mod content;
pub mod message;
pub mod tool;

pub use content::{Content, ContentBlock};
pub use message::Message;
pub use tool::Tool;
