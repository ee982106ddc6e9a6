//! Reduction of streamed model output into validated structured replies
//!
//! Everything in this crate is a pure function of its input: the parser
//! never fails, validation falls back to defaults, and source ranking has
//! no side effects.

pub mod parser;
pub mod ranker;
pub mod schema;
pub mod schemas;

pub use parser::{parse_full, parse_partial, scan_string_value, Extraction};
pub use ranker::{rank_sources, DomainPolicy, SourceRanker, DEFAULT_TOP_SOURCES};
pub use schema::{validate, validate_text, Schema};
pub use schemas::{
    validate_actions, ChatReply, EmailCategory, EmailClassification, Priority, TaskBreakdown,
    TaskStep, WeeklyDigest,
};

use cadence_types::{ParseTier, ParsedResponse};
use serde_json::Value;

/// Reduce the complete model output of a run to a chat reply
///
/// The returned message is never empty: an empty extracted message is
/// replaced by the trimmed raw text, and by the fallback reply when the raw
/// text is blank as well.
pub fn reduce(raw: &str) -> ParsedResponse {
    let (reply, tier) = match parse_full(raw) {
        Extraction::Strict(object) => (validate::<ChatReply>(&Value::Object(object)), ParseTier::Strict),
        Extraction::Repaired { message } => (
            ChatReply {
                message,
                actions: Vec::new(),
            },
            ParseTier::Repaired,
        ),
        Extraction::RawFallback { text } => (
            ChatReply {
                message: text,
                actions: Vec::new(),
            },
            ParseTier::RawFallback,
        ),
    };

    let message = if !reply.message.trim().is_empty() {
        reply.message
    } else if !raw.trim().is_empty() {
        tracing::debug!(tier = ?tier, "Extracted message is empty, using raw text");
        raw.trim().to_string()
    } else {
        ChatReply::fallback().message
    };

    ParsedResponse {
        message,
        actions: reply.actions,
        raw: raw.to_string(),
        tier,
    }
}
