//! Mapping from loop events to what the client receives
//!
//! Streaming clients get named SSE events (`token`, `sources`, `done`,
//! `error`); non-streaming clients get a single [`ChatResponseBody`].

use std::convert::Infallible;

use axum::response::sse::Event;
use cadence_agent::{RunHandle, RunOutcome};
use cadence_types::{Action, LoopEvent, Source};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

/// Body of a non-streaming reply
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponseBody {
    pub response: String,
    #[schema(value_type = Vec<Object>)]
    pub sources: Vec<Source>,
    #[schema(value_type = Vec<Object>)]
    pub actions: Vec<Action>,
}

impl From<RunOutcome> for ChatResponseBody {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            response: outcome.response.message,
            sources: outcome.sources,
            actions: outcome.response.actions,
        }
    }
}

/// SSE event name and JSON payload for a loop event
pub fn event_payload(event: &LoopEvent) -> (&'static str, Value) {
    match event {
        LoopEvent::Token { text, preview } => (
            "token",
            json!({
                "text": text,
                "preview": preview
            }),
        ),
        LoopEvent::Sources { sources } => ("sources", json!({ "sources": sources })),
        LoopEvent::Done { response, sources } => (
            "done",
            json!({
                "response": response.message,
                "sources": sources,
                "actions": response.actions
            }),
        ),
        LoopEvent::Error { message } => ("error", json!({ "message": message })),
    }
}

pub fn to_sse_event(event: &LoopEvent) -> Event {
    let (name, payload) = event_payload(event);
    Event::default().event(name).data(payload.to_string())
}

/// Stream a run to the client
///
/// The handle moves into the stream, so when the client goes away and axum
/// drops the response body the run is aborted with it.
pub fn sse_stream(handle: RunHandle) -> impl Stream<Item = Result<Event, Infallible>> {
    handle.map(|event| Ok(to_sse_event(&event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_types::{ParseTier, ParsedResponse};

    fn response(message: &str) -> ParsedResponse {
        ParsedResponse {
            message: message.to_string(),
            actions: vec![Action::ShowSources {
                label: "Show sources".to_string(),
            }],
            raw: format!("{{\"message\":\"{message}\"}}"),
            tier: ParseTier::Strict,
        }
    }

    #[test]
    fn test_token_payload() {
        let (name, payload) = event_payload(&LoopEvent::Token {
            text: "Hel".to_string(),
            preview: Some("Hel".to_string()),
        });
        assert_eq!(name, "token");
        assert_eq!(payload, json!({"text": "Hel", "preview": "Hel"}));

        let (_, payload) = event_payload(&LoopEvent::Token {
            text: "{".to_string(),
            preview: None,
        });
        assert_eq!(payload["preview"], Value::Null);
    }

    #[test]
    fn test_done_payload_flattens_response() {
        let sources = vec![Source::new("USA.gov", "https://www.usa.gov/passport")];
        let (name, payload) = event_payload(&LoopEvent::Done {
            response: response("All set."),
            sources: sources.clone(),
        });

        assert_eq!(name, "done");
        assert_eq!(payload["response"], "All set.");
        assert_eq!(payload["sources"][0]["url"], "https://www.usa.gov/passport");
        assert_eq!(payload["actions"][0]["type"], "show_sources");
        assert!(payload.get("raw").is_none());
    }

    #[test]
    fn test_error_and_sources_payloads() {
        let (name, payload) = event_payload(&LoopEvent::Error {
            message: "Please try again.".to_string(),
        });
        assert_eq!(name, "error");
        assert_eq!(payload, json!({"message": "Please try again."}));

        let (name, payload) = event_payload(&LoopEvent::Sources { sources: vec![] });
        assert_eq!(name, "sources");
        assert_eq!(payload, json!({"sources": []}));
    }

    #[test]
    fn test_outcome_to_body() {
        let body = ChatResponseBody::from(RunOutcome {
            response: response("Done."),
            sources: vec![],
        });
        assert_eq!(body.response, "Done.");
        assert_eq!(body.actions.len(), 1);
    }
}
