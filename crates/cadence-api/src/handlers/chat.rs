use std::sync::Arc;

use axum::{
    extract::State,
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use cadence_types::{HistoryTurn, RunInput};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    relay::{self, ChatResponseBody},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// Free text or a JSON object describing what the user is working on
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub context: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    fn into_input(self) -> ApiResult<(RunInput, bool)> {
        if self.message.trim().is_empty() {
            return Err(ApiError::BadRequest("message must not be empty".to_string()));
        }

        let mut input = RunInput::new(self.message).with_history(self.history);
        if let Some(context) = self.context {
            input = input.with_context(context);
        }
        Ok((input, self.stream))
    }
}

/// Send a message and receive the assistant's reply
///
/// With `stream: true` the reply arrives as Server-Sent Events: `token`,
/// `sources`, then one `done` or `error`. Otherwise the whole reply is
/// returned as JSON once the run ends.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply (JSON, or text/event-stream when streaming)", body = ChatResponseBody),
        (status = 400, description = "Empty message"),
        (status = 502, description = "Upstream model failed"),
        (status = 504, description = "Run timed out")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Response> {
    let (input, stream) = req.into_input()?;
    tracing::debug!(
        stream,
        history = input.history.len(),
        has_context = input.context.is_some(),
        "Chat request accepted"
    );

    if stream {
        let handle = state.controller.spawn_run(input);
        let sse = Sse::new(relay::sse_stream(handle)).keep_alive(KeepAlive::default());
        return Ok(sse.into_response());
    }

    let outcome = state.controller.run_to_completion(input).await?;
    Ok(Json(ChatResponseBody::from(outcome)).into_response())
}
