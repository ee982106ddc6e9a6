use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadence_agent::LoopError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Run failed: {0}")]
    Run(#[from] LoopError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Run(ref e) => {
                tracing::error!("Run error: {}", e);
                let status = match e {
                    LoopError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    LoopError::Transport(_) | LoopError::Upstream(_) => StatusCode::BAD_GATEWAY,
                    LoopError::IterationLimit(_) | LoopError::ClientDisconnected => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.user_message().to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
