use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LarkError {
    /// The response body could not be encoded.
    #[error("failed to encode response body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request was cancelled while parked in a long poll.
    #[error("request cancelled while waiting for updates")]
    Cancelled,
}

impl IntoResponse for LarkError {
    fn into_response(self) -> Response {
        match self {
            LarkError::Encode(err) => {
                tracing::error!("failed to marshal data, err: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server err").into_response()
            }
            LarkError::Cancelled => {
                (StatusCode::REQUEST_TIMEOUT, "timeout").into_response()
            }
        }
    }
}
