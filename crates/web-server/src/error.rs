// In crates/web-server/src/error.rs

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] core_types::Error),

    #[error("Failed to bind the server address: {0}")]
    ServerBindError(std::io::Error),

    #[error("Server stopped unexpectedly: {0}")]
    ServeError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Core(core_types::Error::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            Error::Core(core_types::Error::InsufficientData { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Core(core_types::Error::DataUnavailable(_)) => StatusCode::BAD_GATEWAY,
            Error::ServerBindError(_) | Error::ServeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders as `{ "error": "..." }` with a status matching the error kind.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed.");
        } else {
            tracing::warn!(error = %self, "Request rejected.");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
