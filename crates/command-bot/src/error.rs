//! Application error types.

use api_clients::FetchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use discord_client::DiscordError;
use interactive::Reply;
use serde::Serialize;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Upstream error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),

    #[error("Invalid request signature")]
    InvalidSignature,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Ephemeral reply telling the invoking user what went wrong.
    pub fn to_reply(&self) -> Reply {
        match self {
            AppError::Fetch(e) => Reply::error(e.user_message()),
            AppError::BadRequest(message) => Reply::error(message),
            _ => Reply::error("An error occurred while running this command!"),
        }
    }
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::InvalidSignature => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            AppError::Fetch(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Discord(_) => (StatusCode::BAD_GATEWAY, "DISCORD_API_ERROR"),
            AppError::Config(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::BadRequest(format!("Malformed interaction: {}", e))
    }
}
