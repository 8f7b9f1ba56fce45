//! Shared HTTP plumbing for upstream clients.

use crate::error::FetchError;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("command-bot/", env!("CARGO_PKG_VERSION"));

/// Build a client whose requests fail with [`FetchError::Timeout`] after `timeout`.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::from)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Pass successful responses through; map everything else to a fetch error.
///
/// A 404 becomes `NotFound { what }`. Other statuses use the service's own
/// `{"error": ...}` message when it sends one.
pub(crate) async fn check_status(
    response: Response,
    what: &'static str,
) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 404 {
        return Err(FetchError::NotFound { what });
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error: Some(message) }) if !message.is_empty() => {
            Err(FetchError::Upstream(message))
        }
        _ => Err(FetchError::UpstreamStatus(status.as_u16())),
    }
}

/// Strip a JSONP wrapper (`callback(...);`) down to its JSON payload.
pub(crate) fn strip_jsonp(body: &str) -> Option<&str> {
    let start = body.find('(')?;
    let end = body.rfind(')')?;
    (end > start).then(|| body[start + 1..end].trim())
}
