//! Upstream fetch errors.

use thiserror::Error;

/// Failure of an upstream fetch. Never cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),

    /// Error text reported by the upstream service itself.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Text shown to the user who issued the command.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::NotFound { what } => format!("That {} could not be found!", what),
            FetchError::UpstreamStatus(code) => {
                format!("The service gave us a {}! Try again later!", code)
            }
            FetchError::Upstream(message) => message.clone(),
            FetchError::Timeout => "The service took too long to respond! Try again later!".into(),
            FetchError::Transport(_) | FetchError::Decode(_) => {
                "An error occurred with the API!".into()
            }
        }
    }

    /// Whether re-issuing the command later might succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::NotFound { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}
