use thiserror::Error;

/// Failure of a single data-source request.
///
/// `Display` output is what the dashboard shows in its error banner, so
/// `Server` renders only the server-provided message (often just the status
/// code).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    Server(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Server(format!("invalid response body: {err}"))
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
