//! Error taxonomy for chat API operations

/// Errors surfaced by the chat repository
///
/// Repository errors propagate unmodified to the store layer; the store is
/// responsible for converting them into display-safe strings.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Transport or connectivity failure
    #[error("network error: {0}")]
    Network(String),

    /// Missing, expired, or invalid credentials
    #[error("authentication required: {0}")]
    Auth(String),

    /// Request rejected as malformed (e.g. empty send)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Thread or message no longer exists
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response from the server
    #[error("api error (status {status}): {detail}")]
    Api { status: u16, detail: String },
}

impl ChatError {
    /// Map an HTTP status code to the error taxonomy
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::Validation("rejected by server".to_string()),
            401 | 403 => Self::Auth(format!("server returned {}", status)),
            404 => Self::NotFound("resource does not exist".to_string()),
            _ => Self::Api {
                status,
                detail: "unexpected response".to_string(),
            },
        }
    }

    /// Whether this error indicates missing or expired credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<ureq::Error> for ChatError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::from_status(code),
            e => Self::Network(e.to_string()),
        }
    }
}
