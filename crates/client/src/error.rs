use listing_dash_domain::SubmissionError;
use thiserror::Error;

/// Everything that can go wrong talking to the listing-bot service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required")]
    Unauthorized,
    #[error("access denied, not owner")]
    Forbidden,
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    /// 2xx response whose body carried `success: false`.
    #[error("{0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("action {0} is already being verified")]
    AlreadyVerifying(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl ClientError {
    /// Whether the session cookie is missing or expired.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
