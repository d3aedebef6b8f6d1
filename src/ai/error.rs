use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by completion endpoint: {0}")]
    RateLimited(String),

    #[error("completion endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("completion response contained no reply")]
    EmptyReply,
}

impl DispatchError {
    pub fn missing_credential(key: &str) -> Self {
        DispatchError::Configuration(format!("{} not found in environment variables", key))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Configuration(_) => "configuration",
            DispatchError::Network(_) => "network",
            DispatchError::RateLimited(_) => "rate_limit",
            DispatchError::Api { .. } => "api",
            DispatchError::MalformedResponse(_) => "malformed_response",
            DispatchError::EmptyReply => "empty_reply",
        }
    }

    /// Whether repeating the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DispatchError::Network(_) | DispatchError::RateLimited(_) => true,
            DispatchError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DispatchError::MalformedResponse(e.to_string())
        } else {
            DispatchError::Network(e.to_string())
        }
    }
}
