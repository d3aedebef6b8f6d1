use thiserror::Error;

/// Failures of a user action. The display text is the inline message shown next to the action.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("{name} is {size_mb:.2} MB, above the {limit_mb:.0} MB limit")]
    TooLarge { name: String, size_mb: f64, limit_mb: f64 },

    #[error("Error saving {0}")]
    SaveFailed(String),

    #[error("Could not fetch resource: {0}")]
    FetchFailed(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Error deleting file: {0}")]
    DeleteFailed(String),

    #[error("No text could be extracted from {0}")]
    NoText(String),

    #[error("LLM API not configured: {0}")]
    LlmUnavailable(String),
}
