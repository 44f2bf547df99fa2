//! Error types for the status board service

/// Errors that can occur in the status board service
#[derive(Debug, thiserror::Error)]
pub enum StatusBoardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{service} returned status {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Display error: {0}")]
    Device(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for status board operations
pub type Result<T> = std::result::Result<T, StatusBoardError>;
