use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors raised while driving the browser or running a harvest
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Response listener '{name}' failed: {reason}")]
    ListenerFailed { name: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
