//! Error taxonomy for dockhand.

/// dockhand errors.
#[derive(Debug, thiserror::Error)]
pub enum DockhandError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{program} failed with exit code {code}")]
    ProcessFailed { program: String, code: i32 },

    #[error("Docker build failed")]
    BuildFailed { tag: String },

    #[error("Docker push failed")]
    PushFailed { tag: String },

    #[error("git error: {0}")]
    Git(String),

    #[error("checks API error: {0}")]
    ChecksApi(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DockhandError {
    fn from(err: reqwest::Error) -> Self {
        DockhandError::Http(err.to_string())
    }
}

/// Result type for dockhand operations.
pub type Result<T> = std::result::Result<T, DockhandError>;
