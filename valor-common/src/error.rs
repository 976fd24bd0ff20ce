//! Error types shared by valor crates.

use thiserror::Error;

/// Result type alias using the valor error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for valor.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// External service error
    #[error("External service error: {0}")]
    External(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::WithContext { source, .. } => source.is_rate_limited(),
            _ => false,
        }
    }

    /// Process exit code for CLI front-ends.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,
            Self::InvalidInput(_) => 65,
            Self::NotFound(_) => 66,
            Self::Io(_) => 74,
            Self::RateLimited(_) | Self::External(_) => 69,
            Self::WithContext { source, .. } => source.exit_code(),
            _ => 70,
        }
    }
}
