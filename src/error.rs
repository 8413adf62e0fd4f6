//! Muninn error types

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    // Collaborator errors
    /// Context-store read or write failed. The tracker logs these and
    /// degrades to "no context"; they only cross the public API through
    /// the [`ContextStore`](crate::ContextStore) trait itself.
    #[error("context store error: {0}")]
    Store(String),

    /// Tool execution failed. The speculative executor logs these and
    /// discards the prefetch; they only cross the public API through
    /// the [`ToolExecutor`](crate::ToolExecutor) trait itself.
    #[error("tool execution error: {0}")]
    Tool(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("no tool executor configured")]
    NoToolExecutor,

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
