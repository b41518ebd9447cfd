//! Error types for the diff crate.

/// Errors that can occur while diffing a document pair.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The document tree exceeded the recursion depth limit.
    #[error("maximum tree depth {limit} exceeded at `{path}`")]
    MaxDepthExceeded { path: String, limit: usize },

    /// Serialization error while computing content digests.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
