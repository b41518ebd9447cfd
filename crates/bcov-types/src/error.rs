//! Error types shared by the foundation crate.

/// Errors produced by collaborator interfaces at the bundle boundary.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// A file diff lookup failed at the configuration backend.
    #[error("file diff lookup failed for {file_ref}: {message}")]
    Lookup { file_ref: String, message: String },

    /// The configured resolver does not support lookups.
    #[error("file diff resolution is not available: {0}")]
    ResolverUnavailable(String),
}

impl TypesError {
    /// Create a lookup error for a file reference.
    pub fn lookup(file_ref: impl ToString, message: impl Into<String>) -> Self {
        Self::Lookup {
            file_ref: file_ref.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience alias for foundation results.
pub type TypesResult<T> = Result<T, TypesError>;
