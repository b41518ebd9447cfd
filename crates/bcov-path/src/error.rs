//! Error types for path parsing.

/// Errors that can occur while compiling a path expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// An unexpected character was encountered.
    #[error("unexpected character `{ch}` at byte {pos} in `{expr}`")]
    UnexpectedChar { expr: String, pos: usize, ch: char },

    /// The expression ended before a token was complete.
    #[error("unexpected end of expression `{expr}`")]
    UnexpectedEnd { expr: String },

    /// A bracketed list index could not be parsed.
    #[error("invalid list index at byte {pos} in `{expr}`: {message}")]
    InvalidIndex {
        expr: String,
        pos: usize,
        message: String,
    },

    /// A filter predicate could not be parsed.
    #[error("invalid filter predicate at byte {pos} in `{expr}`: {message}")]
    InvalidPredicate {
        expr: String,
        pos: usize,
        message: String,
    },
}

/// Convenience alias for path results.
pub type PathResult<T> = Result<T, PathError>;
