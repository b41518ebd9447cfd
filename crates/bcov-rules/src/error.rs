//! Error types for rule compilation.
//!
//! Every variant here is a configuration error: a change type that fails
//! to compile must abort the whole coverage pass, since a silently
//! half-compiled rule set could under- or mis-cover changes.

use bcov_path::PathError;

/// Errors that can occur while compiling a change type.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The detector declares a provider other than the JSON-path provider.
    #[error("`{provider}` is not a supported change detection provider within change type `{change_type}`")]
    UnsupportedProvider {
        change_type: String,
        provider: String,
    },

    /// A context selector declares a trigger other than added/removed.
    #[error("`{when}` is not a supported context trigger within change type `{change_type}` (expected `added` or `removed`)")]
    UnsupportedContextTrigger { change_type: String, when: String },

    /// The change type declares an unknown context file type.
    #[error("`{context_type}` is not a supported context type within change type `{change_type}`")]
    UnsupportedContextType {
        change_type: String,
        context_type: String,
    },

    /// A path selector failed to compile.
    #[error("invalid path selector `{selector}` in change type `{change_type}`: {source}")]
    InvalidSelector {
        change_type: String,
        selector: String,
        #[source]
        source: PathError,
    },
}

/// Convenience alias for rule results.
pub type RuleResult<T> = Result<T, RuleError>;
