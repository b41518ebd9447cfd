//! Error types for the coverage engine.

use bcov_rules::RuleError;

/// Errors that can abort a coverage evaluation pass.
///
/// Only configuration-level failures abort the pass; per-document
/// failures are isolated into the report instead.
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// A change type failed to compile. The pass must not proceed with a
    /// partially compiled rule set.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Convenience alias for coverage results.
pub type CoverageResult<T> = Result<T, CoverageError>;
