//! The [`FileDiffResolver`] trait defining the document fetch interface.
//!
//! The coverage engine never talks to the configuration backend itself;
//! callers hand it before/after document content through this trait.

use serde_json::Value;

use crate::error::{TypesError, TypesResult};
use crate::fileref::FileRef;

/// Resolves the before/after content of a bundle file.
///
/// Implementations must be thread-safe (`Send + Sync`). Either side of the
/// returned pair may be `None` when the file did not exist on that side
/// (file creation or deletion).
pub trait FileDiffResolver: Send + Sync {
    /// Fetch the (old, new) content for a file reference.
    fn lookup_file_diff(&self, file_ref: &FileRef)
        -> TypesResult<(Option<Value>, Option<Value>)>;
}

/// A resolver that refuses every lookup.
///
/// Used in contexts where coverage evaluation is driven entirely from an
/// already-materialized change set and any lookup indicates a wiring bug.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpFileDiffResolver;

impl FileDiffResolver for NoOpFileDiffResolver {
    fn lookup_file_diff(
        &self,
        file_ref: &FileRef,
    ) -> TypesResult<(Option<Value>, Option<Value>)> {
        Err(TypesError::ResolverUnavailable(format!(
            "NoOpFileDiffResolver cannot look up {file_ref}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_resolver_refuses_lookups() {
        let resolver = NoOpFileDiffResolver;
        let err = resolver
            .lookup_file_diff(&FileRef::datafile("/a.yml", "/schema-1.yml"))
            .unwrap_err();
        assert!(matches!(err, TypesError::ResolverUnavailable(_)));
    }
}
