//! Ownership context extraction.
//!
//! Determines which entities own a given bundle file change under a
//! change type. The common case is direct ownership (the changed file's
//! schema is the change type's own schema); the interesting case is
//! cross-document ownership, where a detector's context selector finds
//! the owning entities referenced from the changed document.

use std::collections::BTreeSet;

use serde_json::Value;

use bcov_diff::BundleFileChange;
use bcov_path::PathExpr;
use bcov_types::{BundleFileType, FileRef};

use crate::processor::{ChangeTypeProcessor, ContextWhen};

/// Find the owning entities affected by `change` under `processor`.
///
/// - A change type without detectors owns nothing.
/// - If the changed file's schema is the change type's context schema,
///   the file itself is the context (no detector logic consulted).
/// - Otherwise every detector matching the changed file's schema and
///   declaring a context selector contributes the references that were
///   added to (or removed from, per its trigger) the document; each
///   becomes a datafile ref under the change type's context schema.
pub fn extract_context(
    change: &BundleFileChange,
    processor: &ChangeTypeProcessor,
) -> Vec<FileRef> {
    if processor.def().changes.is_empty() {
        return Vec::new();
    }

    if processor.context_schema() == change.fileref.schema.as_deref() {
        return vec![change.fileref.clone()];
    }

    let mut contexts = Vec::new();
    for detector in processor.detectors() {
        let Some(ctx) = &detector.context else {
            continue;
        };
        if detector.change_schema.as_deref() != change.fileref.schema.as_deref() {
            continue;
        }

        let old_refs = string_leaf_values(&ctx.selector, change.old.as_ref());
        let new_refs = string_leaf_values(&ctx.selector, change.new.as_ref());
        let affected: Vec<&String> = match ctx.when {
            ContextWhen::Added => new_refs.difference(&old_refs).collect(),
            ContextWhen::Removed => old_refs.difference(&new_refs).collect(),
        };

        contexts.extend(affected.into_iter().map(|path| {
            FileRef::new(
                BundleFileType::Datafile,
                path.clone(),
                processor.context_schema().map(str::to_string),
            )
        }));
    }
    contexts
}

/// Collect the set of string leaf values a selector matches in `content`.
///
/// Context selectors resolve owners by file path, so only string values
/// participate; anything else is skipped.
fn string_leaf_values(selector: &PathExpr, content: Option<&Value>) -> BTreeSet<String> {
    let Some(content) = content else {
        return BTreeSet::new();
    };
    let mut values = BTreeSet::new();
    for m in selector.find(content) {
        match m.value {
            Value::String(s) => {
                values.insert(s.clone());
            }
            other => {
                tracing::debug!(path = %m.path, value = %other, "ignoring non-string context value");
            }
        }
    }
    values
}
