//! Bundle file changes: a diffed (old, new) document pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bcov_types::{BundleFileType, FileRef};

use crate::diff::{Diff, Differ};
use crate::error::{DiffError, DiffResult};

/// BLAKE3 digest of a document's canonical JSON serialization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentSha(String);

impl ContentSha {
    /// Digest a document tree.
    pub fn of_value(value: &Value) -> DiffResult<Self> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| DiffError::Serialization(e.to_string()))?;
        Ok(Self(blake3::hash(&bytes).to_hex().to_string()))
    }

    /// Hex form of the digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single bundle file's change: before/after content plus the deltas
/// between them.
///
/// Created once per evaluation run and discarded after reporting. Whole
/// document creation and deletion produce no field-level deltas; they are
/// reported through [`Self::is_file_creation`] / [`Self::is_file_deletion`].
#[derive(Clone, Debug, PartialEq)]
pub struct BundleFileChange {
    /// Identity of the changed file.
    pub fileref: FileRef,
    /// Content before the change, if the file existed.
    pub old: Option<Value>,
    /// Content after the change, if the file still exists.
    pub new: Option<Value>,
    /// Field-level deltas between old and new.
    pub diffs: Vec<Diff>,
    /// Digest of the old content.
    pub old_content_sha: Option<ContentSha>,
    /// Digest of the new content.
    pub new_content_sha: Option<ContentSha>,
}

impl BundleFileChange {
    /// `true` when the file did not exist before this change.
    pub fn is_file_creation(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }

    /// `true` when the file no longer exists after this change.
    pub fn is_file_deletion(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }
}

/// Diff an (old, new) document pair into a [`BundleFileChange`].
///
/// JSON `null` content is treated as an absent side. Field-level deltas
/// are only computed when both sides are present.
pub fn create_bundle_file_change(
    path: impl Into<String>,
    schema: Option<String>,
    file_type: BundleFileType,
    old: Option<Value>,
    new: Option<Value>,
) -> DiffResult<BundleFileChange> {
    let fileref = FileRef::new(file_type, path, schema);
    let old = old.filter(|v| !v.is_null());
    let new = new.filter(|v| !v.is_null());

    let diffs = match (&old, &new) {
        (Some(old_content), Some(new_content)) => {
            Differ::default().diff(old_content, new_content)?
        }
        _ => Vec::new(),
    };

    let old_content_sha = old.as_ref().map(ContentSha::of_value).transpose()?;
    let new_content_sha = new.as_ref().map(ContentSha::of_value).transpose()?;

    Ok(BundleFileChange {
        fileref,
        old,
        new,
        diffs,
        old_content_sha,
        new_content_sha,
    })
}
