//! Bundle file identity: file kinds and file references.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a file within a configuration bundle.
///
/// Datafiles are schema-tagged structured documents; resourcefiles are
/// free-form payloads referenced from datafiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFileType {
    Datafile,
    Resourcefile,
}

impl fmt::Display for BundleFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Datafile => write!(f, "datafile"),
            Self::Resourcefile => write!(f, "resourcefile"),
        }
    }
}

/// Identifies a single file within a bundle.
///
/// A `FileRef` is the unit of ownership resolution: coverage contexts and
/// role bindings are keyed by it. Equality and hashing cover all three
/// fields so refs can serve as map keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileRef {
    /// The kind of file.
    pub file_type: BundleFileType,
    /// The bundle-relative path of the file.
    pub path: String,
    /// The schema the file is tagged with, if any. Resourcefiles
    /// typically carry no schema.
    pub schema: Option<String>,
}

impl FileRef {
    /// Create a new file reference.
    pub fn new(
        file_type: BundleFileType,
        path: impl Into<String>,
        schema: Option<String>,
    ) -> Self {
        Self {
            file_type,
            path: path.into(),
            schema,
        }
    }

    /// Shorthand for a schema-tagged datafile reference.
    pub fn datafile(path: impl Into<String>, schema: impl Into<String>) -> Self {
        Self::new(BundleFileType::Datafile, path, Some(schema.into()))
    }

    /// Shorthand for a resourcefile reference (no schema).
    pub fn resourcefile(path: impl Into<String>) -> Self {
        Self::new(BundleFileType::Resourcefile, path, None)
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_type, self.path)
    }
}
