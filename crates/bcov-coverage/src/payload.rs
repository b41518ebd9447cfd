//! Raw bundle diff payloads and their conversion into change coverage.
//!
//! The configuration backend reports a proposed bundle change as two maps
//! of per-file entries. Parsing diffs every entry; a failure on one file
//! is isolated into a [`FileFailure`] so sibling files still get
//! coverage. An uncovered or failed file is the safe outcome, never a
//! silently dropped one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bcov_diff::create_bundle_file_change;
use bcov_types::{BundleFileType, FileDiffResolver, FileRef};

use crate::matcher::ChangeCoverage;

/// A proposed bundle change as reported by the configuration backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BundleDiffPayload {
    /// Changed datafiles, keyed by path.
    #[serde(default)]
    pub datafiles: BTreeMap<String, DatafileDiff>,
    /// Changed resourcefiles, keyed by path.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDiff>,
}

/// Before/after content of one changed datafile.
#[derive(Clone, Debug, Deserialize)]
pub struct DatafileDiff {
    pub datafilepath: String,
    #[serde(default)]
    pub datafileschema: Option<String>,
    #[serde(default)]
    pub old: Option<Value>,
    #[serde(default)]
    pub new: Option<Value>,
}

/// Before/after content of one changed resourcefile.
#[derive(Clone, Debug, Deserialize)]
pub struct ResourceDiff {
    pub resourcepath: String,
    #[serde(default)]
    pub old: Option<Value>,
    #[serde(default)]
    pub new: Option<Value>,
}

/// A file whose diff could not be computed.
#[derive(Clone, Debug, Serialize)]
pub struct FileFailure {
    /// Identity of the failed file.
    pub fileref: FileRef,
    /// Why diffing failed.
    pub error: String,
}

/// The outcome of parsing a payload: diffed changes plus isolated
/// per-file failures.
#[derive(Debug, Default)]
pub struct ParsedChanges {
    pub changes: Vec<ChangeCoverage>,
    pub failures: Vec<FileFailure>,
}

/// Diff every file in a payload into change coverage state.
pub fn parse_bundle_changes(payload: &BundleDiffPayload) -> ParsedChanges {
    let mut parsed = ParsedChanges::default();

    for entry in payload.datafiles.values() {
        collect(
            &mut parsed,
            FileRef::new(
                BundleFileType::Datafile,
                entry.datafilepath.clone(),
                entry.datafileschema.clone(),
            ),
            entry.old.clone(),
            entry.new.clone(),
        );
    }
    for entry in payload.resources.values() {
        collect(
            &mut parsed,
            FileRef::resourcefile(entry.resourcepath.clone()),
            entry.old.clone(),
            entry.new.clone(),
        );
    }
    parsed
}

/// Fetch and diff a set of file refs through a [`FileDiffResolver`].
///
/// Lookup failures are isolated per file, like diff failures.
pub fn resolve_bundle_changes(
    resolver: &dyn FileDiffResolver,
    refs: &[FileRef],
) -> ParsedChanges {
    let mut parsed = ParsedChanges::default();
    for fileref in refs {
        match resolver.lookup_file_diff(fileref) {
            Ok((old, new)) => collect(&mut parsed, fileref.clone(), old, new),
            Err(e) => {
                tracing::warn!(file = %fileref, error = %e, "file diff lookup failed");
                parsed.failures.push(FileFailure {
                    fileref: fileref.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    parsed
}

fn collect(parsed: &mut ParsedChanges, fileref: FileRef, old: Option<Value>, new: Option<Value>) {
    match create_bundle_file_change(
        fileref.path.clone(),
        fileref.schema.clone(),
        fileref.file_type,
        old,
        new,
    ) {
        Ok(change) => parsed.changes.push(ChangeCoverage::new(change)),
        Err(e) => {
            tracing::warn!(file = %fileref, error = %e, "diffing failed");
            parsed.failures.push(FileFailure {
                fileref,
                error: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use bcov_types::{NoOpFileDiffResolver, TypesResult};

    fn payload() -> BundleDiffPayload {
        serde_json::from_value(json!({
            "datafiles": {
                "/user.yml": {
                    "datafilepath": "/user.yml",
                    "datafileschema": "/access/user-1.yml",
                    "old": {"roles": []},
                    "new": {"roles": [{"$ref": "/role/a.yml"}]},
                },
            },
            "resources": {
                "/limits.yml": {
                    "resourcepath": "/limits.yml",
                    "old": {"limit": 1},
                    "new": {"limit": 2},
                },
            },
        }))
        .unwrap()
    }

    #[test]
    fn parses_datafiles_and_resources() {
        let parsed = parse_bundle_changes(&payload());
        assert!(parsed.failures.is_empty());
        assert_eq!(parsed.changes.len(), 2);

        let datafile = parsed
            .changes
            .iter()
            .find(|c| c.fileref().file_type == BundleFileType::Datafile)
            .unwrap();
        assert_eq!(
            datafile.fileref().schema.as_deref(),
            Some("/access/user-1.yml")
        );
        assert_eq!(datafile.change().diffs.len(), 1);

        let resource = parsed
            .changes
            .iter()
            .find(|c| c.fileref().file_type == BundleFileType::Resourcefile)
            .unwrap();
        assert_eq!(resource.fileref().schema, None);
    }

    #[test]
    fn depth_bomb_is_isolated_to_its_file() {
        let mut deep_old = json!(1);
        let mut deep_new = json!(2);
        for _ in 0..80 {
            deep_old = json!({ "nested": deep_old });
            deep_new = json!({ "nested": deep_new });
        }
        let payload: BundleDiffPayload = serde_json::from_value(json!({
            "datafiles": {
                "/deep.yml": {
                    "datafilepath": "/deep.yml",
                    "datafileschema": "/s.yml",
                    "old": deep_old,
                    "new": deep_new,
                },
                "/ok.yml": {
                    "datafilepath": "/ok.yml",
                    "datafileschema": "/s.yml",
                    "old": {"a": 1},
                    "new": {"a": 2},
                },
            },
        }))
        .unwrap();

        let parsed = parse_bundle_changes(&payload);
        assert_eq!(parsed.changes.len(), 1);
        assert_eq!(parsed.changes[0].fileref().path, "/ok.yml");
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].fileref.path, "/deep.yml");
    }

    #[test]
    fn resolver_failures_are_isolated() {
        struct OneGoodResolver;
        impl FileDiffResolver for OneGoodResolver {
            fn lookup_file_diff(
                &self,
                file_ref: &FileRef,
            ) -> TypesResult<(Option<Value>, Option<Value>)> {
                if file_ref.path == "/good.yml" {
                    Ok((Some(json!({"a": 1})), Some(json!({"a": 2}))))
                } else {
                    NoOpFileDiffResolver.lookup_file_diff(file_ref)
                }
            }
        }

        let refs = vec![
            FileRef::datafile("/good.yml", "/s.yml"),
            FileRef::datafile("/bad.yml", "/s.yml"),
        ];
        let parsed = resolve_bundle_changes(&OneGoodResolver, &refs);
        assert_eq!(parsed.changes.len(), 1);
        assert_eq!(parsed.changes[0].fileref().path, "/good.yml");
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].fileref.path, "/bad.yml");
    }
}
