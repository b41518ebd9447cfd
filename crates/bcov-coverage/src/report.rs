//! The coverage report handed to presentation.
//!
//! One entry per evaluated file, one row per delta. The report makes no
//! approve/reject decision; callers render it or feed it into an
//! approval gate.

use serde::Serialize;
use serde_json::Value;

use bcov_diff::DiffType;

use crate::matcher::ChangeCoverage;
use crate::payload::FileFailure;

/// Aggregated coverage over one evaluated bundle change.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CoverageReport {
    /// Per-file coverage, in file order.
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    /// Assemble a report from matched changes and isolated failures.
    pub fn build(changes: &[ChangeCoverage], failures: &[FileFailure]) -> Self {
        let mut files: Vec<FileCoverage> = changes.iter().map(FileCoverage::from_change).collect();
        files.extend(failures.iter().map(FileCoverage::from_failure));
        Self { files }
    }

    /// `true` when every delta of every file is covered and no file
    /// failed evaluation.
    pub fn is_fully_covered(&self) -> bool {
        self.files
            .iter()
            .all(|f| f.error.is_none() && f.diffs.iter().all(|d| d.covered))
    }

    /// Number of deltas without any covering context, counting failed
    /// files as indeterminate (not covered).
    pub fn uncovered_count(&self) -> usize {
        self.files
            .iter()
            .map(|f| {
                if f.error.is_some() {
                    1
                } else {
                    f.diffs.iter().filter(|d| !d.covered).count()
                }
            })
            .sum()
    }
}

/// Coverage for one file.
#[derive(Clone, Debug, Serialize)]
pub struct FileCoverage {
    /// Bundle-relative path.
    pub path: String,
    /// Schema the file is tagged with, if any.
    pub schema: Option<String>,
    /// Populated when the file's diff could not be computed; such a file
    /// is indeterminate and must be treated as uncovered.
    pub error: Option<String>,
    /// One row per delta.
    pub diffs: Vec<DiffRow>,
}

impl FileCoverage {
    fn from_change(change: &ChangeCoverage) -> Self {
        Self {
            path: change.fileref().path.clone(),
            schema: change.fileref().schema.clone(),
            error: None,
            diffs: change.covered_diffs().map(|cd| DiffRow::new(&cd)).collect(),
        }
    }

    fn from_failure(failure: &FileFailure) -> Self {
        Self {
            path: failure.fileref.path.clone(),
            schema: failure.fileref.schema.clone(),
            error: Some(failure.error.clone()),
            diffs: Vec::new(),
        }
    }
}

/// One delta with its coverage annotation.
///
/// The change type, context, and approvers come from the first covering
/// context; [`Self::covered`] reflects any.
#[derive(Clone, Debug, Serialize)]
pub struct DiffRow {
    /// Canonical path of the delta.
    pub path: String,
    /// Kind of delta.
    pub diff_type: DiffType,
    /// Old-side value, when attached.
    pub old: Option<Value>,
    /// New-side value, when attached.
    pub new: Option<Value>,
    /// Whether at least one context covers this delta.
    pub covered: bool,
    /// Name of the first covering change type.
    pub change_type: Option<String>,
    /// Scope description of the first covering context.
    pub context: Option<String>,
    /// Approver usernames of the first covering context.
    pub approvers: Vec<String>,
}

impl DiffRow {
    fn new(cd: &crate::matcher::CoveredDiff<'_>) -> Self {
        let first = cd.covered_by.first();
        Self {
            path: cd.diff.path.to_string(),
            diff_type: cd.diff.diff_type,
            old: cd.diff.old.clone(),
            new: cd.diff.new.clone(),
            covered: cd.is_covered(),
            change_type: first.map(|c| c.change_type_name().to_string()),
            context: first.map(|c| c.context().to_string()),
            approvers: first
                .map(|c| {
                    c.approver_usernames()
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
