//! Coverage matching: associating deltas with the contexts that cover
//! them.
//!
//! A [`ChangeCoverage`] wraps a diffed [`BundleFileChange`] with one
//! coverage list per delta. Matching evaluates the context's allowed
//! paths against the right document side -- added fields only exist in
//! the new content, a removed field's authorizing subtree only in the old
//! -- and prefix-matches delta paths at segment boundaries, so one
//! selector can authorize an entire subtree.

use std::sync::Arc;

use bcov_diff::{BundleFileChange, Diff, DiffType};
use bcov_path::{covers, Path};
use bcov_types::FileRef;

use crate::context::ChangeTypeContext;

/// A delta together with the contexts covering it.
#[derive(Clone, Debug)]
pub struct CoveredDiff<'a> {
    /// The delta.
    pub diff: &'a Diff,
    /// Contexts covering it; empty means the delta requires review
    /// outside self-service.
    pub covered_by: &'a [Arc<ChangeTypeContext>],
}

impl CoveredDiff<'_> {
    /// `true` when at least one context covers this delta.
    pub fn is_covered(&self) -> bool {
        !self.covered_by.is_empty()
    }
}

/// A bundle file change under coverage evaluation.
///
/// Coverage state is per delta and accumulates across
/// [`Self::cover_changes`] calls; a delta may end up covered by several
/// contexts independently.
#[derive(Debug)]
pub struct ChangeCoverage {
    change: BundleFileChange,
    coverage: Vec<Vec<Arc<ChangeTypeContext>>>,
}

impl ChangeCoverage {
    /// Start coverage evaluation for a diffed file change.
    pub fn new(change: BundleFileChange) -> Self {
        let coverage = vec![Vec::new(); change.diffs.len()];
        Self { change, coverage }
    }

    /// The underlying file change.
    pub fn change(&self) -> &BundleFileChange {
        &self.change
    }

    /// Identity of the changed file.
    pub fn fileref(&self) -> &FileRef {
        &self.change.fileref
    }

    /// The deltas with their current coverage.
    pub fn covered_diffs(&self) -> impl Iterator<Item = CoveredDiff<'_>> {
        self.change
            .diffs
            .iter()
            .zip(&self.coverage)
            .map(|(diff, covered_by)| CoveredDiff { diff, covered_by })
    }

    /// `true` when every delta has at least one covering context.
    pub fn is_fully_covered(&self) -> bool {
        self.coverage.iter().all(|c| !c.is_empty())
    }

    /// Apply a coverage context to this change.
    ///
    /// Added and changed deltas are matched against the context's allowed
    /// paths evaluated on the new content, removed deltas against the old
    /// content. Returns the paths of all deltas this context matches.
    ///
    /// Applying the same logical context twice is idempotent: a context
    /// is appended to a delta's coverage at most once per
    /// (change type, scope) pair.
    pub fn cover_changes(&mut self, context: &Arc<ChangeTypeContext>) -> Vec<Path> {
        let allowed_new = self.change.new.as_ref().map(|content| {
            context
                .processor()
                .allowed_changed_paths(&self.change.fileref, content)
        });
        let allowed_old = self.change.old.as_ref().map(|content| {
            context
                .processor()
                .allowed_changed_paths(&self.change.fileref, content)
        });

        let mut matched = Vec::new();
        for (i, diff) in self.change.diffs.iter().enumerate() {
            let allowed = match diff.diff_type {
                DiffType::Added | DiffType::Changed => allowed_new.as_deref(),
                DiffType::Removed => allowed_old.as_deref(),
            };
            let Some(allowed) = allowed else {
                continue;
            };

            let path_str = diff.path.to_string();
            if allowed.iter().any(|ap| covers(ap, &path_str)) {
                matched.push(diff.path.clone());
                let slot = &mut self.coverage[i];
                if !slot.iter().any(|c| c.same_scope(context)) {
                    slot.push(Arc::clone(context));
                }
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    use bcov_diff::create_bundle_file_change;
    use bcov_rules::{ChangeTypeDef, ChangeTypeProcessor};
    use bcov_types::{Approver, BundleFileType, User};

    fn saas_file_context() -> Arc<ChangeTypeContext> {
        let def: ChangeTypeDef = serde_json::from_value(json!({
            "name": "saas-file-owner",
            "contextType": "datafile",
            "contextSchema": "/app-sre/saas-file.yml",
            "changes": [{
                "provider": "jsonPath",
                "jsonPathSelectors": ["resourceTemplates[*].targets[*].ref"],
            }],
        }))
        .unwrap();
        Arc::new(ChangeTypeContext::new(
            Arc::new(ChangeTypeProcessor::compile(def).unwrap()),
            "RoleV1 - role-1",
            vec![Arc::new(User::new("user")) as Arc<dyn Approver>],
        ))
    }

    fn saas_subtree_context() -> Arc<ChangeTypeContext> {
        let def: ChangeTypeDef = serde_json::from_value(json!({
            "name": "saas-template-owner",
            "contextType": "datafile",
            "contextSchema": "/app-sre/saas-file.yml",
            "changes": [{
                "provider": "jsonPath",
                "jsonPathSelectors": ["resourceTemplates[0]"],
            }],
        }))
        .unwrap();
        Arc::new(ChangeTypeContext::new(
            Arc::new(ChangeTypeProcessor::compile(def).unwrap()),
            "RoleV1 - role-1",
            vec![Arc::new(User::new("user")) as Arc<dyn Approver>],
        ))
    }

    fn saas_file_content(target_ref: &str, name: &str) -> Value {
        json!({
            "name": name,
            "resourceTemplates": [
                {"name": "rt-1", "targets": [{"ref": target_ref}]},
                {"name": "rt-2", "targets": [{"ref": "stable"}]},
            ],
        })
    }

    fn saas_change(old: Value, new: Value) -> ChangeCoverage {
        ChangeCoverage::new(
            create_bundle_file_change(
                "/saas.yml",
                Some("/app-sre/saas-file.yml".to_string()),
                BundleFileType::Datafile,
                Some(old),
                Some(new),
            )
            .unwrap(),
        )
    }

    fn coverage_by_path(cc: &ChangeCoverage) -> Vec<(String, usize)> {
        cc.covered_diffs()
            .map(|cd| (cd.diff.path.to_string(), cd.covered_by.len()))
            .collect()
    }

    #[test]
    fn authorized_change_is_covered() {
        let mut cc = saas_change(
            saas_file_content("old-ref", "app"),
            saas_file_content("new-ref", "app"),
        );
        let matched = cc.cover_changes(&saas_file_context());
        assert_eq!(matched.len(), 1);
        assert!(cc.is_fully_covered());
        assert_eq!(
            coverage_by_path(&cc),
            vec![("resourceTemplates.[0].targets.[0].ref".to_string(), 1)]
        );
    }

    #[test]
    fn unauthorized_change_stays_uncovered() {
        let mut cc = saas_change(
            saas_file_content("ref", "old-name"),
            saas_file_content("ref", "new-name"),
        );
        cc.cover_changes(&saas_file_context());
        assert!(!cc.is_fully_covered());
        assert_eq!(coverage_by_path(&cc), vec![("name".to_string(), 0)]);
    }

    #[test]
    fn partially_covered_change() {
        let mut cc = saas_change(
            saas_file_content("old-ref", "old-name"),
            saas_file_content("new-ref", "new-name"),
        );
        cc.cover_changes(&saas_file_context());
        assert!(!cc.is_fully_covered());
        for cd in cc.covered_diffs() {
            match cd.diff.path.to_string().as_str() {
                "name" => assert!(!cd.is_covered()),
                "resourceTemplates.[0].targets.[0].ref" => {
                    assert_eq!(cd.covered_by.len(), 1);
                    assert_eq!(cd.covered_by[0].approver_usernames(), vec!["user"]);
                }
                other => panic!("unexpected change path {other}"),
            }
        }
    }

    #[test]
    fn allowed_subtree_covers_deltas_beneath_it() {
        let mut cc = saas_change(
            saas_file_content("old-ref", "app"),
            saas_file_content("new-ref", "app"),
        );
        let matched = cc.cover_changes(&saas_subtree_context());
        // the delta sits below the authorized resourceTemplates.[0] root
        assert_eq!(matched.len(), 1);
        assert!(cc.is_fully_covered());
    }

    #[test]
    fn sibling_index_is_not_covered() {
        // change in resourceTemplates[1] while only [0] is authorized
        let old = json!({"resourceTemplates": [
            {"name": "rt-1", "targets": [{"ref": "a"}]},
            {"name": "rt-2", "targets": [{"ref": "b"}]},
        ]});
        let new = json!({"resourceTemplates": [
            {"name": "rt-1", "targets": [{"ref": "a"}]},
            {"name": "rt-2", "targets": [{"ref": "changed"}]},
        ]});
        let mut cc = saas_change(old, new);
        cc.cover_changes(&saas_subtree_context());
        assert!(!cc.is_fully_covered());
    }

    #[test]
    fn cover_changes_is_idempotent() {
        let mut cc = saas_change(
            saas_file_content("old-ref", "app"),
            saas_file_content("new-ref", "app"),
        );
        let ctx = saas_file_context();
        cc.cover_changes(&ctx);
        cc.cover_changes(&ctx);
        // an equivalent context built separately must also dedupe
        cc.cover_changes(&saas_file_context());
        assert_eq!(
            coverage_by_path(&cc),
            vec![("resourceTemplates.[0].targets.[0].ref".to_string(), 1)]
        );
    }

    #[test]
    fn distinct_scopes_accumulate() {
        let mut cc = saas_change(
            saas_file_content("old-ref", "app"),
            saas_file_content("new-ref", "app"),
        );
        cc.cover_changes(&saas_file_context());
        cc.cover_changes(&saas_subtree_context());
        assert_eq!(
            coverage_by_path(&cc),
            vec![("resourceTemplates.[0].targets.[0].ref".to_string(), 2)]
        );
    }

    #[test]
    fn removed_deltas_match_against_old_content() {
        // the whole second template disappears; the authorizing subtree
        // only exists in the old content
        let old = json!({"resourceTemplates": [
            {"name": "rt-1", "targets": [{"ref": "a"}]},
            {"name": "rt-2", "targets": [{"ref": "b"}]},
        ]});
        let new = json!({"resourceTemplates": [
            {"name": "rt-1", "targets": [{"ref": "a"}]},
        ]});
        let def: ChangeTypeDef = serde_json::from_value(json!({
            "name": "template-remover",
            "contextType": "datafile",
            "contextSchema": "/app-sre/saas-file.yml",
            "changes": [{
                "provider": "jsonPath",
                "jsonPathSelectors": ["resourceTemplates[1]"],
            }],
        }))
        .unwrap();
        let ctx = Arc::new(ChangeTypeContext::new(
            Arc::new(ChangeTypeProcessor::compile(def).unwrap()),
            "RoleV1 - role-1",
            vec![Arc::new(User::new("user")) as Arc<dyn Approver>],
        ));
        let mut cc = saas_change(old, new);
        cc.cover_changes(&ctx);
        assert!(cc.is_fully_covered(), "{:?}", coverage_by_path(&cc));
    }
}
