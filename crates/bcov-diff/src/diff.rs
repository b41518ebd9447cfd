//! The structural tree walk producing field-level deltas.
//!
//! Compares two document trees and emits one [`Diff`] per detected
//! field/element difference. Object keys are compared by name; list
//! elements are reconciled order-insensitively through the identity
//! policy (see [`crate::identity`]); everything else is a leaf whose
//! values are compared directly.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use bcov_path::Path;

use crate::error::{DiffError, DiffResult};
use crate::identity::{element_identifier, ListIdentityPolicy, StructuralSimilarity};

/// Default recursion depth limit for document trees.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The kind of a detected difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffType {
    /// Present only in the new document.
    Added,
    /// Present only in the old document.
    Removed,
    /// Present on both sides with different values.
    Changed,
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Changed => write!(f, "changed"),
        }
    }
}

/// A single field-level difference between two document versions.
///
/// Added/removed object keys carry no values; added/removed list elements
/// carry the element on the side it exists on; changed leaves carry both.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diff {
    /// Concrete path of the difference.
    pub path: Path,
    /// The kind of difference.
    pub diff_type: DiffType,
    /// Old-side value, when attached.
    pub old: Option<Value>,
    /// New-side value, when attached.
    pub new: Option<Value>,
}

impl Diff {
    fn changed(path: Path, old: Value, new: Value) -> Self {
        Self {
            path,
            diff_type: DiffType::Changed,
            old: Some(old),
            new: Some(new),
        }
    }

    fn key_added(path: Path) -> Self {
        Self {
            path,
            diff_type: DiffType::Added,
            old: None,
            new: None,
        }
    }

    fn key_removed(path: Path) -> Self {
        Self {
            path,
            diff_type: DiffType::Removed,
            old: None,
            new: None,
        }
    }

    fn item_added(path: Path, element: Value) -> Self {
        Self {
            path,
            diff_type: DiffType::Added,
            old: None,
            new: Some(element),
        }
    }

    fn item_removed(path: Path, element: Value) -> Self {
        Self {
            path,
            diff_type: DiffType::Removed,
            old: Some(element),
            new: None,
        }
    }
}

/// The structural differ.
///
/// Holds the list identity policy and the recursion depth limit. For the
/// common case use [`diff_values`].
pub struct Differ {
    policy: Box<dyn ListIdentityPolicy>,
    max_depth: usize,
}

impl Default for Differ {
    fn default() -> Self {
        Self::new(Box::new(StructuralSimilarity))
    }
}

impl Differ {
    /// Create a differ with the given list identity policy.
    pub fn new(policy: Box<dyn ListIdentityPolicy>) -> Self {
        Self {
            policy,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the recursion depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compute the deltas between two document trees.
    pub fn diff(&self, old: &Value, new: &Value) -> DiffResult<Vec<Diff>> {
        let mut diffs = Vec::new();
        self.walk(&Path::root(), old, new, 0, &mut diffs)?;
        Ok(diffs)
    }

    fn walk(
        &self,
        path: &Path,
        old: &Value,
        new: &Value,
        depth: usize,
        out: &mut Vec<Diff>,
    ) -> DiffResult<()> {
        if depth > self.max_depth {
            return Err(DiffError::MaxDepthExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }

        match (old, new) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                for (key, old_val) in old_map {
                    match new_map.get(key) {
                        Some(new_val) => {
                            self.walk(&path.field(key.clone()), old_val, new_val, depth + 1, out)?
                        }
                        None => out.push(Diff::key_removed(path.field(key.clone()))),
                    }
                }
                for key in new_map.keys() {
                    if !old_map.contains_key(key) {
                        out.push(Diff::key_added(path.field(key.clone())));
                    }
                }
            }
            (Value::Array(old_items), Value::Array(new_items)) => {
                self.diff_lists(path, old_items, new_items, depth, out)?;
            }
            _ => {
                if old != new {
                    out.push(Diff::changed(path.clone(), old.clone(), new.clone()));
                }
            }
        }
        Ok(())
    }

    /// Order-insensitive list diff.
    ///
    /// Matched pairs are recursed under the old-side index; removals keep
    /// the old-side index, additions the new-side index.
    fn diff_lists(
        &self,
        path: &Path,
        old_items: &[Value],
        new_items: &[Value],
        depth: usize,
        out: &mut Vec<Diff>,
    ) -> DiffResult<()> {
        let rec = self.reconcile(path, old_items, new_items);

        for (old_idx, new_idx) in rec.pairs {
            self.walk(
                &path.index(old_idx),
                &old_items[old_idx],
                &new_items[new_idx],
                depth + 1,
                out,
            )?;
        }
        for old_idx in rec.removed {
            out.push(Diff::item_removed(
                path.index(old_idx),
                old_items[old_idx].clone(),
            ));
        }
        for new_idx in rec.added {
            out.push(Diff::item_added(
                path.index(new_idx),
                new_items[new_idx].clone(),
            ));
        }
        Ok(())
    }

    fn reconcile(&self, path: &Path, old_items: &[Value], new_items: &[Value]) -> ListMatch {
        let mut old_paired = vec![false; old_items.len()];
        let mut new_paired = vec![false; new_items.len()];
        let mut pairs: Vec<(usize, usize)> = Vec::new();

        // Phase 1: explicit identifiers. First occurrence wins per side;
        // an identified element never pairs with an unidentified one.
        let mut new_by_id: HashMap<&str, usize> = HashMap::new();
        for (j, element) in new_items.iter().enumerate() {
            if let Some(id) = element_identifier(element) {
                match new_by_id.entry(id) {
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        entry.insert(j);
                    }
                    std::collections::hash_map::Entry::Occupied(_) => {
                        tracing::warn!(path = %path, identifier = id, "duplicate list identifier");
                    }
                }
            }
        }
        for (i, element) in old_items.iter().enumerate() {
            if let Some(id) = element_identifier(element) {
                if let Some(&j) = new_by_id.get(id) {
                    if !new_paired[j] {
                        pairs.push((i, j));
                        old_paired[i] = true;
                        new_paired[j] = true;
                    }
                }
            }
        }

        let eligible_old: Vec<usize> = (0..old_items.len())
            .filter(|&i| !old_paired[i] && element_identifier(&old_items[i]).is_none())
            .collect();
        let eligible_new: Vec<usize> = (0..new_items.len())
            .filter(|&j| !new_paired[j] && element_identifier(&new_items[j]).is_none())
            .collect();

        // Phase 2: exact equality among unidentified elements (multiset
        // matching, so reordering alone produces no deltas).
        for &i in &eligible_old {
            for &j in &eligible_new {
                if !new_paired[j] && old_items[i] == new_items[j] {
                    pairs.push((i, j));
                    old_paired[i] = true;
                    new_paired[j] = true;
                    break;
                }
            }
        }

        // Phase 3: structural similarity, greedy best pair first.
        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
        for &i in &eligible_old {
            if old_paired[i] {
                continue;
            }
            for &j in &eligible_new {
                if new_paired[j] {
                    continue;
                }
                let score = self.policy.similarity(&old_items[i], &new_items[j]);
                if score >= self.policy.threshold() {
                    candidates.push((i, j, score));
                }
            }
        }
        candidates.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
                .then(a.1.cmp(&b.1))
        });
        for (i, j, _) in candidates {
            if !old_paired[i] && !new_paired[j] {
                pairs.push((i, j));
                old_paired[i] = true;
                new_paired[j] = true;
            }
        }

        pairs.sort_by_key(|&(i, _)| i);
        ListMatch {
            pairs,
            removed: (0..old_items.len()).filter(|&i| !old_paired[i]).collect(),
            added: (0..new_items.len()).filter(|&j| !new_paired[j]).collect(),
        }
    }
}

struct ListMatch {
    pairs: Vec<(usize, usize)>,
    removed: Vec<usize>,
    added: Vec<usize>,
}

/// Diff two document trees with the default identity policy.
pub fn diff_values(old: &Value, new: &Value) -> DiffResult<Vec<Diff>> {
    Differ::default().diff(old, new)
}
