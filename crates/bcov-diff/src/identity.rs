//! List element identity reconciliation.
//!
//! Lists in bundle documents are order-insensitive, so the differ must
//! decide which old element corresponds to which new element before it can
//! diff them. Elements carrying the `__identifier` key (maintained by the
//! bundle validator from context-unique schema properties) are matched by
//! that key. Heterogeneous lists mix identified and unidentified elements
//! though -- resource templates, for instance, have no property set that
//! uniquely identifies the resulting resource -- so the remainder falls
//! back to a structural similarity heuristic.
//!
//! The heuristic lives behind [`ListIdentityPolicy`] so it can be swapped
//! without touching the tree walk.

use serde_json::Value;

/// The object key that carries an explicit element identity.
pub const IDENTIFIER_KEY: &str = "__identifier";

/// The explicit identity of a list element, if it carries one.
pub fn element_identifier(element: &Value) -> Option<&str> {
    element.get(IDENTIFIER_KEY).and_then(Value::as_str)
}

/// Decides whether two list elements without explicit identifiers are the
/// same logical element.
///
/// Implementations score a candidate pair in `[0.0, 1.0]`; the differ
/// pairs candidates greedily, best score first, accepting scores at or
/// above [`ListIdentityPolicy::threshold`]. Unpaired elements become
/// added/removed deltas.
pub trait ListIdentityPolicy: Send + Sync {
    /// Similarity of two unidentified elements, in `[0.0, 1.0]`.
    fn similarity(&self, old: &Value, new: &Value) -> f64;

    /// Minimum score at which a pair counts as the same element.
    fn threshold(&self) -> f64 {
        0.5
    }
}

/// Default identity heuristic: shared top-level structure.
///
/// Equal values score `1.0`. Two objects score by their top-level entries:
/// a key present on both sides counts fully when the values are equal and
/// half when they differ, normalized by the total entry count. Everything
/// else (unequal scalars, mixed types) scores `0.0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralSimilarity;

impl ListIdentityPolicy for StructuralSimilarity {
    fn similarity(&self, old: &Value, new: &Value) -> f64 {
        if old == new {
            return 1.0;
        }
        let (Value::Object(old_map), Value::Object(new_map)) = (old, new) else {
            return 0.0;
        };
        if old_map.is_empty() && new_map.is_empty() {
            return 1.0;
        }

        let mut score = 0.0;
        for (key, old_val) in old_map {
            match new_map.get(key) {
                Some(new_val) if new_val == old_val => score += 1.0,
                Some(_) => score += 0.5,
                None => {}
            }
        }
        2.0 * score / (old_map.len() + new_map.len()) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_are_identical() {
        let policy = StructuralSimilarity;
        assert_eq!(policy.similarity(&json!({"a": 1}), &json!({"a": 1})), 1.0);
        assert_eq!(policy.similarity(&json!(42), &json!(42)), 1.0);
    }

    #[test]
    fn unequal_scalars_never_match() {
        let policy = StructuralSimilarity;
        assert_eq!(policy.similarity(&json!(1), &json!(2)), 0.0);
        assert_eq!(policy.similarity(&json!("a"), &json!({"a": 1})), 0.0);
    }

    #[test]
    fn single_differing_entry_sits_on_threshold() {
        let policy = StructuralSimilarity;
        let score = policy.similarity(&json!({"age": 1}), &json!({"age": 2}));
        assert!(score >= policy.threshold());
    }

    #[test]
    fn mostly_shared_objects_score_high() {
        let policy = StructuralSimilarity;
        let old = json!({"provider": "resource-template", "path": "res-1", "vars": {"x": 1}});
        let new = json!({"provider": "resource-template", "path": "res-1", "vars": {"x": 2}});
        let score = policy.similarity(&old, &new);
        assert!(score > 0.8, "score was {score}");
    }

    #[test]
    fn disjoint_objects_score_low() {
        let policy = StructuralSimilarity;
        let score = policy.similarity(&json!({"a": 1, "b": 2}), &json!({"c": 3, "d": 4}));
        assert!(score < policy.threshold(), "score was {score}");
    }

    #[test]
    fn element_identifier_reads_the_key() {
        assert_eq!(
            element_identifier(&json!({"__identifier": "secret-1", "version": 1})),
            Some("secret-1")
        );
        assert_eq!(element_identifier(&json!({"version": 1})), None);
        assert_eq!(element_identifier(&json!(3)), None);
    }
}
