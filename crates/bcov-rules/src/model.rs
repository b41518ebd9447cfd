//! Declarative change-type definitions as delivered by the rule provider.
//!
//! These types mirror the wire format (camelCase field names) and carry
//! raw strings; validation and selector compilation happen in
//! [`crate::processor`].

use serde::{Deserialize, Serialize};

/// Wire name of the JSON-path change detection provider, the only
/// provider the engine supports.
pub const JSON_PATH_PROVIDER: &str = "jsonPath";

/// A declarative change type: which paths within which document schema
/// may be self-service changed, and how to find the owning entity for
/// changes in a different schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeTypeDef {
    /// Unique name of the change type.
    pub name: String,
    /// File type the owning entity lives in (`datafile`/`resourcefile`).
    #[serde(rename = "contextType")]
    pub context_type: String,
    /// Schema of the owning entity's documents.
    #[serde(rename = "contextSchema")]
    pub context_schema: Option<String>,
    /// Change detectors contributing allowed paths and context selectors.
    #[serde(default)]
    pub changes: Vec<ChangeDetectorDef>,
}

/// One change detector within a change type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeDetectorDef {
    /// Detection provider; must be [`JSON_PATH_PROVIDER`].
    pub provider: String,
    /// Schema of documents this detector applies to. Defaults to the
    /// change type's `contextSchema` when absent.
    #[serde(rename = "changeSchema", default)]
    pub change_schema: Option<String>,
    /// Selector expressions pinpointing the changeable subtrees.
    #[serde(rename = "jsonPathSelectors", default)]
    pub json_path_selectors: Vec<String>,
    /// Optional cross-document ownership selector.
    #[serde(default)]
    pub context: Option<ContextSelectorDef>,
}

/// Finds the owning entities affected by a change in a related document:
/// the selector collects reference values on both sides and the trigger
/// picks the direction of the difference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextSelectorDef {
    /// Selector expression evaluated against old and new content.
    pub selector: String,
    /// `added` or `removed`.
    pub when: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_wire_format() {
        let def: ChangeTypeDef = serde_json::from_value(json!({
            "name": "role-member",
            "contextType": "datafile",
            "contextSchema": "/access/roles-1.yml",
            "changes": [{
                "provider": "jsonPath",
                "changeSchema": "/access/user-1.yml",
                "jsonPathSelectors": ["roles"],
                "context": {"selector": "roles[*].'$ref'", "when": "added"},
            }],
        }))
        .unwrap();

        assert_eq!(def.name, "role-member");
        assert_eq!(def.context_schema.as_deref(), Some("/access/roles-1.yml"));
        assert_eq!(def.changes.len(), 1);
        let detector = &def.changes[0];
        assert_eq!(detector.provider, JSON_PATH_PROVIDER);
        assert_eq!(detector.change_schema.as_deref(), Some("/access/user-1.yml"));
        assert_eq!(detector.json_path_selectors, vec!["roles"]);
        assert_eq!(detector.context.as_ref().unwrap().when, "added");
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let def: ChangeTypeDef = serde_json::from_value(json!({
            "name": "bare",
            "contextType": "datafile",
            "contextSchema": null,
        }))
        .unwrap();
        assert!(def.changes.is_empty());
        assert!(def.context_schema.is_none());
    }
}
