//! Rule compilation: from declarative definitions to an indexed processor.
//!
//! A [`ChangeTypeProcessor`] wraps a [`ChangeTypeDef`] with everything
//! precompiled: path selectors parsed and indexed by the `(file type,
//! schema)` they apply to, context selectors parsed and their triggers
//! validated. Compilation failure is fatal for the whole rule set.

use std::collections::HashMap;

use serde_json::Value;

use bcov_path::PathExpr;
use bcov_types::{BundleFileType, FileRef};

use crate::error::{RuleError, RuleResult};
use crate::model::{ChangeTypeDef, JSON_PATH_PROVIDER};

/// Validated trigger of a context selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextWhen {
    /// React to references that appear in the new content.
    Added,
    /// React to references that disappear from the old content.
    Removed,
}

/// A compiled cross-document ownership selector.
#[derive(Clone, Debug)]
pub struct CompiledContextSelector {
    /// Selector evaluated against both document sides.
    pub selector: PathExpr,
    /// Direction of the difference that names affected owners.
    pub when: ContextWhen,
}

/// A compiled change detector with its schema resolved.
#[derive(Clone, Debug)]
pub struct CompiledDetector {
    /// Schema this detector applies to (explicit or inherited).
    pub change_schema: Option<String>,
    /// Compiled ownership selector, if declared.
    pub context: Option<CompiledContextSelector>,
}

/// A change type with compiled selector expressions.
#[derive(Debug)]
pub struct ChangeTypeProcessor {
    def: ChangeTypeDef,
    file_type: BundleFileType,
    detectors: Vec<CompiledDetector>,
    expressions: HashMap<(BundleFileType, Option<String>), Vec<PathExpr>>,
}

impl ChangeTypeProcessor {
    /// Compile a change type definition.
    ///
    /// Fails on an unknown provider or context type, an invalid trigger,
    /// or an uncompilable selector. A detector with no resolvable change
    /// schema contributes nothing and is skipped with a warning.
    pub fn compile(def: ChangeTypeDef) -> RuleResult<Self> {
        let file_type = match def.context_type.as_str() {
            "datafile" => BundleFileType::Datafile,
            "resourcefile" => BundleFileType::Resourcefile,
            other => {
                return Err(RuleError::UnsupportedContextType {
                    change_type: def.name.clone(),
                    context_type: other.to_string(),
                })
            }
        };

        let mut detectors = Vec::with_capacity(def.changes.len());
        let mut expressions: HashMap<(BundleFileType, Option<String>), Vec<PathExpr>> =
            HashMap::new();

        for detector in &def.changes {
            if detector.provider != JSON_PATH_PROVIDER {
                return Err(RuleError::UnsupportedProvider {
                    change_type: def.name.clone(),
                    provider: detector.provider.clone(),
                });
            }

            let change_schema = detector
                .change_schema
                .clone()
                .or_else(|| def.context_schema.clone());
            if change_schema.is_none() && !detector.json_path_selectors.is_empty() {
                tracing::warn!(
                    change_type = %def.name,
                    "detector has no resolvable change schema, skipping its selectors"
                );
            } else {
                for selector in &detector.json_path_selectors {
                    let expr = PathExpr::parse(selector).map_err(|source| {
                        RuleError::InvalidSelector {
                            change_type: def.name.clone(),
                            selector: selector.clone(),
                            source,
                        }
                    })?;
                    expressions
                        .entry((file_type, change_schema.clone()))
                        .or_default()
                        .push(expr);
                }
            }

            let context = match &detector.context {
                Some(ctx) => {
                    let when = match ctx.when.as_str() {
                        "added" => ContextWhen::Added,
                        "removed" => ContextWhen::Removed,
                        other => {
                            return Err(RuleError::UnsupportedContextTrigger {
                                change_type: def.name.clone(),
                                when: other.to_string(),
                            })
                        }
                    };
                    let selector = PathExpr::parse(&ctx.selector).map_err(|source| {
                        RuleError::InvalidSelector {
                            change_type: def.name.clone(),
                            selector: ctx.selector.clone(),
                            source,
                        }
                    })?;
                    Some(CompiledContextSelector { selector, when })
                }
                None => None,
            };

            detectors.push(CompiledDetector {
                change_schema,
                context,
            });
        }

        Ok(Self {
            def,
            file_type,
            detectors,
            expressions,
        })
    }

    /// Name of the change type.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// File type of the owning entity's documents.
    pub fn file_type(&self) -> BundleFileType {
        self.file_type
    }

    /// Schema of the owning entity's documents.
    pub fn context_schema(&self) -> Option<&str> {
        self.def.context_schema.as_deref()
    }

    /// The underlying definition.
    pub fn def(&self) -> &ChangeTypeDef {
        &self.def
    }

    /// Compiled detectors in declaration order.
    pub fn detectors(&self) -> &[CompiledDetector] {
        &self.detectors
    }

    /// All paths within `content` this change type authorizes for the
    /// given file.
    ///
    /// Every selector registered for the file's `(file type, schema)` is
    /// evaluated against the content; each match contributes the
    /// canonical path of the matched subtree root. Files outside the
    /// index get no authority.
    pub fn allowed_changed_paths(&self, fileref: &FileRef, content: &Value) -> Vec<String> {
        let key = (fileref.file_type, fileref.schema.clone());
        match self.expressions.get(&key) {
            Some(exprs) => exprs
                .iter()
                .flat_map(|expr| expr.find(content))
                .map(|m| m.path.to_string())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Compile a whole rule set, failing on the first unusable rule.
pub fn compile_change_types(
    defs: impl IntoIterator<Item = ChangeTypeDef>,
) -> RuleResult<Vec<ChangeTypeProcessor>> {
    defs.into_iter().map(ChangeTypeProcessor::compile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change_type(value: Value) -> ChangeTypeDef {
        serde_json::from_value(value).unwrap()
    }

    fn saas_file_change_type() -> ChangeTypeDef {
        change_type(json!({
            "name": "saas-file-owner",
            "contextType": "datafile",
            "contextSchema": "/app-sre/saas-file.yml",
            "changes": [{
                "provider": "jsonPath",
                "jsonPathSelectors": ["resourceTemplates[*].targets[*].ref"],
            }],
        }))
    }

    fn secret_promoter_change_type() -> ChangeTypeDef {
        change_type(json!({
            "name": "secret-promoter",
            "contextType": "datafile",
            "contextSchema": "/openshift/namespace-1.yml",
            "changes": [{
                "provider": "jsonPath",
                "jsonPathSelectors": ["openshiftResources[?(@.provider == 'vault-secret')].version"],
            }],
        }))
    }

    fn role_member_change_type() -> ChangeTypeDef {
        change_type(json!({
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
    }

    #[test]
    fn allowed_paths_simple_selector() {
        let processor = ChangeTypeProcessor::compile(role_member_change_type()).unwrap();
        let fileref = FileRef::datafile("/somepath.yml", "/access/user-1.yml");
        let content = json!({"roles": [{"$ref": "/role/a.yml"}]});
        assert_eq!(
            processor.allowed_changed_paths(&fileref, &content),
            vec!["roles"]
        );
    }

    #[test]
    fn allowed_paths_with_filter_predicate() {
        let processor = ChangeTypeProcessor::compile(secret_promoter_change_type()).unwrap();
        let fileref = FileRef::datafile("/namespace.yml", "/openshift/namespace-1.yml");
        let content = json!({
            "openshiftResources": [
                {"provider": "resource-template", "path": "res-1"},
                {"provider": "vault-secret", "path": "path-1", "version": 3},
            ]
        });
        assert_eq!(
            processor.allowed_changed_paths(&fileref, &content),
            vec!["openshiftResources.[1].version"]
        );
    }

    #[test]
    fn detector_schema_defaults_to_context_schema() {
        let processor = ChangeTypeProcessor::compile(saas_file_change_type()).unwrap();
        let fileref = FileRef::datafile("/saas.yml", "/app-sre/saas-file.yml");
        let content = json!({
            "resourceTemplates": [{"targets": [{"ref": "main"}]}]
        });
        assert_eq!(
            processor.allowed_changed_paths(&fileref, &content),
            vec!["resourceTemplates.[0].targets.[0].ref"]
        );
    }

    #[test]
    fn unknown_schema_key_has_no_authority() {
        let processor = ChangeTypeProcessor::compile(saas_file_change_type()).unwrap();
        let fileref = FileRef::datafile("/saas.yml", "/some/other/schema.yml");
        let content = json!({"resourceTemplates": [{"targets": [{"ref": "main"}]}]});
        assert!(processor.allowed_changed_paths(&fileref, &content).is_empty());
    }

    #[test]
    fn unsupported_provider_is_fatal() {
        let err = ChangeTypeProcessor::compile(change_type(json!({
            "name": "bad-provider",
            "contextType": "datafile",
            "contextSchema": "/s.yml",
            "changes": [{"provider": "regex", "jsonPathSelectors": ["a"]}],
        })))
        .unwrap_err();
        assert!(matches!(err, RuleError::UnsupportedProvider { .. }));
    }

    #[test]
    fn unsupported_trigger_is_fatal() {
        let err = ChangeTypeProcessor::compile(change_type(json!({
            "name": "bad-trigger",
            "contextType": "datafile",
            "contextSchema": "/s.yml",
            "changes": [{
                "provider": "jsonPath",
                "changeSchema": "/other.yml",
                "context": {"selector": "roles[*].'$ref'", "when": "modified"},
            }],
        })))
        .unwrap_err();
        assert!(matches!(err, RuleError::UnsupportedContextTrigger { .. }));
    }

    #[test]
    fn unsupported_context_type_is_fatal() {
        let err = ChangeTypeProcessor::compile(change_type(json!({
            "name": "bad-context-type",
            "contextType": "gitrepo",
            "contextSchema": "/s.yml",
        })))
        .unwrap_err();
        assert!(matches!(err, RuleError::UnsupportedContextType { .. }));
    }

    #[test]
    fn invalid_selector_is_fatal() {
        let err = ChangeTypeProcessor::compile(change_type(json!({
            "name": "bad-selector",
            "contextType": "datafile",
            "contextSchema": "/s.yml",
            "changes": [{"provider": "jsonPath", "jsonPathSelectors": ["a['unterminated"]}],
        })))
        .unwrap_err();
        assert!(matches!(err, RuleError::InvalidSelector { .. }));
    }

    #[test]
    fn detector_without_any_schema_is_skipped() {
        let processor = ChangeTypeProcessor::compile(change_type(json!({
            "name": "schemaless",
            "contextType": "datafile",
            "contextSchema": null,
            "changes": [{"provider": "jsonPath", "jsonPathSelectors": ["a.b"]}],
        })))
        .unwrap();
        let fileref = FileRef::datafile("/x.yml", "/any.yml");
        assert!(processor
            .allowed_changed_paths(&fileref, &json!({"a": {"b": 1}}))
            .is_empty());
    }

    #[test]
    fn compile_change_types_fails_fast() {
        let defs = vec![
            saas_file_change_type(),
            change_type(json!({
                "name": "broken",
                "contextType": "datafile",
                "contextSchema": "/s.yml",
                "changes": [{"provider": "regex"}],
            })),
        ];
        assert!(compile_change_types(defs).is_err());
    }
}
