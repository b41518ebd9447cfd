//! The coverage evaluation pass.
//!
//! Linear pipeline over one proposed bundle change:
//! raw changes -> diffed -> contexts resolved -> matched -> reported.
//!
//! Rule compilation failures abort the pass before any coverage is
//! computed; an unusable rule silently granting no coverage would be a
//! worse failure mode than stopping. Per-document failures never abort
//! sibling documents.

use std::sync::Arc;

use bcov_rules::{compile_change_types, ChangeTypeDef};

use crate::error::CoverageResult;
use crate::payload::{parse_bundle_changes, BundleDiffPayload, ParsedChanges};
use crate::report::CoverageReport;
use crate::roles::{cover_changes_with_self_service_roles, Role};

/// Evaluate coverage for a proposed bundle change.
///
/// Compiles the rule set (fatal on the first unusable rule), diffs every
/// file in the payload (per-file failures isolated), resolves ownership
/// contexts through the self-service roles, matches every delta, and
/// assembles the report.
pub fn evaluate_coverage(
    payload: &BundleDiffPayload,
    change_types: Vec<ChangeTypeDef>,
    roles: &[Role],
    saas_file_owner_change_type: Option<&str>,
) -> CoverageResult<CoverageReport> {
    let processors: Vec<Arc<_>> = compile_change_types(change_types)?
        .into_iter()
        .map(Arc::new)
        .collect();
    tracing::debug!(rules = processors.len(), "compiled change types");

    let ParsedChanges {
        mut changes,
        failures,
    } = parse_bundle_changes(payload);
    tracing::debug!(
        files = changes.len(),
        failed = failures.len(),
        "diffed bundle changes"
    );

    cover_changes_with_self_service_roles(
        &mut changes,
        &processors,
        roles,
        saas_file_owner_change_type,
    );

    Ok(CoverageReport::build(&changes, &failures))
}
