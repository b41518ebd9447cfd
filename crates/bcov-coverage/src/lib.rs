//! Coverage engine for bcov.
//!
//! Associates every field-level delta of a proposed bundle change with
//! the change-type rules, owning entities, and approvers that cover it.
//! A delta with no covering context requires review outside self-service;
//! the engine reports coverage and decides nothing.
//!
//! # Key Types
//!
//! - [`ChangeTypeContext`] -- a change type bound to an owning entity and
//!   its approvers
//! - [`ChangeCoverage`] / [`CoveredDiff`] -- per-delta coverage state and
//!   the matching algorithm
//! - [`Role`] / [`cover_changes_with_self_service_roles`] -- self-service
//!   role bindings
//! - [`BundleDiffPayload`] / [`parse_bundle_changes`] -- raw backend diff
//!   payloads with per-file failure isolation
//! - [`evaluate_coverage`] -- the full pass
//! - [`CoverageReport`] -- the result handed to presentation

pub mod context;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod payload;
pub mod report;
pub mod roles;

pub use context::ChangeTypeContext;
pub use engine::evaluate_coverage;
pub use error::{CoverageError, CoverageResult};
pub use matcher::{ChangeCoverage, CoveredDiff};
pub use payload::{
    parse_bundle_changes, resolve_bundle_changes, BundleDiffPayload, DatafileDiff, FileFailure,
    ParsedChanges, ResourceDiff,
};
pub use report::{CoverageReport, DiffRow, FileCoverage};
pub use roles::{
    build_role, cover_changes_with_self_service_roles, ChangeTypeRef, DatafileObject, Role,
    SelfServiceConfig,
};
