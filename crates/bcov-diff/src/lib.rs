//! Structural differ for the bcov change coverage engine.
//!
//! Computes field-level deltas between two versions of a tree-structured
//! document, reconciling reordered list elements through an identity
//! policy.
//!
//! # Key Types
//!
//! - [`Diff`] / [`DiffType`] -- one detected field/element difference
//! - [`Differ`] / [`diff_values`] -- the tree walk
//! - [`ListIdentityPolicy`] / [`StructuralSimilarity`] -- list element
//!   identity reconciliation strategy
//! - [`BundleFileChange`] / [`create_bundle_file_change`] -- a diffed
//!   (old, new) document pair with content digests

pub mod change;
pub mod diff;
pub mod error;
pub mod identity;

pub use change::{create_bundle_file_change, BundleFileChange, ContentSha};
pub use diff::{diff_values, Diff, DiffType, Differ, DEFAULT_MAX_DEPTH};
pub use error::{DiffError, DiffResult};
pub use identity::{element_identifier, ListIdentityPolicy, StructuralSimilarity, IDENTIFIER_KEY};
