//! Foundation types for the bcov change coverage engine.
//!
//! Everything here is shared vocabulary between the differ, the rule
//! compiler, and the coverage matcher:
//!
//! - [`BundleFileType`] / [`FileRef`] -- identity of files within a bundle
//! - [`Approver`] / [`User`] -- identities allowed to approve changes
//! - [`FileDiffResolver`] -- collaborator interface for fetching document
//!   before/after content

pub mod approver;
pub mod error;
pub mod fileref;
pub mod resolver;

pub use approver::{Approver, User};
pub use error::{TypesError, TypesResult};
pub use fileref::{BundleFileType, FileRef};
pub use resolver::{FileDiffResolver, NoOpFileDiffResolver};
