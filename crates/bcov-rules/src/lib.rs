//! Change-type rules for the bcov change coverage engine.
//!
//! A change type declares which paths within which document schema are
//! self-service changeable, and how to find the owning entity for changes
//! in a *different* schema.
//!
//! # Key Types
//!
//! - [`ChangeTypeDef`] -- the declarative rule as delivered by the rule
//!   provider (raw strings, camelCase wire names)
//! - [`ChangeTypeProcessor`] -- the compiled rule: validated providers and
//!   triggers, selectors parsed and indexed by `(file type, schema)`
//! - [`extract_context`] -- ownership resolution for a bundle file change

pub mod context;
pub mod error;
pub mod model;
pub mod processor;

pub use context::extract_context;
pub use error::{RuleError, RuleResult};
pub use model::{ChangeDetectorDef, ChangeTypeDef, ContextSelectorDef, JSON_PATH_PROVIDER};
pub use processor::{
    compile_change_types, ChangeTypeProcessor, CompiledContextSelector, CompiledDetector,
    ContextWhen,
};
