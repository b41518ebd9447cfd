//! Path expressions for the bcov change coverage engine.
//!
//! Two layers share one canonical string form:
//!
//! - [`Path`] / [`Segment`] -- a concrete, addressable location in a
//!   tree-structured document (`resourceTemplates.[0].targets.[0].ref`)
//! - [`PathExpr`] -- a compiled selector expression with wildcards,
//!   indices, and filter predicates, evaluated against a document to
//!   produce concrete [`Path`]s
//!
//! The canonical form is stable: deltas display it and coverage matching
//! prefixes against it (see [`covers`]).

pub mod error;
pub mod expr;
pub mod path;

pub use error::{PathError, PathResult};
pub use expr::{CmpOp, ExprSegment, PathExpr, PathMatch, Predicate};
pub use path::{covers, Path, Segment};
