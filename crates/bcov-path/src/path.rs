//! Concrete, addressable paths into tree-structured documents.
//!
//! A [`Path`] pins down one location in a document: a sequence of object
//! field names and list indices. The canonical string form uses dotted
//! field segments and bracketed indices, e.g.
//! `resourceTemplates.[0].targets.[0].ref`. That form is stable; deltas
//! are displayed with it and coverage matching prefixes against it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One step of a concrete path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// An object field.
    Field(String),
    /// A list index.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// A concrete path into a tree-structured document.
///
/// Paths are ordered, hashable, and serialize to their canonical string
/// form. The root path is empty and renders as `""`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// A new path with a field segment appended.
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Field(name.into()))
    }

    /// A new path with an index segment appended.
    pub fn index(&self, i: usize) -> Self {
        self.child(Segment::Index(i))
    }

    /// Segment-wise prefix test: `true` if `prefix` is an ancestor of (or
    /// equal to) this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = crate::error::PathError;

    /// Parse a canonical path string (`a.b.[0].c`) back into a path.
    ///
    /// Only concrete segments are accepted; wildcards and filters belong
    /// to [`crate::PathExpr`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use crate::error::PathError;

        if s.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        let mut offset = 0;
        for part in s.split('.') {
            if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                let index = inner.parse::<usize>().map_err(|e| PathError::InvalidIndex {
                    expr: s.to_string(),
                    pos: offset,
                    message: e.to_string(),
                })?;
                segments.push(Segment::Index(index));
            } else if part.is_empty() {
                return Err(PathError::UnexpectedChar {
                    expr: s.to_string(),
                    pos: offset,
                    ch: '.',
                });
            } else {
                segments.push(Segment::Field(part.to_string()));
            }
            offset += part.len() + 1;
        }
        Ok(Self { segments })
    }
}

impl Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// String-level coverage test on canonical path forms.
///
/// `changed_path` is covered by `allowed_path` when it equals the allowed
/// path or extends it at a segment boundary: `roles` covers
/// `roles.[0].$ref` but never `roles2`. An empty allowed path (the
/// document root) covers everything.
pub fn covers(allowed_path: &str, changed_path: &str) -> bool {
    if allowed_path.is_empty() {
        return true;
    }
    match changed_path.strip_prefix(allowed_path) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}
