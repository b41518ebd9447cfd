//! Compiled selector expressions.
//!
//! A [`PathExpr`] is the query side of the path model: where a
//! [`Path`](crate::Path) addresses exactly one location, an expression can
//! match many. The language supports dotted field access (quoted or bare,
//! including `$`-prefixed names), list wildcards (`[*]`, `.*`), explicit
//! indices (`[0]`), and filter predicates over list elements
//! (`[?(@.provider == 'vault-secret')]`).
//!
//! Expressions are compiled once at rule-load time; a parse failure is a
//! configuration error surfaced to the operator.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use serde_json::Value;

use crate::error::{PathError, PathResult};
use crate::path::{Path, Segment};

/// One step of a compiled expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprSegment {
    /// Match an object field by name.
    Field(String),
    /// Match one list index.
    Index(usize),
    /// Match every element of a list, or every value of an object.
    Wildcard,
    /// Match list elements satisfying a predicate.
    Filter(Predicate),
}

/// A filter predicate applied to list elements: `@.a.b == literal`.
///
/// Without a comparison the predicate tests for field presence.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    /// Field path below the element (`@.provider` -> `["provider"]`).
    pub field_path: Vec<String>,
    /// Optional comparison against a literal.
    pub comparison: Option<(CmpOp, Value)>,
}

impl Predicate {
    fn matches(&self, element: &Value) -> bool {
        let mut current = element;
        for field in &self.field_path {
            match current.get(field) {
                Some(v) => current = v,
                None => return false,
            }
        }
        match &self.comparison {
            None => true,
            Some((CmpOp::Eq, literal)) => current == literal,
            Some((CmpOp::Ne, literal)) => current != literal,
        }
    }
}

/// Comparison operator inside a filter predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

/// A single match produced by evaluating an expression.
#[derive(Clone, Debug, PartialEq)]
pub struct PathMatch<'a> {
    /// Concrete path of the matched subtree root.
    pub path: Path,
    /// The matched subtree.
    pub value: &'a Value,
}

/// A compiled path expression.
#[derive(Clone, Debug, PartialEq)]
pub struct PathExpr {
    source: String,
    segments: Vec<ExprSegment>,
}

impl PathExpr {
    /// Compile a selector expression.
    ///
    /// An optional leading `$` / `$.` root anchor is accepted and ignored.
    pub fn parse(expr: &str) -> PathResult<Self> {
        let segments = Parser::new(expr).parse()?;
        Ok(Self {
            source: expr.to_string(),
            segments,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled segments.
    pub fn segments(&self) -> &[ExprSegment] {
        &self.segments
    }

    /// Evaluate against a document, returning every matched subtree root
    /// with its concrete path.
    pub fn find<'a>(&self, root: &'a Value) -> Vec<PathMatch<'a>> {
        let mut current: Vec<PathMatch<'a>> = vec![PathMatch {
            path: Path::root(),
            value: root,
        }];

        for seg in &self.segments {
            let mut next = Vec::new();
            for m in &current {
                match seg {
                    ExprSegment::Field(name) => {
                        if let Some(v) = m.value.get(name.as_str()) {
                            next.push(PathMatch {
                                path: m.path.field(name.clone()),
                                value: v,
                            });
                        }
                    }
                    ExprSegment::Index(i) => {
                        if let Some(v) = m.value.as_array().and_then(|a| a.get(*i)) {
                            next.push(PathMatch {
                                path: m.path.index(*i),
                                value: v,
                            });
                        }
                    }
                    ExprSegment::Wildcard => match m.value {
                        Value::Array(items) => {
                            for (i, v) in items.iter().enumerate() {
                                next.push(PathMatch {
                                    path: m.path.index(i),
                                    value: v,
                                });
                            }
                        }
                        Value::Object(map) => {
                            for (k, v) in map {
                                next.push(PathMatch {
                                    path: m.path.field(k.clone()),
                                    value: v,
                                });
                            }
                        }
                        _ => {}
                    },
                    ExprSegment::Filter(pred) => {
                        if let Value::Array(items) = m.value {
                            for (i, v) in items.iter().enumerate() {
                                if pred.matches(v) {
                                    next.push(PathMatch {
                                        path: m.path.index(i),
                                        value: v,
                                    });
                                }
                            }
                        }
                    }
                }
            }
            current = next;
        }

        current
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    expr: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            expr,
            chars: expr.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> PathResult<Vec<ExprSegment>> {
        let mut segments = Vec::new();
        self.skip_ws();

        // Optional root anchor: "$", "$.", "$[". A bare "$xyz" is a field.
        if let Some('$') = self.peek_char() {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            match lookahead.peek().map(|&(_, c)| c) {
                None | Some('.') | Some('[') => {
                    self.chars.next();
                }
                _ => {}
            }
        }

        loop {
            self.skip_ws();
            match self.peek_char() {
                None => break,
                Some('.') => {
                    self.chars.next();
                    if let Some('*') = self.peek_char() {
                        self.chars.next();
                        segments.push(ExprSegment::Wildcard);
                    } else {
                        segments.push(ExprSegment::Field(self.parse_name()?));
                    }
                }
                Some('[') => {
                    segments.push(self.parse_bracket()?);
                }
                Some(_) if segments.is_empty() => {
                    segments.push(ExprSegment::Field(self.parse_name()?));
                }
                Some(ch) => {
                    return Err(self.unexpected(ch));
                }
            }
        }

        Ok(segments)
    }

    fn parse_name(&mut self) -> PathResult<String> {
        match self.peek_char() {
            Some(q @ ('\'' | '"')) => self.parse_quoted(q),
            Some(c) if is_ident_start(c) => {
                let mut name = String::new();
                while let Some(&(_, c)) = self.chars.peek() {
                    if is_ident_continue(c) {
                        name.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Ok(name)
            }
            Some(ch) => Err(self.unexpected(ch)),
            None => Err(self.unexpected_end()),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> PathResult<String> {
        self.chars.next(); // opening quote
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(name),
                Some((_, c)) => name.push(c),
                None => return Err(self.unexpected_end()),
            }
        }
    }

    fn parse_bracket(&mut self) -> PathResult<ExprSegment> {
        let (open_pos, _) = self.chars.next().ok_or_else(|| self.unexpected_end())?;
        self.skip_ws();
        let segment = match self.peek_char() {
            Some('*') => {
                self.chars.next();
                ExprSegment::Wildcard
            }
            Some('?') => {
                self.chars.next();
                self.expect('(')?;
                let pred = self.parse_predicate(open_pos)?;
                self.expect(')')?;
                ExprSegment::Filter(pred)
            }
            Some(q @ ('\'' | '"')) => ExprSegment::Field(self.parse_quoted(q)?),
            Some(c) if c.is_ascii_digit() => {
                let digits = self.take_while(|c| c.is_ascii_digit());
                let index = digits.parse::<usize>().map_err(|e| PathError::InvalidIndex {
                    expr: self.expr.to_string(),
                    pos: open_pos,
                    message: e.to_string(),
                })?;
                ExprSegment::Index(index)
            }
            Some(ch) => return Err(self.unexpected(ch)),
            None => return Err(self.unexpected_end()),
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(segment)
    }

    fn parse_predicate(&mut self, pos: usize) -> PathResult<Predicate> {
        self.skip_ws();
        match self.chars.next() {
            Some((_, '@')) => {}
            Some((_, ch)) => {
                return Err(PathError::InvalidPredicate {
                    expr: self.expr.to_string(),
                    pos,
                    message: format!("expected `@`, found `{ch}`"),
                })
            }
            None => return Err(self.unexpected_end()),
        }

        let mut field_path = Vec::new();
        while let Some('.') = self.peek_char() {
            self.chars.next();
            field_path.push(self.parse_name()?);
        }
        if field_path.is_empty() {
            return Err(PathError::InvalidPredicate {
                expr: self.expr.to_string(),
                pos,
                message: "predicate must access a field below `@`".to_string(),
            });
        }

        self.skip_ws();
        let comparison = match self.peek_char() {
            Some('=' | '!') => {
                let op = self.parse_cmp_op(pos)?;
                self.skip_ws();
                let literal = self.parse_literal(pos)?;
                Some((op, literal))
            }
            _ => None,
        };

        Ok(Predicate {
            field_path,
            comparison,
        })
    }

    fn parse_cmp_op(&mut self, pos: usize) -> PathResult<CmpOp> {
        let first = self.chars.next().map(|(_, c)| c);
        let second = self.chars.next().map(|(_, c)| c);
        match (first, second) {
            (Some('='), Some('=')) => Ok(CmpOp::Eq),
            (Some('!'), Some('=')) => Ok(CmpOp::Ne),
            _ => Err(PathError::InvalidPredicate {
                expr: self.expr.to_string(),
                pos,
                message: "expected `==` or `!=`".to_string(),
            }),
        }
    }

    fn parse_literal(&mut self, pos: usize) -> PathResult<Value> {
        match self.peek_char() {
            Some(q @ ('\'' | '"')) => Ok(Value::String(self.parse_quoted(q)?)),
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let text = self.take_while(|c| {
                    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
                });
                if let Ok(n) = text.parse::<i64>() {
                    return Ok(Value::from(n));
                }
                text.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| PathError::InvalidPredicate {
                        expr: self.expr.to_string(),
                        pos,
                        message: format!("invalid numeric literal `{text}`"),
                    })
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.take_while(|c| c.is_ascii_alphabetic());
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => Err(PathError::InvalidPredicate {
                        expr: self.expr.to_string(),
                        pos,
                        message: format!("unknown literal `{other}`"),
                    }),
                }
            }
            Some(ch) => Err(self.unexpected(ch)),
            None => Err(self.unexpected_end()),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if pred(c) {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn expect(&mut self, expected: char) -> PathResult<()> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((pos, c)) => Err(PathError::UnexpectedChar {
                expr: self.expr.to_string(),
                pos,
                ch: c,
            }),
            None => Err(self.unexpected_end()),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn unexpected(&mut self, ch: char) -> PathError {
        let pos = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.expr.len());
        PathError::UnexpectedChar {
            expr: self.expr.to_string(),
            pos,
            ch,
        }
    }

    fn unexpected_end(&self) -> PathError {
        PathError::UnexpectedEnd {
            expr: self.expr.to_string(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '$')
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-')
}
