//! Concrete syntax tree for Braid source
//!
//! The reader produces `SExpr` nodes; lowering to runtime literals lives in
//! the interpreter crate. Atom text is kept verbatim (strings include their
//! quotes) so the lowering layer owns unescaping and number parsing.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Classification of an atom token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomKind {
    Int,
    BigInt,
    Float,
    /// String literal; text includes the surrounding quotes
    Str,
    Keyword,
    Symbol,
    /// `^Name` / `^Name?`
    TypeName,
    /// `.member` / `.?member` / `.Type/member`
    Member,
    /// `%N`
    ArgIndex,
}

/// A node in the s-expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SExpr {
    pub kind: SExprKind,
    pub span: Span,
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SExprKind {
    /// `( … )`: application / special form
    List(Vec<SExpr>),
    /// `[ … ]`: vector literal
    Vector(Vec<SExpr>),
    /// `{ … }`: dictionary literal (flat key/value list)
    Map(Vec<SExpr>),
    /// `#{ … }`: hash-set literal
    Set(Vec<SExpr>),
    /// `'expr`
    Quote(Box<SExpr>),
    /// `@expr`: splat into the enclosing container
    Splat(Box<SExpr>),
    Atom { kind: AtomKind, text: String },
}

impl SExpr {
    pub fn new(kind: SExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create an atom node
    pub fn atom(kind: AtomKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SExprKind::Atom {
                kind,
                text: text.into(),
            },
            span,
        }
    }

    /// Atom text, if this node is an atom
    pub fn atom_text(&self) -> Option<&str> {
        match &self.kind {
            SExprKind::Atom { text, .. } => Some(text),
            _ => None,
        }
    }

    /// True if this node is a symbol atom with the given name
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(
            &self.kind,
            SExprKind::Atom { kind: AtomKind::Symbol, text } if text == name
        )
    }

    /// True if this node is a splat marker
    pub fn is_splat(&self) -> bool {
        matches!(self.kind, SExprKind::Splat(_))
    }
}
