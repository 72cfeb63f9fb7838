//! braid_lang_parser
//!
//! Pure Rust s-expression reader for BraidLang.
//!
//! Produces a spanned CST (`SExpr`); lowering to runtime literal objects is
//! the interpreter crate's job. String literals are scanned by hand so that
//! bracket characters inside strings never participate in bracket matching.
//!
//! # Example
//!
//! ```
//! use braid_lang_parser::{parse, SExprKind};
//!
//! let forms = parse("(print [1 2 3])").expect("parse failed");
//! assert_eq!(forms.len(), 1);
//! assert!(matches!(forms[0].kind, SExprKind::List(_)));
//! ```

pub mod cst;
pub mod error;
pub mod lexer;
pub mod reader;
pub mod span;
pub mod token;

// Re-exports
pub use cst::{AtomKind, SExpr, SExprKind};
pub use error::{ParseError, ParseResult};
pub use lexer::{tokenize, Lexer, SpannedToken};
pub use reader::Reader;
pub use span::{SourceMap, Span};
pub use token::Token;

/// Parse Braid source code into a list of top-level forms
pub fn parse(source: &str) -> ParseResult<Vec<SExpr>> {
    Reader::new(source).read_all()
}

/// Check whether `source` is a complete set of forms.
///
/// Returns `false` when the only problem is an unclosed bracket, an
/// unterminated string, or a truncated reader prefix; the REPL keeps
/// reading lines in that case. Hard syntax errors count as "complete"
/// so they are reported instead of trapping the user in continuation
/// prompts.
pub fn is_complete(source: &str) -> bool {
    match parse(source) {
        Ok(_) => true,
        Err(e) => !e.is_incomplete(),
    }
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
