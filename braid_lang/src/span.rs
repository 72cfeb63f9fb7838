use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Source code span with byte offsets and 1-indexed line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        start_line: usize,
        end_line: usize,
        start_column: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start.min(source.len())..self.end.min(source.len())]
    }

    /// Create a Span from braid_lang_parser's Span type.
    pub fn from_parser_span(span: &braid_lang_parser::Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
            start_line: span.start_line,
            end_line: span.end_line,
            start_column: span.start_column,
            end_column: span.end_column,
        }
    }
}

/// Source context captured at literal construction time.
///
/// Every literal carries one of these; errors raised during evaluation
/// report the file, position, and containing function it names.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub span: Span,
    /// File the literal came from ("<repl>" for interactive input)
    pub file: Rc<str>,
    /// Verbatim source text of the literal
    pub text: Rc<str>,
    /// Name of the function the literal appears in ("top-level" otherwise)
    pub function: Rc<str>,
}

impl SourceContext {
    pub fn new(span: Span, file: Rc<str>, text: Rc<str>, function: Rc<str>) -> Self {
        Self {
            span,
            file,
            text,
            function,
        }
    }

    /// Synthetic context for literals built outside a parse (tests, FFI).
    pub fn synthetic(text: &str) -> Self {
        Self {
            span: Span::default(),
            file: Rc::from("<none>"),
            text: Rc::from(text),
            function: Rc::from("top-level"),
        }
    }

    /// Render as `file:line:column (in function)`
    pub fn location(&self) -> String {
        format!(
            "{}:{}:{} (in {})",
            self.file, self.span.start_line, self.span.start_column, self.function
        )
    }
}
