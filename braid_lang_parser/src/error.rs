//! Parse error types

use crate::span::Span;
use thiserror::Error;

/// Parse error type
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    /// Unexpected token
    #[error("unexpected token '{found}' at {span:?}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    /// Unexpected end of input
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    /// Invalid escape sequence
    #[error("invalid escape sequence '{sequence}' at {span:?}")]
    InvalidEscape { sequence: String, span: Span },

    /// Unterminated string
    #[error("unterminated string literal starting at line {}", span.start_line)]
    UnterminatedString { span: Span },

    /// Invalid number literal
    #[error("invalid number literal '{literal}' at {span:?}")]
    InvalidNumber { literal: String, span: Span },

    /// Mismatched brackets
    #[error("mismatched brackets: expected '{expected}', found '{found}' at {span:?}")]
    MismatchedBrackets {
        expected: char,
        found: char,
        span: Span,
    },

    /// Unclosed bracket
    #[error("unclosed bracket '{bracket}' opened at line {}", span.start_line)]
    UnclosedBracket { bracket: char, span: Span },

    /// Lexer error
    #[error("unrecognized token at line {}, column {}", span.start_line, span.start_column)]
    LexerError { span: Span },
}

impl ParseError {
    /// Get the span of the error
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => span,
            ParseError::UnexpectedEof { span, .. } => span,
            ParseError::InvalidEscape { span, .. } => span,
            ParseError::UnterminatedString { span } => span,
            ParseError::InvalidNumber { span, .. } => span,
            ParseError::MismatchedBrackets { span, .. } => span,
            ParseError::UnclosedBracket { span, .. } => span,
            ParseError::LexerError { span } => span,
        }
    }

    /// Create an unexpected token error
    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    /// Create an unexpected EOF error
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }

    /// True for errors the REPL treats as "keep reading more lines"
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            ParseError::UnexpectedEof { .. }
                | ParseError::UnclosedBracket { .. }
                | ParseError::UnterminatedString { .. }
        )
    }

    /// Format error with source context
    ///
    /// Returns a string showing the source line with an error marker.
    pub fn format_with_context(&self, source: &str) -> String {
        let span = self.span();

        let lines: Vec<&str> = source.lines().collect();
        let line_idx = span.start_line.saturating_sub(1);

        if line_idx >= lines.len() {
            return String::new();
        }

        let line = lines[line_idx];
        let col = span.start_column.saturating_sub(1);
        let len = if span.start_line == span.end_line {
            span.end_column.saturating_sub(span.start_column).max(1)
        } else {
            1
        };

        let spaces = " ".repeat(col);
        let marker = "^".repeat(len.min(line.len().saturating_sub(col)).max(1));

        format!(
            "  {} | {}\n  {} | {}{}",
            span.start_line,
            line,
            " ".repeat(span.start_line.to_string().len()),
            spaces,
            marker
        )
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
