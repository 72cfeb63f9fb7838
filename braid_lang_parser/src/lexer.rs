//! Lexer for Braid source code
//!
//! Wraps the logos-generated lexer with hand-scanning for string literals,
//! so that delimiters inside strings never reach the reader. This is also
//! what keeps bracket matching honest: a `)` inside a string body is part
//! of the string, not a closer.

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token, span: Span, text: &'a str) -> Self {
        Self { token, span, text }
    }
}

/// Braid lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    /// Peeked token (for lookahead)
    peeked: Option<Option<Result<SpannedToken<'a>, ParseError>>>,
    /// Offset from original source (used after restarting the lexer)
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        let source_map = SourceMap::new(source);
        Self {
            source,
            inner: Token::lexer(source),
            source_map,
            peeked: None,
            offset: 0,
        }
    }

    /// Get the source code
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Get the source map
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Create a span from byte offsets
    fn make_span(&self, start: usize, end: usize) -> Span {
        self.source_map.span(start, end)
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&Result<SpannedToken<'a>, ParseError>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token_internal());
        }
        self.peeked.as_ref().and_then(|p| p.as_ref())
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<Result<SpannedToken<'a>, ParseError>> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }
        self.next_token_internal()
    }

    fn next_token_internal(&mut self) -> Option<Result<SpannedToken<'a>, ParseError>> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        let start = self.offset + span.start;
        let end = self.offset + span.end;

        match result {
            Ok(Token::DoubleQuote) => {
                // Scan string content by hand to find the closing quote.
                // The emitted token covers the whole literal, quotes included.
                match self.scan_string_to_close(end) {
                    Ok(string_end) => {
                        self.restart_from(string_end);
                        let span = self.make_span(start, string_end);
                        let text = &self.source[start..string_end];
                        Some(Ok(SpannedToken::new(Token::DoubleQuote, span, text)))
                    }
                    Err(e) => {
                        self.restart_from(self.source.len());
                        Some(Err(e))
                    }
                }
            }

            Ok(token) => {
                let span = self.make_span(start, end);
                let text = &self.source[start..end];
                Some(Ok(SpannedToken::new(token, span, text)))
            }

            Err(()) => {
                let span = self.make_span(start, end);
                Some(Err(ParseError::LexerError { span }))
            }
        }
    }

    /// Scan string content to find the closing quote.
    /// Uses memchr for fast scanning over escape and quote bytes.
    fn scan_string_to_close(&self, start: usize) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while pos < bytes.len() {
            match memchr::memchr2(b'\\', b'"', &bytes[pos..]) {
                None => break,
                Some(offset) => {
                    pos += offset;
                    if bytes[pos] == b'\\' && pos + 1 < bytes.len() {
                        pos += 2;
                        continue;
                    }
                    if bytes[pos] == b'"' {
                        return Ok(pos + 1);
                    }
                    pos += 1;
                }
            }
        }

        Err(ParseError::UnterminatedString {
            span: self.make_span(start - 1, pos),
        })
    }

    /// Restart the lexer from a new position.
    fn restart_from(&mut self, pos: usize) {
        self.peeked = None;
        let logos_abs_pos = self.offset + self.inner.span().end;
        if pos > logos_abs_pos && pos <= self.source.len() {
            let skip = pos - logos_abs_pos;
            self.inner.bump(skip);
        } else if pos < self.source.len() {
            let remaining = &self.source[pos..];
            self.inner = Token::lexer(remaining);
            self.offset = pos;
        } else {
            self.inner = Token::lexer("");
            self.offset = pos;
        }
    }
}

/// Tokenize Braid source code
///
/// Returns a vector of tokens with their spans.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken<'_>, ParseError>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ok_tokens(source: &str) -> Vec<(Token, String)> {
        tokenize(source)
            .into_iter()
            .map(|r| {
                let t = r.unwrap();
                (t.token, t.text.to_string())
            })
            .collect()
    }

    #[test]
    fn test_string_lexeme_includes_quotes() {
        let tokens = ok_tokens(r#"(print "hi")"#);
        assert_eq!(
            tokens,
            vec![
                (Token::LParen, "(".to_string()),
                (Token::Symbol, "print".to_string()),
                (Token::DoubleQuote, "\"hi\"".to_string()),
                (Token::RParen, ")".to_string()),
            ]
        );
    }

    #[test]
    fn test_brackets_inside_strings_are_opaque() {
        // The ')' and '(' inside the string must not tokenize as delimiters.
        let tokens = ok_tokens(r#"("a ) ( b")"#);
        assert_eq!(
            tokens,
            vec![
                (Token::LParen, "(".to_string()),
                (Token::DoubleQuote, "\"a ) ( b\"".to_string()),
                (Token::RParen, ")".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let tokens = ok_tokens(r#""say \"hi\"""#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].1, r#""say \"hi\"""#);
    }

    #[test]
    fn test_unterminated_string() {
        let results = tokenize(r#""never ends"#);
        assert!(matches!(
            results[0],
            Err(ParseError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_span_positions() {
        let tokens = tokenize("x\ny").into_iter().map(|t| t.unwrap()).collect::<Vec<_>>();
        assert_eq!(tokens[0].span.start_line, 1);
        assert_eq!(tokens[1].span.start_line, 2);
        assert_eq!(tokens[1].span.start_column, 1);
    }
}
