//! Reader: token stream -> s-expression tree
//!
//! A small recursive-descent reader over the lexer. Bracket pairing errors
//! carry the span of the offending token; an unclosed bracket reports the
//! line where it was opened, which the REPL uses to decide whether to keep
//! reading input.

use crate::cst::{AtomKind, SExpr, SExprKind};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

/// Braid reader
pub struct Reader<'a> {
    lexer: Lexer<'a>,
    /// End-of-source span for EOF errors
    eof_span: Span,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        let lexer = Lexer::new(source);
        let eof_span = lexer.source_map().span(source.len(), source.len());
        Self { lexer, eof_span }
    }

    /// Read all top-level forms
    pub fn read_all(&mut self) -> ParseResult<Vec<SExpr>> {
        let mut forms = Vec::new();
        while let Some(result) = self.lexer.next_token() {
            let token = result?;
            forms.push(self.read_form(token)?);
        }
        Ok(forms)
    }

    /// Read a single form starting from the given token
    fn read_form(&mut self, token: SpannedToken<'a>) -> ParseResult<SExpr> {
        match token.token {
            Token::LParen => self.read_delimited(token, Token::RParen, SExprKind::List),
            Token::LBracket => self.read_delimited(token, Token::RBracket, SExprKind::Vector),
            Token::LBrace => self.read_delimited(token, Token::RBrace, SExprKind::Map),
            Token::HashLBrace => self.read_delimited(token, Token::RBrace, SExprKind::Set),

            Token::Quote => {
                let inner = self.read_next("quoted form", &token)?;
                let span = token.span.merge(&inner.span);
                Ok(SExpr::new(SExprKind::Quote(Box::new(inner)), span))
            }
            Token::At => {
                let inner = self.read_next("splatted form", &token)?;
                let span = token.span.merge(&inner.span);
                Ok(SExpr::new(SExprKind::Splat(Box::new(inner)), span))
            }

            Token::RParen | Token::RBracket | Token::RBrace => Err(
                ParseError::unexpected_token(token.text, "a form", token.span),
            ),

            Token::Int => Ok(SExpr::atom(AtomKind::Int, token.text, token.span)),
            Token::BigInt => Ok(SExpr::atom(AtomKind::BigInt, token.text, token.span)),
            Token::Float => Ok(SExpr::atom(AtomKind::Float, token.text, token.span)),
            Token::DoubleQuote => Ok(SExpr::atom(AtomKind::Str, token.text, token.span)),
            Token::Keyword => Ok(SExpr::atom(AtomKind::Keyword, token.text, token.span)),
            Token::Symbol => Ok(SExpr::atom(AtomKind::Symbol, token.text, token.span)),
            Token::TypeName => Ok(SExpr::atom(AtomKind::TypeName, token.text, token.span)),
            Token::Member => Ok(SExpr::atom(AtomKind::Member, token.text, token.span)),
            Token::ArgIndex => Ok(SExpr::atom(AtomKind::ArgIndex, token.text, token.span)),
        }
    }

    /// Read forms until `closer`, building a collection node
    fn read_delimited(
        &mut self,
        opener: SpannedToken<'a>,
        closer: Token,
        build: fn(Vec<SExpr>) -> SExprKind,
    ) -> ParseResult<SExpr> {
        let mut items = Vec::new();
        loop {
            match self.lexer.next_token() {
                None => {
                    return Err(ParseError::UnclosedBracket {
                        bracket: opener_char(opener.token),
                        span: opener.span,
                    });
                }
                Some(Err(e)) => return Err(e),
                Some(Ok(token)) if token.token == closer => {
                    let span = opener.span.merge(&token.span);
                    return Ok(SExpr::new(build(items), span));
                }
                Some(Ok(token)) if token.token.is_closer() => {
                    return Err(ParseError::MismatchedBrackets {
                        expected: closer_char(closer),
                        found: closer_char(token.token),
                        span: token.span,
                    });
                }
                Some(Ok(token)) => items.push(self.read_form(token)?),
            }
        }
    }

    /// Read the next form, erroring with `expected` at EOF
    fn read_next(&mut self, expected: &str, after: &SpannedToken<'a>) -> ParseResult<SExpr> {
        match self.lexer.next_token() {
            None => Err(ParseError::unexpected_eof(expected, self.eof_span)),
            Some(Err(e)) => Err(e),
            Some(Ok(token)) if token.token.is_closer() => Err(ParseError::unexpected_token(
                token.text,
                expected,
                after.span.merge(&token.span),
            )),
            Some(Ok(token)) => self.read_form(token),
        }
    }
}

fn opener_char(token: Token) -> char {
    match token {
        Token::LParen => '(',
        Token::LBracket => '[',
        Token::LBrace | Token::HashLBrace => '{',
        _ => '?',
    }
}

fn closer_char(token: Token) -> char {
    match token {
        Token::RParen => ')',
        Token::RBracket => ']',
        Token::RBrace => '}',
        _ => '?',
    }
}
