//! Token definitions for the Braid lexer
//!
//! Braid surface syntax is s-expressions plus a handful of reader-level
//! literal prefixes: `^Type` / `^Type?`, `.member` / `.?member` /
//! `.Type/member`, `%N`, `:keyword` / `:keyword:`, `@splat`, and the
//! `[ … ]`, `{ … }`, `#{ … }` collection brackets.

use logos::Logos;

/// Braid tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n,]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("#{")]
    HashLBrace,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ==================== Reader prefixes ====================
    #[token("'")]
    Quote,
    /// Splat marker: `@expr` expands into the enclosing container
    #[token("@")]
    At,

    /// Opening quote of a string literal; the lexer scans the body by hand
    /// so that brackets inside strings never reach the reader.
    #[token("\"")]
    DoubleQuote,

    // ==================== Literal prefixes ====================
    /// Argument-index literal: `%0`, `%1`, ...
    #[regex(r"%[0-9]+")]
    ArgIndex,

    /// Type literal: `^int`, `^int?`, `^text.Builder`
    #[regex(r"\^[A-Za-z_][A-Za-z0-9_.]*\??")]
    TypeName,

    /// Member literal: `.member`, `.?member`, `.Type/member`
    #[regex(r"\.\??[A-Za-z_][A-Za-z0-9_]*(/[A-Za-z_][A-Za-z0-9_]*)?")]
    Member,

    /// Keyword literal: `:name`, `:name:` (trailing colon = takes argument)
    #[regex(r":[A-Za-z_][A-Za-z0-9_\-]*:?")]
    Keyword,

    // ==================== Numbers ====================
    /// Big integer literal with `N` suffix: `123N`
    #[regex(r"-?[0-9]+N", priority = 5)]
    BigInt,

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", priority = 5)]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", priority = 5)]
    Float,

    #[regex(r"-?[0-9]+", priority = 4)]
    Int,

    // ==================== Symbols ====================
    #[regex(r"[A-Za-z_+\-*/<>=!?&|][A-Za-z0-9_+\-*/<>=!?&|]*", priority = 2)]
    Symbol,
}

impl Token {
    /// Human-readable description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::HashLBrace => "'#{'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::Quote => "quote",
            Token::At => "splat marker",
            Token::DoubleQuote => "string",
            Token::ArgIndex => "argument index",
            Token::TypeName => "type literal",
            Token::Member => "member literal",
            Token::Keyword => "keyword",
            Token::BigInt => "big integer",
            Token::Float => "float",
            Token::Int => "integer",
            Token::Symbol => "symbol",
        }
    }

    /// True for tokens that open a collection
    pub fn is_opener(&self) -> bool {
        matches!(
            self,
            Token::LParen | Token::LBracket | Token::LBrace | Token::HashLBrace
        )
    }

    /// True for tokens that close a collection
    pub fn is_closer(&self) -> bool {
        matches!(self, Token::RParen | Token::RBracket | Token::RBrace)
    }
}
