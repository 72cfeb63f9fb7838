//! rustyline editor integration: completion, validation, highlighting.

use std::borrow::Cow;
use std::cell::RefCell;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

/// ANSI color codes for the Monokai theme
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const STRING: &str = "\x1b[38;2;230;219;116m"; // #E6DB74 (yellow)
    pub const NUMBER: &str = "\x1b[38;2;174;129;255m"; // #AE81FF (purple)
    pub const COMMENT: &str = "\x1b[38;2;117;113;94m"; // #75715E (gray)
    pub const KEYWORD: &str = "\x1b[38;2;253;151;31m"; // #FD971F (orange)
    pub const TYPE: &str = "\x1b[38;2;102;217;239m"; // #66D9EF (cyan)
    pub const MEMBER: &str = "\x1b[38;2;166;226;46m"; // #A6E22E (green)
    pub const CONSTANT: &str = "\x1b[38;2;249;38;114m"; // #F92672 (pink)
    pub const PROMPT: &str = "\x1b[32m"; // Green
    pub const ERROR: &str = "\x1b[31m"; // Red
}

const CONSTANTS: &[&str] = &["true", "false", "nil", "null"];

/// Braid syntax highlighter for rustyline
#[derive(Debug, Default)]
pub struct BraidHighlighter;

impl BraidHighlighter {
    pub fn highlight_line(&self, line: &str) -> String {
        let mut result = String::with_capacity(line.len() * 2);
        let chars: Vec<char> = line.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            let c = chars[i];

            // Line comment runs to end of line
            if c == ';' {
                result.push_str(colors::COMMENT);
                while i < len {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(colors::RESET);
                break;
            }

            // String literal (escape-aware)
            if c == '"' {
                result.push_str(colors::STRING);
                result.push(c);
                i += 1;
                while i < len {
                    result.push(chars[i]);
                    if chars[i] == '\\' && i + 1 < len {
                        i += 1;
                        result.push(chars[i]);
                    } else if chars[i] == '"' {
                        break;
                    }
                    i += 1;
                }
                i += 1;
                result.push_str(colors::RESET);
                continue;
            }

            // Number
            if c.is_ascii_digit()
                || (c == '-' && i + 1 < len && chars[i + 1].is_ascii_digit())
            {
                result.push_str(colors::NUMBER);
                result.push(c);
                i += 1;
                while i < len
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_')
                {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(colors::RESET);
                continue;
            }

            // Keyword / type / member prefixes color the whole token
            if c == ':' || c == '^' || c == '.' || c == '%' {
                let color = match c {
                    ':' => colors::KEYWORD,
                    '^' => colors::TYPE,
                    '.' => colors::MEMBER,
                    _ => colors::NUMBER,
                };
                let start = i;
                i += 1;
                while i < len && is_token_char(chars[i]) {
                    i += 1;
                }
                if i > start + 1 {
                    result.push_str(color);
                    result.extend(&chars[start..i]);
                    result.push_str(colors::RESET);
                } else {
                    result.push(c);
                }
                continue;
            }

            // Bare word: constants get color, everything else passes through
            if is_token_char(c) {
                let start = i;
                while i < len && is_token_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if CONSTANTS.contains(&word.as_str()) {
                    result.push_str(colors::CONSTANT);
                    result.push_str(&word);
                    result.push_str(colors::RESET);
                } else {
                    result.push_str(&word);
                }
                continue;
            }

            result.push(c);
            i += 1;
        }

        result
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '+' | '*' | '/' | '<' | '>' | '=' | '!' | '?' | ':')
}

/// rustyline helper: completion over session bindings, bracket-aware
/// multi-line validation, Monokai highlighting.
#[derive(Debug, Default)]
pub struct BraidHelper {
    highlighter: BraidHighlighter,
    /// Completion candidates, refreshed by the REPL loop after each eval
    candidates: RefCell<Vec<String>>,
}

impl BraidHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate list (bound symbols, keywords, types)
    pub fn set_candidates(&self, candidates: Vec<String>) {
        *self.candidates.borrow_mut() = candidates;
    }
}

impl Completer for BraidHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| !is_token_char(c) && c != '^' && c != '.' && c != '%')
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &line[start..pos];
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }
        let matches: Vec<Pair> = self
            .candidates
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for BraidHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for BraidHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlighter.highlight_line(line))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("{}{}{}", colors::PROMPT, prompt, colors::RESET))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

impl Validator for BraidHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        // Bracket balance is string-aware: a ')' inside a string literal
        // never closes a form.
        if braid_lang_parser::is_complete(ctx.input()) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

impl Helper for BraidHelper {}
