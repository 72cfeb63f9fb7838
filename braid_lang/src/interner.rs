//! Symbol and keyword interners.
//!
//! Symbols intern case-sensitively; keywords intern case-insensitively and
//! carry a stable integer id assigned by their table. Both tables guard
//! insertion with a lock so that identical text produced from multiple
//! threads still yields one canonical object. Reads of already-interned
//! entries go through the same lock; tables are small and insertion-heavy
//! only during lowering.
//!
//! A process-wide default table backs `Symbol::global` / `Keyword::global`
//! for code with no context at hand; interpreter contexts own their own
//! tables so tests can run isolated interpreters.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

// ==================== Symbol ====================

#[derive(Debug)]
struct SymbolData {
    name: Box<str>,
    id: u32,
}

/// An interned identifier. One instance per name within a table.
#[derive(Debug, Clone)]
pub struct Symbol(Arc<SymbolData>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Hash id within the owning table
    pub fn id(&self) -> u32 {
        self.0.id
    }

    /// Intern in the process-wide default table
    pub fn global(name: &str) -> Symbol {
        GLOBAL_SYMBOLS.intern(name)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.name.cmp(&other.0.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Case-sensitive symbol interner
#[derive(Debug, Default)]
pub struct SymbolTable {
    inner: Mutex<HashMap<Box<str>, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, name: &str) -> Symbol {
        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sym) = table.get(name) {
            return sym.clone();
        }
        let id = table.len() as u32;
        let sym = Symbol(Arc::new(SymbolData {
            name: Box::from(name),
            id,
        }));
        table.insert(Box::from(name), sym.clone());
        sym
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all interned names (used by REPL completion)
    pub fn names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .map(|k| k.to_string())
            .collect()
    }
}

static GLOBAL_SYMBOLS: Lazy<SymbolTable> = Lazy::new(SymbolTable::new);

// ==================== Keyword ====================

#[derive(Debug)]
struct KeywordData {
    /// Raw text including the leading ':' (and trailing ':' if present)
    text: Box<str>,
    /// Base name: raw minus leading ':' and optional trailing ':'
    base: Box<str>,
    /// Stable id within the owning table
    id: u32,
    /// Trailing ':' marks a keyword that consumes the following argument
    requires_argument: bool,
}

/// An interned keyword. Case-insensitive: `:Foo` and `:foo` are one object.
#[derive(Debug, Clone)]
pub struct Keyword(Arc<KeywordData>);

impl Keyword {
    /// Raw text, leading ':' included
    pub fn text(&self) -> &str {
        &self.0.text
    }

    /// Base name without the colon decorations
    pub fn base_name(&self) -> &str {
        &self.0.base
    }

    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn requires_argument(&self) -> bool {
        self.0.requires_argument
    }

    /// Intern in the process-wide default table
    pub fn global(text: &str) -> Keyword {
        GLOBAL_KEYWORDS.intern(text)
    }

    /// Coerce to a case-insensitive regex over the base name
    pub fn to_regex(&self) -> Result<regex::Regex, regex::Error> {
        regex::RegexBuilder::new(&regex::escape(&self.0.base))
            .case_insensitive(true)
            .build()
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        // Within one table id equality and base equality coincide; across
        // tables the base name is the identity.
        Arc::ptr_eq(&self.0, &other.0) || self.0.base.eq_ignore_ascii_case(&other.0.base)
    }
}

impl Eq for Keyword {}

impl Hash for Keyword {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.base.to_ascii_lowercase().hash(state);
    }
}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyword {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Case-insensitive text comparison, id as tiebreak
        self.0
            .base
            .to_ascii_lowercase()
            .cmp(&other.0.base.to_ascii_lowercase())
            .then(self.0.id.cmp(&other.0.id))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.text)
    }
}

/// Case-insensitive keyword interner with stable ids
#[derive(Debug, Default)]
pub struct KeywordTable {
    inner: Mutex<HashMap<String, Keyword>>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern keyword text. Accepts `name`, `:name`, or `:name:`.
    pub fn intern(&self, text: &str) -> Keyword {
        let raw = if text.starts_with(':') {
            text.to_string()
        } else {
            format!(":{}", text)
        };
        let requires_argument = raw.len() > 1 && raw.ends_with(':');
        let base = raw
            .trim_start_matches(':')
            .trim_end_matches(':')
            .to_string();
        let key = base.to_ascii_lowercase();

        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(kw) = table.get(&key) {
            return kw.clone();
        }
        let id = table.len() as u32;
        let kw = Keyword(Arc::new(KeywordData {
            text: raw.into_boxed_str(),
            base: base.into_boxed_str(),
            id,
            requires_argument,
        }));
        table.insert(key, kw.clone());
        kw
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all interned keyword texts (used by REPL completion)
    pub fn texts(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|k| k.text().to_string())
            .collect()
    }
}

static GLOBAL_KEYWORDS: Lazy<KeywordTable> = Lazy::new(KeywordTable::new);
