//! Insertion-ordered dictionary and its key type.
//!
//! Keys are restricted to hashable scalar values; containers and functions
//! are rejected at insertion time. Iteration preserves insertion order so
//! dictionary display and splat expansion are deterministic.

use std::collections::HashMap;

use crate::error::{BraidError, BraidResult};
use crate::interner::{Keyword, Symbol};
use crate::value::Value;

/// Hashable dictionary key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Int(i64),
    Bool(bool),
    Char(char),
    Str(String),
    Keyword(Keyword),
    Symbol(Symbol),
}

impl DictKey {
    /// Convert a runtime value into a key. Unhashable values error.
    pub fn from_value(value: &Value) -> BraidResult<DictKey> {
        match value {
            Value::Int(v) => Ok(DictKey::Int(*v)),
            Value::Bool(v) => Ok(DictKey::Bool(*v)),
            Value::Char(v) => Ok(DictKey::Char(*v)),
            Value::Str(v) => Ok(DictKey::Str(v.clone())),
            Value::Keyword(v) => Ok(DictKey::Keyword(v.clone())),
            Value::Symbol(v) => Ok(DictKey::Symbol(v.clone())),
            other => Err(BraidError::type_mismatch(format!(
                "invalid dictionary key of type {}",
                other.type_name()
            ))),
        }
    }

    /// Convert back into a runtime value
    pub fn to_value(&self) -> Value {
        match self {
            DictKey::Int(v) => Value::Int(*v),
            DictKey::Bool(v) => Value::Bool(*v),
            DictKey::Char(v) => Value::Char(*v),
            DictKey::Str(v) => Value::Str(v.clone()),
            DictKey::Keyword(v) => Value::Keyword(v.clone()),
            DictKey::Symbol(v) => Value::Symbol(v.clone()),
        }
    }
}

/// Insertion-ordered dictionary value
#[derive(Debug, Clone, Default)]
pub struct DictValue {
    entries: Vec<(DictKey, Value)>,
    index: HashMap<DictKey, usize>,
}

impl DictValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &DictKey) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &DictKey) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or update; updates keep the key's original position.
    pub fn insert(&mut self, key: DictKey, value: Value) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &DictKey) -> Option<Value> {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DictKey, Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DictKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Case-insensitive lookup over string-ish keys. Member dispatch uses
    /// this so `.name` finds the `:Name` entry of a property bag.
    pub fn get_member(&self, name: &str) -> Option<(&DictKey, &Value)> {
        self.entries.iter().find_map(|(k, v)| {
            let matches = match k {
                DictKey::Str(s) => s.eq_ignore_ascii_case(name),
                DictKey::Keyword(kw) => kw.base_name().eq_ignore_ascii_case(name),
                DictKey::Symbol(sym) => sym.name().eq_ignore_ascii_case(name),
                _ => false,
            };
            matches.then_some((k, v))
        })
    }
}
