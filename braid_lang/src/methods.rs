//! User-defined method table.
//!
//! Maps `(type name, method symbol)` to a callable. Member dispatch falls
//! back here after the reflected member search misses, which is how users
//! extend builtin types: `(defmethod ^string shout [s] (.ToUpper s))`.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::interner::Symbol;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey {
    /// Lowercased type name
    type_name: String,
    method: Symbol,
}

/// Per-interpreter table of user-defined methods
#[derive(Debug, Default)]
pub struct MethodTable {
    inner: RefCell<HashMap<MethodKey, Value>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method on a type, replacing any previous definition
    pub fn define(&self, type_name: &str, method: Symbol, callable: Value) {
        self.inner.borrow_mut().insert(
            MethodKey {
                type_name: type_name.to_ascii_lowercase(),
                method,
            },
            callable,
        );
    }

    /// Look up a method by type name and symbol
    pub fn get_method(&self, type_name: &str, method: &Symbol) -> Option<Value> {
        self.inner
            .borrow()
            .get(&MethodKey {
                type_name: type_name.to_ascii_lowercase(),
                method: method.clone(),
            })
            .cloned()
    }

    /// Method names defined for a type (for error alternatives)
    pub fn methods_for(&self, type_name: &str) -> Vec<String> {
        let key = type_name.to_ascii_lowercase();
        self.inner
            .borrow()
            .keys()
            .filter(|k| k.type_name == key)
            .map(|k| k.method.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::SymbolTable;

    #[test]
    fn test_define_and_lookup() {
        let syms = SymbolTable::new();
        let table = MethodTable::new();
        let shout = syms.intern("shout");

        assert!(table.get_method("string", &shout).is_none());
        table.define("string", shout.clone(), Value::Int(1));
        assert!(table.get_method("string", &shout).is_some());
        // Type name lookup is case-insensitive
        assert!(table.get_method("String", &shout).is_some());
        // Method symbols are case-sensitive
        let upper = syms.intern("SHOUT");
        assert!(table.get_method("string", &upper).is_none());
    }

    #[test]
    fn test_methods_for_lists_names() {
        let syms = SymbolTable::new();
        let table = MethodTable::new();
        table.define("vector", syms.intern("sum"), Value::Int(0));
        table.define("vector", syms.intern("avg"), Value::Int(0));
        table.define("dict", syms.intern("merge"), Value::Int(0));

        let mut names = table.methods_for("vector");
        names.sort();
        assert_eq!(names, vec!["avg".to_string(), "sum".to_string()]);
    }
}
