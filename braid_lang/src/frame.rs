//! Call frames.
//!
//! One activation record per call: symbol-keyed locals, a lexical parent
//! link, a dynamic caller link, and an optional bound argument vector.
//! `%N` literals walk the lexical chain for the nearest frame whose
//! argument vector is non-null, so a nested argument-less lambda reads the
//! arguments of its enclosing call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interner::Symbol;
use crate::value::Value;

pub type FrameRef = Rc<Frame>;

#[derive(Debug)]
pub struct Frame {
    parent: Option<FrameRef>,
    caller: Option<FrameRef>,
    /// Bound argument vector; `None` for frames that carry no arguments
    pub arguments: Option<RefCell<Vec<Value>>>,
    locals: RefCell<HashMap<Symbol, Value>>,
    pub function_name: Rc<str>,
    pub is_interactive: bool,
}

impl Frame {
    /// Root frame for batch evaluation
    pub fn root() -> FrameRef {
        Rc::new(Frame {
            parent: None,
            caller: None,
            arguments: None,
            locals: RefCell::new(HashMap::new()),
            function_name: Rc::from("top-level"),
            is_interactive: false,
        })
    }

    /// Root frame for an interactive session
    pub fn interactive() -> FrameRef {
        Rc::new(Frame {
            parent: None,
            caller: None,
            arguments: None,
            locals: RefCell::new(HashMap::new()),
            function_name: Rc::from("top-level"),
            is_interactive: true,
        })
    }

    /// New call frame under `parent`
    pub fn child(
        parent: &FrameRef,
        function_name: Rc<str>,
        arguments: Option<Vec<Value>>,
        caller: Option<FrameRef>,
    ) -> FrameRef {
        Rc::new(Frame {
            parent: Some(parent.clone()),
            caller,
            arguments: arguments.map(RefCell::new),
            locals: RefCell::new(HashMap::new()),
            function_name,
            is_interactive: parent.is_interactive,
        })
    }

    pub fn parent(&self) -> Option<&FrameRef> {
        self.parent.as_ref()
    }

    pub fn caller(&self) -> Option<&FrameRef> {
        self.caller.as_ref()
    }

    /// Look up a variable, walking the lexical chain
    pub fn get_variable(&self, sym: &Symbol) -> Option<Value> {
        if let Some(v) = self.locals.borrow().get(sym) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get_variable(sym))
    }

    /// Bind a variable in this frame
    pub fn set_local(&self, sym: Symbol, value: Value) {
        self.locals.borrow_mut().insert(sym, value);
    }

    /// Overwrite an existing binding, walking the lexical chain.
    /// Returns false when no frame binds the symbol.
    pub fn assign(&self, sym: &Symbol, value: Value) -> bool {
        if self.locals.borrow().contains_key(sym) {
            self.locals.borrow_mut().insert(sym.clone(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.assign(sym, value),
            None => false,
        }
    }

    /// Names bound in this frame (used by REPL completion)
    pub fn local_names(&self) -> Vec<String> {
        self.locals
            .borrow()
            .keys()
            .map(|s| s.name().to_string())
            .collect()
    }
}

/// Nearest frame (starting here) whose argument vector is bound
pub fn nearest_arguments(frame: &FrameRef) -> Option<FrameRef> {
    let mut current = Some(frame.clone());
    while let Some(f) = current {
        if f.arguments.is_some() {
            return Some(f);
        }
        current = f.parent().cloned();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::SymbolTable;

    #[test]
    fn test_lookup_walks_parent_chain() {
        let syms = SymbolTable::new();
        let x = syms.intern("x");
        let root = Frame::root();
        root.set_local(x.clone(), Value::Int(1));

        let inner = Frame::child(&root, Rc::from("f"), None, None);
        assert_eq!(inner.get_variable(&x), Some(Value::Int(1)));

        inner.set_local(x.clone(), Value::Int(2));
        assert_eq!(inner.get_variable(&x), Some(Value::Int(2)));
        assert_eq!(root.get_variable(&x), Some(Value::Int(1)));
    }

    #[test]
    fn test_assign_updates_binding_frame() {
        let syms = SymbolTable::new();
        let x = syms.intern("x");
        let root = Frame::root();
        root.set_local(x.clone(), Value::Int(1));

        let inner = Frame::child(&root, Rc::from("f"), None, None);
        assert!(inner.assign(&x, Value::Int(9)));
        assert_eq!(root.get_variable(&x), Some(Value::Int(9)));

        let y = syms.intern("y");
        assert!(!inner.assign(&y, Value::Int(0)));
    }

    #[test]
    fn test_nearest_arguments_skips_argless_frames() {
        let root = Frame::root();
        let outer = Frame::child(&root, Rc::from("outer"), Some(vec![Value::Int(42)]), None);
        let inner = Frame::child(&outer, Rc::from("inner"), None, None);

        let found = nearest_arguments(&inner).expect("should find outer frame");
        assert_eq!(found.arguments.as_ref().unwrap().borrow()[0], Value::Int(42));
    }

    #[test]
    fn test_nearest_arguments_none() {
        let root = Frame::root();
        assert!(nearest_arguments(&root).is_none());
    }
}
