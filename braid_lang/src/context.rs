//! The interpreter context.
//!
//! Everything that would otherwise be process-global state (interner
//! tables, the type registry, the user method table, the documentation
//! side-table, the cancellation token, captured output) lives on `Braid`,
//! so tests and embedders can run isolated interpreters side by side.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::cancel::CancelToken;
use crate::interner::{KeywordTable, SymbolTable};
use crate::methods::MethodTable;
use crate::types::TypeRegistry;

#[derive(Debug)]
pub struct Braid {
    pub symbols: SymbolTable,
    pub keywords: KeywordTable,
    pub types: TypeRegistry,
    pub methods: MethodTable,
    /// Help text side-table, keyed by lambda id
    pub docs: RefCell<HashMap<usize, Rc<str>>>,
    pub cancel: CancelToken,
    /// Output captured from `print`/`println`; drained by the host
    out: RefCell<String>,
    lambda_ids: Cell<usize>,
}

impl Braid {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            keywords: KeywordTable::new(),
            types: TypeRegistry::with_builtins(),
            methods: MethodTable::new(),
            docs: RefCell::new(HashMap::new()),
            cancel: CancelToken::new(),
            out: RefCell::new(String::new()),
            lambda_ids: Cell::new(0),
        }
    }

    /// Fresh identity for an instantiated lambda
    pub fn next_lambda_id(&self) -> usize {
        let id = self.lambda_ids.get() + 1;
        self.lambda_ids.set(id);
        id
    }

    /// Attach help text to a lambda id
    pub fn set_doc(&self, id: usize, help: Rc<str>) {
        self.docs.borrow_mut().insert(id, help);
    }

    /// Help text for a lambda id, if any
    pub fn get_doc(&self, id: usize) -> Option<Rc<str>> {
        self.docs.borrow().get(&id).cloned()
    }

    /// Append to captured output
    pub fn write_out(&self, text: &str) {
        self.out.borrow_mut().push_str(text);
    }

    /// Drain captured output
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.out.borrow_mut())
    }
}

impl Default for Braid {
    fn default() -> Self {
        Self::new()
    }
}
