//! Interactive session: persistent globals across evaluations.

use serde::Serialize;

use crate::builtins;
use crate::cancel::CancelToken;
use crate::context::Braid;
use crate::eval;
use crate::frame::{Frame, FrameRef};
use crate::value::{render, Value};

/// Special form names, offered by completion alongside bound symbols
const SPECIAL_FORMS: &[&str] = &[
    "and", "def", "defmethod", "defn", "do", "fn", "if", "let", "or", "quote", "set", "throw",
];

/// Result of one REPL evaluation
#[derive(Debug, Clone, Serialize)]
pub struct ReplResult {
    pub success: bool,
    /// Rendered result value when evaluation succeeded
    pub value: Option<String>,
    pub error: Option<String>,
    /// Output captured from print/println during the evaluation
    pub output: String,
}

impl ReplResult {
    fn ok(value: Option<String>, output: String) -> Self {
        Self {
            success: true,
            value,
            error: None,
            output,
        }
    }

    fn error(message: String, output: String) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(message),
            output,
        }
    }
}

/// REPL session that maintains state across evaluations.
#[derive(Debug)]
pub struct ReplSession {
    braid: Braid,
    /// Persistent interactive global frame
    globals: FrameRef,
    /// Evaluation counter (drives the `ans` rebinding)
    eval_count: u64,
}

impl ReplSession {
    pub fn new() -> Self {
        let braid = Braid::new();
        let globals = Frame::interactive();
        builtins::install(&braid, &globals);
        Self {
            braid,
            globals,
            eval_count: 0,
        }
    }

    /// Evaluate Braid code in this session.
    /// Variables defined here persist for future evaluations.
    pub fn eval(&mut self, input: &str) -> ReplResult {
        self.braid.cancel.reset();
        self.eval_count += 1;

        match eval::run_source(&self.braid, &self.globals, input, "<repl>") {
            Ok(value) => {
                self.globals
                    .set_local(self.braid.symbols.intern("ans"), value.clone());
                let rendered = match render(&value, Some(&self.braid.cancel)) {
                    Ok(text) => text,
                    Err(e) => {
                        return ReplResult::error(e.to_string(), self.braid.take_output());
                    }
                };
                ReplResult::ok(Some(rendered), self.braid.take_output())
            }
            Err(e) => ReplResult::error(e.to_string(), self.braid.take_output()),
        }
    }

    /// Whether the input is a complete set of forms (continuation prompt
    /// logic; brackets inside strings never count).
    pub fn is_complete(input: &str) -> bool {
        braid_lang_parser::is_complete(input)
    }

    /// Discard all session state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn eval_count(&self) -> u64 {
        self.eval_count
    }

    pub fn braid(&self) -> &Braid {
        &self.braid
    }

    pub fn globals(&self) -> &FrameRef {
        &self.globals
    }

    /// Token a host can use to interrupt a running evaluation
    pub fn cancel_token(&self) -> CancelToken {
        self.braid.cancel.clone()
    }

    /// Names of the global bindings (for `vars()`-style listings)
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = self.globals.local_names();
        names.sort();
        names
    }

    /// Candidates for tab completion on a prefix
    pub fn completion_candidates(&self, prefix: &str) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();
        candidates.extend(self.globals.local_names());
        candidates.extend(SPECIAL_FORMS.iter().map(|s| s.to_string()));
        candidates.extend(self.braid.types.names().into_iter().map(|t| format!("^{}", t)));
        candidates.extend(self.braid.keywords.texts());

        let mut matching: Vec<String> = candidates
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect();
        matching.sort();
        matching.dedup();
        matching
    }

    /// Value of a global, mostly for tests and embedding
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.get_variable(&self.braid.symbols.intern(name))
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}
