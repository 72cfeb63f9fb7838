// Prevent accidental debug output in library code.
// The CLI binary (bin/) may use eprintln!() for user-facing error messages.
#![deny(clippy::print_stderr)]

//! braid_lang
//!
//! The BraidLang interpreter front-end: a dynamically-typed s-expression
//! language where every parsed literal is simultaneously an AST node and a
//! first-class runtime callable.
//!
//! The core of the crate is the literal hierarchy in [`literal`]: vectors,
//! dictionaries, sets, keywords, type literals (`^int` / `^int?`), member
//! literals (`.ToUpper`, `.?quiet`, `.Type/Static`), argument indices
//! (`%N`), and function literals, all implementing the uniform
//! evaluate/invoke protocol. Around it sit the dynamic [`value::Value`]
//! model, the reflected type registry in [`types`], call [`frame`]s, the
//! [`eval`] primitive, and a rustyline REPL behind the `repl` feature.
//!
//! # Example
//!
//! ```
//! use braid_lang::{Braid, Frame};
//!
//! let braid = Braid::new();
//! let frame = Frame::root();
//! braid_lang::builtins::install(&braid, &frame);
//!
//! let result = braid_lang::eval_source(&braid, &frame, "((^int?) \"42\")", "<demo>")
//!     .unwrap();
//! assert_eq!(result, braid_lang::Value::Int(42));
//! ```

// Core modules
pub mod builtins;
pub mod cancel;
pub mod context;
pub mod convert;
pub mod error;
pub mod eval;
pub mod frame;
pub mod interner;
pub mod literal;
pub mod lower;
pub mod methods;
pub mod span;
pub mod types;
pub mod value;

// REPL session management
pub mod repl;

// Re-exports for the common surface
pub use cancel::CancelToken;
pub use context::Braid;
pub use error::{BraidError, BraidErrorKind, BraidResult};
pub use eval::run_source as eval_source;
pub use frame::{Frame, FrameRef};
pub use interner::{Keyword, KeywordTable, Symbol, SymbolTable};
pub use span::{SourceContext, Span};
pub use value::Value;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
