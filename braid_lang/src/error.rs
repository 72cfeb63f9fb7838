//! Interpreter error types.
//!
//! Errors are raised, not returned as values; each carries the source
//! context captured when the offending literal was constructed. User-thrown
//! values travel in `UserError` and pass through dispatch unchanged; they
//! belong to the program, not the interpreter.

use thiserror::Error;

use crate::span::SourceContext;
use crate::value::Value;

/// Error kind
#[derive(Debug, Error, Clone)]
pub enum BraidErrorKind {
    /// Type name could not be resolved
    #[error("UnresolvedType: cannot resolve type '{0}'")]
    UnresolvedType(String),

    /// Strict cast rejected the value
    #[error("StrictCastFailure: cannot cast {value} to ^{target}")]
    StrictCastFailure { value: String, target: String },

    /// Soft cast could not coerce the value
    #[error("SoftCastFailure: soft type constraint violation: {value} -> ^{target}: {reason}")]
    SoftCastFailure {
        value: String,
        target: String,
        reason: String,
    },

    /// Named property/field/method not found; carries the alternatives list
    #[error("MissingMember: no member '{member}' on type '{type_name}'; members are: {}", .alternatives.join(", "))]
    MissingMember {
        type_name: String,
        member: String,
        alternatives: Vec<String>,
    },

    /// Wrong number of arguments to a literal-as-callable
    #[error("ArityMismatch: {what} takes {expected} argument(s), got {got}")]
    ArityMismatch {
        what: String,
        expected: String,
        got: usize,
    },

    /// Vector/dictionary/set index invalid
    #[error("BadIndex: {0}")]
    BadIndex(String),

    /// `%N` beyond the current argument frame
    #[error("ArgIndexOutOfRange: %{index} exceeds argument vector of length {length}")]
    ArgIndexOutOfRange { index: usize, length: usize },

    /// Parse-time duplicate keys in a dictionary literal
    #[error("DuplicateKey: duplicate literal key {0} in dictionary literal")]
    DuplicateKey(String),

    /// Runtime odd element count after splat expansion
    #[error("OddDictionaryLiteral: dictionary literal has {0} elements after splat expansion")]
    OddDictionaryLiteral(usize),

    /// Wrapped failure from a host member invocation
    #[error("HostInvocationError: {member}: {message}")]
    HostInvocationError { member: String, message: String },

    /// General "expected X, got Y" runtime error
    #[error("TypeMismatch: {0}")]
    TypeMismatch(String),

    /// Unbound symbol reference
    #[error("UndefinedSymbol: symbol '{0}' is not bound")]
    UndefinedSymbol(String),

    /// Value in function position cannot be invoked
    #[error("NotCallable: {0} cannot be used as a function")]
    NotCallable(String),

    /// Evaluation was cancelled through the interpreter's token
    #[error("Cancelled: evaluation cancelled")]
    Cancelled,

    /// Value thrown by the program; passes through unchanged
    #[error("{0}")]
    UserError(Value),

    /// Reader or lowering failure
    #[error("SyntaxError: {0}")]
    Syntax(String),
}

/// An error with optional source context
#[derive(Debug, Clone)]
pub struct BraidError {
    pub kind: BraidErrorKind,
    pub context: Option<SourceContext>,
}

impl BraidError {
    pub fn new(kind: BraidErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Attach source context if none is present yet. The innermost literal
    /// wins: errors keep the context of the construct that raised them.
    pub fn with_context(mut self, context: &SourceContext) -> Self {
        if self.context.is_none() {
            self.context = Some(context.clone());
        }
        self
    }

    /// True for user-thrown errors, which dispatch must not rewrap
    pub fn is_user_error(&self) -> bool {
        matches!(self.kind, BraidErrorKind::UserError(_))
    }

    /// Innermost message of a (possibly nested) host invocation error
    pub fn unwrapped_message(&self) -> String {
        match &self.kind {
            BraidErrorKind::HostInvocationError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    // ── constructors ──────────────────────────────────────────────────────

    pub fn unresolved_type(name: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::UnresolvedType(name.into()))
    }

    pub fn strict_cast(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::StrictCastFailure {
            value: value.into(),
            target: target.into(),
        })
    }

    pub fn soft_cast(
        value: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(BraidErrorKind::SoftCastFailure {
            value: value.into(),
            target: target.into(),
            reason: reason.into(),
        })
    }

    pub fn missing_member(
        type_name: impl Into<String>,
        member: impl Into<String>,
        alternatives: Vec<String>,
    ) -> Self {
        Self::new(BraidErrorKind::MissingMember {
            type_name: type_name.into(),
            member: member.into(),
            alternatives,
        })
    }

    pub fn arity(what: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        Self::new(BraidErrorKind::ArityMismatch {
            what: what.into(),
            expected: expected.into(),
            got,
        })
    }

    pub fn bad_index(msg: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::BadIndex(msg.into()))
    }

    pub fn arg_index_out_of_range(index: usize, length: usize) -> Self {
        Self::new(BraidErrorKind::ArgIndexOutOfRange { index, length })
    }

    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::DuplicateKey(key.into()))
    }

    pub fn host_invocation(member: impl Into<String>, inner: &BraidError) -> Self {
        // Unwrap chained wrappers before reporting; user errors are the
        // program's own and must not be rewrapped at all.
        if inner.is_user_error() {
            return inner.clone();
        }
        Self::new(BraidErrorKind::HostInvocationError {
            member: member.into(),
            message: inner.unwrapped_message(),
        })
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::TypeMismatch(msg.into()))
    }

    pub fn undefined_symbol(name: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::UndefinedSymbol(name.into()))
    }

    pub fn not_callable(what: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::NotCallable(what.into()))
    }

    pub fn cancelled() -> Self {
        Self::new(BraidErrorKind::Cancelled)
    }

    pub fn user(value: Value) -> Self {
        Self::new(BraidErrorKind::UserError(value))
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::new(BraidErrorKind::Syntax(msg.into()))
    }
}

impl std::fmt::Display for BraidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " at {}", context.location())?;
        }
        Ok(())
    }
}

impl std::error::Error for BraidError {}

impl From<BraidErrorKind> for BraidError {
    fn from(kind: BraidErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type alias for interpreter operations
pub type BraidResult<T> = Result<T, BraidError>;
