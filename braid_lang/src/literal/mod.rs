//! The literal hierarchy.
//!
//! Every parsed form is a literal: a dual-purpose object that is both an
//! AST node and a first-class runtime callable. The two uniform
//! capabilities are `value` (evaluate in the current frame) and `invoke`
//! (act as a callable). When a literal appears in function position the
//! evaluator calls `invoke` instead of `value`.

mod dictionary;
mod function;
mod hash_set;
mod member;
mod primitives;
mod static_member;
mod type_literal;
mod vector;

pub use dictionary::DictionaryLiteral;
pub use function::FunctionLiteral;
pub use hash_set::HashSetLiteral;
pub use member::MemberLiteral;
pub use primitives::{ArgIndexLiteral, ExpandableStringLiteral, ValueLiteral};
pub use static_member::{StaticMethodLiteral, StaticPropertyLiteral};
pub use type_literal::{invoke_type_value, TypeLiteral};
pub use vector::VectorLiteral;

pub(crate) use dictionary::dict_call;
pub(crate) use hash_set::set_call;
pub(crate) use vector::vector_call;

use std::rc::Rc;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::eval;
use crate::frame::FrameRef;
use crate::interner::{Keyword, Symbol};
use crate::span::SourceContext;
use crate::value::{new_vector_ref, Value};

/// Uniform evaluation/invocation protocol of every literal
pub trait Literal {
    /// Source context captured at construction
    fn context(&self) -> &SourceContext;

    /// Evaluate: produce a host value in the current call stack
    fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value>;

    /// Invoke as a callable. `arg_symbols` records which argument
    /// expressions were bare symbols, for by-reference write-back.
    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value>;
}

/// A parsed expression
#[derive(Debug, Clone)]
pub enum Expr {
    Value(ValueLiteral),
    Symbol(SymbolExpr),
    Keyword(KeywordExpr),
    ArgIndex(ArgIndexLiteral),
    ExpandableString(ExpandableStringLiteral),
    Type(TypeLiteral),
    Member(Rc<MemberLiteral>),
    StaticProperty(StaticPropertyLiteral),
    StaticMethod(StaticMethodLiteral),
    Vector(VectorLiteral),
    Dictionary(DictionaryLiteral),
    HashSet(HashSetLiteral),
    Function(FunctionLiteral),
    Quote(QuoteExpr),
    Splat(SplatExpr),
    List(ListExpr),
}

impl Expr {
    pub fn context(&self) -> &SourceContext {
        match self {
            Expr::Value(l) => l.context(),
            Expr::Symbol(l) => &l.ctx,
            Expr::Keyword(l) => &l.ctx,
            Expr::ArgIndex(l) => l.context(),
            Expr::ExpandableString(l) => l.context(),
            Expr::Type(l) => l.context(),
            Expr::Member(l) => l.context(),
            Expr::StaticProperty(l) => l.context(),
            Expr::StaticMethod(l) => l.context(),
            Expr::Vector(l) => l.context(),
            Expr::Dictionary(l) => l.context(),
            Expr::HashSet(l) => l.context(),
            Expr::Function(l) => l.context(),
            Expr::Quote(l) => &l.ctx,
            Expr::Splat(l) => &l.ctx,
            Expr::List(l) => &l.ctx,
        }
    }

    /// Evaluate this expression
    pub fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        match self {
            Expr::Value(l) => l.value(braid, frame),
            Expr::Symbol(l) => l.value(braid, frame),
            Expr::Keyword(l) => Ok(Value::Keyword(l.kw.clone())),
            Expr::ArgIndex(l) => l.value(braid, frame),
            Expr::ExpandableString(l) => l.value(braid, frame),
            Expr::Type(l) => l.value(braid, frame),
            // A member literal in value position is itself the value; the
            // shared Rc keeps its dispatch cache alive across calls.
            Expr::Member(l) => Ok(Value::Member(l.clone())),
            Expr::StaticProperty(l) => l.value(braid, frame),
            Expr::StaticMethod(l) => l.value(braid, frame),
            Expr::Vector(l) => l.value(braid, frame),
            Expr::Dictionary(l) => l.value(braid, frame),
            Expr::HashSet(l) => l.value(braid, frame),
            Expr::Function(l) => l.value(braid, frame),
            Expr::Quote(l) => expr_to_value(&l.inner, braid, frame),
            Expr::Splat(l) => Err(BraidError::syntax(
                "splat marker is only valid inside a container or argument list",
            )
            .with_context(&l.ctx)),
            Expr::List(l) => eval::eval_list(braid, frame, l),
        }
    }

    /// Invoke this expression as a callable
    pub fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        match self {
            Expr::Keyword(l) => {
                eval::keyword_call(&l.kw, args).map_err(|e| e.with_context(&l.ctx))
            }
            Expr::ArgIndex(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::Type(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::Member(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::StaticProperty(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::StaticMethod(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::Vector(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::Dictionary(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::HashSet(l) => l.invoke(braid, frame, args, arg_symbols),
            Expr::Function(l) => l.invoke(braid, frame, args, arg_symbols),
            // Everything else evaluates first, then invokes the result.
            other => {
                let callee = other.value(braid, frame)?;
                eval::invoke_value(braid, frame, callee, args, arg_symbols)
                    .map_err(|e| e.with_context(other.context()))
            }
        }
    }

    /// The symbol this expression names, if it is a bare symbol reference
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Symbol(s) => Some(&s.sym),
            _ => None,
        }
    }
}

/// Bare symbol reference
#[derive(Debug, Clone)]
pub struct SymbolExpr {
    pub sym: Symbol,
    pub ctx: SourceContext,
}

impl SymbolExpr {
    fn value(&self, _braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        // Unbound symbols evaluate to nil; `set` is where an unbound name
        // is a hard error.
        Ok(frame.get_variable(&self.sym).unwrap_or(Value::Nil))
    }
}

/// Keyword literal in expression position
#[derive(Debug, Clone)]
pub struct KeywordExpr {
    pub kw: Keyword,
    pub ctx: SourceContext,
}

/// Quoted form
#[derive(Debug, Clone)]
pub struct QuoteExpr {
    pub inner: Box<Expr>,
    pub ctx: SourceContext,
}

/// Splat marker; only meaningful inside containers and argument lists
#[derive(Debug, Clone)]
pub struct SplatExpr {
    pub inner: Box<Expr>,
    pub ctx: SourceContext,
}

/// Application form `(head args...)`
#[derive(Debug, Clone)]
pub struct ListExpr {
    pub items: Vec<Expr>,
    pub ctx: SourceContext,
}

/// Quote semantics: a quoted form becomes data without evaluation.
fn expr_to_value(expr: &Expr, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
    match expr {
        Expr::Value(l) => l.value(braid, frame),
        Expr::Symbol(s) => Ok(Value::Symbol(s.sym.clone())),
        Expr::Keyword(k) => Ok(Value::Keyword(k.kw.clone())),
        // A quoted template string stays raw.
        Expr::ExpandableString(l) => Ok(Value::Str(l.raw().to_string())),
        Expr::List(l) => Ok(Value::Vector(new_vector_ref(
            l.items
                .iter()
                .map(|e| expr_to_value(e, braid, frame))
                .collect::<BraidResult<Vec<_>>>()?,
        ))),
        Expr::Vector(v) => Ok(Value::Vector(new_vector_ref(
            v.elements()
                .iter()
                .map(|e| expr_to_value(e, braid, frame))
                .collect::<BraidResult<Vec<_>>>()?,
        ))),
        Expr::Quote(q) => expr_to_value(&q.inner, braid, frame),
        Expr::Splat(s) => expr_to_value(&s.inner, braid, frame),
        // Remaining literal kinds quote to their evaluated form.
        other => other.value(braid, frame),
    }
}
