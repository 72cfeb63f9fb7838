//! Dynamic value type for the interpreter.
//!
//! `Value` is the single runtime representation: every literal evaluates to
//! one of these, and callables (keywords, types, members, containers,
//! functions) are ordinary values that the evaluator knows how to invoke.

mod dict;
mod display;
mod equality;
mod set;

pub use dict::{DictKey, DictValue};
pub use display::render;
pub use equality::{braid_equals, is_true};
pub use set::SetValue;

use std::cell::RefCell;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::context::Braid;
use crate::error::BraidResult;
use crate::frame::FrameRef;
use crate::interner::{Keyword, Symbol};
use crate::literal::{Expr, MemberLiteral};
use crate::types::TypeHandle;

/// Shared mutable vector
pub type VectorRef = Rc<RefCell<Vec<Value>>>;
/// Shared mutable dictionary
pub type DictRef = Rc<RefCell<DictValue>>;
/// Shared mutable set
pub type SetRef = Rc<RefCell<SetValue>>;

/// Create a new shared vector from values
pub fn new_vector_ref(values: Vec<Value>) -> VectorRef {
    Rc::new(RefCell::new(values))
}

/// Create a new shared dictionary
pub fn new_dict_ref(dict: DictValue) -> DictRef {
    Rc::new(RefCell::new(dict))
}

/// Create a new shared set
pub fn new_set_ref(set: SetValue) -> SetRef {
    Rc::new(RefCell::new(set))
}

/// Dynamic value
#[derive(Debug, Clone)]
pub enum Value {
    /// The empty list / null value
    Nil,
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Arbitrary precision integer
    BigInt(Box<BigInt>),
    /// 64-bit floating point
    Float(f64),
    Char(char),
    Str(String),
    Symbol(Symbol),
    Keyword(Keyword),
    Regex(Rc<regex::Regex>),
    Vector(VectorRef),
    Dict(DictRef),
    Set(SetRef),
    /// A resolved host type; carries the coercion mode of the literal that
    /// produced it so invoking the value casts in the right mode.
    Type(TypeHandle),
    /// User function with captured environment
    Lambda(Rc<Lambda>),
    /// Native top-level function
    Builtin(Rc<Builtin>),
    /// Member-access literal as a first-class callable
    Member(Rc<MemberLiteral>),
    /// Host reflection-wrapper object with its own member invoker
    Native(Rc<dyn NativeObject>),
}

impl Value {
    /// Get the Braid type name of this value
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::Regex(_) => "regex",
            Value::Vector(_) => "vector",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Type(_) => "type",
            Value::Lambda(_) | Value::Builtin(_) => "function",
            Value::Member(_) => "member",
            Value::Native(obj) => obj.type_name(),
        }
    }

    /// Check if this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Try to extract as i64 (bigints that fit narrow silently)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::BigInt(v) => v.to_i64(),
            _ => None,
        }
    }

    /// Try to extract as f64, widening from the integer types
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::BigInt(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorRef> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictRef> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetRef> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// True for values the evaluator can put in function position
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Keyword(_)
                | Value::Type(_)
                | Value::Vector(_)
                | Value::Dict(_)
                | Value::Set(_)
                | Value::Lambda(_)
                | Value::Builtin(_)
                | Value::Member(_)
        )
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        braid_equals(self, other)
    }
}

/// User function: parameter list, body, and the captured environment.
///
/// A `FunctionLiteral` holds an environment-free template; each evaluation
/// clones it with `env` bound to the frame that was current at that moment.
#[derive(Debug)]
pub struct Lambda {
    /// Identity used by the documentation side-table
    pub id: usize,
    pub name: Rc<str>,
    pub params: Vec<Symbol>,
    pub body: Rc<[Expr]>,
    /// Captured lexical environment; `None` for templates
    pub env: Option<FrameRef>,
}

impl Lambda {
    /// Clone this template with a fresh id and the given environment
    pub fn instantiate(&self, id: usize, env: FrameRef) -> Lambda {
        Lambda {
            id,
            name: self.name.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            env: Some(env),
        }
    }
}

/// Native top-level function signature
pub type BuiltinFn = fn(&Braid, &FrameRef, &mut Vec<Value>) -> BraidResult<Value>;

/// Native top-level function
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// A host object that performs its own dynamic member dispatch.
///
/// Member invocation short-circuits to `invoke_member` when such an object
/// appears among the arguments, bypassing the type-registry search.
pub trait NativeObject: std::fmt::Debug {
    fn type_name(&self) -> &str;

    /// Invoke or read a member. `args[0]` is the receiver.
    fn invoke_member(&self, member: &str, args: &mut [Value]) -> BraidResult<Value>;

    fn describe(&self) -> String {
        format!("#<{}>", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Str("s".to_string()).type_name(), "string");
        assert_eq!(Value::Vector(new_vector_ref(vec![])).type_name(), "vector");
    }

    #[test]
    fn test_as_int_narrows_bigint() {
        let big = Value::BigInt(Box::new(BigInt::from(7)));
        assert_eq!(big.as_int(), Some(7));

        let huge = Value::BigInt(Box::new(BigInt::from(i64::MAX) * 4));
        assert_eq!(huge.as_int(), None);
    }

    #[test]
    fn test_partial_eq_uses_shared_predicate() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Str("2".to_string()));
    }
}
