//! Primitive literals: boxed constants, `%N` argument indices, and
//! interpolated string templates.

use std::cell::RefCell;
use std::hash::{Hash, Hasher};

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::eval;
use crate::frame::{nearest_arguments, FrameRef};
use crate::interner::Symbol;
use crate::literal::Literal;
use crate::span::SourceContext;
use crate::value::Value;

/// A boxed constant value
#[derive(Debug, Clone)]
pub struct ValueLiteral {
    value: RefCell<Value>,
    ctx: SourceContext,
}

impl ValueLiteral {
    pub fn new(value: Value, ctx: SourceContext) -> Self {
        Self {
            value: RefCell::new(value),
            ctx,
        }
    }

    /// Replace the boxed value (constant folding uses this)
    pub fn set(&self, value: Value) {
        *self.value.borrow_mut() = value;
    }
}

impl Literal for ValueLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, _braid: &Braid, _frame: &FrameRef) -> BraidResult<Value> {
        Ok(self.value.borrow().clone())
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let callee = self.value.borrow().clone();
        eval::invoke_value(braid, frame, callee, args, arg_symbols)
            .map_err(|e| e.with_context(&self.ctx))
    }
}

/// Argument-index literal `%N`.
///
/// Reads and writes target the nearest enclosing call frame whose argument
/// vector is non-null; hash and equality are by index alone.
#[derive(Debug, Clone)]
pub struct ArgIndexLiteral {
    pub index: usize,
    ctx: SourceContext,
}

impl ArgIndexLiteral {
    pub fn new(index: usize, ctx: SourceContext) -> Self {
        Self { index, ctx }
    }

    /// Write through to the owning frame's argument vector
    pub fn set(&self, frame: &FrameRef, value: Value) -> BraidResult<()> {
        let owner = nearest_arguments(frame).ok_or_else(|| {
            BraidError::arg_index_out_of_range(self.index, 0).with_context(&self.ctx)
        })?;
        let arguments = owner.arguments.as_ref().unwrap();
        let mut arguments = arguments.borrow_mut();
        let len = arguments.len();
        if self.index >= len {
            return Err(BraidError::arg_index_out_of_range(self.index, len)
                .with_context(&self.ctx));
        }
        arguments[self.index] = value;
        Ok(())
    }
}

impl PartialEq for ArgIndexLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for ArgIndexLiteral {}

impl Hash for ArgIndexLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl Literal for ArgIndexLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, _braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        let owner = nearest_arguments(frame).ok_or_else(|| {
            BraidError::arg_index_out_of_range(self.index, 0).with_context(&self.ctx)
        })?;
        let arguments = owner.arguments.as_ref().unwrap().borrow();
        arguments.get(self.index).cloned().ok_or_else(|| {
            BraidError::arg_index_out_of_range(self.index, arguments.len())
                .with_context(&self.ctx)
        })
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let callee = self.value(braid, frame)?;
        eval::invoke_value(braid, frame, callee, args, arg_symbols)
            .map_err(|e| e.with_context(&self.ctx))
    }
}

/// Interpolated string template.
///
/// The template keeps `\$` escapes unresolved; expansion resolves them and
/// evaluates `$name` / `$(expr)` segments in the current frame.
#[derive(Debug, Clone)]
pub struct ExpandableStringLiteral {
    raw: String,
    ctx: SourceContext,
}

impl ExpandableStringLiteral {
    pub fn new(raw: String, ctx: SourceContext) -> Self {
        Self { raw, ctx }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Literal for ExpandableStringLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        eval::expand_string(braid, frame, &self.raw)
            .map(Value::Str)
            .map_err(|e| e.with_context(&self.ctx))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let callee = self.value(braid, frame)?;
        eval::invoke_value(braid, frame, callee, args, arg_symbols)
            .map_err(|e| e.with_context(&self.ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use std::rc::Rc;

    fn ctx() -> SourceContext {
        SourceContext::synthetic("%0")
    }

    #[test]
    fn test_arg_index_reads_nearest_frame_with_arguments() {
        let braid = Braid::new();
        let root = Frame::root();
        let outer = Frame::child(
            &root,
            Rc::from("outer"),
            Some(vec![Value::Int(10), Value::Int(20)]),
            None,
        );
        // Inner lambda declared no parameters, so its frame has no
        // argument vector and %N walks out to the enclosing call.
        let inner = Frame::child(&outer, Rc::from("inner"), None, None);

        let lit = ArgIndexLiteral::new(1, ctx());
        assert_eq!(lit.value(&braid, &inner).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_arg_index_out_of_range() {
        let braid = Braid::new();
        let root = Frame::root();
        let frame = Frame::child(&root, Rc::from("f"), Some(vec![Value::Int(1)]), None);
        let lit = ArgIndexLiteral::new(5, ctx());
        let err = lit.value(&braid, &frame).unwrap_err();
        assert!(err.to_string().contains("ArgIndexOutOfRange"));
    }

    #[test]
    fn test_arg_index_no_frame() {
        let braid = Braid::new();
        let root = Frame::root();
        let lit = ArgIndexLiteral::new(0, ctx());
        assert!(lit.value(&braid, &root).is_err());
    }

    #[test]
    fn test_arg_index_write() {
        let root = Frame::root();
        let frame = Frame::child(&root, Rc::from("f"), Some(vec![Value::Int(1)]), None);
        let lit = ArgIndexLiteral::new(0, ctx());
        lit.set(&frame, Value::Int(99)).unwrap();
        assert_eq!(
            frame.arguments.as_ref().unwrap().borrow()[0],
            Value::Int(99)
        );
    }

    #[test]
    fn test_arg_index_identity_is_by_index() {
        let a = ArgIndexLiteral::new(2, ctx());
        let b = ArgIndexLiteral::new(2, SourceContext::synthetic("other"));
        let c = ArgIndexLiteral::new(3, ctx());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
