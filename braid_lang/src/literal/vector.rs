//! Vector literals `[ … ]`.
//!
//! Evaluation produces a fresh vector each time, expanding splatted
//! elements in place. As a callable a vector indexes: one integer argument
//! reads (negative counts from the end), two arguments write and return
//! the vector for pipeline chaining.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::eval::expand_splat_value;
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::{Expr, Literal};
use crate::span::SourceContext;
use crate::value::{new_vector_ref, Value, VectorRef};

#[derive(Debug, Clone)]
pub struct VectorLiteral {
    elements: Vec<Expr>,
    text_cache: RefCell<Option<Rc<str>>>,
    ctx: SourceContext,
}

impl VectorLiteral {
    pub fn new(elements: Vec<Expr>, ctx: SourceContext) -> Self {
        Self {
            elements,
            text_cache: RefCell::new(None),
            ctx,
        }
    }

    pub fn elements(&self) -> &[Expr] {
        &self.elements
    }

    /// Source-text rendering, cached on first use
    pub fn source_text(&self) -> Rc<str> {
        if let Some(text) = self.text_cache.borrow().as_ref() {
            return text.clone();
        }
        let text: Rc<str> = if self.ctx.text.is_empty() {
            Rc::from(format!("[{} elements]", self.elements.len()))
        } else {
            self.ctx.text.clone()
        };
        *self.text_cache.borrow_mut() = Some(text.clone());
        text
    }

    fn build(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<VectorRef> {
        let mut items = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            match element {
                Expr::Splat(splat) => {
                    let value = splat.inner.value(braid, frame)?;
                    expand_splat_value(&value, &mut items);
                }
                other => items.push(other.value(braid, frame)?),
            }
        }
        Ok(new_vector_ref(items))
    }
}

impl Literal for VectorLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        Ok(Value::Vector(self.build(braid, frame)?))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        _arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let vector = self.build(braid, frame)?;
        vector_call(&vector, args).map_err(|e| e.with_context(&self.ctx))
    }
}

/// Callable protocol shared by vector literals and vector values.
pub(crate) fn vector_call(vector: &VectorRef, args: &[Value]) -> BraidResult<Value> {
    match args.len() {
        0 => Ok(Value::Vector(vector.clone())),
        1 => {
            let index = resolve_index(vector, &args[0])?;
            let items = vector.borrow();
            Ok(items[index].clone())
        }
        2 => {
            let index = resolve_index(vector, &args[0])?;
            vector.borrow_mut()[index] = args[1].clone();
            Ok(Value::Vector(vector.clone()))
        }
        got => Err(BraidError::arity("vector", "0 to 2", got)),
    }
}

/// Coerce to an integer index; negative values count from the end.
fn resolve_index(vector: &VectorRef, value: &Value) -> BraidResult<usize> {
    let raw = coerce_index(value)?;
    let len = vector.borrow().len() as i64;
    let resolved = if raw < 0 { len + raw } else { raw };
    if resolved < 0 || resolved >= len {
        return Err(BraidError::bad_index(format!(
            "index {} out of range for vector of length {}",
            raw, len
        )));
    }
    Ok(resolved as usize)
}

fn coerce_index(value: &Value) -> BraidResult<i64> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        Value::Str(s) => s.trim().parse::<i64>().map_err(|_| {
            BraidError::bad_index(format!("cannot use '{}' as a vector index", s))
        }),
        other => match other.as_int() {
            Some(v) => Ok(v),
            None => Err(BraidError::bad_index(format!(
                "cannot use {} as a vector index",
                other.type_name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::literal::{SymbolExpr, ValueLiteral};

    fn ctx(text: &str) -> SourceContext {
        SourceContext::synthetic(text)
    }

    fn int_expr(v: i64) -> Expr {
        Expr::Value(ValueLiteral::new(Value::Int(v), ctx(&v.to_string())))
    }

    fn literal(elements: Vec<Expr>) -> VectorLiteral {
        VectorLiteral::new(elements, ctx("[...]"))
    }

    fn invoke(lit: &VectorLiteral, braid: &Braid, args: Vec<Value>) -> BraidResult<Value> {
        let frame = Frame::root();
        let mut args = args;
        let symbols = vec![None; args.len()];
        lit.invoke(braid, &frame, &mut args, &symbols)
    }

    #[test]
    fn test_evaluation_preserves_order() {
        let braid = Braid::new();
        let frame = Frame::root();
        let lit = literal(vec![int_expr(1), int_expr(2), int_expr(3)]);
        let value = lit.value(&braid, &frame).unwrap();
        assert_eq!(value.to_string(), "[1 2 3]");
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let braid = Braid::new();
        let lit = literal(vec![int_expr(1), int_expr(2), int_expr(3)]);
        assert_eq!(invoke(&lit, &braid, vec![Value::Int(-1)]).unwrap(), Value::Int(3));
        assert_eq!(invoke(&lit, &braid, vec![Value::Int(0)]).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_index_round_trip_property() {
        // v(i) == v(i - n) for 0 <= i < n
        let braid = Braid::new();
        let lit = literal(vec![int_expr(10), int_expr(20), int_expr(30)]);
        for i in 0..3i64 {
            let a = invoke(&lit, &braid, vec![Value::Int(i)]).unwrap();
            let b = invoke(&lit, &braid, vec![Value::Int(i - 3)]).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let braid = Braid::new();
        let lit = literal(vec![int_expr(1)]);
        let err = invoke(&lit, &braid, vec![Value::Int(5)]).unwrap_err();
        assert!(err.to_string().contains("BadIndex"));
    }

    #[test]
    fn test_index_type_coercion() {
        let braid = Braid::new();
        let lit = literal(vec![int_expr(1), int_expr(2)]);
        assert_eq!(
            invoke(&lit, &braid, vec![Value::Float(1.0)]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            invoke(&lit, &braid, vec![Value::Str("0".to_string())]).unwrap(),
            Value::Int(1)
        );
        assert!(invoke(&lit, &braid, vec![Value::Str("x".to_string())]).is_err());
    }

    #[test]
    fn test_two_argument_write_returns_vector() {
        let braid = Braid::new();
        let lit = literal(vec![int_expr(1), int_expr(2)]);
        let result = invoke(&lit, &braid, vec![Value::Int(0), Value::Int(9)]).unwrap();
        assert_eq!(result.to_string(), "[9 2]");
    }

    #[test]
    fn test_splat_expansion() {
        let braid = Braid::new();
        let frame = Frame::root();
        // [1 @xs 4] with xs = [2 3]
        let xs = braid.symbols.intern("xs");
        frame.set_local(
            xs.clone(),
            Value::Vector(new_vector_ref(vec![Value::Int(2), Value::Int(3)])),
        );
        let splat = Expr::Splat(crate::literal::SplatExpr {
            inner: Box::new(Expr::Symbol(SymbolExpr {
                sym: xs,
                ctx: ctx("xs"),
            })),
            ctx: ctx("@xs"),
        });
        let lit = literal(vec![int_expr(1), splat, int_expr(4)]);
        let value = lit.value(&braid, &frame).unwrap();
        assert_eq!(value.to_string(), "[1 2 3 4]");
    }

    #[test]
    fn test_source_text_cached() {
        let lit = literal(vec![int_expr(1)]);
        let first = lit.source_text();
        let second = lit.source_text();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_fresh_vector_per_evaluation() {
        let braid = Braid::new();
        let frame = Frame::root();
        let lit = literal(vec![int_expr(1)]);
        let a = lit.value(&braid, &frame).unwrap();
        let b = lit.value(&braid, &frame).unwrap();
        if let (Value::Vector(a), Value::Vector(b)) = (&a, &b) {
            assert!(!Rc::ptr_eq(a, b));
        } else {
            panic!("expected vectors");
        }
    }
}
