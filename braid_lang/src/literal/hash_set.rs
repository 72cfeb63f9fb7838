//! Hash-set literals `#{ … }`.
//!
//! Elements accumulate uniquely under the shared equality predicate.
//! Splats contribute each element of an enumerable (vectors, sets,
//! dictionary entries); strings and other scalars splat as themselves,
//! and nil contributes nothing. As a callable one argument is a
//! containment test; two arguments toggle: add when the second argument
//! is truthy, remove otherwise.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::{Expr, Literal};
use crate::span::SourceContext;
use crate::value::{is_true, new_set_ref, new_vector_ref, SetRef, SetValue, Value};

#[derive(Debug, Clone)]
pub struct HashSetLiteral {
    elements: Vec<Expr>,
    text_cache: RefCell<Option<Rc<str>>>,
    ctx: SourceContext,
}

impl HashSetLiteral {
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
            Rc::from(format!("#{{{} elements}}", self.elements.len()))
        } else {
            self.ctx.text.clone()
        };
        *self.text_cache.borrow_mut() = Some(text.clone());
        text
    }

    fn build(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<SetRef> {
        let mut set = SetValue::new();
        for element in &self.elements {
            match element {
                Expr::Splat(splat) => {
                    let value = splat.inner.value(braid, frame)?;
                    match &value {
                        Value::Nil => {}
                        Value::Vector(items) => {
                            for item in items.borrow().iter() {
                                set.insert(item.clone());
                            }
                        }
                        Value::Set(items) => {
                            for item in items.borrow().iter() {
                                set.insert(item.clone());
                            }
                        }
                        Value::Dict(dict) => {
                            for (k, v) in dict.borrow().iter() {
                                set.insert(Value::Vector(new_vector_ref(vec![
                                    k.to_value(),
                                    v.clone(),
                                ])));
                            }
                        }
                        // Strings and scalars splat as themselves.
                        other => {
                            set.insert(other.clone());
                        }
                    }
                }
                other => {
                    set.insert(other.value(braid, frame)?);
                }
            }
        }
        Ok(new_set_ref(set))
    }
}

impl Literal for HashSetLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        Ok(Value::Set(self.build(braid, frame)?))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        _arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let set = self.build(braid, frame)?;
        set_call(&set, args).map_err(|e| e.with_context(&self.ctx))
    }
}

/// Callable protocol shared by set literals and set values: containment on
/// one argument; add/remove toggle on two, returning the set.
pub(crate) fn set_call(set: &SetRef, args: &[Value]) -> BraidResult<Value> {
    match args.len() {
        1 => Ok(Value::Bool(set.borrow().contains(&args[0]))),
        2 => {
            if is_true(&args[1]) {
                set.borrow_mut().insert(args[0].clone());
            } else {
                set.borrow_mut().remove(&args[0]);
            }
            Ok(Value::Set(set.clone()))
        }
        got => Err(BraidError::arity("set", "1 or 2", got)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::literal::{SplatExpr, SymbolExpr, ValueLiteral};

    fn ctx(text: &str) -> SourceContext {
        SourceContext::synthetic(text)
    }

    fn int_expr(v: i64) -> Expr {
        Expr::Value(ValueLiteral::new(Value::Int(v), ctx(&v.to_string())))
    }

    fn literal(elements: Vec<Expr>) -> HashSetLiteral {
        HashSetLiteral::new(elements, ctx("#{...}"))
    }

    fn invoke(lit: &HashSetLiteral, braid: &Braid, args: Vec<Value>) -> BraidResult<Value> {
        let frame = Frame::root();
        let mut args = args;
        let symbols = vec![None; args.len()];
        lit.invoke(braid, &frame, &mut args, &symbols)
    }

    #[test]
    fn test_duplicates_collapse() {
        let braid = Braid::new();
        let frame = Frame::root();
        let lit = literal(vec![int_expr(1), int_expr(2), int_expr(1)]);
        let Value::Set(set) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected set");
        };
        assert_eq!(set.borrow().len(), 2);
    }

    #[test]
    fn test_containment_call() {
        let braid = Braid::new();
        let lit = literal(vec![int_expr(1), int_expr(2), int_expr(3)]);
        assert_eq!(
            invoke(&lit, &braid, vec![Value::Int(2)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            invoke(&lit, &braid, vec![Value::Int(4)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_toggle_add_and_remove() {
        let braid = Braid::new();
        let lit = literal(vec![int_expr(1)]);
        let result = invoke(&lit, &braid, vec![Value::Int(9), Value::Bool(true)]).unwrap();
        let Value::Set(set) = result else {
            panic!("expected set");
        };
        assert!(set.borrow().contains(&Value::Int(9)));

        let removed = set_call(&set, &[Value::Int(9), Value::Bool(false)]).unwrap();
        let Value::Set(set) = removed else {
            panic!("expected set");
        };
        assert!(!set.borrow().contains(&Value::Int(9)));
    }

    #[test]
    fn test_splat_of_vector_contributes_elements() {
        let braid = Braid::new();
        let frame = Frame::root();
        let xs = braid.symbols.intern("xs");
        frame.set_local(
            xs.clone(),
            Value::Vector(new_vector_ref(vec![Value::Int(2), Value::Int(3)])),
        );
        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Symbol(SymbolExpr {
                sym: xs,
                ctx: ctx("xs"),
            })),
            ctx: ctx("@xs"),
        });
        let lit = literal(vec![int_expr(1), splat]);
        let Value::Set(set) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected set");
        };
        assert_eq!(set.borrow().len(), 3);
    }

    #[test]
    fn test_splat_of_string_is_a_single_value() {
        let braid = Braid::new();
        let frame = Frame::root();
        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Value(ValueLiteral::new(
                Value::Str("ab".to_string()),
                ctx("\"ab\""),
            ))),
            ctx: ctx("@\"ab\""),
        });
        let lit = literal(vec![splat]);
        let Value::Set(set) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected set");
        };
        assert_eq!(set.borrow().len(), 1);
        assert!(set.borrow().contains(&Value::Str("ab".to_string())));
    }

    #[test]
    fn test_nil_splat_contributes_nothing() {
        let braid = Braid::new();
        let frame = Frame::root();
        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Value(ValueLiteral::new(Value::Nil, ctx("nil")))),
            ctx: ctx("@nil"),
        });
        let lit = literal(vec![splat]);
        let Value::Set(set) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected set");
        };
        assert!(set.borrow().is_empty());
    }
}
