//! Dictionary literals `{ k v … }`.
//!
//! The parse-tree list is flat: keys and values alternate, with splatted
//! elements contributing whole entries. Duplicate *literal* keys are
//! rejected at lowering time, before anything evaluates; duplicates that
//! arrive through splats are last-writer-wins. As a callable a dictionary
//! looks up on one argument and writes on two, returning the dictionary so
//! writes chain.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::{Expr, Literal};
use crate::span::SourceContext;
use crate::value::{new_dict_ref, DictKey, DictRef, DictValue, Value};

#[derive(Debug, Clone)]
pub struct DictionaryLiteral {
    /// Flat alternating key/value list; splats contribute whole entries
    items: Vec<Expr>,
    text_cache: RefCell<Option<Rc<str>>>,
    ctx: SourceContext,
}

impl DictionaryLiteral {
    pub fn new(items: Vec<Expr>, ctx: SourceContext) -> Self {
        Self {
            items,
            text_cache: RefCell::new(None),
            ctx,
        }
    }

    pub fn items(&self) -> &[Expr] {
        &self.items
    }

    /// Source-text rendering, cached on first use
    pub fn source_text(&self) -> Rc<str> {
        if let Some(text) = self.text_cache.borrow().as_ref() {
            return text.clone();
        }
        let text: Rc<str> = if self.ctx.text.is_empty() {
            Rc::from(format!("{{{} elements}}", self.items.len()))
        } else {
            self.ctx.text.clone()
        };
        *self.text_cache.borrow_mut() = Some(text.clone());
        text
    }

    fn build(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<DictRef> {
        let mut dict = DictValue::new();
        let mut pending_key: Option<DictKey> = None;
        let mut loose = 0usize;

        for item in &self.items {
            match item {
                Expr::Splat(splat) => {
                    let value = splat.inner.value(braid, frame)?;
                    merge_splat(&mut dict, &value)
                        .map_err(|e| e.with_context(&self.ctx))?;
                }
                other => {
                    loose += 1;
                    let value = other.value(braid, frame)?;
                    match pending_key.take() {
                        None => {
                            pending_key = Some(
                                DictKey::from_value(&value)
                                    .map_err(|e| e.with_context(other.context()))?,
                            );
                        }
                        Some(key) => dict.insert(key, value),
                    }
                }
            }
        }

        if pending_key.is_some() {
            return Err(BraidError::new(
                crate::error::BraidErrorKind::OddDictionaryLiteral(loose),
            )
            .with_context(&self.ctx));
        }
        Ok(new_dict_ref(dict))
    }
}

/// Merge a splatted value's contents: a dictionary, a list of `[k v]`
/// entries, or a flat even-length list. Nil contributes nothing.
fn merge_splat(dict: &mut DictValue, value: &Value) -> BraidResult<()> {
    match value {
        Value::Nil => Ok(()),
        Value::Dict(other) => {
            for (k, v) in other.borrow().iter() {
                dict.insert(k.clone(), v.clone());
            }
            Ok(())
        }
        Value::Vector(items) => {
            let items = items.borrow();
            let all_pairs = !items.is_empty()
                && items.iter().all(|item| {
                    item.as_vector()
                        .map(|v| v.borrow().len() == 2)
                        .unwrap_or(false)
                });
            if all_pairs {
                for item in items.iter() {
                    let pair = item.as_vector().unwrap().borrow().clone();
                    dict.insert(DictKey::from_value(&pair[0])?, pair[1].clone());
                }
                return Ok(());
            }
            if items.len() % 2 != 0 {
                return Err(BraidError::new(
                    crate::error::BraidErrorKind::OddDictionaryLiteral(items.len()),
                ));
            }
            for chunk in items.chunks(2) {
                dict.insert(DictKey::from_value(&chunk[0])?, chunk[1].clone());
            }
            Ok(())
        }
        other => Err(BraidError::type_mismatch(format!(
            "cannot splat {} into a dictionary literal",
            other.type_name()
        ))),
    }
}

impl Literal for DictionaryLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        Ok(Value::Dict(self.build(braid, frame)?))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        _arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let dict = self.build(braid, frame)?;
        dict_call(&dict, args).map_err(|e| e.with_context(&self.ctx))
    }
}

/// Callable protocol shared by dictionary literals and dictionary values:
/// one argument looks up (nil on a missing key), two write and return the
/// dictionary.
pub(crate) fn dict_call(dict: &DictRef, args: &[Value]) -> BraidResult<Value> {
    match args.len() {
        1 => {
            let key = DictKey::from_value(&args[0])?;
            Ok(dict.borrow().get(&key).cloned().unwrap_or(Value::Nil))
        }
        2 => {
            let key = DictKey::from_value(&args[0])?;
            dict.borrow_mut().insert(key, args[1].clone());
            Ok(Value::Dict(dict.clone()))
        }
        got => Err(BraidError::arity("dict", "1 or 2", got)),
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

    fn kw_expr(braid: &Braid, text: &str) -> Expr {
        Expr::Value(ValueLiteral::new(
            Value::Keyword(braid.keywords.intern(text)),
            ctx(text),
        ))
    }

    fn int_expr(v: i64) -> Expr {
        Expr::Value(ValueLiteral::new(Value::Int(v), ctx(&v.to_string())))
    }

    fn invoke(lit: &DictionaryLiteral, braid: &Braid, args: Vec<Value>) -> BraidResult<Value> {
        let frame = Frame::root();
        let mut args = args;
        let symbols = vec![None; args.len()];
        lit.invoke(braid, &frame, &mut args, &symbols)
    }

    #[test]
    fn test_build_and_lookup() {
        let braid = Braid::new();
        let lit = DictionaryLiteral::new(
            vec![
                kw_expr(&braid, ":a"),
                int_expr(1),
                kw_expr(&braid, ":b"),
                int_expr(2),
            ],
            ctx("{:a 1 :b 2}"),
        );
        let key = Value::Keyword(braid.keywords.intern(":b"));
        assert_eq!(invoke(&lit, &braid, vec![key]).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_missing_key_is_nil() {
        let braid = Braid::new();
        let lit = DictionaryLiteral::new(
            vec![kw_expr(&braid, ":a"), int_expr(1)],
            ctx("{:a 1}"),
        );
        let key = Value::Keyword(braid.keywords.intern(":zz"));
        assert_eq!(invoke(&lit, &braid, vec![key]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_write_returns_dictionary() {
        let braid = Braid::new();
        let lit = DictionaryLiteral::new(
            vec![kw_expr(&braid, ":a"), int_expr(1)],
            ctx("{:a 1}"),
        );
        let key = Value::Keyword(braid.keywords.intern(":a"));
        let result = invoke(&lit, &braid, vec![key.clone(), Value::Int(9)]).unwrap();
        let Value::Dict(dict) = result else {
            panic!("expected dict");
        };
        assert_eq!(dict_call(&dict, &[key]).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_odd_element_count_is_runtime_error() {
        let braid = Braid::new();
        let frame = Frame::root();
        let lit = DictionaryLiteral::new(
            vec![kw_expr(&braid, ":a"), int_expr(1), kw_expr(&braid, ":b")],
            ctx("{:a 1 :b}"),
        );
        let err = lit.value(&braid, &frame).unwrap_err();
        assert!(err.to_string().contains("OddDictionaryLiteral"));
    }

    #[test]
    fn test_splat_merges_dictionary() {
        let braid = Braid::new();
        let frame = Frame::root();

        let mut source = DictValue::new();
        source.insert(
            DictKey::Keyword(braid.keywords.intern(":b")),
            Value::Int(2),
        );
        let m = braid.symbols.intern("m");
        frame.set_local(m.clone(), Value::Dict(new_dict_ref(source)));

        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Symbol(SymbolExpr {
                sym: m,
                ctx: ctx("m"),
            })),
            ctx: ctx("@m"),
        });
        let lit = DictionaryLiteral::new(
            vec![kw_expr(&braid, ":a"), int_expr(1), splat],
            ctx("{:a 1 @m}"),
        );
        let value = lit.value(&braid, &frame).unwrap();
        let Value::Dict(dict) = value else {
            panic!("expected dict");
        };
        assert_eq!(dict.borrow().len(), 2);
    }

    #[test]
    fn test_splat_duplicates_are_last_writer_wins() {
        let braid = Braid::new();
        let frame = Frame::root();

        let mut source = DictValue::new();
        source.insert(
            DictKey::Keyword(braid.keywords.intern(":a")),
            Value::Int(99),
        );
        let m = braid.symbols.intern("m");
        frame.set_local(m.clone(), Value::Dict(new_dict_ref(source)));

        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Symbol(SymbolExpr {
                sym: m,
                ctx: ctx("m"),
            })),
            ctx: ctx("@m"),
        });
        let lit = DictionaryLiteral::new(
            vec![kw_expr(&braid, ":a"), int_expr(1), splat],
            ctx("{:a 1 @m}"),
        );
        let Value::Dict(dict) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected dict");
        };
        let key = DictKey::Keyword(braid.keywords.intern(":a"));
        assert_eq!(dict.borrow().get(&key), Some(&Value::Int(99)));
    }

    #[test]
    fn test_splat_of_flat_even_vector() {
        let braid = Braid::new();
        let frame = Frame::root();
        let xs = braid.symbols.intern("xs");
        frame.set_local(
            xs.clone(),
            Value::Vector(crate::value::new_vector_ref(vec![
                Value::Str("k".to_string()),
                Value::Int(5),
            ])),
        );
        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Symbol(SymbolExpr {
                sym: xs,
                ctx: ctx("xs"),
            })),
            ctx: ctx("@xs"),
        });
        let lit = DictionaryLiteral::new(vec![splat], ctx("{@xs}"));
        let Value::Dict(dict) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected dict");
        };
        assert_eq!(
            dict.borrow().get(&DictKey::Str("k".to_string())),
            Some(&Value::Int(5))
        );
    }

    #[test]
    fn test_nil_splat_contributes_nothing() {
        let braid = Braid::new();
        let frame = Frame::root();
        let splat = Expr::Splat(SplatExpr {
            inner: Box::new(Expr::Value(ValueLiteral::new(Value::Nil, ctx("nil")))),
            ctx: ctx("@nil"),
        });
        let lit = DictionaryLiteral::new(vec![splat], ctx("{@nil}"));
        let Value::Dict(dict) = lit.value(&braid, &frame).unwrap() else {
            panic!("expected dict");
        };
        assert!(dict.borrow().is_empty());
    }
}
