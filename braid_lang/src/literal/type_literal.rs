//! Type literals: `^Name` (strict) and `^Name?` (soft).
//!
//! Resolution against the type registry is deferred until first use and
//! memoised; once resolved the binding never changes. Invoking a type
//! literal with one argument casts it; the resolved type object keeps the
//! literal's coercion mode so casts through the value behave identically.

use std::cell::OnceCell;

use regex::RegexBuilder;

use crate::context::Braid;
use crate::convert::{self, to_text};
use crate::error::{BraidError, BraidResult};
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::Literal;
use crate::span::SourceContext;
use crate::types::{TypeHandle, TypeRef, TypeTag};
use crate::value::{is_true, Value};

#[derive(Debug, Clone)]
pub struct TypeLiteral {
    /// Type name without the `^` sigil or `?` suffix
    name: Box<str>,
    /// Absence of a trailing `?` in the source
    strict: bool,
    resolved: OnceCell<TypeRef>,
    ctx: SourceContext,
}

impl TypeLiteral {
    pub fn new(name: &str, strict: bool, ctx: SourceContext) -> Self {
        Self {
            name: Box::from(name),
            strict,
            resolved: OnceCell::new(),
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Resolve the named type, memoising the result
    pub fn resolve(&self, braid: &Braid) -> BraidResult<TypeRef> {
        if let Some(ty) = self.resolved.get() {
            return Ok(ty.clone());
        }
        let ty = braid
            .types
            .resolve(&self.name)
            .ok_or_else(|| BraidError::unresolved_type(&*self.name).with_context(&self.ctx))?;
        // A concurrent resolve produced the same binding; either wins.
        let _ = self.resolved.set(ty.clone());
        Ok(ty)
    }

    /// Pattern-test protocol for match expressions: `(matched, coerced)`.
    pub fn test(&self, braid: &Braid, value: &Value) -> BraidResult<(bool, Option<Value>)> {
        let ty = self.resolve(braid)?;
        if self.strict {
            if value.is_nil() {
                let matched = ty.tag() == TypeTag::Nil;
                return Ok((matched, matched.then_some(Value::Nil)));
            }
            let matched = ty.is_assignable_from(value);
            Ok((matched, matched.then(|| value.clone())))
        } else {
            match convert::try_convert(value, &ty) {
                Some(coerced) => Ok((true, Some(coerced))),
                None => Ok((false, None)),
            }
        }
    }
}

impl Literal for TypeLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, braid: &Braid, _frame: &FrameRef) -> BraidResult<Value> {
        let ty = self.resolve(braid)?;
        Ok(Value::Type(TypeHandle {
            ty,
            soft: !self.strict,
        }))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        _arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let ty = self.resolve(braid)?;
        match args.len() {
            0 => self.value(braid, frame),
            1 => cast_value(&ty, !self.strict, &args[0]).map_err(|e| e.with_context(&self.ctx)),
            got => Err(BraidError::arity(format!("^{}", self.name), "0 or 1", got)
                .with_context(&self.ctx)),
        }
    }
}

/// Cast `value` to `ty` in the given mode. Shared between type literals
/// and invocation of type objects.
pub fn cast_value(ty: &TypeRef, soft: bool, value: &Value) -> BraidResult<Value> {
    if soft {
        soft_cast(ty, value)
    } else {
        strict_cast(ty, value)
    }
}

/// Strict cast: identity for assignable values plus the few explicit
/// name-producing conversions; everything else fails.
fn strict_cast(ty: &TypeRef, value: &Value) -> BraidResult<Value> {
    if value.is_nil() {
        // nil only casts to the empty-list type.
        if ty.tag() == TypeTag::Nil {
            return Ok(Value::Nil);
        }
        return Err(BraidError::strict_cast("nil", ty.name()));
    }
    if ty.is_assignable_from(value) {
        return Ok(value.clone());
    }
    if ty.tag() == TypeTag::Str {
        match value {
            Value::Symbol(sym) => return Ok(Value::Str(sym.name().to_string())),
            Value::Keyword(kw) => return Ok(Value::Str(kw.base_name().to_string())),
            Value::Member(m) => return Ok(Value::Str(m.text().to_string())),
            _ => {}
        }
    }
    Err(BraidError::strict_cast(value.type_name(), ty.name()))
}

/// Soft cast: truthiness for bool, case-insensitive regex for regex,
/// otherwise the host conversion primitive.
fn soft_cast(ty: &TypeRef, value: &Value) -> BraidResult<Value> {
    match ty.tag() {
        TypeTag::Bool => Ok(Value::Bool(is_true(value))),
        TypeTag::Regex => {
            if let Value::Regex(_) = value {
                return Ok(value.clone());
            }
            let mut pattern = to_text(value);
            // Unwrap a quoted form if present.
            if pattern.len() >= 2 && pattern.starts_with('"') && pattern.ends_with('"') {
                pattern = pattern[1..pattern.len() - 1].to_string();
            }
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .unicode(true)
                .build()
                .map(|re| Value::Regex(std::rc::Rc::new(re)))
                .map_err(|e| {
                    BraidError::soft_cast(value.to_string(), ty.name(), e.to_string())
                })
        }
        _ => convert::convert(value, ty).map_err(|e| {
            BraidError::soft_cast(value.to_string(), ty.name(), e.unwrapped_message())
        }),
    }
}

/// Invoke a type object value, using the mode it carries.
pub fn invoke_type_value(handle: &TypeHandle, args: &mut [Value]) -> BraidResult<Value> {
    match args.len() {
        0 => Ok(Value::Type(handle.clone())),
        1 => cast_value(&handle.ty, handle.soft, &args[0]),
        got => Err(BraidError::arity(
            format!("^{}", handle.ty.name()),
            "0 or 1",
            got,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn lit(name: &str, strict: bool) -> TypeLiteral {
        TypeLiteral::new(name, strict, SourceContext::synthetic(name))
    }

    #[test]
    fn test_resolution_is_memoised() {
        let braid = Braid::new();
        let t = lit("int", true);
        let first = t.resolve(&braid).unwrap();
        let second = t.resolve(&braid).unwrap();
        assert!(std::rc::Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unresolved_type() {
        let braid = Braid::new();
        let t = lit("widget", true);
        let err = t.resolve(&braid).unwrap_err();
        assert!(err.to_string().contains("UnresolvedType"));
    }

    #[test]
    fn test_strict_cast_rejects_nil_except_for_nil_type() {
        let braid = Braid::new();
        let frame = Frame::root();
        let int_lit = lit("int", true);
        let mut args = vec![Value::Nil];
        assert!(int_lit.invoke(&braid, &frame, &mut args, &[None]).is_err());

        let nil_lit = lit("nil", true);
        let mut args = vec![Value::Nil];
        assert_eq!(
            nil_lit.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Nil
        );
    }

    #[test]
    fn test_strict_cast_passes_assignable_unchanged() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("int", true);
        let mut args = vec![Value::Int(5)];
        assert_eq!(
            t.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Int(5)
        );
        // A float is not assignable to int under strict rules.
        let mut args = vec![Value::Float(5.0)];
        assert!(t.invoke(&braid, &frame, &mut args, &[None]).is_err());
    }

    #[test]
    fn test_strict_string_cast_of_names() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("string", true);
        let sym = braid.symbols.intern("hello");
        let mut args = vec![Value::Symbol(sym)];
        assert_eq!(
            t.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Str("hello".to_string())
        );
        let kw = braid.keywords.intern(":flag:");
        let mut args = vec![Value::Keyword(kw)];
        assert_eq!(
            t.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Str("flag".to_string())
        );
    }

    #[test]
    fn test_soft_cast_parses_strings() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("int", false);
        let mut args = vec![Value::Str("42".to_string())];
        assert_eq!(
            t.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Int(42)
        );
        // nil soft-converts through the host primitive to zero.
        let mut args = vec![Value::Nil];
        assert_eq!(
            t.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_soft_cast_failure_kind() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("int", false);
        let mut args = vec![Value::Str("not a number".to_string())];
        let err = t.invoke(&braid, &frame, &mut args, &[None]).unwrap_err();
        assert!(err.to_string().contains("SoftCastFailure"));
    }

    #[test]
    fn test_soft_bool_uses_truthiness() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("bool", false);
        let mut args = vec![Value::Str(String::new())];
        assert_eq!(
            t.invoke(&braid, &frame, &mut args, &[None]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_soft_regex_is_case_insensitive() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("regex", false);
        let mut args = vec![Value::Str("abc".to_string())];
        let result = t.invoke(&braid, &frame, &mut args, &[None]).unwrap();
        match result {
            Value::Regex(re) => assert!(re.is_match("ABC")),
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_error() {
        let braid = Braid::new();
        let frame = Frame::root();
        let t = lit("int", true);
        let mut args = vec![Value::Int(1), Value::Int(2)];
        let err = t
            .invoke(&braid, &frame, &mut args, &[None, None])
            .unwrap_err();
        assert!(err.to_string().contains("ArityMismatch"));
    }

    #[test]
    fn test_pattern_test_strict() {
        let braid = Braid::new();
        let t = lit("int", true);
        assert_eq!(t.test(&braid, &Value::Int(1)).unwrap().0, true);
        assert_eq!(t.test(&braid, &Value::Str("x".to_string())).unwrap().0, false);
        assert_eq!(t.test(&braid, &Value::Nil).unwrap().0, false);

        let nil_t = lit("nil", true);
        assert_eq!(nil_t.test(&braid, &Value::Nil).unwrap(), (true, Some(Value::Nil)));
    }

    #[test]
    fn test_pattern_test_soft_coerces() {
        let braid = Braid::new();
        let t = lit("int", false);
        let (matched, coerced) = t.test(&braid, &Value::Str("7".to_string())).unwrap();
        assert!(matched);
        assert_eq!(coerced, Some(Value::Int(7)));

        let (matched, coerced) = t.test(&braid, &Value::Str("x".to_string())).unwrap();
        assert!(!matched);
        assert_eq!(coerced, None);
    }
}
