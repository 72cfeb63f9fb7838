//! Pre-resolved static member literals.
//!
//! When lowering sees `.Type/member` and can already resolve the type and
//! a public static member, it binds the handle eagerly; the runtime-search
//! `MemberLiteral` path is only kept for names that resolve late.

use std::rc::Rc;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::{Literal, MemberLiteral};
use crate::span::SourceContext;
use crate::types::{TypeHandle, TypeRef};
use crate::value::Value;

/// A static property bound at lowering time
#[derive(Debug, Clone)]
pub struct StaticPropertyLiteral {
    text: Box<str>,
    ty: TypeRef,
    /// Property index within the owning type
    index: usize,
    ctx: SourceContext,
}

impl StaticPropertyLiteral {
    pub fn new(text: &str, ty: TypeRef, index: usize, ctx: SourceContext) -> Self {
        Self {
            text: Box::from(text),
            ty,
            index,
            ctx,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn receiver(&self) -> Value {
        Value::Type(TypeHandle::strict(self.ty.clone()))
    }
}

impl Literal for StaticPropertyLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    /// A static property evaluates straight to its current value.
    fn value(&self, _braid: &Braid, _frame: &FrameRef) -> BraidResult<Value> {
        let property = self.ty.property_at(self.index);
        (property.getter)(&self.receiver())
            .map_err(|e| BraidError::host_invocation(property.name, &e).with_context(&self.ctx))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        _arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let property = self.ty.property_at(self.index);
        match args.len() {
            0 => self.value(braid, frame),
            1 => match property.setter {
                Some(setter) => {
                    setter(&self.receiver(), args[0].clone())
                        .map_err(|e| {
                            BraidError::host_invocation(property.name, &e)
                                .with_context(&self.ctx)
                        })?;
                    Ok(self.receiver())
                }
                None => Err(BraidError::host_invocation(
                    property.name,
                    &BraidError::type_mismatch(format!(
                        "property '{}' is read-only",
                        property.name
                    )),
                )
                .with_context(&self.ctx)),
            },
            got => Err(BraidError::arity(&*self.text, "0 or 1", got).with_context(&self.ctx)),
        }
    }
}

/// A static method bound at lowering time.
///
/// Overload selection still happens per call (arities differ), so the
/// pre-resolved part is the type binding; invocation delegates to the
/// shared dispatch path with its memoised record.
#[derive(Debug, Clone)]
pub struct StaticMethodLiteral {
    text: Box<str>,
    ty: TypeRef,
    inner: Rc<MemberLiteral>,
    ctx: SourceContext,
}

impl StaticMethodLiteral {
    pub fn new(text: &str, ty: TypeRef, ctx: SourceContext) -> Self {
        Self {
            text: Box::from(text),
            ty,
            inner: Rc::new(MemberLiteral::new(text, ctx.clone())),
            ctx,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn owning_type(&self) -> &TypeRef {
        &self.ty
    }
}

impl Literal for StaticMethodLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, _braid: &Braid, _frame: &FrameRef) -> BraidResult<Value> {
        Ok(Value::Member(self.inner.clone()))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        self.inner.invoke(braid, frame, args, arg_symbols)
    }
}
