//! Function literals.
//!
//! A function literal wraps an environment-free lambda template. Each
//! evaluation clones the template with a snapshot of the current frame, so
//! the produced callable closes over the active lexical environment. Help
//! text, when present, is attached to the produced callable through the
//! context's documentation side-table.

use std::rc::Rc;

use crate::context::Braid;
use crate::error::BraidResult;
use crate::eval;
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::Literal;
use crate::span::SourceContext;
use crate::value::{Lambda, Value};

#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    template: Rc<Lambda>,
    help: Option<Rc<str>>,
    ctx: SourceContext,
}

impl FunctionLiteral {
    pub fn new(template: Rc<Lambda>, help: Option<Rc<str>>, ctx: SourceContext) -> Self {
        Self {
            template,
            help,
            ctx,
        }
    }

    pub fn template(&self) -> &Rc<Lambda> {
        &self.template
    }

    pub fn help(&self) -> Option<&Rc<str>> {
        self.help.as_ref()
    }
}

impl Literal for FunctionLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, braid: &Braid, frame: &FrameRef) -> BraidResult<Value> {
        let id = braid.next_lambda_id();
        let lambda = Rc::new(self.template.instantiate(id, frame.clone()));
        if let Some(help) = &self.help {
            braid.set_doc(id, help.clone());
        }
        Ok(Value::Lambda(lambda))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        _arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let Value::Lambda(lambda) = self.value(braid, frame)? else {
            unreachable!("function literal evaluates to a lambda");
        };
        eval::call_lambda(braid, frame, &lambda, std::mem::take(args), &[])
            .map_err(|e| e.with_context(&self.ctx))
    }
}
