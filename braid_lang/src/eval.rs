//! The eval primitive.
//!
//! Literals evaluate through their own `value`; a list form evaluates its
//! head and invokes it with splat-expanded arguments. When a literal
//! appears in function position the evaluator calls `invoke` on the
//! literal itself, which is what lets every literal double as a callable.
//!
//! Special forms are kept to the minimum a usable front-end needs:
//! `if`, `do`, `and`, `or`, `let`, `def`, `set`, `throw`, and
//! `defmethod`. Function syntax (`fn`, `defn`) and `quote` are rewritten
//! during lowering and never reach this table.

use std::rc::Rc;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::frame::{Frame, FrameRef};
use crate::interner::{Keyword, Symbol};
use crate::literal::{
    dict_call, set_call, vector_call, Expr, ListExpr, Literal,
};
use crate::value::{is_true, new_vector_ref, DictKey, Lambda, Value};

/// Evaluate an expression in the given frame
pub fn eval(braid: &Braid, frame: &FrameRef, expr: &Expr) -> BraidResult<Value> {
    expr.value(braid, frame)
}

/// Parse, lower, and evaluate source text; returns the last form's value.
pub fn run_source(
    braid: &Braid,
    frame: &FrameRef,
    source: &str,
    file: &str,
) -> BraidResult<Value> {
    let forms = braid_lang_parser::parse(source)
        .map_err(|e| BraidError::syntax(e.to_string()))?;
    let lowered = crate::lower::Lowering::new(braid, source, file).lower_forms(&forms)?;
    let mut result = Value::Nil;
    for expr in &lowered {
        result = eval(braid, frame, expr)?;
    }
    Ok(result)
}

/// Evaluate an application form `(head args...)`
pub fn eval_list(braid: &Braid, frame: &FrameRef, list: &ListExpr) -> BraidResult<Value> {
    let Some((head, rest)) = list.items.split_first() else {
        return Ok(Value::Nil);
    };

    if let Some(sym) = head.as_symbol() {
        match sym.name() {
            "if" => return special_if(braid, frame, rest),
            "do" => return special_do(braid, frame, rest),
            "and" => return special_and(braid, frame, rest),
            "or" => return special_or(braid, frame, rest),
            "let" => return special_let(braid, frame, rest, &list.ctx),
            "def" => return special_def(braid, frame, rest, &list.ctx),
            "set" => return special_set(braid, frame, rest, &list.ctx),
            "throw" => return special_throw(braid, frame, rest),
            "defmethod" => return special_defmethod(braid, frame, rest, &list.ctx),
            _ => {}
        }
    }

    let (mut args, arg_symbols, named) = evaluate_args(braid, frame, rest)?;
    if named.is_empty() {
        head.invoke(braid, frame, &mut args, &arg_symbols)
    } else {
        let callee = head.value(braid, frame)?;
        invoke_value_named(braid, frame, callee, &mut args, &arg_symbols, &named)
            .map_err(|e| e.with_context(&list.ctx))
    }
}

// ==================== special forms ====================

fn special_if(braid: &Braid, frame: &FrameRef, rest: &[Expr]) -> BraidResult<Value> {
    let cond = rest
        .first()
        .map(|e| e.value(braid, frame))
        .transpose()?
        .unwrap_or(Value::Nil);
    if is_true(&cond) {
        rest.get(1).map(|e| e.value(braid, frame)).transpose().map(|v| v.unwrap_or(Value::Nil))
    } else {
        rest.get(2).map(|e| e.value(braid, frame)).transpose().map(|v| v.unwrap_or(Value::Nil))
    }
}

fn special_do(braid: &Braid, frame: &FrameRef, rest: &[Expr]) -> BraidResult<Value> {
    let mut result = Value::Nil;
    for expr in rest {
        result = expr.value(braid, frame)?;
    }
    Ok(result)
}

fn special_and(braid: &Braid, frame: &FrameRef, rest: &[Expr]) -> BraidResult<Value> {
    let mut result = Value::Bool(true);
    for expr in rest {
        result = expr.value(braid, frame)?;
        if !is_true(&result) {
            return Ok(result);
        }
    }
    Ok(result)
}

fn special_or(braid: &Braid, frame: &FrameRef, rest: &[Expr]) -> BraidResult<Value> {
    let mut result = Value::Nil;
    for expr in rest {
        result = expr.value(braid, frame)?;
        if is_true(&result) {
            return Ok(result);
        }
    }
    Ok(result)
}

/// `(let name expr)` binds in the current frame; `(let [n1 e1 n2 e2] body…)`
/// runs the body in a child frame.
fn special_let(
    braid: &Braid,
    frame: &FrameRef,
    rest: &[Expr],
    ctx: &crate::span::SourceContext,
) -> BraidResult<Value> {
    match rest.first() {
        Some(Expr::Symbol(s)) => {
            let value = rest
                .get(1)
                .map(|e| e.value(braid, frame))
                .transpose()?
                .unwrap_or(Value::Nil);
            frame.set_local(s.sym.clone(), value.clone());
            Ok(value)
        }
        Some(Expr::Vector(bindings)) => {
            let scope = Frame::child(frame, frame.function_name.clone(), None, None);
            let elements = bindings.elements();
            if elements.len() % 2 != 0 {
                return Err(
                    BraidError::syntax("let bindings require name/value pairs").with_context(ctx)
                );
            }
            for pair in elements.chunks(2) {
                let Some(sym) = pair[0].as_symbol() else {
                    return Err(BraidError::syntax("let binding name must be a symbol")
                        .with_context(pair[0].context()));
                };
                let value = pair[1].value(braid, &scope)?;
                scope.set_local(sym.clone(), value);
            }
            special_do(braid, &scope, &rest[1..])
        }
        _ => Err(BraidError::syntax("let requires a symbol or binding vector")
            .with_context(ctx)),
    }
}

fn special_def(
    braid: &Braid,
    frame: &FrameRef,
    rest: &[Expr],
    ctx: &crate::span::SourceContext,
) -> BraidResult<Value> {
    let Some(sym) = rest.first().and_then(|e| e.as_symbol()) else {
        return Err(BraidError::syntax("def requires a symbol name").with_context(ctx));
    };
    let value = rest
        .get(1)
        .map(|e| e.value(braid, frame))
        .transpose()?
        .unwrap_or(Value::Nil);
    frame.set_local(sym.clone(), value.clone());
    Ok(value)
}

/// `(set name expr)` rebinds an existing variable; `(set %N expr)` writes
/// through to the owning frame's argument vector.
fn special_set(
    braid: &Braid,
    frame: &FrameRef,
    rest: &[Expr],
    ctx: &crate::span::SourceContext,
) -> BraidResult<Value> {
    let value = rest
        .get(1)
        .map(|e| e.value(braid, frame))
        .transpose()?
        .unwrap_or(Value::Nil);
    match rest.first() {
        Some(Expr::Symbol(s)) => {
            if !frame.assign(&s.sym, value.clone()) {
                return Err(BraidError::undefined_symbol(s.sym.name()).with_context(&s.ctx));
            }
            Ok(value)
        }
        Some(Expr::ArgIndex(lit)) => {
            lit.set(frame, value.clone())?;
            Ok(value)
        }
        _ => Err(BraidError::syntax("set requires a symbol or %N target").with_context(ctx)),
    }
}

fn special_throw(braid: &Braid, frame: &FrameRef, rest: &[Expr]) -> BraidResult<Value> {
    let value = rest
        .first()
        .map(|e| e.value(braid, frame))
        .transpose()?
        .unwrap_or(Value::Nil);
    Err(BraidError::user(value))
}

/// `(defmethod ^Type name (fn [self …] …))` registers a user method.
fn special_defmethod(
    braid: &Braid,
    frame: &FrameRef,
    rest: &[Expr],
    ctx: &crate::span::SourceContext,
) -> BraidResult<Value> {
    let Some(Expr::Type(type_lit)) = rest.first() else {
        return Err(
            BraidError::syntax("defmethod requires a type literal first").with_context(ctx)
        );
    };
    let Some(name) = rest.get(1).and_then(|e| e.as_symbol()) else {
        return Err(BraidError::syntax("defmethod requires a method name").with_context(ctx));
    };
    let Some(body) = rest.get(2) else {
        return Err(BraidError::syntax("defmethod requires a callable body").with_context(ctx));
    };

    let ty = type_lit.resolve(braid)?;
    let callable = body.value(braid, frame)?;
    if !callable.is_callable() {
        return Err(BraidError::not_callable(callable.type_name()).with_context(body.context()));
    }
    braid
        .methods
        .define(ty.name(), name.clone(), callable.clone());
    Ok(callable)
}

// ==================== arguments ====================

/// Evaluate an argument list, expanding splats and collecting
/// `:name: value` named parameters. The second return value records which
/// positional argument expressions were bare symbols (the by-reference
/// side table).
pub fn evaluate_args(
    braid: &Braid,
    frame: &FrameRef,
    exprs: &[Expr],
) -> BraidResult<(Vec<Value>, Vec<Option<Symbol>>, Vec<(Keyword, Value)>)> {
    let mut args = Vec::with_capacity(exprs.len());
    let mut symbols = Vec::with_capacity(exprs.len());
    let mut named = Vec::new();

    let mut i = 0;
    while i < exprs.len() {
        match &exprs[i] {
            Expr::Splat(splat) => {
                let value = splat.inner.value(braid, frame)?;
                let before = args.len();
                expand_splat_value(&value, &mut args);
                symbols.resize(symbols.len() + (args.len() - before), None);
            }
            Expr::Keyword(k) if k.kw.requires_argument() => match exprs.get(i + 1) {
                Some(arg) => {
                    let value = arg.value(braid, frame)?;
                    named.push((k.kw.clone(), value));
                    i += 1;
                }
                None => {
                    return Err(BraidError::type_mismatch(format!(
                        "keyword {} requires an argument",
                        k.kw
                    ))
                    .with_context(&k.ctx));
                }
            },
            other => {
                args.push(other.value(braid, frame)?);
                symbols.push(other.as_symbol().cloned());
            }
        }
        i += 1;
    }
    Ok((args, symbols, named))
}

/// Expand one splatted value into an argument or element list. Enumerables
/// contribute their elements, dictionaries their entries as `[k v]` pairs,
/// nil nothing, and anything else itself.
pub fn expand_splat_value(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Nil => {}
        Value::Vector(items) => out.extend(items.borrow().iter().cloned()),
        Value::Set(items) => out.extend(items.borrow().iter().cloned()),
        Value::Dict(dict) => {
            for (k, v) in dict.borrow().iter() {
                out.push(Value::Vector(new_vector_ref(vec![k.to_value(), v.clone()])));
            }
        }
        other => out.push(other.clone()),
    }
}

// ==================== invocation ====================

/// Invoke a runtime value as a callable.
pub fn invoke_value(
    braid: &Braid,
    frame: &FrameRef,
    callee: Value,
    args: &mut Vec<Value>,
    arg_symbols: &[Option<Symbol>],
) -> BraidResult<Value> {
    invoke_value_named(braid, frame, callee, args, arg_symbols, &[])
}

fn invoke_value_named(
    braid: &Braid,
    frame: &FrameRef,
    callee: Value,
    args: &mut Vec<Value>,
    arg_symbols: &[Option<Symbol>],
    named: &[(Keyword, Value)],
) -> BraidResult<Value> {
    if !named.is_empty() && !matches!(callee, Value::Lambda(_)) {
        return Err(BraidError::type_mismatch(format!(
            "{} does not accept named parameters",
            callee.type_name()
        )));
    }
    match callee {
        Value::Keyword(kw) => keyword_call(&kw, args),
        Value::Type(handle) => crate::literal::invoke_type_value(&handle, args),
        Value::Vector(v) => vector_call(&v, args),
        Value::Dict(d) => dict_call(&d, args),
        Value::Set(s) => set_call(&s, args),
        Value::Lambda(lambda) => {
            call_lambda(braid, frame, &lambda, std::mem::take(args), named)
        }
        Value::Builtin(builtin) => (builtin.func)(braid, frame, args),
        Value::Member(member) => member.invoke(braid, frame, args, arg_symbols),
        Value::Nil => Err(BraidError::not_callable("nil")),
        other => Err(BraidError::not_callable(other.type_name().to_string())),
    }
}

/// Keyword-as-function: one argument reads `mapping[self]`, two write and
/// return the mapping so writes chain in pipelines.
pub fn keyword_call(kw: &Keyword, args: &[Value]) -> BraidResult<Value> {
    let mapping = match args.first() {
        Some(Value::Dict(d)) => d.clone(),
        Some(other) => {
            return Err(BraidError::type_mismatch(format!(
                "keyword {} expects a mapping, got {}",
                kw,
                other.type_name()
            )));
        }
        None => return Err(BraidError::arity(kw.text(), "1 or 2", 0)),
    };
    match args.len() {
        1 => Ok(mapping
            .borrow()
            .get(&DictKey::Keyword(kw.clone()))
            .cloned()
            .unwrap_or(Value::Nil)),
        2 => {
            mapping
                .borrow_mut()
                .insert(DictKey::Keyword(kw.clone()), args[1].clone());
            Ok(Value::Dict(mapping))
        }
        got => Err(BraidError::arity(kw.text(), "1 or 2", got)),
    }
}

/// Call a lambda: fresh frame under its captured environment, arguments
/// bound positionally, named parameters matched case-insensitively.
pub fn call_lambda(
    braid: &Braid,
    frame: &FrameRef,
    lambda: &Rc<Lambda>,
    args: Vec<Value>,
    named: &[(Keyword, Value)],
) -> BraidResult<Value> {
    if braid.cancel.is_requested() {
        return Err(BraidError::cancelled());
    }

    let parent = lambda.env.clone().unwrap_or_else(|| frame.clone());
    // A call that binds nothing leaves the argument vector unbound so %N
    // inside resolves against the enclosing call.
    let arguments = if args.is_empty() && lambda.params.is_empty() {
        None
    } else {
        Some(args.clone())
    };
    let call_frame = Frame::child(&parent, lambda.name.clone(), arguments, Some(frame.clone()));

    for (i, param) in lambda.params.iter().enumerate() {
        call_frame.set_local(param.clone(), args.get(i).cloned().unwrap_or(Value::Nil));
    }
    for (kw, value) in named {
        match lambda
            .params
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(kw.base_name()))
        {
            Some(param) => call_frame.set_local(param.clone(), value.clone()),
            None => {
                return Err(BraidError::type_mismatch(format!(
                    "{} has no parameter named {}",
                    lambda.name, kw
                )));
            }
        }
    }

    let mut result = Value::Nil;
    for expr in lambda.body.iter() {
        result = expr.value(braid, &call_frame)?;
    }
    Ok(result)
}

// ==================== string interpolation ====================

/// Expand a string template: `$name` and `$(expr)` evaluate in the current
/// frame; `\$` produces a literal dollar sign.
pub fn expand_string(braid: &Braid, frame: &FrameRef, template: &str) -> BraidResult<String> {
    let mut out = String::with_capacity(template.len());
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() && chars[i + 1] == '$' => {
                out.push('$');
                i += 2;
            }
            '$' if i + 1 < chars.len() && chars[i + 1] == '(' => {
                let start = i + 2;
                let end = find_matching_paren(&chars, start)?;
                let inner: String = chars[start..end].iter().collect();
                let value = run_source(braid, frame, &inner, "<interpolation>")?;
                out.push_str(&bare_text(&value));
                i = end + 1;
            }
            '$' if i + 1 < chars.len() && is_ident_start(chars[i + 1]) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let sym = braid.symbols.intern(&name);
                let value = frame.get_variable(&sym).unwrap_or(Value::Nil);
                out.push_str(&bare_text(&value));
                i = end;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Matching `)` for an interpolation, ignoring parens inside nested string
/// literals.
fn find_matching_paren(chars: &[char], start: usize) -> BraidResult<usize> {
    let mut depth = 1;
    let mut in_string = false;
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            match c {
                '\\' => i += 1,
                '"' => in_string = false,
                _ => {}
            }
        } else {
            match c {
                '"' => in_string = true,
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    Err(BraidError::syntax(
        "unterminated $( interpolation in string template",
    ))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Display form without string quoting, used when splicing into templates
fn bare_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}
