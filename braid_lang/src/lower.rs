//! Lowering: s-expression CST -> literal objects.
//!
//! Attaches source context (file, position, verbatim text, containing
//! function) to every literal, rewrites `fn`/`defn` forms into function
//! literals, pre-resolves `.Type/member` static bindings where the type is
//! already known, and performs the structural duplicate-literal-key check
//! on dictionary literals before anything evaluates.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use braid_lang_parser::{AtomKind, SExpr, SExprKind};
use num_bigint::BigInt;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::literal::{
    ArgIndexLiteral, DictionaryLiteral, ExpandableStringLiteral, Expr, FunctionLiteral,
    HashSetLiteral, KeywordExpr, ListExpr, MemberLiteral, QuoteExpr, SplatExpr,
    StaticMethodLiteral, StaticPropertyLiteral, SymbolExpr, TypeLiteral, ValueLiteral,
    VectorLiteral,
};
use crate::span::{SourceContext, Span};
use crate::value::{Lambda, Value};

pub struct Lowering<'a> {
    braid: &'a Braid,
    source: &'a str,
    file: Rc<str>,
    /// Names of the functions currently being lowered, innermost last
    function_stack: RefCell<Vec<Rc<str>>>,
}

impl<'a> Lowering<'a> {
    pub fn new(braid: &'a Braid, source: &'a str, file: &str) -> Self {
        Self {
            braid,
            source,
            file: Rc::from(file),
            function_stack: RefCell::new(Vec::new()),
        }
    }

    /// Lower all top-level forms
    pub fn lower_forms(&self, forms: &[SExpr]) -> BraidResult<Vec<Expr>> {
        forms.iter().map(|form| self.lower(form)).collect()
    }

    fn ctx(&self, span: &braid_lang_parser::Span) -> SourceContext {
        let function = self
            .function_stack
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| Rc::from("top-level"));
        SourceContext::new(
            Span::from_parser_span(span),
            self.file.clone(),
            Rc::from(span.text(self.source)),
            function,
        )
    }

    pub fn lower(&self, form: &SExpr) -> BraidResult<Expr> {
        let ctx = self.ctx(&form.span);
        match &form.kind {
            SExprKind::Atom { kind, text } => self.lower_atom(*kind, text, ctx),
            SExprKind::Vector(items) => Ok(Expr::Vector(VectorLiteral::new(
                self.lower_elements(items)?,
                ctx,
            ))),
            SExprKind::Set(items) => Ok(Expr::HashSet(HashSetLiteral::new(
                self.lower_elements(items)?,
                ctx,
            ))),
            SExprKind::Map(items) => {
                self.check_duplicate_literal_keys(items)?;
                Ok(Expr::Dictionary(DictionaryLiteral::new(
                    self.lower_elements(items)?,
                    ctx,
                )))
            }
            SExprKind::Quote(inner) => Ok(Expr::Quote(QuoteExpr {
                inner: Box::new(self.lower(inner)?),
                ctx,
            })),
            SExprKind::Splat(inner) => Ok(Expr::Splat(SplatExpr {
                inner: Box::new(self.lower(inner)?),
                ctx,
            })),
            SExprKind::List(items) => self.lower_list(items, ctx),
        }
    }

    fn lower_elements(&self, items: &[SExpr]) -> BraidResult<Vec<Expr>> {
        items.iter().map(|item| self.lower(item)).collect()
    }

    fn lower_atom(&self, kind: AtomKind, text: &str, ctx: SourceContext) -> BraidResult<Expr> {
        match kind {
            AtomKind::Int => match text.parse::<i64>() {
                Ok(v) => Ok(Expr::Value(ValueLiteral::new(Value::Int(v), ctx))),
                // Out-of-range decimal literals widen to bigint.
                Err(_) => text
                    .parse::<BigInt>()
                    .map(|v| Expr::Value(ValueLiteral::new(Value::BigInt(Box::new(v)), ctx)))
                    .map_err(|_| {
                        BraidError::syntax(format!("invalid number literal '{}'", text))
                    }),
            },
            AtomKind::BigInt => {
                let digits = text.strip_suffix('N').unwrap_or(text);
                digits
                    .parse::<BigInt>()
                    .map(|v| Expr::Value(ValueLiteral::new(Value::BigInt(Box::new(v)), ctx)))
                    .map_err(|_| {
                        BraidError::syntax(format!("invalid number literal '{}'", text))
                    })
            }
            AtomKind::Float => text
                .parse::<f64>()
                .map(|v| Expr::Value(ValueLiteral::new(Value::Float(v), ctx)))
                .map_err(|_| BraidError::syntax(format!("invalid number literal '{}'", text))),
            AtomKind::Str => self.lower_string(text, ctx),
            AtomKind::Keyword => Ok(Expr::Keyword(KeywordExpr {
                kw: self.braid.keywords.intern(text),
                ctx,
            })),
            AtomKind::Symbol => Ok(match text {
                "true" => Expr::Value(ValueLiteral::new(Value::Bool(true), ctx)),
                "false" => Expr::Value(ValueLiteral::new(Value::Bool(false), ctx)),
                "nil" | "null" => Expr::Value(ValueLiteral::new(Value::Nil, ctx)),
                name => Expr::Symbol(SymbolExpr {
                    sym: self.braid.symbols.intern(name),
                    ctx,
                }),
            }),
            AtomKind::TypeName => {
                let body = text.strip_prefix('^').unwrap_or(text);
                let (name, strict) = match body.strip_suffix('?') {
                    Some(name) => (name, false),
                    None => (body, true),
                };
                Ok(Expr::Type(TypeLiteral::new(name, strict, ctx)))
            }
            AtomKind::Member => Ok(self.lower_member(text, ctx)),
            AtomKind::ArgIndex => {
                let digits = text.strip_prefix('%').unwrap_or(text);
                digits
                    .parse::<usize>()
                    .map(|index| Expr::ArgIndex(ArgIndexLiteral::new(index, ctx)))
                    .map_err(|_| {
                        BraidError::syntax(format!("invalid argument index '{}'", text))
                    })
            }
        }
    }

    /// `.Type/member` binds eagerly when the type and a public static
    /// member are already known; everything else resolves at call time.
    fn lower_member(&self, text: &str, ctx: SourceContext) -> Expr {
        let member = MemberLiteral::new(text, ctx.clone());
        if !member.is_quiet() {
            if let Some(type_name) = member.type_name() {
                if let Some(ty) = self.braid.types.resolve(type_name) {
                    let name = member.member_name();
                    if let Some(index) = ty.property_index(name, true) {
                        return Expr::StaticProperty(StaticPropertyLiteral::new(
                            text, ty, index, ctx,
                        ));
                    }
                    if !ty.method_indices(name, true).is_empty() {
                        return Expr::StaticMethod(StaticMethodLiteral::new(text, ty, ctx));
                    }
                }
            }
        }
        Expr::Member(Rc::new(member))
    }

    fn lower_string(&self, text: &str, ctx: SourceContext) -> BraidResult<Expr> {
        let inner = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        if has_unescaped_dollar(inner) {
            // Keep `\$` unresolved; expansion handles it.
            let template = unescape(inner, true)?;
            Ok(Expr::ExpandableString(ExpandableStringLiteral::new(
                template, ctx,
            )))
        } else {
            let value = unescape(inner, false)?;
            Ok(Expr::Value(ValueLiteral::new(Value::Str(value), ctx)))
        }
    }

    fn lower_list(&self, items: &[SExpr], ctx: SourceContext) -> BraidResult<Expr> {
        if items.is_empty() {
            return Ok(Expr::Value(ValueLiteral::new(Value::Nil, ctx)));
        }

        if items[0].is_symbol("fn") || items[0].is_symbol("lambda") {
            return self.lower_fn(items, ctx);
        }
        if items[0].is_symbol("defn") {
            return self.lower_defn(items, ctx);
        }
        // `(defmethod ^Type name [params] body…)` sugars the tail into a
        // function literal; an explicit callable third argument passes
        // through unchanged.
        if items[0].is_symbol("defmethod")
            && items.len() >= 4
            && matches!(items[3].kind, SExprKind::Vector(_))
        {
            let name: Rc<str> = Rc::from(items[2].atom_text().unwrap_or("method"));
            let function = self.lower_fn_tail(name, &items[3..], None, ctx.clone())?;
            return Ok(Expr::List(ListExpr {
                items: vec![
                    self.lower(&items[0])?,
                    self.lower(&items[1])?,
                    self.lower(&items[2])?,
                    function,
                ],
                ctx,
            }));
        }
        if items[0].is_symbol("quote") && items.len() == 2 {
            return Ok(Expr::Quote(QuoteExpr {
                inner: Box::new(self.lower(&items[1])?),
                ctx,
            }));
        }

        Ok(Expr::List(ListExpr {
            items: self.lower_elements(items)?,
            ctx,
        }))
    }

    /// `(fn [params] body…)` or `(fn name [params] body…)`
    fn lower_fn(&self, items: &[SExpr], ctx: SourceContext) -> BraidResult<Expr> {
        let mut rest = &items[1..];
        let name: Rc<str> = match rest.first() {
            Some(form) if matches!(&form.kind, SExprKind::Atom { kind: AtomKind::Symbol, .. }) => {
                let name = form.atom_text().unwrap_or("lambda").to_string();
                rest = &rest[1..];
                Rc::from(name)
            }
            _ => Rc::from("lambda"),
        };
        self.lower_fn_tail(name, rest, None, ctx)
    }

    /// `(defn name [params] "help"? body…)` expands to
    /// `(def name (fn …))` with the help string attached.
    fn lower_defn(&self, items: &[SExpr], ctx: SourceContext) -> BraidResult<Expr> {
        let Some(name_form) = items.get(1) else {
            return Err(BraidError::syntax("defn requires a name").with_context(&ctx));
        };
        let Some(name) = name_form.atom_text() else {
            return Err(BraidError::syntax("defn name must be a symbol").with_context(&ctx));
        };

        let rest = &items[2..];
        // A leading string literal with more body behind it is help text.
        if rest.len() > 2 {
            if let Some(SExprKind::Atom { kind: AtomKind::Str, text }) =
                rest.get(1).map(|f| &f.kind)
            {
                let inner = text
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .unwrap_or(text.as_str());
                let help = Some(Rc::from(unescape(inner, false)?));
                let mut trimmed = vec![rest[0].clone()];
                trimmed.extend_from_slice(&rest[2..]);
                return self.finish_defn(name, &trimmed, help, ctx);
            }
        }
        self.finish_defn(name, rest, None, ctx)
    }

    fn finish_defn(
        &self,
        name: &str,
        rest: &[SExpr],
        help: Option<Rc<str>>,
        ctx: SourceContext,
    ) -> BraidResult<Expr> {
        let function = self.lower_fn_tail(Rc::from(name), rest, help, ctx.clone())?;
        Ok(Expr::List(ListExpr {
            items: vec![
                Expr::Symbol(SymbolExpr {
                    sym: self.braid.symbols.intern("def"),
                    ctx: ctx.clone(),
                }),
                Expr::Symbol(SymbolExpr {
                    sym: self.braid.symbols.intern(name),
                    ctx: ctx.clone(),
                }),
                function,
            ],
            ctx,
        }))
    }

    /// Common tail: `[params] body…` starting at `rest[0]`
    fn lower_fn_tail(
        &self,
        name: Rc<str>,
        rest: &[SExpr],
        help: Option<Rc<str>>,
        ctx: SourceContext,
    ) -> BraidResult<Expr> {
        let Some(SExprKind::Vector(param_forms)) = rest.first().map(|f| &f.kind) else {
            return Err(
                BraidError::syntax("fn requires a [parameter] vector").with_context(&ctx)
            );
        };
        let mut params = Vec::with_capacity(param_forms.len());
        for form in param_forms {
            match &form.kind {
                SExprKind::Atom { kind: AtomKind::Symbol, text } => {
                    params.push(self.braid.symbols.intern(text));
                }
                _ => {
                    return Err(BraidError::syntax("fn parameters must be symbols")
                        .with_context(&self.ctx(&form.span)));
                }
            }
        }

        self.function_stack.borrow_mut().push(name.clone());
        let body = self.lower_elements(&rest[1..]);
        self.function_stack.borrow_mut().pop();

        let template = Rc::new(Lambda {
            id: 0,
            name,
            params,
            body: Rc::from(body?),
            env: None,
        });
        Ok(Expr::Function(FunctionLiteral::new(template, help, ctx)))
    }

    /// Duplicate *literal* keys among the non-splat keys are a lowering
    /// error, splats or no splats; splat-introduced duplicates stay
    /// last-writer-wins at runtime.
    fn check_duplicate_literal_keys(&self, items: &[SExpr]) -> BraidResult<()> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut at_key = true;
        for item in items {
            if item.is_splat() {
                // A splat contributes whole entries and does not move the
                // key/value cursor.
                continue;
            }
            if at_key {
                if let Some(repr) = literal_key_repr(item) {
                    if !seen.insert(repr) {
                        return Err(BraidError::duplicate_key(
                            item.atom_text().unwrap_or("?").to_string(),
                        )
                        .with_context(&self.ctx(&item.span)));
                    }
                }
            }
            at_key = !at_key;
        }
        Ok(())
    }
}

/// Canonical representation of a literal key, or None for computed keys
fn literal_key_repr(form: &SExpr) -> Option<String> {
    match &form.kind {
        SExprKind::Atom { kind, text } => match kind {
            AtomKind::Keyword => Some(format!(
                "kw:{}",
                text.trim_matches(':').to_ascii_lowercase()
            )),
            AtomKind::Int | AtomKind::BigInt => Some(format!("int:{}", text)),
            AtomKind::Str => Some(format!("str:{}", text)),
            AtomKind::Symbol if text == "true" || text == "false" => {
                Some(format!("bool:{}", text))
            }
            _ => None,
        },
        _ => None,
    }
}

fn has_unescaped_dollar(text: &str) -> bool {
    let mut escaped = false;
    for c in text.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '$' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

/// Resolve escape sequences. In template mode `\$` is kept for the
/// expander; everywhere else it resolves to `$`.
fn unescape(text: &str, keep_dollar_escapes: bool) -> BraidResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some('$') => {
                if keep_dollar_escapes {
                    out.push('\\');
                }
                out.push('$');
            }
            Some(other) => {
                return Err(BraidError::syntax(format!(
                    "invalid escape sequence '\\{}'",
                    other
                )));
            }
            None => return Err(BraidError::syntax("dangling escape at end of string")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_one(braid: &Braid, source: &str) -> BraidResult<Expr> {
        let forms = braid_lang_parser::parse(source).expect("parse failed");
        let lowering = Lowering::new(braid, source, "<test>");
        let mut lowered = lowering.lower_forms(&forms)?;
        Ok(lowered.remove(0))
    }

    #[test]
    fn test_numbers() {
        let braid = Braid::new();
        assert!(matches!(
            lower_one(&braid, "42").unwrap(),
            Expr::Value(_)
        ));
        assert!(matches!(lower_one(&braid, "3.5").unwrap(), Expr::Value(_)));
        assert!(matches!(lower_one(&braid, "12N").unwrap(), Expr::Value(_)));
        // An int literal too large for i64 silently widens.
        assert!(matches!(
            lower_one(&braid, "99999999999999999999999").unwrap(),
            Expr::Value(_)
        ));
    }

    #[test]
    fn test_member_kinds() {
        let braid = Braid::new();
        assert!(matches!(
            lower_one(&braid, ".ToUpper").unwrap(),
            Expr::Member(_)
        ));
        // Static property binds eagerly.
        assert!(matches!(
            lower_one(&braid, ".int/MaxValue").unwrap(),
            Expr::StaticProperty(_)
        ));
        // Static method binds eagerly.
        assert!(matches!(
            lower_one(&braid, ".string/Join").unwrap(),
            Expr::StaticMethod(_)
        ));
        // Unknown types fall back to runtime resolution.
        assert!(matches!(
            lower_one(&braid, ".widget/Spin").unwrap(),
            Expr::Member(_)
        ));
    }

    #[test]
    fn test_duplicate_literal_keys_rejected() {
        let braid = Braid::new();
        let err = lower_one(&braid, "{:a 1 :a 2}").unwrap_err();
        assert!(err.to_string().contains("DuplicateKey"));
        // Case-insensitive keyword identity.
        assert!(lower_one(&braid, "{:a 1 :A 2}").is_err());
    }

    #[test]
    fn test_duplicate_check_with_splat_present() {
        let braid = Braid::new();
        // A splat does not disable the literal-key check...
        assert!(lower_one(&braid, "{:a 1 @m}").is_ok());
        // ...and duplicates are still caught around it.
        assert!(lower_one(&braid, "{:a 1 @m :a 2}").is_err());
    }

    #[test]
    fn test_computed_keys_not_checked() {
        let braid = Braid::new();
        assert!(lower_one(&braid, "{(f) 1 (f) 2}").is_ok());
    }

    #[test]
    fn test_string_kinds() {
        let braid = Braid::new();
        assert!(matches!(
            lower_one(&braid, "\"plain\"").unwrap(),
            Expr::Value(_)
        ));
        assert!(matches!(
            lower_one(&braid, "\"has $x\"").unwrap(),
            Expr::ExpandableString(_)
        ));
        // Escaped dollars stay plain strings.
        assert!(matches!(
            lower_one(&braid, "\"cost \\$5\"").unwrap(),
            Expr::Value(_)
        ));
    }

    #[test]
    fn test_invalid_escape() {
        let braid = Braid::new();
        assert!(lower_one(&braid, "\"bad \\q\"").is_err());
    }

    #[test]
    fn test_fn_forms() {
        let braid = Braid::new();
        assert!(matches!(
            lower_one(&braid, "(fn [x] x)").unwrap(),
            Expr::Function(_)
        ));
        // defn expands to (def name (fn ...)).
        let Expr::List(list) = lower_one(&braid, "(defn f [x] \"doc\" x)").unwrap() else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 3);
        let Expr::Function(f) = &list.items[2] else {
            panic!("expected function literal");
        };
        assert_eq!(f.help().map(|h| h.to_string()), Some("doc".to_string()));
    }

    #[test]
    fn test_containing_function_recorded() {
        let braid = Braid::new();
        let Expr::Function(f) = lower_one(&braid, "(fn outer [x] %0)").unwrap() else {
            panic!("expected function literal");
        };
        let body = &f.template().body;
        assert_eq!(&*body[0].context().function, "outer");
    }

    #[test]
    fn test_empty_list_is_nil() {
        let braid = Braid::new();
        let Expr::Value(_) = lower_one(&braid, "()").unwrap() else {
            panic!("expected nil literal");
        };
    }
}
