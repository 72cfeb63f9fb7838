//! Member literals: `.member`, `.?member`, `.Type/member`.
//!
//! The central dispatcher. Resolution happens at call time against the
//! receiver's reflected type, in order: property, dictionary field,
//! method (exact signature first, then arity), metaclass retry for type
//! receivers, then the user method table. A quiet literal (`.?member`)
//! turns null receivers and missing members into nil instead of raising.
//!
//! Each call site memoises its last `(type, arity) -> member` resolution;
//! re-resolving after a receiver type change is idempotent, so the cache
//! needs no locking.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Braid;
use crate::convert::coerce_arg;
use crate::error::{BraidError, BraidResult};
use crate::eval;
use crate::frame::FrameRef;
use crate::interner::Symbol;
use crate::literal::Literal;
use crate::span::SourceContext;
use crate::types::{TypeHandle, TypeRef};
use crate::value::{DictKey, Value};

/// Which search space a cached resolution points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchSpace {
    /// The receiver's own type
    Base,
    /// The metaclass, for type-object receivers
    Meta,
}

#[derive(Debug, Clone)]
enum ResolvedMember {
    Property(usize),
    Method(usize),
}

/// Memoised resolution for one call site
#[derive(Debug, Clone)]
struct DispatchRecord {
    target: TypeRef,
    arity: usize,
    space: SearchSpace,
    member: ResolvedMember,
}

#[derive(Debug, Clone)]
pub struct MemberLiteral {
    /// Original token text, leading dot included
    text: Box<str>,
    /// Static form `.Type/member` names the type explicitly
    type_name: Option<Box<str>>,
    /// Member name without the `?` quiet marker
    member: Box<str>,
    quiet: bool,
    cache: RefCell<Option<DispatchRecord>>,
    ctx: SourceContext,
}

impl MemberLiteral {
    /// Parse a member token: `.member`, `.?member`, `.Type/member`.
    pub fn new(text: &str, ctx: SourceContext) -> Self {
        let body = text.strip_prefix('.').unwrap_or(text);
        let (quiet, body) = match body.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let (type_name, member) = match body.split_once('/') {
            Some((ty, member)) => (Some(Box::from(ty)), Box::from(member)),
            None => (None, Box::from(body)),
        };
        Self {
            text: Box::from(text),
            type_name,
            member,
            quiet,
            cache: RefCell::new(None),
            ctx,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn member_name(&self) -> &str {
        &self.member
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Quiet mode maps misses and null receivers to nil.
    fn soften(&self, result: BraidResult<Value>) -> BraidResult<Value> {
        match result {
            Err(e)
                if self.quiet
                    && matches!(
                        e.kind,
                        crate::error::BraidErrorKind::MissingMember { .. }
                    ) =>
            {
                Ok(Value::Nil)
            }
            other => other,
        }
    }

    fn dispatch(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        // 1. A host reflection wrapper among the arguments takes over
        //    dispatch entirely.
        if let Some(pos) = args
            .iter()
            .position(|a| matches!(a, Value::Native(_)))
        {
            let obj = match &args[pos] {
                Value::Native(o) => o.clone(),
                _ => unreachable!(),
            };
            return obj
                .invoke_member(&self.member, args.as_mut_slice())
                .map_err(|e| BraidError::host_invocation(&*self.member, &e));
        }

        // 2–3. Normalize so slot 0 holds the receiver (the type object for
        //    static forms) and determine the target type.
        let mut symbol_offset = 0usize;
        let (target, is_static) = if let Some(type_name) = &self.type_name {
            let ty = braid
                .types
                .resolve(type_name)
                .ok_or_else(|| BraidError::unresolved_type(&**type_name))?;
            args.insert(0, Value::Type(TypeHandle::strict(ty.clone())));
            symbol_offset = 1;
            (ty, true)
        } else {
            match args.first() {
                None => {
                    return Err(BraidError::arity(&*self.text, "at least a receiver", 0));
                }
                Some(Value::Nil) => {
                    if self.quiet {
                        return Ok(Value::Nil);
                    }
                    return Err(BraidError::missing_member(
                        "nil",
                        &*self.member,
                        Vec::new(),
                    ));
                }
                Some(Value::Type(h)) => (h.ty.clone(), true),
                Some(receiver) => (braid.types.type_of(receiver), false),
            }
        };

        // Fast path: this call site already resolved the same type at the
        // same arity.
        if let Some(record) = self.cache.borrow().clone() {
            if Rc::ptr_eq(&record.target, &target) && record.arity == args.len() {
                let (ty, want_static) = match record.space {
                    SearchSpace::Base => (target.clone(), is_static),
                    SearchSpace::Meta => (braid.types.metaclass(), false),
                };
                return match record.member {
                    ResolvedMember::Property(i) => {
                        self.invoke_property(&ty, i, args, want_static)
                    }
                    ResolvedMember::Method(i) => {
                        self.invoke_method(frame, &ty, i, args, arg_symbols, symbol_offset)
                    }
                };
            }
        }

        // 4.1–4.3 against the receiver's type.
        if let Some(result) = self.search_space(
            frame,
            &target,
            &target,
            is_static,
            SearchSpace::Base,
            args,
            arg_symbols,
            symbol_offset,
        )? {
            return Ok(result);
        }

        // 4.2 dictionaries expose their entries as fields.
        if !is_static {
            if let Some(Value::Dict(dict)) = args.first().cloned().as_ref() {
                if let Some(result) = self.dict_field(braid, dict, args)? {
                    return Ok(result);
                }
            }
        }

        // 4.4 metaclass retry for type-object receivers.
        if matches!(args.first(), Some(Value::Type(_))) {
            let meta = braid.types.metaclass();
            if let Some(result) = self.search_space(
                frame,
                &meta,
                &target,
                false,
                SearchSpace::Meta,
                args,
                arg_symbols,
                symbol_offset,
            )? {
                return Ok(result);
            }
        }

        // 4.5 user-defined braid methods.
        let method_sym = braid.symbols.intern(&self.member);
        if let Some(callable) = braid.methods.get_method(target.name(), &method_sym) {
            // The original receiver is already installed in slot 0.
            return eval::invoke_value(braid, frame, callable, args, arg_symbols);
        }

        // 5. Miss: report the members that do exist.
        let mut alternatives = target.member_names();
        alternatives.extend(braid.methods.methods_for(target.name()));
        Err(BraidError::missing_member(
            target.name(),
            &*self.member,
            alternatives,
        ))
    }

    /// Property and method search within one space. Returns Ok(None) on a
    /// clean miss so the caller can continue down the chain. Cache records
    /// always key on the receiver's own type (`record_target`), even when
    /// the search ran against the metaclass.
    fn search_space(
        &self,
        frame: &FrameRef,
        ty: &TypeRef,
        record_target: &TypeRef,
        want_static: bool,
        space: SearchSpace,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
        symbol_offset: usize,
    ) -> BraidResult<Option<Value>> {
        if let Some(i) = ty.property_index(&self.member, want_static) {
            self.remember(record_target, args.len(), space, ResolvedMember::Property(i));
            return self.invoke_property(ty, i, args, want_static).map(Some);
        }

        let candidates = ty.method_indices(&self.member, want_static);
        if candidates.is_empty() {
            return Ok(None);
        }
        let argc = args.len().saturating_sub(1);

        // Exact argument-type signature first.
        let exact = candidates.iter().copied().find(|&i| {
            let m = ty.method_at(i);
            m.params.len() == argc
                && m.params.iter().zip(args[1..].iter()).all(|(p, a)| {
                    p.by_ref
                        || p.expect == crate::types::TypeTag::Any
                        || crate::types::value_tag(a) == p.expect
                })
        });
        // Fall back to name + arity.
        let chosen = exact.or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|&i| ty.method_at(i).params.len() == argc)
        });

        match chosen {
            Some(i) => {
                self.remember(record_target, args.len(), space, ResolvedMember::Method(i));
                self.invoke_method(frame, ty, i, args, arg_symbols, symbol_offset)
                    .map(Some)
            }
            None => Err(BraidError::arity(
                format!("{}.{}", ty.name(), self.member),
                describe_arities(ty, &candidates),
                argc,
            )),
        }
    }

    fn remember(&self, ty: &TypeRef, arity: usize, space: SearchSpace, member: ResolvedMember) {
        *self.cache.borrow_mut() = Some(DispatchRecord {
            target: ty.clone(),
            arity,
            space,
            member,
        });
    }

    fn invoke_property(
        &self,
        ty: &TypeRef,
        index: usize,
        args: &[Value],
        _want_static: bool,
    ) -> BraidResult<Value> {
        let property = ty.property_at(index);
        if args.len() > 1 {
            match property.setter {
                Some(setter) => {
                    setter(&args[0], args[1].clone())
                        .map_err(|e| BraidError::host_invocation(property.name, &e))?;
                    // Return the receiver for pipeline chaining.
                    Ok(args[0].clone())
                }
                None => Err(BraidError::host_invocation(
                    property.name,
                    &BraidError::type_mismatch(format!(
                        "property '{}' is read-only",
                        property.name
                    )),
                )),
            }
        } else {
            (property.getter)(&args[0])
                .map_err(|e| BraidError::host_invocation(property.name, &e))
        }
    }

    fn invoke_method(
        &self,
        frame: &FrameRef,
        ty: &TypeRef,
        index: usize,
        args: &mut [Value],
        arg_symbols: &[Option<Symbol>],
        symbol_offset: usize,
    ) -> BraidResult<Value> {
        let method = ty.method_at(index).clone();

        // Coerce positional arguments to the parameter types; by-ref slots
        // stay untouched so the callee can overwrite them.
        let mut writebacks: Vec<(usize, Symbol)> = Vec::new();
        for (i, param) in method.params.iter().enumerate() {
            let slot = i + 1;
            if param.by_ref {
                // Record the slot -> symbol side table before the call.
                if let Some(Some(sym)) = arg_symbols.get(slot - symbol_offset) {
                    writebacks.push((slot, sym.clone()));
                }
            } else {
                args[slot] = coerce_arg(&args[slot], param.expect)?;
            }
        }

        let result = (method.func)(args)
            .map_err(|e| BraidError::host_invocation(&*self.member, &e))?;

        // Write captured by-ref outputs into the caller's bindings for the
        // symbols that appeared in those argument positions.
        for (slot, sym) in writebacks {
            frame.set_local(sym, args[slot].clone());
        }

        Ok(result)
    }

    /// Dictionary entries behave as fields: read on one argument, write on
    /// two. A write creates the entry; a read miss falls through.
    fn dict_field(
        &self,
        braid: &Braid,
        dict: &crate::value::DictRef,
        args: &[Value],
    ) -> BraidResult<Option<Value>> {
        if args.len() > 1 {
            let key = dict
                .borrow()
                .get_member(&self.member)
                .map(|(k, _)| k.clone())
                .unwrap_or_else(|| DictKey::Keyword(braid.keywords.intern(&self.member)));
            dict.borrow_mut().insert(key, args[1].clone());
            return Ok(Some(args[0].clone()));
        }
        Ok(dict.borrow().get_member(&self.member).map(|(_, v)| v.clone()))
    }
}

impl Literal for MemberLiteral {
    fn context(&self) -> &SourceContext {
        &self.ctx
    }

    fn value(&self, _braid: &Braid, _frame: &FrameRef) -> BraidResult<Value> {
        // The literal is itself a first-class callable value.
        Ok(Value::Member(Rc::new(self.clone())))
    }

    fn invoke(
        &self,
        braid: &Braid,
        frame: &FrameRef,
        args: &mut Vec<Value>,
        arg_symbols: &[Option<Symbol>],
    ) -> BraidResult<Value> {
        let result = self.dispatch(braid, frame, args, arg_symbols);
        self.soften(result).map_err(|e| e.with_context(&self.ctx))
    }
}

fn describe_arities(ty: &TypeRef, candidates: &[usize]) -> String {
    let mut counts: Vec<usize> = candidates
        .iter()
        .map(|&i| ty.method_at(i).params.len())
        .collect();
    counts.sort_unstable();
    counts.dedup();
    counts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::span::SourceContext;

    fn member(text: &str) -> MemberLiteral {
        MemberLiteral::new(text, SourceContext::synthetic(text))
    }

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_instance_member() {
        let m = member(".ToUpper");
        assert_eq!(m.member_name(), "ToUpper");
        assert!(m.type_name().is_none());
        assert!(!m.is_quiet());
    }

    #[test]
    fn test_parse_quiet_member() {
        let m = member(".?foo");
        assert_eq!(m.member_name(), "foo");
        assert!(m.is_quiet());
    }

    #[test]
    fn test_parse_static_member() {
        let m = member(".string/Join");
        assert_eq!(m.type_name(), Some("string"));
        assert_eq!(m.member_name(), "Join");
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    fn call(m: &MemberLiteral, braid: &Braid, args: Vec<Value>) -> BraidResult<Value> {
        let frame = Frame::root();
        let mut args = args;
        let symbols = vec![None; args.len()];
        m.invoke(braid, &frame, &mut args, &symbols)
    }

    #[test]
    fn test_instance_method_dispatch() {
        let braid = Braid::new();
        let m = member(".ToUpper");
        let result = call(&m, &braid, vec![Value::Str("hello".to_string())]).unwrap();
        assert_eq!(result, Value::Str("HELLO".to_string()));
    }

    #[test]
    fn test_case_insensitive_member_match() {
        let braid = Braid::new();
        let m = member(".toupper");
        let result = call(&m, &braid, vec![Value::Str("abc".to_string())]).unwrap();
        assert_eq!(result, Value::Str("ABC".to_string()));
    }

    #[test]
    fn test_property_read() {
        let braid = Braid::new();
        let m = member(".Length");
        let result = call(&m, &braid, vec![Value::Str("abcd".to_string())]).unwrap();
        assert_eq!(result, Value::Int(4));
    }

    #[test]
    fn test_static_method_through_type_name() {
        let braid = Braid::new();
        let m = member(".int/Parse");
        let result = call(&m, &braid, vec![Value::Str("42".to_string())]).unwrap();
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn test_static_property_on_type_receiver() {
        let braid = Braid::new();
        let int_ty = braid.types.resolve("int").unwrap();
        let m = member(".MaxValue");
        let result = call(
            &m,
            &braid,
            vec![Value::Type(TypeHandle::strict(int_ty))],
        )
        .unwrap();
        assert_eq!(result, Value::Int(i64::MAX));
    }

    #[test]
    fn test_metaclass_retry_for_type_receiver() {
        let braid = Braid::new();
        let int_ty = braid.types.resolve("int").unwrap();
        let m = member(".Name");
        let result = call(
            &m,
            &braid,
            vec![Value::Type(TypeHandle::strict(int_ty))],
        )
        .unwrap();
        assert_eq!(result, Value::Str("int".to_string()));
    }

    #[test]
    fn test_quiet_null_receiver_yields_nil() {
        let braid = Braid::new();
        let quiet = member(".?foo");
        assert_eq!(call(&quiet, &braid, vec![Value::Nil]).unwrap(), Value::Nil);

        let loud = member(".foo");
        assert!(call(&loud, &braid, vec![Value::Nil]).is_err());
    }

    #[test]
    fn test_quiet_missing_member_yields_nil() {
        let braid = Braid::new();
        let quiet = member(".?NoSuchThing");
        let result = call(&quiet, &braid, vec![Value::Int(1)]).unwrap();
        assert_eq!(result, Value::Nil);
    }

    #[test]
    fn test_missing_member_lists_alternatives() {
        let braid = Braid::new();
        let m = member(".NoSuchThing");
        let err = call(&m, &braid, vec![Value::Str("s".to_string())]).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("MissingMember"));
        assert!(text.contains("ToUpper"));
        assert!(text.contains("(S) Join"));
    }

    #[test]
    fn test_by_ref_writes_symbol_binding() {
        let braid = Braid::new();
        let frame = Frame::root();
        let n = braid.symbols.intern("n");

        let m = member(".int/TryParse");
        let mut args = vec![Value::Str("42".to_string()), Value::Nil];
        let symbols = vec![None, Some(n.clone())];
        let result = m.invoke(&braid, &frame, &mut args, &symbols).unwrap();

        assert_eq!(result, Value::Bool(true));
        assert_eq!(frame.get_variable(&n), Some(Value::Int(42)));
    }

    #[test]
    fn test_dict_entries_read_as_fields() {
        let braid = Braid::new();
        let mut dict = crate::value::DictValue::new();
        let kw = braid.keywords.intern(":name");
        dict.insert(DictKey::Keyword(kw), Value::Str("braid".to_string()));
        let d = Value::Dict(crate::value::new_dict_ref(dict));

        let m = member(".name");
        assert_eq!(
            call(&m, &braid, vec![d.clone()]).unwrap(),
            Value::Str("braid".to_string())
        );

        // A two-argument call writes the field and returns the receiver.
        let m2 = member(".name");
        let result = call(
            &m2,
            &braid,
            vec![d.clone(), Value::Str("other".to_string())],
        )
        .unwrap();
        assert!(matches!(result, Value::Dict(_)));
        let m3 = member(".name");
        assert_eq!(
            call(&m3, &braid, vec![d]).unwrap(),
            Value::Str("other".to_string())
        );
    }

    #[test]
    fn test_numeric_argument_coercion() {
        let braid = Braid::new();
        // Substring expects ints; floats with no fraction coerce.
        let m = member(".Substring");
        let result = call(
            &m,
            &braid,
            vec![Value::Str("hello".to_string()), Value::Float(1.0)],
        )
        .unwrap();
        assert_eq!(result, Value::Str("ello".to_string()));
    }

    #[test]
    fn test_overload_selection_by_arity() {
        let braid = Braid::new();
        let m = member(".Substring");
        let result = call(
            &m,
            &braid,
            vec![
                Value::Str("hello".to_string()),
                Value::Int(1),
                Value::Int(2),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::Str("el".to_string()));
    }

    #[test]
    fn test_dispatch_cache_reuse() {
        let braid = Braid::new();
        let m = member(".ToUpper");
        for text in ["a", "b", "c"] {
            let result = call(&m, &braid, vec![Value::Str(text.to_string())]).unwrap();
            assert_eq!(result, Value::Str(text.to_uppercase()));
        }
        assert!(m.cache.borrow().is_some());
    }

    #[test]
    fn test_native_object_delegation() {
        #[derive(Debug)]
        struct Probe;
        impl crate::value::NativeObject for Probe {
            fn type_name(&self) -> &str {
                "probe"
            }
            fn invoke_member(&self, member: &str, _args: &mut [Value]) -> BraidResult<Value> {
                Ok(Value::Str(format!("probe:{}", member)))
            }
        }

        let braid = Braid::new();
        let m = member(".Anything");
        let native = Value::Native(Rc::new(Probe));
        let result = call(&m, &braid, vec![native]).unwrap();
        assert_eq!(result, Value::Str("probe:Anything".to_string()));
    }

    #[test]
    fn test_user_method_fallback() {
        let braid = Braid::new();
        let frame = Frame::root();
        // Register a user method `double` on int as a native builtin value.
        let sym = braid.symbols.intern("double");
        let builtin = Value::Builtin(Rc::new(crate::value::Builtin {
            name: "double",
            func: |_braid, _frame, args| {
                let v = args[0].as_int().unwrap_or(0);
                Ok(Value::Int(v * 2))
            },
        }));
        braid.methods.define("int", sym, builtin);

        let m = member(".double");
        let mut args = vec![Value::Int(21)];
        let symbols = vec![None];
        let result = m.invoke(&braid, &frame, &mut args, &symbols).unwrap();
        assert_eq!(result, Value::Int(42));
    }
}
