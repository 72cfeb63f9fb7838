//! Host type system: named type descriptors and the registry that resolves
//! them.
//!
//! A `BraidType` describes one reflected type: its properties, and its
//! method overloads (including by-reference parameters). Member dispatch
//! searches these descriptors; the `type` descriptor doubles as the
//! metaclass, so a type object receiver can answer `Name`, `IsClass`,
//! `GetMethod` and friends.

mod builtins;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::BraidResult;
use crate::value::Value;

/// Shared reference to a type descriptor
pub type TypeRef = Rc<BraidType>;

/// A resolved type together with the coercion mode of the literal that
/// produced it. `^int` and `^int?` resolve to the same descriptor but
/// invoke in different modes.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    pub ty: TypeRef,
    pub soft: bool,
}

impl TypeHandle {
    pub fn strict(ty: TypeRef) -> Self {
        Self { ty, soft: false }
    }

    pub fn soft(ty: TypeRef) -> Self {
        Self { ty, soft: true }
    }
}

/// Builtin classification of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Nil,
    Bool,
    Int,
    BigInt,
    Float,
    Char,
    Str,
    Symbol,
    Keyword,
    Regex,
    Vector,
    Dict,
    Set,
    Type,
    Function,
    Native,
    Any,
}

/// Native property accessor; the receiver is the type object for statics.
pub type PropertyGetter = fn(&Value) -> BraidResult<Value>;
/// Native property writer
pub type PropertySetter = fn(&Value, Value) -> BraidResult<()>;

/// Reflected property
#[derive(Debug, Clone)]
pub struct Property {
    pub name: &'static str,
    pub is_static: bool,
    pub getter: PropertyGetter,
    pub setter: Option<PropertySetter>,
}

/// One method parameter: expected type and by-reference flag
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub expect: TypeTag,
    pub by_ref: bool,
}

impl Param {
    pub const fn of(expect: TypeTag) -> Self {
        Self {
            expect,
            by_ref: false,
        }
    }

    pub const fn by_ref(expect: TypeTag) -> Self {
        Self {
            expect,
            by_ref: true,
        }
    }
}

/// Native method implementation. `args[0]` is the receiver (the type object
/// for statics); by-ref parameters write their output back into the slice.
pub type MethodFn = fn(&mut [Value]) -> BraidResult<Value>;

/// Reflected method overload
#[derive(Debug, Clone)]
pub struct Method {
    pub name: &'static str,
    pub is_static: bool,
    /// Parameters after the receiver
    pub params: Vec<Param>,
    pub func: MethodFn,
}

/// A reflected host type
#[derive(Debug)]
pub struct BraidType {
    name: Box<str>,
    tag: TypeTag,
    properties: Vec<Property>,
    methods: Vec<Method>,
}

impl BraidType {
    pub fn new(
        name: &str,
        tag: TypeTag,
        properties: Vec<Property>,
        methods: Vec<Method>,
    ) -> Self {
        Self {
            name: Box::from(name),
            tag,
            properties,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Find a property by case-insensitive name
    pub fn find_property(&self, name: &str, want_static: bool) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.is_static == want_static && p.name.eq_ignore_ascii_case(name))
    }

    /// All method overloads matching a case-insensitive name
    pub fn find_methods(&self, name: &str, want_static: bool) -> Vec<&Method> {
        self.methods
            .iter()
            .filter(|m| m.is_static == want_static && m.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// Index of a property by case-insensitive name
    pub fn property_index(&self, name: &str, want_static: bool) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| p.is_static == want_static && p.name.eq_ignore_ascii_case(name))
    }

    pub fn property_at(&self, index: usize) -> &Property {
        &self.properties[index]
    }

    /// Indices of all method overloads matching a case-insensitive name
    pub fn method_indices(&self, name: &str, want_static: bool) -> Vec<usize> {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_static == want_static && m.name.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn method_at(&self, index: usize) -> &Method {
        &self.methods[index]
    }

    /// True if this type has any member (property or method) with the name
    pub fn has_member(&self, name: &str) -> bool {
        self.properties
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name))
            || self
                .methods
                .iter()
                .any(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Member names for error reporting; statics carry an `(S)` prefix.
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for p in &self.properties {
            names.push(if p.is_static {
                format!("(S) {}", p.name)
            } else {
                p.name.to_string()
            });
        }
        for m in &self.methods {
            let rendered = if m.is_static {
                format!("(S) {}", m.name)
            } else {
                m.name.to_string()
            };
            if !names.contains(&rendered) {
                names.push(rendered);
            }
        }
        names.sort();
        names
    }

    /// Assignability: exact tag match, or the `any` sink.
    pub fn is_assignable_from(&self, value: &Value) -> bool {
        self.tag == TypeTag::Any || value_tag(value) == self.tag
    }
}

/// Classify a runtime value
pub fn value_tag(value: &Value) -> TypeTag {
    match value {
        Value::Nil => TypeTag::Nil,
        Value::Bool(_) => TypeTag::Bool,
        Value::Int(_) => TypeTag::Int,
        Value::BigInt(_) => TypeTag::BigInt,
        Value::Float(_) => TypeTag::Float,
        Value::Char(_) => TypeTag::Char,
        Value::Str(_) => TypeTag::Str,
        Value::Symbol(_) => TypeTag::Symbol,
        Value::Keyword(_) => TypeTag::Keyword,
        Value::Regex(_) => TypeTag::Regex,
        Value::Vector(_) => TypeTag::Vector,
        Value::Dict(_) => TypeTag::Dict,
        Value::Set(_) => TypeTag::Set,
        Value::Type(_) => TypeTag::Type,
        Value::Lambda(_) | Value::Builtin(_) | Value::Member(_) => TypeTag::Function,
        Value::Native(_) => TypeTag::Native,
    }
}

/// Per-interpreter registry of named types
#[derive(Debug)]
pub struct TypeRegistry {
    by_name: RefCell<HashMap<String, TypeRef>>,
    by_tag: HashMap<TypeTag, TypeRef>,
}

impl TypeRegistry {
    /// Build a registry with the builtin types registered
    pub fn with_builtins() -> Self {
        let mut by_name = HashMap::new();
        let mut by_tag = HashMap::new();
        for ty in builtins::builtin_types() {
            let ty = Rc::new(ty);
            by_name.insert(ty.name().to_ascii_lowercase(), ty.clone());
            by_tag.insert(ty.tag(), ty);
        }
        Self {
            by_name: RefCell::new(by_name),
            by_tag,
        }
    }

    /// Resolve a type by case-insensitive name
    pub fn resolve(&self, name: &str) -> Option<TypeRef> {
        self.by_name
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Register a type under its name (user-defined types)
    pub fn register(&self, ty: TypeRef) {
        self.by_name
            .borrow_mut()
            .insert(ty.name().to_ascii_lowercase(), ty);
    }

    /// The descriptor for a runtime value's type
    pub fn type_of(&self, value: &Value) -> TypeRef {
        // Natives resolve by their declared name when registered, else fall
        // back to the generic native descriptor.
        if let Value::Native(obj) = value {
            if let Some(ty) = self.resolve(obj.type_name()) {
                return ty;
            }
        }
        self.by_tag[&value_tag(value)].clone()
    }

    /// The metaclass consulted when the receiver is itself a type object
    pub fn metaclass(&self) -> TypeRef {
        self.by_tag[&TypeTag::Type].clone()
    }

    /// The empty-list type (the type of `nil`)
    pub fn nil_type(&self) -> TypeRef {
        self.by_tag[&TypeTag::Nil].clone()
    }

    /// All registered type names (used by REPL completion)
    pub fn names(&self) -> Vec<String> {
        self.by_name.borrow().keys().cloned().collect()
    }
}
