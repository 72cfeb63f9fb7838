//! Builtin type descriptors and their native members.
//!
//! Each descriptor lists the reflected surface member dispatch searches:
//! properties first, then method overloads. String indices are character
//! based, matching how the language counts string length.

use std::rc::Rc;

use num_bigint::BigInt;

use crate::error::{BraidError, BraidResult};
use crate::interner::{Keyword, Symbol};
use crate::types::{BraidType, Method, Param, Property, TypeTag};
use crate::value::{braid_equals, new_vector_ref, Value};

/// All builtin type descriptors
pub(super) fn builtin_types() -> Vec<BraidType> {
    vec![
        nil_type(),
        any_type(),
        bool_type(),
        int_type(),
        bigint_type(),
        float_type(),
        char_type(),
        string_type(),
        symbol_type(),
        keyword_type(),
        regex_type(),
        vector_type(),
        dict_type(),
        set_type(),
        function_type(),
        native_type(),
        metaclass(),
    ]
}

// ==================== argument helpers ====================

fn str_arg(args: &[Value], i: usize) -> BraidResult<String> {
    match args.get(i) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(BraidError::type_mismatch(format!(
            "expected string argument, got {}",
            other.type_name()
        ))),
        None => Err(BraidError::type_mismatch("missing string argument")),
    }
}

fn int_arg(args: &[Value], i: usize) -> BraidResult<i64> {
    match args.get(i).and_then(|v| v.as_int()) {
        Some(v) => Ok(v),
        None => Err(BraidError::type_mismatch(format!(
            "expected integer argument, got {}",
            args.get(i).map(|v| v.type_name()).unwrap_or("nothing")
        ))),
    }
}

fn receiver_str(args: &[Value]) -> BraidResult<String> {
    str_arg(args, 0)
}

/// Character index of `needle` within `haystack`, or -1
fn char_index_of(haystack: &str, needle: &str) -> i64 {
    match haystack.find(needle) {
        Some(byte) => haystack[..byte].chars().count() as i64,
        None => -1,
    }
}

// ==================== nil / any / bool ====================

fn nil_type() -> BraidType {
    BraidType::new("nil", TypeTag::Nil, vec![], vec![])
}

fn any_type() -> BraidType {
    BraidType::new("any", TypeTag::Any, vec![], vec![])
}

fn bool_type() -> BraidType {
    BraidType::new("bool", TypeTag::Bool, vec![], vec![])
}

// ==================== int ====================

fn int_type() -> BraidType {
    BraidType::new(
        "int",
        TypeTag::Int,
        vec![
            Property {
                name: "MaxValue",
                is_static: true,
                getter: |_| Ok(Value::Int(i64::MAX)),
                setter: None,
            },
            Property {
                name: "MinValue",
                is_static: true,
                getter: |_| Ok(Value::Int(i64::MIN)),
                setter: None,
            },
        ],
        vec![
            Method {
                name: "Parse",
                is_static: true,
                params: vec![Param::of(TypeTag::Str)],
                func: int_parse,
            },
            Method {
                name: "TryParse",
                is_static: true,
                params: vec![Param::of(TypeTag::Str), Param::by_ref(TypeTag::Any)],
                func: int_try_parse,
            },
            Method {
                name: "ToFloat",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Float(int_arg(args, 0)? as f64)),
            },
            Method {
                name: "ToChar",
                is_static: false,
                params: vec![],
                func: |args| {
                    let v = int_arg(args, 0)?;
                    u32::try_from(v)
                        .ok()
                        .and_then(char::from_u32)
                        .map(Value::Char)
                        .ok_or_else(|| {
                            BraidError::type_mismatch(format!("{} is not a valid codepoint", v))
                        })
                },
            },
        ],
    )
}

fn int_parse(args: &mut [Value]) -> BraidResult<Value> {
    let text = str_arg(args, 1)?;
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(Value::Int(v));
    }
    trimmed
        .parse::<BigInt>()
        .map(|v| Value::BigInt(Box::new(v)))
        .map_err(|_| BraidError::type_mismatch(format!("cannot parse '{}' as int", text)))
}

fn int_try_parse(args: &mut [Value]) -> BraidResult<Value> {
    let text = str_arg(args, 1)?;
    match text.trim().parse::<i64>() {
        Ok(v) => {
            args[2] = Value::Int(v);
            Ok(Value::Bool(true))
        }
        Err(_) => {
            args[2] = Value::Nil;
            Ok(Value::Bool(false))
        }
    }
}

// ==================== bigint / float / char ====================

fn bigint_type() -> BraidType {
    BraidType::new(
        "bigint",
        TypeTag::BigInt,
        vec![],
        vec![Method {
            name: "Parse",
            is_static: true,
            params: vec![Param::of(TypeTag::Str)],
            func: |args| {
                let text = str_arg(args, 1)?;
                text.trim()
                    .parse::<BigInt>()
                    .map(|v| Value::BigInt(Box::new(v)))
                    .map_err(|_| {
                        BraidError::type_mismatch(format!("cannot parse '{}' as bigint", text))
                    })
            },
        }],
    )
}

fn float_type() -> BraidType {
    BraidType::new(
        "float",
        TypeTag::Float,
        vec![
            Property {
                name: "NaN",
                is_static: true,
                getter: |_| Ok(Value::Float(f64::NAN)),
                setter: None,
            },
            Property {
                name: "Infinity",
                is_static: true,
                getter: |_| Ok(Value::Float(f64::INFINITY)),
                setter: None,
            },
        ],
        vec![
            Method {
                name: "Parse",
                is_static: true,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    let text = str_arg(args, 1)?;
                    text.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                        BraidError::type_mismatch(format!("cannot parse '{}' as float", text))
                    })
                },
            },
            Method {
                name: "Floor",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Float(float_receiver(args)?.floor())),
            },
            Method {
                name: "Ceiling",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Float(float_receiver(args)?.ceil())),
            },
            Method {
                name: "Round",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Float(float_receiver(args)?.round())),
            },
        ],
    )
}

fn float_receiver(args: &[Value]) -> BraidResult<f64> {
    args.first().and_then(|v| v.as_float()).ok_or_else(|| {
        BraidError::type_mismatch(format!(
            "expected float receiver, got {}",
            args.first().map(|v| v.type_name()).unwrap_or("nothing")
        ))
    })
}

fn char_type() -> BraidType {
    BraidType::new(
        "char",
        TypeTag::Char,
        vec![],
        vec![
            Method {
                name: "ToInt",
                is_static: false,
                params: vec![],
                func: |args| match args.first() {
                    Some(Value::Char(c)) => Ok(Value::Int(*c as i64)),
                    _ => Err(BraidError::type_mismatch("expected char receiver")),
                },
            },
            Method {
                name: "ToUpper",
                is_static: false,
                params: vec![],
                func: |args| match args.first() {
                    Some(Value::Char(c)) => {
                        Ok(Value::Char(c.to_uppercase().next().unwrap_or(*c)))
                    }
                    _ => Err(BraidError::type_mismatch("expected char receiver")),
                },
            },
        ],
    )
}

// ==================== string ====================

fn string_type() -> BraidType {
    BraidType::new(
        "string",
        TypeTag::Str,
        vec![Property {
            name: "Length",
            is_static: false,
            getter: |recv| match recv {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                other => Err(BraidError::type_mismatch(format!(
                    "Length expects a string, got {}",
                    other.type_name()
                ))),
            },
            setter: None,
        }],
        vec![
            Method {
                name: "ToUpper",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Str(receiver_str(args)?.to_uppercase())),
            },
            Method {
                name: "ToLower",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Str(receiver_str(args)?.to_lowercase())),
            },
            Method {
                name: "Trim",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Str(receiver_str(args)?.trim().to_string())),
            },
            Method {
                name: "Contains",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    Ok(Value::Bool(
                        receiver_str(args)?.contains(&str_arg(args, 1)?),
                    ))
                },
            },
            Method {
                name: "StartsWith",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    Ok(Value::Bool(
                        receiver_str(args)?.starts_with(&str_arg(args, 1)?),
                    ))
                },
            },
            Method {
                name: "EndsWith",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    Ok(Value::Bool(
                        receiver_str(args)?.ends_with(&str_arg(args, 1)?),
                    ))
                },
            },
            Method {
                name: "IndexOf",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    Ok(Value::Int(char_index_of(
                        &receiver_str(args)?,
                        &str_arg(args, 1)?,
                    )))
                },
            },
            Method {
                name: "Substring",
                is_static: false,
                params: vec![Param::of(TypeTag::Int)],
                func: |args| {
                    let s = receiver_str(args)?;
                    let start = int_arg(args, 1)?;
                    substring(&s, start, i64::MAX)
                },
            },
            Method {
                name: "Substring",
                is_static: false,
                params: vec![Param::of(TypeTag::Int), Param::of(TypeTag::Int)],
                func: |args| {
                    let s = receiver_str(args)?;
                    let start = int_arg(args, 1)?;
                    let len = int_arg(args, 2)?;
                    substring(&s, start, len)
                },
            },
            Method {
                name: "Replace",
                is_static: false,
                params: vec![Param::of(TypeTag::Str), Param::of(TypeTag::Str)],
                func: |args| {
                    let s = receiver_str(args)?;
                    Ok(Value::Str(s.replace(&str_arg(args, 1)?, &str_arg(args, 2)?)))
                },
            },
            Method {
                name: "Split",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    let s = receiver_str(args)?;
                    let sep = str_arg(args, 1)?;
                    let parts: Vec<Value> = s
                        .split(sep.as_str())
                        .map(|p| Value::Str(p.to_string()))
                        .collect();
                    Ok(Value::Vector(new_vector_ref(parts)))
                },
            },
            Method {
                name: "PadLeft",
                is_static: false,
                params: vec![Param::of(TypeTag::Int)],
                func: |args| {
                    let s = receiver_str(args)?;
                    let width = int_arg(args, 1)?.max(0) as usize;
                    let len = s.chars().count();
                    let mut out = " ".repeat(width.saturating_sub(len));
                    out.push_str(&s);
                    Ok(Value::Str(out))
                },
            },
            Method {
                name: "ToKeyword",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Keyword(Keyword::global(&receiver_str(args)?))),
            },
            Method {
                name: "ToSymbol",
                is_static: false,
                params: vec![],
                func: |args| Ok(Value::Symbol(Symbol::global(&receiver_str(args)?))),
            },
            Method {
                name: "Join",
                is_static: true,
                params: vec![Param::of(TypeTag::Str), Param::of(TypeTag::Vector)],
                func: string_join,
            },
            Method {
                name: "Concat",
                is_static: true,
                params: vec![Param::of(TypeTag::Any), Param::of(TypeTag::Any)],
                func: |args| {
                    Ok(Value::Str(format!(
                        "{}{}",
                        bare_text(&args[1]),
                        bare_text(&args[2])
                    )))
                },
            },
        ],
    )
}

fn substring(s: &str, start: i64, len: i64) -> BraidResult<Value> {
    let chars: Vec<char> = s.chars().collect();
    if start < 0 || start as usize > chars.len() || len < 0 {
        return Err(BraidError::bad_index(format!(
            "substring start {} out of range for string of length {}",
            start,
            chars.len()
        )));
    }
    let start = start as usize;
    let end = start.saturating_add(len.min(chars.len() as i64) as usize).min(chars.len());
    Ok(Value::Str(chars[start..end].iter().collect()))
}

fn string_join(args: &mut [Value]) -> BraidResult<Value> {
    let sep = str_arg(args, 1)?;
    let vec = match args.get(2) {
        Some(Value::Vector(v)) => v.clone(),
        other => {
            return Err(BraidError::type_mismatch(format!(
                "Join expects a vector, got {}",
                other.map(|v| v.type_name()).unwrap_or("nothing")
            )))
        }
    };
    let parts: Vec<String> = vec.borrow().iter().map(bare_text).collect();
    Ok(Value::Str(parts.join(&sep)))
}

/// Display form without string quoting, for concatenation-style members
fn bare_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

// ==================== symbol / keyword / regex ====================

fn symbol_type() -> BraidType {
    BraidType::new(
        "symbol",
        TypeTag::Symbol,
        vec![Property {
            name: "Name",
            is_static: false,
            getter: |recv| match recv {
                Value::Symbol(sym) => Ok(Value::Str(sym.name().to_string())),
                other => Err(BraidError::type_mismatch(format!(
                    "Name expects a symbol, got {}",
                    other.type_name()
                ))),
            },
            setter: None,
        }],
        vec![],
    )
}

fn keyword_type() -> BraidType {
    BraidType::new(
        "keyword",
        TypeTag::Keyword,
        vec![Property {
            name: "Name",
            is_static: false,
            getter: |recv| match recv {
                Value::Keyword(kw) => Ok(Value::Str(kw.base_name().to_string())),
                other => Err(BraidError::type_mismatch(format!(
                    "Name expects a keyword, got {}",
                    other.type_name()
                ))),
            },
            setter: None,
        }],
        vec![],
    )
}

fn regex_type() -> BraidType {
    BraidType::new(
        "regex",
        TypeTag::Regex,
        vec![Property {
            name: "Pattern",
            is_static: false,
            getter: |recv| match recv {
                Value::Regex(re) => Ok(Value::Str(re.as_str().to_string())),
                other => Err(BraidError::type_mismatch(format!(
                    "Pattern expects a regex, got {}",
                    other.type_name()
                ))),
            },
            setter: None,
        }],
        vec![
            Method {
                name: "IsMatch",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    let re = regex_receiver(args)?;
                    Ok(Value::Bool(re.is_match(&str_arg(args, 1)?)))
                },
            },
            Method {
                name: "Match",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    let re = regex_receiver(args)?;
                    let text = str_arg(args, 1)?;
                    Ok(match re.find(&text) {
                        Some(m) => Value::Str(m.as_str().to_string()),
                        None => Value::Nil,
                    })
                },
            },
            Method {
                name: "Replace",
                is_static: false,
                params: vec![Param::of(TypeTag::Str), Param::of(TypeTag::Str)],
                func: |args| {
                    let re = regex_receiver(args)?;
                    let text = str_arg(args, 1)?;
                    let with = str_arg(args, 2)?;
                    Ok(Value::Str(re.replace_all(&text, with.as_str()).into_owned()))
                },
            },
        ],
    )
}

fn regex_receiver(args: &[Value]) -> BraidResult<Rc<regex::Regex>> {
    match args.first() {
        Some(Value::Regex(re)) => Ok(re.clone()),
        other => Err(BraidError::type_mismatch(format!(
            "expected regex receiver, got {}",
            other.map(|v| v.type_name()).unwrap_or("nothing")
        ))),
    }
}

// ==================== containers ====================

fn vector_type() -> BraidType {
    let length: Property = Property {
        name: "Length",
        is_static: false,
        getter: vector_length,
        setter: None,
    };
    let count = Property {
        name: "Count",
        is_static: false,
        getter: vector_length,
        setter: None,
    };
    BraidType::new(
        "vector",
        TypeTag::Vector,
        vec![length, count],
        vec![
            Method {
                name: "Add",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let v = vector_receiver(args)?;
                    v.borrow_mut().push(args[1].clone());
                    Ok(Value::Vector(v))
                },
            },
            Method {
                name: "Contains",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let v = vector_receiver(args)?;
                    let found = v.borrow().iter().any(|item| braid_equals(item, &args[1]));
                    Ok(Value::Bool(found))
                },
            },
            Method {
                name: "IndexOf",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let v = vector_receiver(args)?;
                    let idx = v
                        .borrow()
                        .iter()
                        .position(|item| braid_equals(item, &args[1]));
                    Ok(Value::Int(idx.map(|i| i as i64).unwrap_or(-1)))
                },
            },
            Method {
                name: "First",
                is_static: false,
                params: vec![],
                func: |args| {
                    let v = vector_receiver(args)?;
                    let first = v.borrow().first().cloned();
                    Ok(first.unwrap_or(Value::Nil))
                },
            },
            Method {
                name: "Last",
                is_static: false,
                params: vec![],
                func: |args| {
                    let v = vector_receiver(args)?;
                    let last = v.borrow().last().cloned();
                    Ok(last.unwrap_or(Value::Nil))
                },
            },
            Method {
                name: "Reverse",
                is_static: false,
                params: vec![],
                func: |args| {
                    let v = vector_receiver(args)?;
                    let mut items: Vec<Value> = v.borrow().clone();
                    items.reverse();
                    Ok(Value::Vector(new_vector_ref(items)))
                },
            },
        ],
    )
}

fn vector_length(recv: &Value) -> BraidResult<Value> {
    match recv {
        Value::Vector(v) => Ok(Value::Int(v.borrow().len() as i64)),
        other => Err(BraidError::type_mismatch(format!(
            "Length expects a vector, got {}",
            other.type_name()
        ))),
    }
}

fn vector_receiver(args: &[Value]) -> BraidResult<crate::value::VectorRef> {
    match args.first() {
        Some(Value::Vector(v)) => Ok(v.clone()),
        other => Err(BraidError::type_mismatch(format!(
            "expected vector receiver, got {}",
            other.map(|v| v.type_name()).unwrap_or("nothing")
        ))),
    }
}

fn dict_type() -> BraidType {
    BraidType::new(
        "dict",
        TypeTag::Dict,
        vec![
            Property {
                name: "Count",
                is_static: false,
                getter: |recv| match recv {
                    Value::Dict(d) => Ok(Value::Int(d.borrow().len() as i64)),
                    other => Err(BraidError::type_mismatch(format!(
                        "Count expects a dict, got {}",
                        other.type_name()
                    ))),
                },
                setter: None,
            },
            Property {
                name: "Keys",
                is_static: false,
                getter: |recv| match recv {
                    Value::Dict(d) => Ok(Value::Vector(new_vector_ref(
                        d.borrow().keys().map(|k| k.to_value()).collect(),
                    ))),
                    other => Err(BraidError::type_mismatch(format!(
                        "Keys expects a dict, got {}",
                        other.type_name()
                    ))),
                },
                setter: None,
            },
            Property {
                name: "Values",
                is_static: false,
                getter: |recv| match recv {
                    Value::Dict(d) => Ok(Value::Vector(new_vector_ref(
                        d.borrow().values().cloned().collect(),
                    ))),
                    other => Err(BraidError::type_mismatch(format!(
                        "Values expects a dict, got {}",
                        other.type_name()
                    ))),
                },
                setter: None,
            },
        ],
        vec![
            Method {
                name: "ContainsKey",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let d = dict_receiver(args)?;
                    let key = crate::value::DictKey::from_value(&args[1])?;
                    let contains = d.borrow().contains_key(&key);
                    Ok(Value::Bool(contains))
                },
            },
            Method {
                name: "Remove",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let d = dict_receiver(args)?;
                    let key = crate::value::DictKey::from_value(&args[1])?;
                    let removed = d.borrow_mut().remove(&key).is_some();
                    Ok(Value::Bool(removed))
                },
            },
        ],
    )
}

fn dict_receiver(args: &[Value]) -> BraidResult<crate::value::DictRef> {
    match args.first() {
        Some(Value::Dict(d)) => Ok(d.clone()),
        other => Err(BraidError::type_mismatch(format!(
            "expected dict receiver, got {}",
            other.map(|v| v.type_name()).unwrap_or("nothing")
        ))),
    }
}

fn set_type() -> BraidType {
    BraidType::new(
        "set",
        TypeTag::Set,
        vec![Property {
            name: "Count",
            is_static: false,
            getter: |recv| match recv {
                Value::Set(s) => Ok(Value::Int(s.borrow().len() as i64)),
                other => Err(BraidError::type_mismatch(format!(
                    "Count expects a set, got {}",
                    other.type_name()
                ))),
            },
            setter: None,
        }],
        vec![
            Method {
                name: "Add",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let s = set_receiver(args)?;
                    s.borrow_mut().insert(args[1].clone());
                    Ok(Value::Set(s))
                },
            },
            Method {
                name: "Remove",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let s = set_receiver(args)?;
                    let removed = s.borrow_mut().remove(&args[1]);
                    Ok(Value::Bool(removed))
                },
            },
            Method {
                name: "Contains",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let s = set_receiver(args)?;
                    let found = s.borrow().contains(&args[1]);
                    Ok(Value::Bool(found))
                },
            },
        ],
    )
}

fn set_receiver(args: &[Value]) -> BraidResult<crate::value::SetRef> {
    match args.first() {
        Some(Value::Set(s)) => Ok(s.clone()),
        other => Err(BraidError::type_mismatch(format!(
            "expected set receiver, got {}",
            other.map(|v| v.type_name()).unwrap_or("nothing")
        ))),
    }
}

// ==================== function / native / metaclass ====================

fn function_type() -> BraidType {
    BraidType::new(
        "function",
        TypeTag::Function,
        vec![Property {
            name: "Name",
            is_static: false,
            getter: |recv| match recv {
                Value::Lambda(l) => Ok(Value::Str(l.name.to_string())),
                Value::Builtin(b) => Ok(Value::Str(b.name.to_string())),
                Value::Member(m) => Ok(Value::Str(m.text().to_string())),
                other => Err(BraidError::type_mismatch(format!(
                    "Name expects a function, got {}",
                    other.type_name()
                ))),
            },
            setter: None,
        }],
        vec![],
    )
}

fn native_type() -> BraidType {
    BraidType::new("native", TypeTag::Native, vec![], vec![])
}

/// The metaclass: members available when the receiver is a type object.
fn metaclass() -> BraidType {
    BraidType::new(
        "type",
        TypeTag::Type,
        vec![
            Property {
                name: "Name",
                is_static: false,
                getter: |recv| match recv {
                    Value::Type(h) => Ok(Value::Str(h.ty.name().to_string())),
                    other => Err(BraidError::type_mismatch(format!(
                        "Name expects a type, got {}",
                        other.type_name()
                    ))),
                },
                setter: None,
            },
            Property {
                name: "IsClass",
                is_static: false,
                getter: |recv| match recv {
                    Value::Type(h) => Ok(Value::Bool(matches!(
                        h.ty.tag(),
                        TypeTag::Str
                            | TypeTag::Vector
                            | TypeTag::Dict
                            | TypeTag::Set
                            | TypeTag::Function
                            | TypeTag::Native
                            | TypeTag::Type
                    ))),
                    other => Err(BraidError::type_mismatch(format!(
                        "IsClass expects a type, got {}",
                        other.type_name()
                    ))),
                },
                setter: None,
            },
            Property {
                name: "Members",
                is_static: false,
                getter: |recv| match recv {
                    Value::Type(h) => Ok(Value::Vector(new_vector_ref(
                        h.ty.member_names().into_iter().map(Value::Str).collect(),
                    ))),
                    other => Err(BraidError::type_mismatch(format!(
                        "Members expects a type, got {}",
                        other.type_name()
                    ))),
                },
                setter: None,
            },
        ],
        vec![
            Method {
                name: "GetMethod",
                is_static: false,
                params: vec![Param::of(TypeTag::Str)],
                func: |args| {
                    let ty = type_receiver(args)?;
                    let name = str_arg(args, 1)?;
                    let instance = ty.find_methods(&name, false);
                    let statics = ty.find_methods(&name, true);
                    Ok(match instance.first().or(statics.first()) {
                        Some(m) => Value::Str(m.name.to_string()),
                        None => Value::Nil,
                    })
                },
            },
            Method {
                name: "GetMembers",
                is_static: false,
                params: vec![],
                func: |args| {
                    let ty = type_receiver(args)?;
                    Ok(Value::Vector(new_vector_ref(
                        ty.member_names().into_iter().map(Value::Str).collect(),
                    )))
                },
            },
            Method {
                name: "IsAssignableFrom",
                is_static: false,
                params: vec![Param::of(TypeTag::Type)],
                func: |args| {
                    let ty = type_receiver(args)?;
                    match &args[1] {
                        Value::Type(other) => Ok(Value::Bool(
                            ty.tag() == TypeTag::Any || ty.tag() == other.ty.tag(),
                        )),
                        other => Err(BraidError::type_mismatch(format!(
                            "IsAssignableFrom expects a type, got {}",
                            other.type_name()
                        ))),
                    }
                },
            },
            Method {
                name: "IsInstance",
                is_static: false,
                params: vec![Param::of(TypeTag::Any)],
                func: |args| {
                    let ty = type_receiver(args)?;
                    Ok(Value::Bool(ty.is_assignable_from(&args[1])))
                },
            },
        ],
    )
}

fn type_receiver(args: &[Value]) -> BraidResult<crate::types::TypeRef> {
    match args.first() {
        Some(Value::Type(h)) => Ok(h.ty.clone()),
        other => Err(BraidError::type_mismatch(format!(
            "expected type receiver, got {}",
            other.map(|v| v.type_name()).unwrap_or("nothing")
        ))),
    }
}
