//! Type conversion primitives.
//!
//! `convert` is the host coercion primitive the soft-cast path delegates
//! to; `coerce_arg` is the narrower numeric/collection coercion used when
//! binding method arguments to parameter types.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::error::{BraidError, BraidResult};
use crate::interner::{Keyword, Symbol};
use crate::types::{value_tag, TypeRef, TypeTag};
use crate::value::{
    is_true, new_dict_ref, new_set_ref, new_vector_ref, DictKey, DictValue, SetValue, Value,
};

/// Convert a value to the target type. Errors on failure.
pub fn convert(value: &Value, target: &TypeRef) -> BraidResult<Value> {
    let tag = target.tag();
    if tag == TypeTag::Any || value_tag(value) == tag {
        return Ok(value.clone());
    }

    match tag {
        TypeTag::Int => to_int(value),
        TypeTag::BigInt => to_bigint(value),
        TypeTag::Float => to_float(value),
        TypeTag::Bool => Ok(Value::Bool(is_true(value))),
        TypeTag::Char => to_char(value),
        TypeTag::Str => Ok(Value::Str(to_text(value))),
        TypeTag::Symbol => to_symbol(value),
        TypeTag::Keyword => to_keyword(value),
        TypeTag::Regex => to_regex(value),
        TypeTag::Vector => to_vector(value),
        TypeTag::Dict => to_dict(value),
        TypeTag::Set => to_set(value),
        _ => Err(conversion_error(value, target.name())),
    }
}

/// Convert, returning `None` instead of an error
pub fn try_convert(value: &Value, target: &TypeRef) -> Option<Value> {
    convert(value, target).ok()
}

/// Numeric/collection coercion used for method parameter binding.
///
/// Deliberately narrower than `convert`: it never parses strings or
/// invents truthiness, it only widens/narrows within the numeric tower
/// and between the container kinds.
pub fn coerce_arg(value: &Value, expect: TypeTag) -> BraidResult<Value> {
    if expect == TypeTag::Any || value_tag(value) == expect {
        return Ok(value.clone());
    }
    match (expect, value) {
        (TypeTag::Int, Value::Float(f)) if f.fract() == 0.0 => Ok(Value::Int(*f as i64)),
        (TypeTag::Int, Value::BigInt(b)) => b.to_i64().map(Value::Int).ok_or_else(|| {
            BraidError::type_mismatch(format!("{} is out of range for int", b))
        }),
        (TypeTag::Float, Value::Int(v)) => Ok(Value::Float(*v as f64)),
        (TypeTag::Float, Value::BigInt(b)) => b
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| BraidError::type_mismatch(format!("{} does not fit a float", b))),
        (TypeTag::BigInt, Value::Int(v)) => Ok(Value::BigInt(Box::new(BigInt::from(*v)))),
        (TypeTag::Vector, Value::Set(s)) => Ok(Value::Vector(new_vector_ref(
            s.borrow().iter().cloned().collect(),
        ))),
        _ => Err(BraidError::type_mismatch(format!(
            "cannot pass {} where {:?} is expected",
            value.type_name(),
            expect
        ))),
    }
}

fn conversion_error(value: &Value, target: &str) -> BraidError {
    BraidError::type_mismatch(format!(
        "cannot convert {} to {}",
        value.type_name(),
        target
    ))
}

fn to_int(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Nil => Ok(Value::Int(0)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::BigInt(b) => b
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| BraidError::type_mismatch(format!("{} is out of range for int", b))),
        Value::Float(f) => {
            if f.fract() != 0.0 {
                Err(BraidError::type_mismatch(format!(
                    "cannot convert {} to int (inexact)",
                    f
                )))
            } else {
                Ok(Value::Int(*f as i64))
            }
        }
        Value::Char(c) => Ok(Value::Int(*c as i64)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| BraidError::type_mismatch(format!("cannot parse '{}' as int", s))),
        other => Err(conversion_error(other, "int")),
    }
}

fn to_bigint(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Nil => Ok(Value::BigInt(Box::new(BigInt::from(0)))),
        Value::Int(v) => Ok(Value::BigInt(Box::new(BigInt::from(*v)))),
        Value::Float(f) if f.fract() == 0.0 => BigInt::from_f64(*f)
            .map(|b| Value::BigInt(Box::new(b)))
            .ok_or_else(|| conversion_error(value, "bigint")),
        Value::Str(s) => s
            .trim()
            .parse::<BigInt>()
            .map(|b| Value::BigInt(Box::new(b)))
            .map_err(|_| BraidError::type_mismatch(format!("cannot parse '{}' as bigint", s))),
        other => Err(conversion_error(other, "bigint")),
    }
}

fn to_float(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Nil => Ok(Value::Float(0.0)),
        Value::Int(v) => Ok(Value::Float(*v as f64)),
        Value::BigInt(b) => b
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| conversion_error(value, "float")),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| BraidError::type_mismatch(format!("cannot parse '{}' as float", s))),
        other => Err(conversion_error(other, "float")),
    }
}

fn to_char(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Int(v) => u32::try_from(*v)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| {
                BraidError::type_mismatch(format!("{} is not a valid codepoint", v))
            }),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(BraidError::type_mismatch(format!(
                    "cannot convert string of length {} to char",
                    s.chars().count()
                ))),
            }
        }
        other => Err(conversion_error(other, "char")),
    }
}

/// Textual form used by string conversion: symbols and keywords convert to
/// their names; everything else uses the display rendering.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Symbol(sym) => sym.name().to_string(),
        Value::Keyword(kw) => kw.base_name().to_string(),
        Value::Member(m) => m.text().to_string(),
        other => other.to_string(),
    }
}

fn to_symbol(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Str(s) => Ok(Value::Symbol(Symbol::global(s))),
        Value::Keyword(kw) => Ok(Value::Symbol(Symbol::global(kw.base_name()))),
        other => Err(conversion_error(other, "symbol")),
    }
}

fn to_keyword(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Str(s) => Ok(Value::Keyword(Keyword::global(s))),
        Value::Symbol(sym) => Ok(Value::Keyword(Keyword::global(sym.name()))),
        other => Err(conversion_error(other, "keyword")),
    }
}

fn to_regex(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Str(s) => regex::Regex::new(s)
            .map(|re| Value::Regex(std::rc::Rc::new(re)))
            .map_err(|e| BraidError::type_mismatch(format!("invalid regex '{}': {}", s, e))),
        Value::Keyword(kw) => kw
            .to_regex()
            .map(|re| Value::Regex(std::rc::Rc::new(re)))
            .map_err(|e| BraidError::type_mismatch(format!("invalid regex: {}", e))),
        other => Err(conversion_error(other, "regex")),
    }
}

fn to_vector(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Nil => Ok(Value::Vector(new_vector_ref(vec![]))),
        Value::Set(s) => Ok(Value::Vector(new_vector_ref(
            s.borrow().iter().cloned().collect(),
        ))),
        Value::Str(s) => Ok(Value::Vector(new_vector_ref(
            s.chars().map(Value::Char).collect(),
        ))),
        Value::Dict(d) => Ok(Value::Vector(new_vector_ref(
            d.borrow()
                .iter()
                .map(|(k, v)| {
                    Value::Vector(new_vector_ref(vec![k.to_value(), v.clone()]))
                })
                .collect(),
        ))),
        other => Err(conversion_error(other, "vector")),
    }
}

fn to_dict(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Nil => Ok(Value::Dict(new_dict_ref(DictValue::new()))),
        Value::Vector(v) => {
            let items = v.borrow();
            let mut dict = DictValue::new();
            // A vector of [k v] pairs, or a flat even-length k/v list.
            if items.iter().all(is_pair_vector) {
                for item in items.iter() {
                    let pair = item.as_vector().unwrap().borrow().clone();
                    dict.insert(DictKey::from_value(&pair[0])?, pair[1].clone());
                }
            } else if items.len() % 2 == 0 {
                for chunk in items.chunks(2) {
                    dict.insert(DictKey::from_value(&chunk[0])?, chunk[1].clone());
                }
            } else {
                return Err(BraidError::type_mismatch(
                    "cannot convert odd-length vector to dict",
                ));
            }
            Ok(Value::Dict(new_dict_ref(dict)))
        }
        other => Err(conversion_error(other, "dict")),
    }
}

fn is_pair_vector(value: &Value) -> bool {
    value
        .as_vector()
        .map(|v| v.borrow().len() == 2)
        .unwrap_or(false)
}

fn to_set(value: &Value) -> BraidResult<Value> {
    match value {
        Value::Nil => Ok(Value::Set(new_set_ref(SetValue::new()))),
        Value::Vector(v) => {
            let mut set = SetValue::new();
            for item in v.borrow().iter() {
                set.insert(item.clone());
            }
            Ok(Value::Set(new_set_ref(set)))
        }
        other => Err(conversion_error(other, "set")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;

    fn registry() -> TypeRegistry {
        TypeRegistry::with_builtins()
    }

    #[test]
    fn test_convert_string_to_int() {
        let reg = registry();
        let int_ty = reg.resolve("int").unwrap();
        assert_eq!(
            convert(&Value::Str("42".to_string()), &int_ty).unwrap(),
            Value::Int(42)
        );
        assert!(convert(&Value::Str("4x".to_string()), &int_ty).is_err());
    }

    #[test]
    fn test_convert_nil_to_int_is_zero() {
        let reg = registry();
        let int_ty = reg.resolve("int").unwrap();
        assert_eq!(convert(&Value::Nil, &int_ty).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_convert_float_inexact() {
        let reg = registry();
        let int_ty = reg.resolve("int").unwrap();
        assert_eq!(convert(&Value::Float(3.0), &int_ty).unwrap(), Value::Int(3));
        assert!(convert(&Value::Float(3.5), &int_ty).is_err());
    }

    #[test]
    fn test_convert_to_bool_uses_truthiness() {
        let reg = registry();
        let bool_ty = reg.resolve("bool").unwrap();
        assert_eq!(
            convert(&Value::Str("x".to_string()), &bool_ty).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(convert(&Value::Nil, &bool_ty).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_single_element_vector_is_not_unwrapped() {
        // Soft casts never special-case one-element vectors.
        let reg = registry();
        let int_ty = reg.resolve("int").unwrap();
        let vec = Value::Vector(new_vector_ref(vec![Value::Int(7)]));
        assert!(convert(&vec, &int_ty).is_err());
    }

    #[test]
    fn test_try_convert() {
        let reg = registry();
        let float_ty = reg.resolve("float").unwrap();
        assert_eq!(
            try_convert(&Value::Int(2), &float_ty),
            Some(Value::Float(2.0))
        );
        assert_eq!(try_convert(&Value::Vector(new_vector_ref(vec![])), &float_ty), None);
    }

    #[test]
    fn test_coerce_arg_numeric_widening() {
        assert_eq!(
            coerce_arg(&Value::Int(3), TypeTag::Float).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            coerce_arg(&Value::Float(4.0), TypeTag::Int).unwrap(),
            Value::Int(4)
        );
        assert!(coerce_arg(&Value::Float(4.5), TypeTag::Int).is_err());
        assert!(coerce_arg(&Value::Str("s".to_string()), TypeTag::Int).is_err());
    }
}
