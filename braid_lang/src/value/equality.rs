//! Truthiness and the shared equality predicate.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::value::Value;

/// Truthiness predicate.
///
/// `nil`, `false`, numeric zero, and empty strings/containers are false;
/// everything else is true.
pub fn is_true(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        Value::Int(v) => *v != 0,
        Value::BigInt(v) => !v.is_zero(),
        Value::Float(v) => *v != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::Vector(v) => !v.borrow().is_empty(),
        Value::Dict(d) => !d.borrow().is_empty(),
        Value::Set(s) => !s.borrow().is_empty(),
        _ => true,
    }
}

/// Shared equality predicate used by sets, pattern tests, and `==`.
///
/// Numbers compare across representations; strings are case-sensitive;
/// keywords compare by interned identity; containers compare structurally.
pub fn braid_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Keyword(x), Value::Keyword(y)) => x == y,
        (Value::Regex(x), Value::Regex(y)) => x.as_str() == y.as_str(),

        // Numeric tower
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            *y == *x as f64
        }
        (Value::Int(x), Value::BigInt(y)) | (Value::BigInt(y), Value::Int(x)) => {
            **y == BigInt::from(*x)
        }
        (Value::Float(x), Value::BigInt(y)) | (Value::BigInt(y), Value::Float(x)) => {
            y.to_f64().is_some_and(|f| f == *x)
        }

        (Value::Vector(x), Value::Vector(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| braid_equals(a, b))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(k, v)| {
                    y.get(k).map(|other| braid_equals(v, other)).unwrap_or(false)
                })
        }
        (Value::Set(x), Value::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().all(|item| y.contains(item))
        }

        (Value::Type(x), Value::Type(y)) => std::rc::Rc::ptr_eq(&x.ty, &y.ty),
        (Value::Lambda(x), Value::Lambda(y)) => std::rc::Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => std::rc::Rc::ptr_eq(x, y),
        (Value::Member(x), Value::Member(y)) => std::rc::Rc::ptr_eq(x, y),
        (Value::Native(x), Value::Native(y)) => std::rc::Rc::ptr_eq(x, y),

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::new_vector_ref;

    #[test]
    fn test_truthiness() {
        assert!(!is_true(&Value::Nil));
        assert!(!is_true(&Value::Bool(false)));
        assert!(!is_true(&Value::Int(0)));
        assert!(!is_true(&Value::Str(String::new())));
        assert!(!is_true(&Value::Vector(new_vector_ref(vec![]))));

        assert!(is_true(&Value::Bool(true)));
        assert!(is_true(&Value::Int(-1)));
        assert!(is_true(&Value::Str("x".to_string())));
        assert!(is_true(&Value::Char('\0')));
    }

    #[test]
    fn test_numeric_tower_equality() {
        assert!(braid_equals(&Value::Int(3), &Value::Float(3.0)));
        assert!(!braid_equals(&Value::Int(3), &Value::Float(3.5)));
        assert!(braid_equals(
            &Value::Int(12),
            &Value::BigInt(Box::new(BigInt::from(12)))
        ));
    }

    #[test]
    fn test_structural_vector_equality() {
        let a = Value::Vector(new_vector_ref(vec![Value::Int(1), Value::Float(2.0)]));
        let b = Value::Vector(new_vector_ref(vec![Value::Int(1), Value::Int(2)]));
        assert!(braid_equals(&a, &b));
    }

    #[test]
    fn test_strings_case_sensitive() {
        assert!(!braid_equals(
            &Value::Str("Abc".to_string()),
            &Value::Str("abc".to_string())
        ));
    }
}
