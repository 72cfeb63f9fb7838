//! Top-level builtin functions.
//!
//! Installed into the global frame as ordinary callable values. Arithmetic
//! dispatches on the runtime types of the operands; 64-bit integer
//! overflow widens to bigint rather than wrapping or erroring.

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::context::Braid;
use crate::error::{BraidError, BraidResult};
use crate::frame::FrameRef;
use crate::types::TypeHandle;
use crate::value::{braid_equals, is_true, new_vector_ref, Builtin, BuiltinFn, Value};

/// Install the builtin functions into a frame
pub fn install(braid: &Braid, frame: &FrameRef) {
    let defs: &[(&'static str, BuiltinFn)] = &[
        ("+", builtin_add),
        ("-", builtin_sub),
        ("*", builtin_mul),
        ("/", builtin_div),
        ("mod", builtin_mod),
        ("<", builtin_lt),
        (">", builtin_gt),
        ("<=", builtin_le),
        (">=", builtin_ge),
        ("==", builtin_eq),
        ("!=", builtin_ne),
        ("not", builtin_not),
        ("nil?", builtin_is_nil),
        ("print", builtin_print),
        ("println", builtin_println),
        ("str", builtin_str),
        ("length", builtin_length),
        ("count", builtin_length),
        ("typeof", builtin_typeof),
        ("first", builtin_first),
        ("rest", builtin_rest),
        ("help", builtin_help),
    ];
    for (name, func) in defs.iter().copied() {
        frame.set_local(
            braid.symbols.intern(name),
            Value::Builtin(Rc::new(Builtin { name, func })),
        );
    }
}

fn no_method(op: &str, lhs: &Value, rhs: &Value) -> BraidError {
    BraidError::type_mismatch(format!(
        "no method matching {}({}, {})",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn big(v: i64) -> BigInt {
    BigInt::from(v)
}

/// Shrink a bigint back to int when it fits
fn normalize_big(value: BigInt) -> Value {
    match value.to_i64() {
        Some(v) => Value::Int(v),
        None => Value::BigInt(Box::new(value)),
    }
}

// ==================== arithmetic ====================

fn add2(lhs: &Value, rhs: &Value) -> BraidResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(match a.checked_add(*b) {
            Some(v) => Value::Int(v),
            None => normalize_big(big(*a) + big(*b)),
        }),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::BigInt(a), Value::BigInt(b)) => Ok(normalize_big(&**a + &**b)),
        (Value::BigInt(a), Value::Int(b)) => Ok(normalize_big(&**a + big(*b))),
        (Value::Int(a), Value::BigInt(b)) => Ok(normalize_big(big(*a) + &**b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        _ => Err(no_method("+", lhs, rhs)),
    }
}

fn sub2(lhs: &Value, rhs: &Value) -> BraidResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(match a.checked_sub(*b) {
            Some(v) => Value::Int(v),
            None => normalize_big(big(*a) - big(*b)),
        }),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 - b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - *b as f64)),
        (Value::BigInt(a), Value::BigInt(b)) => Ok(normalize_big(&**a - &**b)),
        (Value::BigInt(a), Value::Int(b)) => Ok(normalize_big(&**a - big(*b))),
        (Value::Int(a), Value::BigInt(b)) => Ok(normalize_big(big(*a) - &**b)),
        _ => Err(no_method("-", lhs, rhs)),
    }
}

fn mul2(lhs: &Value, rhs: &Value) -> BraidResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(match a.checked_mul(*b) {
            Some(v) => Value::Int(v),
            None => normalize_big(big(*a) * big(*b)),
        }),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 * b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * *b as f64)),
        (Value::BigInt(a), Value::BigInt(b)) => Ok(normalize_big(&**a * &**b)),
        (Value::BigInt(a), Value::Int(b)) => Ok(normalize_big(&**a * big(*b))),
        (Value::Int(a), Value::BigInt(b)) => Ok(normalize_big(big(*a) * &**b)),
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat((*n).max(0) as usize)))
        }
        _ => Err(no_method("*", lhs, rhs)),
    }
}

fn div2(lhs: &Value, rhs: &Value) -> BraidResult<Value> {
    let (a, b) = match (lhs.as_float(), rhs.as_float()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(no_method("/", lhs, rhs)),
    };
    if b == 0.0 {
        return Err(BraidError::type_mismatch("division by zero"));
    }
    Ok(Value::Float(a / b))
}

fn builtin_add(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    fold(args, Value::Int(0), add2)
}

fn builtin_sub(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.len() {
        0 => Err(BraidError::arity("-", "at least 1", 0)),
        1 => sub2(&Value::Int(0), &args[0]),
        _ => {
            let mut acc = args[0].clone();
            for arg in &args[1..] {
                acc = sub2(&acc, arg)?;
            }
            Ok(acc)
        }
    }
}

fn builtin_mul(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    fold(args, Value::Int(1), mul2)
}

fn builtin_div(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.len() {
        2 => div2(&args[0], &args[1]),
        got => Err(BraidError::arity("/", "2", got)),
    }
}

fn builtin_mod(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match (args.first(), args.get(1)) {
        (Some(Value::Int(a)), Some(Value::Int(b))) => {
            if *b == 0 {
                Err(BraidError::type_mismatch("division by zero"))
            } else {
                Ok(Value::Int(a % b))
            }
        }
        (Some(lhs), Some(rhs)) => Err(no_method("mod", lhs, rhs)),
        _ => Err(BraidError::arity("mod", "2", args.len())),
    }
}

fn fold(
    args: &[Value],
    identity: Value,
    op: fn(&Value, &Value) -> BraidResult<Value>,
) -> BraidResult<Value> {
    match args.split_first() {
        None => Ok(identity),
        Some((first, rest)) => {
            let mut acc = first.clone();
            for arg in rest {
                acc = op(&acc, arg)?;
            }
            Ok(acc)
        }
    }
}

// ==================== comparison ====================

fn compare(op: &str, lhs: &Value, rhs: &Value) -> BraidResult<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Ok(a.cmp(b)),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| BraidError::type_mismatch("cannot order NaN")),
            _ => Err(no_method(op, lhs, rhs)),
        },
    }
}

fn cmp_builtin(
    op: &'static str,
    accept: fn(std::cmp::Ordering) -> bool,
) -> impl Fn(&[Value]) -> BraidResult<Value> {
    move |args| match (args.first(), args.get(1)) {
        (Some(lhs), Some(rhs)) => Ok(Value::Bool(accept(compare(op, lhs, rhs)?))),
        _ => Err(BraidError::arity(op, "2", args.len())),
    }
}

fn builtin_lt(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    cmp_builtin("<", std::cmp::Ordering::is_lt)(args)
}

fn builtin_gt(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    cmp_builtin(">", std::cmp::Ordering::is_gt)(args)
}

fn builtin_le(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    cmp_builtin("<=", std::cmp::Ordering::is_le)(args)
}

fn builtin_ge(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    cmp_builtin(">=", std::cmp::Ordering::is_ge)(args)
}

fn builtin_eq(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match (args.first(), args.get(1)) {
        (Some(lhs), Some(rhs)) => Ok(Value::Bool(braid_equals(lhs, rhs))),
        _ => Err(BraidError::arity("==", "2", args.len())),
    }
}

fn builtin_ne(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match (args.first(), args.get(1)) {
        (Some(lhs), Some(rhs)) => Ok(Value::Bool(!braid_equals(lhs, rhs))),
        _ => Err(BraidError::arity("!=", "2", args.len())),
    }
}

fn builtin_not(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(v) => Ok(Value::Bool(!is_true(v))),
        None => Err(BraidError::arity("not", "1", 0)),
    }
}

fn builtin_is_nil(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(v) => Ok(Value::Bool(v.is_nil())),
        None => Err(BraidError::arity("nil?", "1", 0)),
    }
}

// ==================== output and introspection ====================

fn bare_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn builtin_print(braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    let rendered: Vec<String> = args.iter().map(bare_text).collect();
    braid.write_out(&rendered.join(" "));
    Ok(Value::Nil)
}

fn builtin_println(braid: &Braid, frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    builtin_print(braid, frame, args)?;
    braid.write_out("\n");
    Ok(Value::Nil)
}

fn builtin_str(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    Ok(Value::Str(args.iter().map(bare_text).collect::<String>()))
}

fn builtin_length(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(Value::Str(s)) => Ok(Value::Int(s.chars().count() as i64)),
        Some(Value::Vector(v)) => Ok(Value::Int(v.borrow().len() as i64)),
        Some(Value::Dict(d)) => Ok(Value::Int(d.borrow().len() as i64)),
        Some(Value::Set(s)) => Ok(Value::Int(s.borrow().len() as i64)),
        Some(Value::Nil) => Ok(Value::Int(0)),
        Some(other) => Err(BraidError::type_mismatch(format!(
            "length: expected a collection, got {}",
            other.type_name()
        ))),
        None => Err(BraidError::arity("length", "1", 0)),
    }
}

fn builtin_typeof(braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(v) => Ok(Value::Type(TypeHandle::strict(braid.types.type_of(v)))),
        None => Err(BraidError::arity("typeof", "1", 0)),
    }
}

fn builtin_first(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(Value::Vector(v)) => Ok(v.borrow().first().cloned().unwrap_or(Value::Nil)),
        Some(Value::Str(s)) => Ok(s.chars().next().map(Value::Char).unwrap_or(Value::Nil)),
        Some(Value::Nil) => Ok(Value::Nil),
        Some(other) => Err(BraidError::type_mismatch(format!(
            "first: expected a sequence, got {}",
            other.type_name()
        ))),
        None => Err(BraidError::arity("first", "1", 0)),
    }
}

fn builtin_rest(_braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(Value::Vector(v)) => {
            let items = v.borrow();
            Ok(Value::Vector(new_vector_ref(
                items.iter().skip(1).cloned().collect(),
            )))
        }
        Some(Value::Nil) => Ok(Value::Nil),
        Some(other) => Err(BraidError::type_mismatch(format!(
            "rest: expected a sequence, got {}",
            other.type_name()
        ))),
        None => Err(BraidError::arity("rest", "1", 0)),
    }
}

fn builtin_help(braid: &Braid, _frame: &FrameRef, args: &mut Vec<Value>) -> BraidResult<Value> {
    match args.first() {
        Some(Value::Lambda(lambda)) => Ok(braid
            .get_doc(lambda.id)
            .map(|doc| Value::Str(doc.to_string()))
            .unwrap_or(Value::Nil)),
        Some(_) | None => Ok(Value::Nil),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn call(name: &str, args: Vec<Value>) -> BraidResult<Value> {
        let braid = Braid::new();
        let frame = Frame::root();
        install(&braid, &frame);
        let sym = braid.symbols.intern(name);
        let Some(Value::Builtin(builtin)) = frame.get_variable(&sym) else {
            panic!("builtin {} not installed", name);
        };
        let mut args = args;
        (builtin.func)(&braid, &frame, &mut args)
    }

    #[test]
    fn test_add_numeric_tower() {
        assert_eq!(call("+", vec![Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(3));
        assert_eq!(
            call("+", vec![Value::Int(1), Value::Float(2.5)]).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            call("+", vec![Value::Str("a".into()), Value::Str("b".into())]).unwrap(),
            Value::Str("ab".into())
        );
    }

    #[test]
    fn test_add_overflow_widens_to_bigint() {
        let result = call("+", vec![Value::Int(i64::MAX), Value::Int(1)]).unwrap();
        match result {
            Value::BigInt(b) => assert_eq!(*b, BigInt::from(i64::MAX) + 1),
            other => panic!("expected bigint, got {:?}", other),
        }
    }

    #[test]
    fn test_sub_single_arg_negates() {
        assert_eq!(call("-", vec![Value::Int(5)]).unwrap(), Value::Int(-5));
    }

    #[test]
    fn test_div_is_float_and_checks_zero() {
        assert_eq!(
            call("/", vec![Value::Int(7), Value::Int(2)]).unwrap(),
            Value::Float(3.5)
        );
        assert!(call("/", vec![Value::Int(1), Value::Int(0)]).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            call("<", vec![Value::Int(1), Value::Float(1.5)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(">=", vec![Value::Str("b".into()), Value::Str("a".into())]).unwrap(),
            Value::Bool(true)
        );
        assert!(call("<", vec![Value::Int(1), Value::Str("x".into())]).is_err());
    }

    #[test]
    fn test_no_method_error_shape() {
        let err = call("+", vec![Value::Int(1), Value::Bool(true)]).unwrap_err();
        assert!(err.to_string().contains("no method matching +(int, bool)"));
    }

    #[test]
    fn test_length() {
        assert_eq!(call("length", vec![Value::Str("héllo".into())]).unwrap(), Value::Int(5));
        assert_eq!(call("length", vec![Value::Nil]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_str_concat_is_bare() {
        assert_eq!(
            call("str", vec![Value::Str("n=".into()), Value::Int(4)]).unwrap(),
            Value::Str("n=4".into())
        );
    }
}
