//! Value stringification.
//!
//! Container rendering is cycle-safe through a depth guard (self-referencing
//! containers truncate with `...`) and polls the cancellation token between
//! elements so a Ctrl-C during the display of a huge structure returns
//! promptly instead of finishing the walk.

use std::fmt;

use crate::cancel::CancelToken;
use crate::error::{BraidError, BraidResult};
use crate::value::Value;

/// Nesting depth at which rendering truncates with `...`
const MAX_RENDER_DEPTH: usize = 32;

/// Render a value, polling `cancel` during container iteration.
pub fn render(value: &Value, cancel: Option<&CancelToken>) -> BraidResult<String> {
    let mut out = String::new();
    write_value(&mut out, value, cancel, 0)?;
    Ok(out)
}

fn write_value(
    out: &mut String,
    value: &Value,
    cancel: Option<&CancelToken>,
    depth: usize,
) -> BraidResult<()> {
    if depth > MAX_RENDER_DEPTH {
        out.push_str("...");
        return Ok(());
    }

    match value {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::BigInt(v) => {
            out.push_str(&v.to_string());
            out.push('N');
        }
        Value::Float(v) => out.push_str(&format_float(*v)),
        Value::Char(c) => {
            out.push('\'');
            out.push(*c);
            out.push('\'');
        }
        Value::Str(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    other => out.push(other),
                }
            }
            out.push('"');
        }
        Value::Symbol(sym) => out.push_str(sym.name()),
        Value::Keyword(kw) => out.push_str(kw.text()),
        Value::Regex(re) => {
            out.push_str("#\"");
            out.push_str(re.as_str());
            out.push('"');
        }
        Value::Vector(v) => {
            out.push('[');
            for (i, item) in v.borrow().iter().enumerate() {
                poll(cancel)?;
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item, cancel, depth + 1)?;
            }
            out.push(']');
        }
        Value::Dict(d) => {
            out.push('{');
            for (i, (key, val)) in d.borrow().iter().enumerate() {
                poll(cancel)?;
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, &key.to_value(), cancel, depth + 1)?;
                out.push(' ');
                write_value(out, val, cancel, depth + 1)?;
            }
            out.push('}');
        }
        Value::Set(s) => {
            out.push_str("#{");
            for (i, item) in s.borrow().iter().enumerate() {
                poll(cancel)?;
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item, cancel, depth + 1)?;
            }
            out.push('}');
        }
        Value::Type(handle) => {
            out.push('^');
            out.push_str(handle.ty.name());
            if handle.soft {
                out.push('?');
            }
        }
        Value::Lambda(lambda) => {
            out.push_str("#<fn ");
            out.push_str(&lambda.name);
            out.push('>');
        }
        Value::Builtin(builtin) => {
            out.push_str("#<builtin ");
            out.push_str(builtin.name);
            out.push('>');
        }
        Value::Member(member) => out.push_str(member.text()),
        Value::Native(obj) => out.push_str(&obj.describe()),
    }
    Ok(())
}

fn poll(cancel: Option<&CancelToken>) -> BraidResult<()> {
    match cancel {
        Some(token) if token.is_requested() => Err(BraidError::cancelled()),
        _ => Ok(()),
    }
}

/// Floats always show a decimal point so `3.0` round-trips as a float.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        // No cancellation token here, so rendering cannot fail.
        let _ = write_value(&mut out, self, None, 0);
        write!(f, "{}", out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{new_dict_ref, new_set_ref, new_vector_ref, DictKey, DictValue, SetValue};

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(3.25).to_string(), "3.25");
        assert_eq!(Value::Str("a\"b".to_string()).to_string(), "\"a\\\"b\"");
    }

    #[test]
    fn test_container_rendering() {
        let vec = Value::Vector(new_vector_ref(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(vec.to_string(), "[1 2]");

        let mut dict = DictValue::new();
        dict.insert(DictKey::Int(1), Value::Str("one".to_string()));
        assert_eq!(Value::Dict(new_dict_ref(dict)).to_string(), "{1 \"one\"}");

        let mut set = SetValue::new();
        set.insert(Value::Int(7));
        assert_eq!(Value::Set(new_set_ref(set)).to_string(), "#{7}");
    }

    #[test]
    fn test_cyclic_vector_truncates() {
        let inner = new_vector_ref(vec![Value::Int(1)]);
        inner.borrow_mut().push(Value::Vector(inner.clone()));
        // Must terminate; the cycle shows up as a truncation marker.
        let rendered = Value::Vector(inner).to_string();
        assert!(rendered.contains("..."));
    }

    #[test]
    fn test_cancellation_stops_rendering() {
        let token = CancelToken::new();
        token.request();
        let vec = Value::Vector(new_vector_ref(vec![Value::Int(1), Value::Int(2)]));
        let err = render(&vec, Some(&token)).unwrap_err();
        assert!(err.to_string().contains("Cancelled"));
    }
}
