//! Human-readable rendering of values in CBOR diagnostic notation.
//!
//! `{}` renders on a single line, `{:#}` renders nested containers indented
//! two spaces per level:
//!
//! ```text
//! {"args": [1, h'0aff'], "func": "sim.getObjectHandle"}
//! ```

use std::fmt;

use crate::value::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write_pretty(f, self, 0)
        } else {
            write_compact(f, self)
        }
    }
}

fn write_scalar(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Integer(i) => write!(f, "{i}"),
        Value::Float(x) if x.is_nan() => f.write_str("NaN"),
        Value::Float(x) if x.is_infinite() => {
            f.write_str(if x.is_sign_negative() {
                "-Infinity"
            } else {
                "Infinity"
            })
        }
        // Debug keeps the fractional part ("1.0"), telling floats from integers
        Value::Float(x) => write!(f, "{x:?}"),
        Value::Text(s) => write!(f, "{s:?}"),
        Value::Bytes(b) => write!(f, "h'{}'", hex::encode(b)),
        Value::Array(_) | Value::Object(_) => write_compact(f, value),
    }
}

fn write_compact(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_compact(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(map) => {
            f.write_str("{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key:?}: ")?;
                write_compact(f, item)?;
            }
            f.write_str("}")
        }
        scalar => write_scalar(f, scalar),
    }
}

fn write_pretty(f: &mut fmt::Formatter<'_>, value: &Value, depth: usize) -> fmt::Result {
    match value {
        Value::Array(items) if !items.is_empty() => {
            f.write_str("[\n")?;
            for (i, item) in items.iter().enumerate() {
                indent(f, depth + 1)?;
                write_pretty(f, item, depth + 1)?;
                if i + 1 < items.len() {
                    f.write_str(",")?;
                }
                f.write_str("\n")?;
            }
            indent(f, depth)?;
            f.write_str("]")
        }
        Value::Object(map) if !map.is_empty() => {
            f.write_str("{\n")?;
            for (i, (key, item)) in map.iter().enumerate() {
                indent(f, depth + 1)?;
                write!(f, "{key:?}: ")?;
                write_pretty(f, item, depth + 1)?;
                if i + 1 < map.len() {
                    f.write_str(",")?;
                }
                f.write_str("\n")?;
            }
            indent(f, depth)?;
            f.write_str("}")
        }
        other => write_compact(f, other),
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}
