//! Runtime value type for the expression evaluator (spec §4.1).

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Null,
}

/// Static classification used by [`crate::types`]'s compile-time checks.
/// Deliberately coarser than `Value` itself: `Int`/`Float` both report
/// `Number` since the arithmetic and comparison operators treat them
/// interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Bool,
    Str,
    Timestamp,
    List,
    Null,
    /// Result type could not be determined statically (e.g. unknown field
    /// or helper). Compilation is permissive toward `Dynamic`.
    Dynamic,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Str(_) => ValueKind::Str,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::List(_) => ValueKind::List,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Three-valued comparison: `None` when the two values aren't
    /// comparable (e.g. string vs. number), which evaluation surfaces as
    /// a type error rather than silently defaulting to `false`.
    pub fn partial_compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(std::cmp::Ordering::Equal),
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => {
                a.as_f64().unwrap().partial_cmp(&b.as_f64().unwrap())
            }
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    pub fn loosely_equal(&self, other: &Value) -> bool {
        match self.partial_compare(other) {
            Some(std::cmp::Ordering::Equal) => true,
            Some(_) => false,
            None => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "null"),
        }
    }
}
