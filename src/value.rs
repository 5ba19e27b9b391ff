use std::fmt;
use std::sync::Arc;

/// A header or query parameter value.
///
/// The set of accepted shapes is closed: plain strings, booleans, integers,
/// string lists and lazily computed strings. Every call site that accepts a
/// value renders it through the single canonical [`Value::render`] function,
/// so `true`, `["a", "b"]` and a deferred closure stringify identically
/// whether they end up in a header line or a query string.
#[derive(Clone)]
pub enum Value {
    /// A plain string value.
    Str(String),
    /// A boolean, rendered as `"true"` or `"false"`.
    Bool(bool),
    /// An integer, rendered in decimal.
    Int(i64),
    /// A list of strings, rendered comma-joined.
    List(Vec<String>),
    /// A deferred value, invoked at render time.
    Lazy(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Value {
    /// Renders the canonical string form of this value.
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Int(n) => n.to_string(),
            Value::List(items) => items.join(","),
            Value::Lazy(f) => f(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u16> for Value {
    #[inline]
    fn from(value: u16) -> Self {
        Value::Int(value.into())
    }
}

impl From<usize> for Value {
    #[inline]
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<Vec<String>> for Value {
    #[inline]
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}

impl From<&[&str]> for Value {
    #[inline]
    fn from(value: &[&str]) -> Self {
        Value::List(value.iter().map(|s| s.to_string()).collect())
    }
}
