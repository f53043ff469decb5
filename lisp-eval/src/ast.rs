use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::runtime::values::Value;

/// Name of the builtin package. `lisp:car` and `car` name the same binding.
pub const BUILTIN_PACKAGE: &str = "lisp";

// --- Symbol ---

#[derive(Debug, PartialEq, Clone, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: &str) -> Self {
        Symbol(s.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Keywords are symbols written with a leading colon. They evaluate to themselves.
    pub fn is_keyword(&self) -> bool {
        self.0.len() > 1 && self.0.starts_with(':')
    }

    /// `:name` -> `name`
    pub fn keyword_name(&self) -> Option<&str> {
        if self.is_keyword() {
            Some(&self.0[1..])
        } else {
            None
        }
    }

    /// Splits `pkg:name` into its package and local name.
    pub fn package(&self) -> Option<(&str, &str)> {
        if self.is_keyword() {
            return None;
        }
        let (pkg, name) = self.0.split_once(':')?;
        if pkg.is_empty() || name.is_empty() {
            None
        } else {
            Some((pkg, name))
        }
    }

    /// Strips a `lisp:` qualifier. Other packages are left untouched.
    pub fn unqualified(&self) -> Symbol {
        match self.package() {
            Some((BUILTIN_PACKAGE, name)) => Symbol::new(name),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

// --- Map Key ---

/// Keys of a sorted map. Ordering is by variant first, then by value.
#[derive(Debug, PartialEq, Clone, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Boolean(bool),
    Integer(i64),
    Float(OrderedFloat<f64>),
    String(String),
    Symbol(Symbol),
    Bytes(Vec<u8>),
}

impl MapKey {
    /// Converts a value into a key, or returns the value's type name when it
    /// cannot be used as one.
    pub fn from_value(value: &Value) -> Result<MapKey, &'static str> {
        match value {
            Value::Boolean(b) => Ok(MapKey::Boolean(*b)),
            Value::Integer(i) => Ok(MapKey::Integer(*i)),
            Value::Float(f) => Ok(MapKey::Float(OrderedFloat(*f))),
            Value::String(s) => Ok(MapKey::String(s.clone())),
            Value::Symbol(s) => Ok(MapKey::Symbol(s.clone())),
            Value::Bytes(b) => Ok(MapKey::Bytes(b.clone())),
            Value::Quote(inner) => match inner.as_ref() {
                Value::Symbol(s) => Ok(MapKey::Symbol(s.clone())),
                other => Err(other.type_name()),
            },
            other => Err(other.type_name()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Boolean(b) => Value::Boolean(*b),
            MapKey::Integer(i) => Value::Integer(*i),
            MapKey::Float(f) => Value::Float(f.into_inner()),
            MapKey::String(s) => Value::String(s.clone()),
            MapKey::Symbol(s) if s.is_keyword() => Value::Symbol(s.clone()),
            MapKey::Symbol(s) => Value::quote(Value::Symbol(s.clone())),
            MapKey::Bytes(b) => Value::Bytes(b.clone()),
        }
    }
}

// --- Source locations ---

/// Where a top-level form starts. Only used to prefix error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub source: String,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(source: &str, line: usize) -> Self {
        SourceLocation {
            source: source.to_string(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// One top-level form produced by the reader.
#[derive(Debug, Clone)]
pub struct Form {
    pub value: Value,
    pub location: SourceLocation,
}
