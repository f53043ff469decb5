// Runtime value system
// Code and data share one representation: the reader produces `Value`s and
// the evaluator walks them.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{MapKey, Symbol};
use crate::runtime::environment::Environment;
use crate::runtime::error::{ErrorValue, RuntimeResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::param_binding::ParamSpec;

#[derive(Debug, Clone)]
pub enum Value {
    /// The code-level empty list `()`.
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Symbol(Symbol),
    String(String),
    Bytes(Vec<u8>),
    /// A proper list. An empty `List` is a data list and prints as `'()`.
    List(List),
    Vector(Vec<Value>),
    SortedMap(BTreeMap<MapKey, Value>),
    Function(Function),
    Macro(Rc<Closure>),
    Error(ErrorValue),
    /// One level of quoting that survived evaluation (`'sym`, `''3`).
    Quote(Rc<Value>),
}

impl Value {
    pub fn quote(value: Value) -> Value {
        Value::Quote(Rc::new(value))
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::new(name))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(List::from_values(items))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil | Value::Boolean(false) => false,
            Value::List(list) => !list.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil | Value::List(_) => "list",
            Value::Boolean(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Symbol(_) => "symbol",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Vector(_) => "vector",
            Value::SortedMap(_) => "sorted-map",
            Value::Function(_) => "function",
            Value::Macro(_) => "macro",
            Value::Error(_) => "error",
            Value::Quote(inner) => inner.type_name(),
        }
    }

    /// Strips every quote level.
    pub fn unquoted(&self) -> &Value {
        let mut value = self;
        while let Value::Quote(inner) = value {
            value = inner;
        }
        value
    }

    /// A bare or quoted symbol.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.unquoted() {
            Value::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.unquoted(), Value::Nil | Value::List(_))
    }

    /// Elements of `()` or a list.
    pub fn as_list(&self) -> Option<List> {
        match self.unquoted() {
            Value::Nil => Some(List::empty()),
            Value::List(list) => Some(list.clone()),
            _ => None,
        }
    }

    /// Elements of a list or vector, copied out.
    pub fn sequence_items(&self) -> Option<Vec<Value>> {
        match self.unquoted() {
            Value::Nil => Some(Vec::new()),
            Value::List(list) => Some(list.to_vec()),
            Value::Vector(items) => Some(items.clone()),
            _ => None,
        }
    }
}

// Quote levels are syntax: `'a` and `a` compare equal. Integers and floats
// never do.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.unquoted(), other.unquoted()) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, Value::List(l)) | (Value::List(l), Value::Nil) => l.is_empty(),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::SortedMap(a), Value::SortedMap(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

// --- Lists ---

/// Immutable singly linked list. Tails are shared, never mutated, so a list
/// handed out once keeps its printed form forever.
#[derive(Clone, Default)]
pub struct List(Option<Rc<Cons>>);

struct Cons {
    car: Value,
    cdr: List,
}

impl List {
    pub fn empty() -> Self {
        List(None)
    }

    pub fn cons(car: Value, cdr: List) -> Self {
        List(Some(Rc::new(Cons { car, cdr })))
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        values
            .into_iter()
            .rev()
            .fold(List::empty(), |tail, head| List::cons(head, tail))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn car(&self) -> Option<&Value> {
        self.0.as_ref().map(|cell| &cell.car)
    }

    pub fn cdr(&self) -> Option<&List> {
        self.0.as_ref().map(|cell| &cell.cdr)
    }

    pub fn split_first(&self) -> Option<(&Value, &List)> {
        self.0.as_ref().map(|cell| (&cell.car, &cell.cdr))
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter { next: self }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

// Long lists would otherwise drop recursively.
impl Drop for List {
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(cell) = next {
            match Rc::try_unwrap(cell) {
                Ok(mut cons) => next = cons.cdr.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.iter().eq(other.iter())
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        List::from_values(iter.into_iter().collect())
    }
}

pub struct ListIter<'a> {
    next: &'a List,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next.0.as_ref()?;
        self.next = &cell.cdr;
        Some(&cell.car)
    }
}

// --- Functions ---

#[derive(Clone)]
pub enum Function {
    Builtin(BuiltinFunction),
    BuiltinWithContext(BuiltinFunctionWithContext),
    Closure(Rc<Closure>),
}

pub fn qualified_builtin_name(name: &str) -> String {
    format!("{}:{}", crate::ast::BUILTIN_PACKAGE, name)
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(b) => b.fmt(f),
            Function::BuiltinWithContext(b) => b.fmt(f),
            Function::Closure(c) => c.fmt(f),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a == b,
            (Function::BuiltinWithContext(a), Function::BuiltinWithContext(b)) => a == b,
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A lambda, `defun` or `defmacro` body together with its defining frame.
pub struct Closure {
    pub name: Option<Symbol>,
    pub params: ParamSpec,
    pub body: Vec<Value>,
    pub env: Environment,
    pub doc: Option<String>,
}

impl Closure {
    /// The name used to attribute errors raised by a call.
    pub fn error_name(&self) -> String {
        self.name
            .as_ref()
            .map(|s| s.0.clone())
            .unwrap_or_else(|| "lambda".to_string())
    }
}

// The captured frame usually contains the closure itself.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body", &self.body.len())
            .finish()
    }
}

pub type BuiltinFn = Rc<dyn Fn(Vec<Value>) -> RuntimeResult<Value>>;

pub type BuiltinFnWithContext =
    Rc<dyn Fn(Vec<Value>, &Evaluator, &Environment) -> RuntimeResult<Value>>;

#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: String,
    pub arity: Arity,
    pub func: BuiltinFn,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

/// A builtin that calls back into the evaluator (higher-order builtins).
#[derive(Clone)]
pub struct BuiltinFunctionWithContext {
    pub name: String,
    pub arity: Arity,
    pub func: BuiltinFnWithContext,
}

impl fmt::Debug for BuiltinFunctionWithContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunctionWithContext")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for BuiltinFunctionWithContext {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic(usize), // Minimum number of arguments
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Fixed(n) => count == n,
            Arity::Variadic(min) => count >= min,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic(min) => write!(f, "at least {}", min),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_and_empty_list_are_equal_but_print_differently() {
        let empty = Value::List(List::empty());
        assert_eq!(Value::Nil, empty);
        assert_eq!(Value::Nil.to_string(), "()");
        assert_eq!(empty.to_string(), "'()");
        assert!(!empty.is_truthy());
    }

    #[test]
    fn quote_levels_are_ignored_by_equality() {
        let a = Value::symbol("a");
        assert_eq!(Value::quote(a.clone()), a);
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    fn cons_shares_the_tail() {
        let tail = List::from_values(vec![Value::Integer(2), Value::Integer(3)]);
        let list = List::cons(Value::Integer(1), tail.clone());
        assert!(list.cdr().map(|cdr| cdr.ptr_eq(&tail)).unwrap_or(false));
        assert_eq!(list.len(), 3);
        assert_eq!(list.car(), Some(&Value::Integer(1)));
    }

    #[test]
    fn dropping_a_long_list_does_not_overflow() {
        let list: List = (0..200_000).map(Value::Integer).collect();
        assert_eq!(list.len(), 200_000);
        drop(list);
    }

    #[test]
    fn arity_accepts() {
        assert!(Arity::Fixed(2).accepts(2));
        assert!(!Arity::Fixed(2).accepts(3));
        assert!(Arity::Variadic(1).accepts(5));
        assert!(!Arity::Variadic(1).accepts(0));
        assert!(Arity::Range(1, 2).accepts(2));
        assert_eq!(Arity::Range(1, 2).to_string(), "1 to 2");
    }
}
