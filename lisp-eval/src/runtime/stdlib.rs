//! Builtin library
//!
//! Builtins are registered in the root frame under their bare names and are
//! also reachable as `lisp:<name>`. They are organized into categories:
//! - Constants (`true`, `false`)
//! - Arithmetic and comparison functions
//! - List functions
//! - Sequence functions taking a target type (`'list`, `'vector`, ...)
//! - Sorted map functions
//! - Type predicates
//! - Conversion functions
//! - Error raising
//!
//! No builtin mutates its arguments: every container result is freshly
//! allocated or shares only immutable list tails.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use itertools::Itertools;

use crate::ast::{MapKey, Symbol};
use crate::runtime::environment::Environment;
use crate::runtime::error::{ErrorValue, RuntimeError, RuntimeResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::values::{
    Arity, BuiltinFunction, BuiltinFunctionWithContext, Function, List, Value,
};

/// The builtin library.
///
/// This struct is responsible for creating the root environment and loading
/// all the builtin functions into it.
pub struct StandardLibrary;

impl StandardLibrary {
    /// Creates a new root environment populated with every builtin.
    pub fn create_global_environment() -> Environment {
        let env = Environment::new();
        Self::load_constants(&env);
        Self::load_arithmetic_functions(&env);
        Self::load_comparison_functions(&env);
        Self::load_list_functions(&env);
        Self::load_sequence_functions(&env);
        Self::load_higher_order_functions(&env);
        Self::load_map_functions(&env);
        Self::load_type_predicates(&env);
        Self::load_conversion_functions(&env);
        Self::load_error_functions(&env);
        tracing::debug!(
            bindings = env.symbol_names().len(),
            "builtin library loaded"
        );
        env
    }

    fn load_constants(env: &Environment) {
        env.define_constant(&Symbol::new("true"), Value::Boolean(true));
        env.define_constant(&Symbol::new("false"), Value::Boolean(false));
    }

    fn load_arithmetic_functions(env: &Environment) {
        define(env, "+", Arity::Variadic(0), Self::add);
        define(env, "-", Arity::Variadic(1), Self::subtract);
        define(env, "*", Arity::Variadic(0), Self::multiply);
        define(env, "/", Arity::Variadic(1), Self::divide);
        define(env, "mod", Arity::Fixed(2), Self::modulo);
    }

    fn load_comparison_functions(env: &Environment) {
        define(env, "=", Arity::Variadic(1), |args| {
            compare_chain("lisp:=", &args, |o| o == Ordering::Equal)
        });
        define(env, "/=", Arity::Fixed(2), |args| {
            compare_chain("lisp:/=", &args, |o| o != Ordering::Equal)
        });
        define(env, "<", Arity::Variadic(1), |args| {
            compare_chain("lisp:<", &args, |o| o == Ordering::Less)
        });
        define(env, "<=", Arity::Variadic(1), |args| {
            compare_chain("lisp:<=", &args, |o| o != Ordering::Greater)
        });
        define(env, ">", Arity::Variadic(1), |args| {
            compare_chain("lisp:>", &args, |o| o == Ordering::Greater)
        });
        define(env, ">=", Arity::Variadic(1), |args| {
            compare_chain("lisp:>=", &args, |o| o != Ordering::Less)
        });
        define(env, "not", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(!args[0].is_truthy()))
        });
        define(env, "equal?", Arity::Fixed(2), |args| {
            Ok(Value::Boolean(args[0] == args[1]))
        });
        define(env, "identity", Arity::Fixed(1), |mut args| Ok(args.remove(0)));
    }

    fn load_list_functions(env: &Environment) {
        define(env, "cons", Arity::Fixed(2), Self::cons);
        define(env, "car", Arity::Fixed(1), |args| Self::car("lisp:car", &args[0]));
        define(env, "first", Arity::Fixed(1), |args| {
            Self::car("lisp:first", &args[0])
        });
        define(env, "cdr", Arity::Fixed(1), |args| Self::cdr("lisp:cdr", &args[0]));
        define(env, "rest", Arity::Fixed(1), |args| Self::cdr("lisp:rest", &args[0]));
        define(env, "second", Arity::Fixed(1), |args| {
            Self::nth_item("lisp:second", &args[0], 1)
        });
        define(env, "list", Arity::Variadic(0), |args| Ok(Value::list(args)));
        define(env, "vector", Arity::Variadic(0), |args| Ok(Value::Vector(args)));
        define(env, "nth", Arity::Fixed(2), Self::nth);
        define(env, "length", Arity::Fixed(1), Self::length);
        define(env, "empty?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(Self::count("lisp:empty?", &args[0])? == 0))
        });
    }

    fn load_sequence_functions(env: &Environment) {
        define(env, "reverse", Arity::Fixed(2), Self::reverse);
        define(env, "concat", Arity::Variadic(1), Self::concat);
        define(env, "slice", Arity::Fixed(4), Self::slice);
        define(env, "insert-index", Arity::Fixed(4), Self::insert_index);
        define(env, "append", Arity::Variadic(2), Self::append);
        define(env, "make-sequence", Arity::Range(2, 3), Self::make_sequence);
    }

    fn load_higher_order_functions(env: &Environment) {
        define_with_context(env, "select", Arity::Fixed(3), |args, ev, env| {
            Self::filter("lisp:select", args, ev, env, true)
        });
        define_with_context(env, "reject", Arity::Fixed(3), |args, ev, env| {
            Self::filter("lisp:reject", args, ev, env, false)
        });
        define_with_context(env, "map", Arity::Fixed(3), Self::map);
        define_with_context(env, "foldl", Arity::Fixed(3), Self::foldl);
    }

    fn load_map_functions(env: &Environment) {
        define(env, "sorted-map", Arity::Variadic(0), Self::sorted_map);
        define(env, "get", Arity::Range(2, 3), Self::get);
        define(env, "assoc", Arity::Fixed(3), Self::assoc);
        define(env, "dissoc", Arity::Fixed(2), Self::dissoc);
        define(env, "keys", Arity::Fixed(1), Self::keys);
    }

    /// Type predicates are total: they never fail.
    fn load_type_predicates(env: &Environment) {
        define(env, "symbol?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(
                args[0].unquoted(),
                Value::Symbol(_) | Value::Boolean(_)
            )))
        });
        define(env, "keyword?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(
                args[0].unquoted(),
                Value::Symbol(sym) if sym.is_keyword()
            )))
        });
        define(env, "string?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::String(_))))
        });
        define(env, "bytes?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Bytes(_))))
        });
        define(env, "int?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Integer(_))))
        });
        define(env, "float?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Float(_))))
        });
        define(env, "number?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(
                args[0],
                Value::Integer(_) | Value::Float(_)
            )))
        });
        define(env, "bool?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
        });
        define(env, "list?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(args[0].is_list()))
        });
        define(env, "vector?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Vector(_))))
        });
        define(env, "array?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Vector(_))))
        });
        define(env, "sorted-map?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::SortedMap(_))))
        });
        define(env, "function?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Function(_))))
        });
        define(env, "macro?", Arity::Fixed(1), |args| {
            Ok(Value::Boolean(matches!(args[0], Value::Macro(_))))
        });
    }

    fn load_conversion_functions(env: &Environment) {
        define(env, "to-int", Arity::Fixed(1), Self::to_int);
        define(env, "to-float", Arity::Fixed(1), Self::to_float);
        define(env, "to-bytes", Arity::Fixed(1), Self::to_bytes);
        define(env, "to-string", Arity::Fixed(1), Self::to_string);
        define(env, "type-of", Arity::Fixed(1), |args| {
            Ok(Value::quote(Value::symbol(args[0].type_name())))
        });
    }

    fn load_error_functions(env: &Environment) {
        define(env, "error", Arity::Variadic(1), Self::error);
    }

    // --- arithmetic ---

    fn add(args: Vec<Value>) -> RuntimeResult<Value> {
        fold_numbers("lisp:+", &args, Number::Int(0), |a, b| {
            Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => Number::Int(x.wrapping_add(y)),
                _ => Number::Float(a.as_f64() + b.as_f64()),
            })
        })
    }

    fn multiply(args: Vec<Value>) -> RuntimeResult<Value> {
        fold_numbers("lisp:*", &args, Number::Int(1), |a, b| {
            Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => Number::Int(x.wrapping_mul(y)),
                _ => Number::Float(a.as_f64() * b.as_f64()),
            })
        })
    }

    fn subtract(args: Vec<Value>) -> RuntimeResult<Value> {
        let sub = |a: Number, b: Number| {
            Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => Number::Int(x.wrapping_sub(y)),
                _ => Number::Float(a.as_f64() - b.as_f64()),
            })
        };
        let first = Number::from_value("lisp:-", &args[0])?;
        if args.len() == 1 {
            return Ok(sub(Number::Int(0), first)?.into_value());
        }
        fold_numbers("lisp:-", &args[1..], first, sub)
    }

    fn divide(args: Vec<Value>) -> RuntimeResult<Value> {
        let div = |a: Number, b: Number| match (a, b) {
            (_, Number::Int(0)) => Err(RuntimeError::DivisionByZero {
                function: "lisp:/".to_string(),
            }),
            (_, Number::Float(y)) if y == 0.0 => Err(RuntimeError::DivisionByZero {
                function: "lisp:/".to_string(),
            }),
            (Number::Int(x), Number::Int(y)) => Ok(Number::Int(x.wrapping_div(y))),
            _ => Ok(Number::Float(a.as_f64() / b.as_f64())),
        };
        let first = Number::from_value("lisp:/", &args[0])?;
        if args.len() == 1 {
            return Ok(div(Number::Int(1), first)?.into_value());
        }
        fold_numbers("lisp:/", &args[1..], first, div)
    }

    /// Floored modulo: the result takes the sign of the divisor.
    fn modulo(args: Vec<Value>) -> RuntimeResult<Value> {
        let x = expect_int("lisp:mod", &args[0])?;
        let y = expect_int("lisp:mod", &args[1])?;
        if y == 0 {
            return Err(RuntimeError::DivisionByZero {
                function: "lisp:mod".to_string(),
            });
        }
        let r = x.wrapping_rem(y);
        let r = if r != 0 && (r < 0) != (y < 0) { r + y } else { r };
        Ok(Value::Integer(r))
    }

    // --- lists ---

    fn cons(args: Vec<Value>) -> RuntimeResult<Value> {
        let tail = args[1]
            .as_list()
            .ok_or_else(|| RuntimeError::type_error("lisp:cons", "list", &args[1]))?;
        Ok(Value::List(List::cons(args[0].clone(), tail)))
    }

    fn car(function: &str, value: &Value) -> RuntimeResult<Value> {
        match value.unquoted() {
            Value::Nil => Ok(Value::Nil),
            Value::List(list) => Ok(list.car().cloned().unwrap_or(Value::Nil)),
            Value::Vector(items) => Ok(items.first().cloned().unwrap_or(Value::Nil)),
            other => Err(RuntimeError::type_error(function, "list", other)),
        }
    }

    /// The tail of a list; `()` once it is exhausted.
    fn cdr(function: &str, value: &Value) -> RuntimeResult<Value> {
        match value.unquoted() {
            Value::Nil => Ok(Value::Nil),
            Value::List(list) => match list.cdr() {
                Some(tail) if !tail.is_empty() => Ok(Value::List(tail.clone())),
                _ => Ok(Value::Nil),
            },
            Value::Vector(items) if items.len() > 1 => Ok(Value::Vector(items[1..].to_vec())),
            Value::Vector(_) => Ok(Value::Nil),
            other => Err(RuntimeError::type_error(function, "list", other)),
        }
    }

    fn nth(args: Vec<Value>) -> RuntimeResult<Value> {
        let index = expect_int("lisp:nth", &args[1])?;
        let index = usize::try_from(index).map_err(|_| {
            RuntimeError::invalid_argument("lisp:nth", format!("negative index: {}", index))
        })?;
        Self::nth_item("lisp:nth", &args[0], index)
    }

    /// Out of range indices give `()`.
    fn nth_item(function: &str, seq: &Value, index: usize) -> RuntimeResult<Value> {
        match seq.unquoted() {
            Value::Nil => Ok(Value::Nil),
            Value::List(list) => Ok(list.iter().nth(index).cloned().unwrap_or(Value::Nil)),
            Value::Vector(items) => Ok(items.get(index).cloned().unwrap_or(Value::Nil)),
            other => Err(RuntimeError::type_error(function, "list or vector", other)),
        }
    }

    fn count(function: &str, value: &Value) -> RuntimeResult<usize> {
        match value.unquoted() {
            Value::Nil => Ok(0),
            Value::List(list) => Ok(list.len()),
            Value::Vector(items) => Ok(items.len()),
            Value::String(s) => Ok(s.chars().count()),
            Value::Bytes(b) => Ok(b.len()),
            Value::SortedMap(m) => Ok(m.len()),
            other => Err(RuntimeError::type_error(function, "sequence", other)),
        }
    }

    fn length(args: Vec<Value>) -> RuntimeResult<Value> {
        Ok(Value::Integer(Self::count("lisp:length", &args[0])? as i64))
    }

    // --- typed sequences ---

    fn reverse(args: Vec<Value>) -> RuntimeResult<Value> {
        let target = SequenceType::container("lisp:reverse", &args[0])?;
        let mut items = sequence_items("lisp:reverse", &args[1])?;
        items.reverse();
        Ok(target.build(items))
    }

    /// Strings, bytes and lists of byte values concatenate into `'string`
    /// and `'bytes`. Lists and vectors concatenate into `'list` and
    /// `'vector`.
    fn concat(args: Vec<Value>) -> RuntimeResult<Value> {
        let target = SequenceType::from_value("lisp:concat", &args[0])?;
        match target {
            SequenceType::List | SequenceType::Vector => {
                let mut items = Vec::new();
                for arg in &args[1..] {
                    items.extend(sequence_items("lisp:concat", arg)?);
                }
                Ok(target.build(items))
            }
            SequenceType::String | SequenceType::Bytes => {
                let mut bytes = Vec::new();
                for arg in &args[1..] {
                    bytes.extend(byte_content("lisp:concat", arg)?);
                }
                if target == SequenceType::Bytes {
                    return Ok(Value::Bytes(bytes));
                }
                String::from_utf8(bytes).map(Value::String).map_err(|_| {
                    RuntimeError::ConversionError {
                        operation: "lisp:concat".to_string(),
                        value: "bytes".to_string(),
                        target: "string".to_string(),
                    }
                })
            }
        }
    }

    /// `(slice type seq start end)`, end exclusive.
    fn slice(args: Vec<Value>) -> RuntimeResult<Value> {
        let target = SequenceType::container("lisp:slice", &args[0])?;
        let items = sequence_items("lisp:slice", &args[1])?;
        let start = expect_index("lisp:slice", &args[2], items.len())?;
        let end = expect_index("lisp:slice", &args[3], items.len())?;
        if start > end {
            return Err(RuntimeError::invalid_argument(
                "lisp:slice",
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(target.build(items[start..end].to_vec()))
    }

    fn insert_index(mut args: Vec<Value>) -> RuntimeResult<Value> {
        let target = SequenceType::container("lisp:insert-index", &args[0])?;
        let mut items = sequence_items("lisp:insert-index", &args[1])?;
        let index = expect_index("lisp:insert-index", &args[2], items.len())?;
        items.insert(index, args.remove(3));
        Ok(target.build(items))
    }

    fn append(mut args: Vec<Value>) -> RuntimeResult<Value> {
        let target = SequenceType::container("lisp:append", &args[0])?;
        let mut items = sequence_items("lisp:append", &args[1])?;
        items.extend(args.drain(2..));
        Ok(target.build(items))
    }

    /// `(make-sequence start stop [step])`, stop exclusive.
    fn make_sequence(args: Vec<Value>) -> RuntimeResult<Value> {
        let start = expect_int("lisp:make-sequence", &args[0])?;
        let stop = expect_int("lisp:make-sequence", &args[1])?;
        let step = match args.get(2) {
            Some(step) => expect_int("lisp:make-sequence", step)?,
            None => 1,
        };
        if step <= 0 {
            return Err(RuntimeError::invalid_argument(
                "lisp:make-sequence",
                format!("step must be positive: {}", step),
            ));
        }
        let items = (start..stop)
            .step_by(step as usize)
            .map(Value::Integer)
            .collect::<Vec<_>>();
        Ok(Value::list(items))
    }

    // --- higher order ---

    fn filter(
        function: &str,
        args: Vec<Value>,
        ev: &Evaluator,
        env: &Environment,
        keep: bool,
    ) -> RuntimeResult<Value> {
        let target = SequenceType::container(function, &args[0])?;
        let mut kept = Vec::new();
        for item in sequence_items(function, &args[2])? {
            let verdict = ev.call_function(args[1].clone(), vec![item.clone()], env)?;
            if verdict.is_truthy() == keep {
                kept.push(item);
            }
        }
        Ok(target.build(kept))
    }

    fn map(args: Vec<Value>, ev: &Evaluator, env: &Environment) -> RuntimeResult<Value> {
        let target = SequenceType::container("lisp:map", &args[0])?;
        let mapped = sequence_items("lisp:map", &args[2])?
            .into_iter()
            .map(|item| ev.call_function(args[1].clone(), vec![item], env))
            .collect::<RuntimeResult<Vec<_>>>()?;
        Ok(target.build(mapped))
    }

    /// `(foldl f acc seq)` calls `(f acc item)` left to right.
    fn foldl(args: Vec<Value>, ev: &Evaluator, env: &Environment) -> RuntimeResult<Value> {
        sequence_items("lisp:foldl", &args[2])?
            .into_iter()
            .try_fold(args[1].clone(), |acc, item| {
                ev.call_function(args[0].clone(), vec![acc, item], env)
            })
    }

    // --- sorted maps ---

    fn sorted_map(args: Vec<Value>) -> RuntimeResult<Value> {
        if args.len() % 2 != 0 {
            return Err(RuntimeError::invalid_argument(
                "lisp:sorted-map",
                "expected key/value pairs",
            ));
        }
        let mut map = BTreeMap::new();
        for (key, value) in args.into_iter().tuples() {
            map.insert(map_key("lisp:sorted-map", &key)?, value);
        }
        Ok(Value::SortedMap(map))
    }

    fn get(args: Vec<Value>) -> RuntimeResult<Value> {
        let map = expect_map("lisp:get", &args[0])?;
        let key = map_key("lisp:get", &args[1])?;
        Ok(map
            .get(&key)
            .cloned()
            .or_else(|| args.get(2).cloned())
            .unwrap_or(Value::Nil))
    }

    fn assoc(mut args: Vec<Value>) -> RuntimeResult<Value> {
        let mut map = expect_map("lisp:assoc", &args[0])?.clone();
        let key = map_key("lisp:assoc", &args[1])?;
        map.insert(key, args.remove(2));
        Ok(Value::SortedMap(map))
    }

    fn dissoc(args: Vec<Value>) -> RuntimeResult<Value> {
        let mut map = expect_map("lisp:dissoc", &args[0])?.clone();
        map.remove(&map_key("lisp:dissoc", &args[1])?);
        Ok(Value::SortedMap(map))
    }

    fn keys(args: Vec<Value>) -> RuntimeResult<Value> {
        let map = expect_map("lisp:keys", &args[0])?;
        Ok(Value::list(map.keys().map(MapKey::to_value).collect()))
    }

    // --- conversions ---

    /// Floats are truncated toward zero.
    fn to_int(args: Vec<Value>) -> RuntimeResult<Value> {
        let fail = |value: &Value| RuntimeError::ConversionError {
            operation: "lisp:to-int".to_string(),
            value: value.to_string(),
            target: "int".to_string(),
        };
        match &args[0] {
            Value::Integer(i) => Ok(Value::Integer(*i)),
            Value::Float(f) => {
                let t = f.trunc();
                if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    Ok(Value::Integer(t as i64))
                } else {
                    Err(fail(&args[0]))
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| fail(&args[0])),
            other => Err(RuntimeError::type_error(
                "lisp:to-int",
                "int, float or string",
                other,
            )),
        }
    }

    fn to_float(args: Vec<Value>) -> RuntimeResult<Value> {
        match &args[0] {
            Value::Integer(i) => Ok(Value::Float(*i as f64)),
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                RuntimeError::ConversionError {
                    operation: "lisp:to-float".to_string(),
                    value: args[0].to_string(),
                    target: "float".to_string(),
                }
            }),
            other => Err(RuntimeError::type_error(
                "lisp:to-float",
                "int, float or string",
                other,
            )),
        }
    }

    fn to_bytes(args: Vec<Value>) -> RuntimeResult<Value> {
        byte_content("lisp:to-bytes", &args[0]).map(Value::Bytes)
    }

    fn to_string(args: Vec<Value>) -> RuntimeResult<Value> {
        let s = match args[0].unquoted() {
            Value::String(s) => s.clone(),
            Value::Bytes(bytes) => String::from_utf8(bytes.clone()).map_err(|_| {
                RuntimeError::ConversionError {
                    operation: "lisp:to-string".to_string(),
                    value: args[0].to_string(),
                    target: "string".to_string(),
                }
            })?,
            Value::Symbol(sym) => sym.name().to_string(),
            other => other.to_string(),
        };
        Ok(Value::String(s))
    }

    // --- errors ---

    /// `(error 'kind part...)`: parts are joined with spaces, strings
    /// without quotes.
    fn error(args: Vec<Value>) -> RuntimeResult<Value> {
        let kind = args[0]
            .as_symbol()
            .cloned()
            .ok_or_else(|| RuntimeError::type_error("lisp:error", "symbol", &args[0]))?;
        let message = args[1..]
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .join(" ");
        Err(ErrorValue::new(kind, message).into())
    }
}

fn define(
    env: &Environment,
    name: &str,
    arity: Arity,
    func: fn(Vec<Value>) -> RuntimeResult<Value>,
) {
    env.define(
        &Symbol::new(name),
        Value::Function(Function::Builtin(BuiltinFunction {
            name: name.to_string(),
            arity,
            func: Rc::new(func),
        })),
    );
}

fn define_with_context(
    env: &Environment,
    name: &str,
    arity: Arity,
    func: fn(Vec<Value>, &Evaluator, &Environment) -> RuntimeResult<Value>,
) {
    env.define(
        &Symbol::new(name),
        Value::Function(Function::BuiltinWithContext(BuiltinFunctionWithContext {
            name: name.to_string(),
            arity,
            func: Rc::new(func),
        })),
    );
}

// --- helpers ---

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(function: &str, value: &Value) -> RuntimeResult<Number> {
        match value {
            Value::Integer(i) => Ok(Number::Int(*i)),
            Value::Float(f) => Ok(Number::Float(*f)),
            other => Err(RuntimeError::type_error(function, "number", other)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }

    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

fn fold_numbers(
    function: &str,
    args: &[Value],
    init: Number,
    op: impl Fn(Number, Number) -> RuntimeResult<Number>,
) -> RuntimeResult<Value> {
    args.iter()
        .try_fold(init, |acc, arg| op(acc, Number::from_value(function, arg)?))
        .map(Number::into_value)
}

/// True when every adjacent pair satisfies `accept`. NaN compares false.
fn compare_chain(
    function: &str,
    args: &[Value],
    accept: impl Fn(Ordering) -> bool,
) -> RuntimeResult<Value> {
    let numbers = args
        .iter()
        .map(|arg| Number::from_value(function, arg))
        .collect::<RuntimeResult<Vec<_>>>()?;
    let holds = numbers
        .iter()
        .tuple_windows()
        .all(|(a, b)| a.compare(*b).map(&accept).unwrap_or(false));
    Ok(Value::Boolean(holds))
}

fn expect_int(function: &str, value: &Value) -> RuntimeResult<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(RuntimeError::type_error(function, "int", other)),
    }
}

/// An index in `0..=len`.
fn expect_index(function: &str, value: &Value, len: usize) -> RuntimeResult<usize> {
    let index = expect_int(function, value)?;
    usize::try_from(index)
        .ok()
        .filter(|i| *i <= len)
        .ok_or_else(|| {
            RuntimeError::invalid_argument(
                function,
                format!("index {} out of bounds for length {}", index, len),
            )
        })
}

fn expect_map<'a>(function: &str, value: &'a Value) -> RuntimeResult<&'a BTreeMap<MapKey, Value>> {
    match value {
        Value::SortedMap(map) => Ok(map),
        other => Err(RuntimeError::type_error(function, "sorted-map", other)),
    }
}

fn map_key(function: &str, value: &Value) -> RuntimeResult<MapKey> {
    MapKey::from_value(value).map_err(|actual| RuntimeError::TypeError {
        expected: "map key".to_string(),
        actual: actual.to_string(),
        operation: function.to_string(),
    })
}

fn sequence_items(function: &str, value: &Value) -> RuntimeResult<Vec<Value>> {
    value
        .sequence_items()
        .ok_or_else(|| RuntimeError::type_error(function, "list or vector", value))
}

/// Raw bytes of a string, a byte sequence, or a list/vector of byte values.
fn byte_content(function: &str, value: &Value) -> RuntimeResult<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Bytes(b) => Ok(b.clone()),
        other => {
            let items = other.sequence_items().ok_or_else(|| {
                RuntimeError::type_error(function, "string, bytes or sequence", other)
            })?;
            items
                .iter()
                .map(|item| match item {
                    Value::Integer(i) => u8::try_from(*i).map_err(|_| {
                        RuntimeError::invalid_argument(function, format!("not a byte: {}", i))
                    }),
                    other => Err(RuntimeError::type_error(function, "int", other)),
                })
                .collect()
        }
    }
}

/// The quoted type argument of the typed sequence builtins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceType {
    List,
    Vector,
    String,
    Bytes,
}

impl SequenceType {
    fn from_value(function: &str, value: &Value) -> RuntimeResult<SequenceType> {
        match value.as_symbol().map(|s| s.unqualified()) {
            Some(sym) => match sym.name() {
                "list" => Ok(SequenceType::List),
                "vector" => Ok(SequenceType::Vector),
                "string" => Ok(SequenceType::String),
                "bytes" => Ok(SequenceType::Bytes),
                other => Err(RuntimeError::invalid_argument(
                    function,
                    format!("unknown sequence type: {}", other),
                )),
            },
            None => Err(RuntimeError::type_error(function, "symbol", value)),
        }
    }

    /// `'list` or `'vector` only.
    fn container(function: &str, value: &Value) -> RuntimeResult<SequenceType> {
        match Self::from_value(function, value)? {
            t @ (SequenceType::List | SequenceType::Vector) => Ok(t),
            other => Err(RuntimeError::invalid_argument(
                function,
                format!("unsupported sequence type: {:?}", other).to_lowercase(),
            )),
        }
    }

    fn build(self, items: Vec<Value>) -> Value {
        match self {
            SequenceType::Vector => Value::Vector(items),
            _ => Value::list(items),
        }
    }
}
