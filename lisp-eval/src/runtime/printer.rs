// Canonical textual form of values, used by the REPL and by tests.

use std::fmt::{self, Write};

use crate::runtime::values::{Closure, Function, List, Value};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, false)
    }
}

/// Lists are printed with a leading quote at the outermost level only.
/// Container elements other than list elements are printed as top-level
/// values.
fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, nested: bool) -> fmt::Result {
    match value {
        Value::Nil => f.write_str("()"),
        Value::Boolean(b) => write!(f, "{}", b),
        Value::Integer(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{:?}", x),
        Value::Symbol(sym) => f.write_str(sym.name()),
        Value::String(s) => write_string(f, s),
        Value::Bytes(bytes) => {
            f.write_str("#<bytes")?;
            for b in bytes {
                write!(f, " {}", b)?;
            }
            f.write_char('>')
        }
        Value::List(list) => {
            if !nested {
                f.write_char('\'')?;
            }
            write_list(f, list)
        }
        Value::Vector(items) => {
            f.write_str("(vector")?;
            for item in items {
                f.write_char(' ')?;
                write_value(f, item, false)?;
            }
            f.write_char(')')
        }
        Value::SortedMap(map) => {
            f.write_str("(sorted-map")?;
            for (key, val) in map {
                f.write_char(' ')?;
                write_value(f, &key.to_value(), false)?;
                f.write_char(' ')?;
                write_value(f, val, false)?;
            }
            f.write_char(')')
        }
        Value::Function(Function::Builtin(b)) => write!(f, "#<builtin lisp:{}>", b.name),
        Value::Function(Function::BuiltinWithContext(b)) => {
            write!(f, "#<builtin lisp:{}>", b.name)
        }
        Value::Function(Function::Closure(closure)) => write_closure(f, "lambda", closure),
        Value::Macro(closure) => write_closure(f, "macro", closure),
        Value::Error(err) => write!(f, "{}", err),
        Value::Quote(inner) => {
            f.write_char('\'')?;
            write_value(f, inner, true)
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &List) -> fmt::Result {
    f.write_char('(')?;
    for (i, item) in list.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        write_value(f, item, true)?;
    }
    f.write_char(')')
}

fn write_closure(f: &mut fmt::Formatter<'_>, head: &str, closure: &Closure) -> fmt::Result {
    write!(f, "({} ", head)?;
    write_value(f, &closure.params.to_value(), true)?;
    for expr in &closure.body {
        f.write_char(' ')?;
        write_value(f, expr, true)?;
    }
    f.write_char(')')
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MapKey, Symbol};
    use std::collections::BTreeMap;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Integer).collect()
    }

    #[test]
    fn lists_quote_only_at_the_top() {
        let inner = Value::list(ints(&[1, 2]));
        let outer = Value::list(vec![inner, Value::Integer(3)]);
        assert_eq!(outer.to_string(), "'((1 2) 3)");
    }

    #[test]
    fn vectors_print_elements_as_top_level_values() {
        let v = Value::Vector(vec![Value::list(ints(&[1])), Value::Nil]);
        assert_eq!(v.to_string(), "(vector '(1) ())");
        assert_eq!(Value::Vector(vec![]).to_string(), "(vector)");
    }

    #[test]
    fn quotes_print_every_level() {
        let q = Value::quote(Value::quote(Value::Integer(3)));
        assert_eq!(q.to_string(), "''3");
        assert_eq!(Value::quote(Value::symbol("true")).to_string(), "'true");
    }

    #[test]
    fn strings_are_escaped() {
        let s = Value::from("\"\"a\nstring\u{1}");
        assert_eq!(s.to_string(), r#""\"\"a\nstring\u{1}""#);
    }

    #[test]
    fn scalars() {
        assert_eq!(Value::Float(-12.75).to_string(), "-12.75");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Bytes(b"abc".to_vec()).to_string(), "#<bytes 97 98 99>");
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }

    #[test]
    fn sorted_maps_print_in_key_order() {
        let mut map = BTreeMap::new();
        map.insert(MapKey::Symbol(Symbol::new(":b")), Value::Integer(2));
        map.insert(MapKey::Symbol(Symbol::new(":a")), Value::Integer(1));
        assert_eq!(Value::SortedMap(map).to_string(), "(sorted-map :a 1 :b 2)");
    }
}
