// Special forms: list forms whose arguments are not evaluated up front

use std::collections::HashMap;
use std::rc::Rc;

use lazy_static::lazy_static;

use crate::ast::Symbol;
use crate::runtime::environment::Environment;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::param_binding::ParamSpec;
use crate::runtime::values::{Arity, Closure, Function, List, Value};

pub type SpecialForm = fn(&Evaluator, &List, &Environment) -> RuntimeResult<Value>;

lazy_static! {
    static ref SPECIAL_FORMS: HashMap<&'static str, SpecialForm> = {
        let mut forms: HashMap<&'static str, SpecialForm> = HashMap::new();
        forms.insert("quote", eval_quote);
        forms.insert("function", eval_function);
        forms.insert("set", eval_set);
        forms.insert("lambda", eval_lambda);
        forms.insert("expr", eval_expr_shorthand);
        forms.insert("defun", eval_defun);
        forms.insert("defmacro", eval_defmacro);
        forms.insert("let", eval_let);
        forms.insert("let*", eval_let_star);
        forms.insert("flet", eval_flet);
        forms.insert("labels", eval_labels);
        forms.insert("funcall", eval_funcall);
        forms.insert("apply", eval_apply);
        forms.insert("if", eval_if);
        forms.insert("cond", eval_cond);
        forms.insert("when", eval_when);
        forms.insert("unless", eval_unless);
        forms.insert("and", eval_and);
        forms.insert("or", eval_or);
        forms.insert("progn", eval_progn);
        forms.insert("dotimes", eval_dotimes);
        forms.insert("dolist", eval_dolist);
        forms.insert("quasiquote", eval_quasiquote);
        forms
    };
}

/// The special form a head symbol names, if any. `lisp:if` and `if` are the
/// same form.
pub fn lookup(sym: &Symbol) -> Option<SpecialForm> {
    SPECIAL_FORMS.get(sym.unqualified().name()).copied()
}

pub fn is_special_form(sym: &Symbol) -> bool {
    lookup(sym).is_some()
}

pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = SPECIAL_FORMS.keys().copied().collect();
    names.sort_unstable();
    names
}

fn form_name(name: &str) -> String {
    format!("lisp:{}", name)
}

fn check_arity(name: &str, args: &List, arity: Arity) -> RuntimeResult<Vec<Value>> {
    let args = args.to_vec();
    if arity.accepts(args.len()) {
        Ok(args)
    } else {
        Err(RuntimeError::arity(&form_name(name), arity, args.len()))
    }
}

fn expect_symbol(name: &str, value: &Value) -> RuntimeResult<Symbol> {
    match value.as_symbol() {
        Some(sym) if !sym.is_keyword() => Ok(sym.clone()),
        _ => Err(RuntimeError::type_error(&form_name(name), "symbol", value)),
    }
}

fn expect_list(name: &str, value: &Value) -> RuntimeResult<List> {
    value
        .as_list()
        .ok_or_else(|| RuntimeError::type_error(&form_name(name), "list", value))
}

// --- quoting ---

fn eval_quote(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("quote", args, Arity::Fixed(1))?;
    ev.eval_expr(&Value::quote(args[0].clone()), env)
}

/// `#'f`: a function by lexical name, or a lambda form.
fn eval_function(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("function", args, Arity::Fixed(1))?;
    let value = match &args[0] {
        Value::Symbol(sym) => env.get(sym)?,
        other => ev.eval_expr(other, env)?,
    };
    match value {
        Value::Function(_) => Ok(value),
        other => Err(RuntimeError::type_error(
            &form_name("function"),
            "function",
            &other,
        )),
    }
}

fn eval_quasiquote(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("quasiquote", args, Arity::Fixed(1))?;
    quasi(ev, &args[0], env, 1)
}

/// `(head arg)` when `form` is a two element list headed by `head`.
fn unary_form<'a>(form: &'a Value, head: &str) -> Option<&'a Value> {
    let Value::List(list) = form else {
        return None;
    };
    let (first, rest) = list.split_first()?;
    match (first, rest.split_first()) {
        (Value::Symbol(sym), Some((arg, tail))) if sym.name() == head && tail.is_empty() => {
            Some(arg)
        }
        _ => None,
    }
}

fn wrap(head: &str, value: Value) -> Value {
    Value::list(vec![Value::symbol(head), value])
}

fn quasi(
    ev: &Evaluator,
    template: &Value,
    env: &Environment,
    depth: usize,
) -> RuntimeResult<Value> {
    if let Some(arg) = unary_form(template, "unquote") {
        return if depth == 1 {
            ev.eval_expr(arg, env)
        } else {
            Ok(wrap("unquote", quasi(ev, arg, env, depth - 1)?))
        };
    }
    if let Some(arg) = unary_form(template, "quasiquote") {
        return Ok(wrap("quasiquote", quasi(ev, arg, env, depth + 1)?));
    }
    match template {
        Value::List(list) => {
            let mut items = Vec::new();
            for item in list.iter() {
                match unary_form(item, "unquote-splicing") {
                    Some(arg) if depth == 1 => {
                        let spliced = ev.eval_expr(arg, env)?;
                        let values = spliced.sequence_items().ok_or_else(|| {
                            RuntimeError::type_error(
                                &form_name("unquote-splicing"),
                                "list or vector",
                                &spliced,
                            )
                        })?;
                        items.extend(values);
                    }
                    _ => items.push(quasi(ev, item, env, depth)?),
                }
            }
            Ok(Value::list(items))
        }
        Value::Quote(inner) => Ok(Value::quote(quasi(ev, inner, env, depth)?)),
        other => Ok(other.clone()),
    }
}

// --- assignment and definition ---

fn eval_set(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("set", args, Arity::Fixed(2))?;
    let target = ev.eval_expr(&args[0], env)?;
    let sym = expect_symbol("set", &target)?;
    let value = ev.eval_expr(&args[1], env)?;
    env.set(&sym, value.clone())?;
    Ok(value)
}

fn make_closure(
    name: Option<Symbol>,
    form: &str,
    params: &Value,
    body: &[Value],
    env: &Environment,
) -> RuntimeResult<Closure> {
    let label = name
        .as_ref()
        .map(|s| s.0.clone())
        .unwrap_or_else(|| form_name(form));
    let params = ParamSpec::parse(&label, params)?;
    // A leading string is a docstring only when something follows it.
    let (doc, body) = match body {
        [Value::String(doc), rest @ ..] if !rest.is_empty() => (Some(doc.clone()), rest),
        _ => (None, body),
    };
    Ok(Closure {
        name,
        params,
        body: body.to_vec(),
        env: env.clone(),
        doc,
    })
}

fn eval_lambda(_ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("lambda", args, Arity::Variadic(1))?;
    let closure = make_closure(None, "lambda", &args[0], &args[1..], env)?;
    Ok(Value::Function(Function::Closure(Rc::new(closure))))
}

fn eval_defun(_ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("defun", args, Arity::Variadic(2))?;
    let name = expect_symbol("defun", &args[0])?;
    let closure = make_closure(Some(name.clone()), "defun", &args[1], &args[2..], env)?;
    tracing::debug!(name = %name, params = %closure.params.to_value(), "defun");
    env.define_checked(
        &form_name("defun"),
        &name,
        Value::Function(Function::Closure(Rc::new(closure))),
    )?;
    Ok(Value::Nil)
}

fn eval_defmacro(_ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("defmacro", args, Arity::Variadic(2))?;
    let name = expect_symbol("defmacro", &args[0])?;
    let closure = make_closure(Some(name.clone()), "defmacro", &args[1], &args[2..], env)?;
    tracing::debug!(name = %name, "defmacro");
    env.define_checked(&form_name("defmacro"), &name, Value::Macro(Rc::new(closure)))?;
    Ok(Value::Nil)
}

/// Collects `%`, `%1`..`%9` and `%&rest` references in an `expr` body and
/// rewrites `%` to `%1`. Nested `expr` forms are left alone.
fn rewrite_shorthand(value: &Value, max_index: &mut usize, rest: &mut bool) -> Value {
    match value {
        Value::Symbol(sym) => match sym.name() {
            "%" => {
                *max_index = (*max_index).max(1);
                Value::symbol("%1")
            }
            "%&rest" => {
                *rest = true;
                value.clone()
            }
            name => {
                if let Some(index) = name
                    .strip_prefix('%')
                    .and_then(|digits| digits.parse::<usize>().ok())
                    .filter(|i| (1..=9).contains(i))
                {
                    *max_index = (*max_index).max(index);
                }
                value.clone()
            }
        },
        Value::List(list) => match list.car() {
            Some(Value::Symbol(head)) if head.unqualified().name() == "expr" => value.clone(),
            _ => Value::List(
                list.iter()
                    .map(|item| rewrite_shorthand(item, max_index, rest))
                    .collect(),
            ),
        },
        _ => value.clone(),
    }
}

/// `(expr body)` / `#^body`: an anonymous function with implicit parameters.
fn eval_expr_shorthand(_ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("expr", args, Arity::Fixed(1))?;
    let mut max_index = 0;
    let mut rest = false;
    let body = rewrite_shorthand(&args[0], &mut max_index, &mut rest);

    let mut params = ParamSpec {
        required: (1..=max_index)
            .map(|i| Symbol(format!("%{}", i)))
            .collect(),
        ..ParamSpec::default()
    };
    if rest {
        params.rest = Some(Symbol::new("%&rest"));
    }
    Ok(Value::Function(Function::Closure(Rc::new(Closure {
        name: None,
        params,
        body: vec![body],
        env: env.clone(),
        doc: None,
    }))))
}

// --- binding blocks ---

/// Binding entries are `(name expr)`, `[name expr]` or a bare `name`.
fn binding_entries(name: &str, bindings: &Value) -> RuntimeResult<Vec<(Symbol, Option<Value>)>> {
    let mut entries = Vec::new();
    for entry in expect_list(name, bindings)?.iter() {
        if let Value::Symbol(sym) = entry {
            entries.push((sym.clone(), None));
            continue;
        }
        let parts = expect_list(name, entry)?.to_vec();
        match parts.as_slice() {
            [target] => entries.push((expect_symbol(name, target)?, None)),
            [target, init] => entries.push((expect_symbol(name, target)?, Some(init.clone()))),
            _ => {
                return Err(RuntimeError::invalid_argument(
                    &form_name(name),
                    format!("malformed binding: {}", entry),
                ))
            }
        }
    }
    Ok(entries)
}

fn eval_let(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("let", args, Arity::Variadic(1))?;
    let mut values = Vec::new();
    for (sym, init) in binding_entries("let", &args[0])? {
        let value = match init {
            Some(expr) => ev.eval_expr(&expr, env)?,
            None => Value::Nil,
        };
        values.push((sym, value));
    }
    let frame = Environment::with_parent(env);
    for (sym, value) in values {
        frame.define(&sym, value);
    }
    ev.eval_body(&args[1..], &frame)
}

fn eval_let_star(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("let*", args, Arity::Variadic(1))?;
    let frame = Environment::with_parent(env);
    for (sym, init) in binding_entries("let*", &args[0])? {
        let value = match init {
            Some(expr) => ev.eval_expr(&expr, &frame)?,
            None => Value::Nil,
        };
        frame.define(&sym, value);
    }
    ev.eval_body(&args[1..], &frame)
}

/// `((name (params) body...) ...)` for `flet` and `labels`.
fn function_bindings(
    name: &str,
    bindings: &Value,
    capture: &Environment,
) -> RuntimeResult<Vec<(Symbol, Value)>> {
    let mut functions = Vec::new();
    for entry in expect_list(name, bindings)?.iter() {
        let parts = expect_list(name, entry)?.to_vec();
        if parts.len() < 2 {
            return Err(RuntimeError::invalid_argument(
                &form_name(name),
                format!("malformed function binding: {}", entry),
            ));
        }
        let fn_name = expect_symbol(name, &parts[0])?;
        let closure = make_closure(Some(fn_name.clone()), name, &parts[1], &parts[2..], capture)?;
        functions.push((fn_name, Value::Function(Function::Closure(Rc::new(closure)))));
    }
    Ok(functions)
}

/// Local functions over the enclosing frame. They cannot see each other.
fn eval_flet(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("flet", args, Arity::Variadic(1))?;
    let functions = function_bindings("flet", &args[0], env)?;
    let frame = Environment::with_parent(env);
    for (sym, function) in functions {
        frame.define(&sym, function);
    }
    ev.eval_body(&args[1..], &frame)
}

/// Local functions that all capture the new frame, so they can call
/// themselves and each other.
fn eval_labels(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("labels", args, Arity::Variadic(1))?;
    let frame = Environment::with_parent(env);
    for (sym, function) in function_bindings("labels", &args[0], &frame)? {
        frame.define(&sym, function);
    }
    ev.eval_body(&args[1..], &frame)
}

// --- application ---

fn eval_args(ev: &Evaluator, args: &[Value], env: &Environment) -> RuntimeResult<Vec<Value>> {
    args.iter().map(|arg| ev.eval_expr(arg, env)).collect()
}

fn eval_funcall(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("funcall", args, Arity::Variadic(1))?;
    let mut values = eval_args(ev, &args, env)?;
    let callee = values.remove(0);
    ev.call_function(callee, values, env)
}

fn eval_apply(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("apply", args, Arity::Variadic(2))?;
    let mut values = eval_args(ev, &args, env)?;
    let callee = values.remove(0);
    let spread = values.pop().unwrap_or(Value::Nil);
    let spread = spread
        .as_list()
        .ok_or_else(|| RuntimeError::type_error(&form_name("apply"), "list", &spread))?;
    values.extend(spread.iter().cloned());
    ev.call_function(callee, values, env)
}

// --- control ---

fn eval_if(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("if", args, Arity::Range(2, 3))?;
    if ev.eval_expr(&args[0], env)?.is_truthy() {
        ev.eval_expr(&args[1], env)
    } else if let Some(else_branch) = args.get(2) {
        ev.eval_expr(else_branch, env)
    } else {
        Ok(Value::Nil)
    }
}

fn is_else(test: &Value) -> bool {
    matches!(test, Value::Symbol(sym) if sym.name() == "else" || sym.name() == ":else")
}

fn eval_cond(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    for clause in args.iter() {
        let clause = expect_list("cond", clause)?;
        let Some((test, body)) = clause.split_first() else {
            return Err(RuntimeError::invalid_argument(
                &form_name("cond"),
                "empty clause",
            ));
        };
        let result = if is_else(test) {
            Value::Boolean(true)
        } else {
            ev.eval_expr(test, env)?
        };
        if result.is_truthy() {
            return if body.is_empty() {
                Ok(result)
            } else {
                ev.eval_body_list(body, env)
            };
        }
    }
    Ok(Value::Nil)
}

fn eval_when(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("when", args, Arity::Variadic(1))?;
    if ev.eval_expr(&args[0], env)?.is_truthy() {
        ev.eval_body(&args[1..], env)
    } else {
        Ok(Value::Nil)
    }
}

fn eval_unless(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("unless", args, Arity::Variadic(1))?;
    if ev.eval_expr(&args[0], env)?.is_truthy() {
        Ok(Value::Nil)
    } else {
        ev.eval_body(&args[1..], env)
    }
}

fn eval_and(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let mut result = Value::Boolean(true);
    for arg in args.iter() {
        result = ev.eval_expr(arg, env)?;
        if !result.is_truthy() {
            break;
        }
    }
    Ok(result)
}

fn eval_or(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let mut result = Value::Boolean(false);
    for arg in args.iter() {
        result = ev.eval_expr(arg, env)?;
        if result.is_truthy() {
            break;
        }
    }
    Ok(result)
}

fn eval_progn(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    ev.eval_body_list(args, env)
}

/// `(var expr [result])` header of `dotimes` and `dolist`.
fn loop_header(name: &str, header: &Value) -> RuntimeResult<(Symbol, Value, Option<Value>)> {
    let parts = expect_list(name, header)?.to_vec();
    match parts.as_slice() {
        [var, expr] => Ok((expect_symbol(name, var)?, expr.clone(), None)),
        [var, expr, result] => Ok((
            expect_symbol(name, var)?,
            expr.clone(),
            Some(result.clone()),
        )),
        _ => Err(RuntimeError::invalid_argument(
            &form_name(name),
            format!("malformed loop header: {}", header),
        )),
    }
}

fn eval_dotimes(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("dotimes", args, Arity::Variadic(1))?;
    let (var, count, result) = loop_header("dotimes", &args[0])?;
    let count = match ev.eval_expr(&count, env)? {
        Value::Integer(n) => n,
        other => {
            return Err(RuntimeError::type_error(
                &form_name("dotimes"),
                "int",
                &other,
            ))
        }
    };
    let frame = Environment::with_parent(env);
    for i in 0..count.max(0) {
        frame.define(&var, Value::Integer(i));
        ev.eval_body(&args[1..], &frame)?;
    }
    match result {
        Some(expr) => ev.eval_expr(&expr, &frame),
        None => Ok(Value::Nil),
    }
}

fn eval_dolist(ev: &Evaluator, args: &List, env: &Environment) -> RuntimeResult<Value> {
    let args = check_arity("dolist", args, Arity::Variadic(1))?;
    let (var, seq, result) = loop_header("dolist", &args[0])?;
    let seq = ev.eval_expr(&seq, env)?;
    let items = seq.sequence_items().ok_or_else(|| {
        RuntimeError::type_error(&form_name("dolist"), "list or vector", &seq)
    })?;
    let frame = Environment::with_parent(env);
    for item in items {
        frame.define(&var, item);
        ev.eval_body(&args[1..], &frame)?;
    }
    match result {
        Some(expr) => ev.eval_expr(&expr, &frame),
        None => Ok(Value::Nil),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use pretty_assertions::assert_eq;

    fn run(ev: &Evaluator, src: &str) -> String {
        let expr = parse_expression(src).expect("parse");
        match ev.evaluate(&expr) {
            Ok(value) => value.to_string(),
            Err(err) => err.into_error_value().to_string(),
        }
    }

    #[test]
    fn lookup_honours_the_builtin_package() {
        assert!(is_special_form(&Symbol::new("if")));
        assert!(is_special_form(&Symbol::new("lisp:if")));
        assert!(!is_special_form(&Symbol::new("user:if")));
        assert!(names().contains(&"labels"));
    }

    #[test]
    fn defun_docstring_needs_a_following_body() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, r#"(defun f () "outer")"#), "()");
        assert_eq!(run(&ev, "(f)"), r#""outer""#);
        assert_eq!(run(&ev, r#"(defun g (x) "doubles" (* 2 x))"#), "()");
        assert_eq!(run(&ev, "(g 4)"), "8");
        assert_eq!(run(&ev, "g"), "(lambda (x) (* 2 x))");
    }

    #[test]
    fn expr_infers_parameters() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, "#^(< % 3)"), "(lambda (%1) (< %1 3))");
        assert_eq!(run(&ev, "(funcall #^(- %2 %1) 1 10)"), "9");
        assert_eq!(run(&ev, "(funcall #^(list %&rest) 1 2)"), "'(1 2)");
        assert_eq!(run(&ev, "(funcall (expr 7))"), "7");
    }

    #[test]
    fn let_and_let_star() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, "(let ((x 1) [y 2] z) (list x y z))"), "'(1 2 ())");
        assert_eq!(run(&ev, "(let* ((x 1) (y (+ x 1))) y)"), "2");
        assert_eq!(
            run(&ev, "(let ((x 1) (y (+ x 1))) y)"),
            "unbound symbol: x"
        );
    }

    #[test]
    fn labels_see_each_other_but_flet_does_not() {
        let ev = Evaluator::new();
        assert_eq!(
            run(
                &ev,
                "(labels ((ev? (n) (if (= n 0) true (od? (- n 1))))
                          (od? (n) (if (= n 0) false (ev? (- n 1)))))
                   (ev? 10))"
            ),
            "true"
        );
        assert_eq!(
            run(&ev, "(flet ((a () 1) (b () (a))) (b))"),
            "unbound symbol: a"
        );
    }

    #[test]
    fn cond_when_unless() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, "(cond ((= 1 2) 'a) (:else 'b))"), "'b");
        assert_eq!(run(&ev, "(cond ((= 1 2) 'a) (else 'c))"), "'c");
        assert_eq!(run(&ev, "(cond ((= 1 2) 'a))"), "()");
        assert_eq!(run(&ev, "(cond (5))"), "5");
        assert_eq!(run(&ev, "(when true 1 2)"), "2");
        assert_eq!(run(&ev, "(when false 1)"), "()");
        assert_eq!(run(&ev, "(unless false 3)"), "3");
    }

    #[test]
    fn and_or_return_the_deciding_value() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, "(and)"), "true");
        assert_eq!(run(&ev, "(and 1 2)"), "2");
        assert_eq!(run(&ev, "(and 1 () 2)"), "()");
        assert_eq!(run(&ev, "(or)"), "false");
        assert_eq!(run(&ev, "(or () 3)"), "3");
    }

    #[test]
    fn loops() {
        let ev = Evaluator::new();
        run(&ev, "(set 'acc 0)");
        assert_eq!(run(&ev, "(dotimes (i 5 acc) (set 'acc (+ acc i)))"), "10");
        run(&ev, "(set 'acc ())");
        assert_eq!(
            run(&ev, "(dolist (x (vector 1 2 3) acc) (set 'acc (cons x acc)))"),
            "'(3 2 1)"
        );
        assert_eq!(run(&ev, "(dotimes (i 3))"), "()");
    }

    #[test]
    fn quasiquote_and_macros() {
        let ev = Evaluator::new();
        run(&ev, "(set 'xs '(2 3))");
        assert_eq!(run(&ev, "`(1 ,(car xs) ,@xs)"), "'(1 2 2 3)");
        assert_eq!(
            run(&ev, "`(a `(b ,(c ,(car xs))))"),
            "'(a (quasiquote (b (unquote (c 2)))))"
        );
        assert_eq!(
            run(&ev, "(defmacro swap-args (f a b) `(,f ,b ,a))"),
            "()"
        );
        assert_eq!(run(&ev, "(swap-args - 1 10)"), "9");
        assert_eq!(
            run(&ev, "(defmacro my-unless (c &rest body) `(if ,c () (progn ,@body)))"),
            "()"
        );
        assert_eq!(run(&ev, "(my-unless false 1 2)"), "2");
        assert_eq!(
            run(&ev, "my-unless"),
            "(macro (c &rest body) \
             (quasiquote (if (unquote c) () (progn (unquote-splicing body)))))"
        );
    }

    #[test]
    fn function_form_uses_lexical_scope() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, "(labels ((f () 1)) (funcall #'f))"), "1");
        assert_eq!(run(&ev, "(funcall #'(lambda (x) x) 4)"), "4");
        assert_eq!(run(&ev, "#'car"), "#<builtin lisp:car>");
    }

    #[test]
    fn apply_requires_a_trailing_list() {
        let ev = Evaluator::new();
        assert_eq!(run(&ev, "(apply '+ 1 2 '(3))"), "6");
        assert_eq!(run(&ev, "(apply '+ 1 2)"), "lisp:apply: expected list, got int");
    }
}
