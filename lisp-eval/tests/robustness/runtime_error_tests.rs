// Runtime error tests
// Goal: every failure surfaces as an error value with a stable kind, function
// and message, and a failed form never corrupts the environment.

use lisp_eval::{ErrorValue, Runtime, RuntimeConfig, Symbol, Value};

fn runtime() -> Runtime {
    Runtime::with_config(RuntimeConfig {
        source_name: "err".to_string(),
        max_call_depth: 50,
        ..RuntimeConfig::default()
    })
}

fn eval_err(code: &str) -> ErrorValue {
    match runtime().evaluate(code) {
        Ok(v) => panic!("expected {} to fail, got {}", code, v),
        Err(err) => err,
    }
}

#[test]
fn test_unbound_symbol() {
    let err = eval_err("(+ 1 undefined-thing)");
    assert_eq!(err.kind, Symbol::new("UnboundSymbolError"));
    assert_eq!(err.to_string(), "err:1: unbound symbol: undefined-thing");
}

#[test]
fn test_arity_errors_for_builtins_and_closures() {
    let err = eval_err("(cons 1)");
    assert_eq!(err.kind, Symbol::new("ArityError"));
    assert_eq!(err.function.as_deref(), Some("lisp:cons"));

    let err = eval_err("((lambda (a b) a) 1)");
    assert_eq!(err.kind, Symbol::new("ArityError"));
    assert_eq!(err.function.as_deref(), Some("lambda"));

    let err = eval_err("(defun two (a b) a) (two 1 2 3)");
    assert_eq!(err.function.as_deref(), Some("two"));
    assert_eq!(err.message, "expected 2 arguments, got 3");
}

#[test]
fn test_keyword_argument_errors() {
    let err = eval_err("((lambda (&key x) x) :x)");
    assert_eq!(err.kind, Symbol::new("ArityError"));
    let err = eval_err("((lambda (&key x) x) 5)");
    assert_eq!(err.kind, Symbol::new("ArityError"));
}

#[test]
fn test_type_errors_name_the_operation() {
    let err = eval_err("(car \"abc\")");
    assert_eq!(err.kind, Symbol::new("TypeError"));
    assert_eq!(err.function.as_deref(), Some("lisp:car"));
    assert_eq!(err.message, "expected list, got string");
}

#[test]
fn test_not_callable() {
    let err = eval_err("(\"f\" 1)");
    assert_eq!(err.kind, Symbol::new("NotCallableError"));
    let err = eval_err("(funcall 3)");
    assert_eq!(err.kind, Symbol::new("NotCallableError"));
}

#[test]
fn test_rebinding_constants_fails_everywhere() {
    let rt = runtime();
    for code in ["(set 'true 2)", "(set 'lisp:false 2)", "(defun true () 1)"] {
        let err = rt.evaluate(code).unwrap_err();
        assert_eq!(err.kind, Symbol::new("RebindConstantError"), "{}", code);
    }
    assert_eq!(rt.evaluate("true").unwrap(), Value::Boolean(true));
}

#[test]
fn test_stack_overflow_is_reported_and_recoverable() {
    let rt = runtime();
    rt.evaluate("(defun loop-forever (n) (loop-forever (+ n 1)))")
        .unwrap();
    let err = rt.evaluate("(loop-forever 0)").unwrap_err();
    assert_eq!(err.kind, Symbol::new("StackOverflowError"));
    assert_eq!(rt.evaluate("(+ 1 1)").unwrap(), Value::Integer(2));
}

#[test]
fn test_user_errors_keep_their_kind() {
    let err = eval_err("(error 'validation-failed \"field\" 'name \"is required\")");
    assert_eq!(err.kind, Symbol::new("validation-failed"));
    assert_eq!(err.message, "field 'name is required");
    assert!(err.is_user_kind());
    assert_eq!(
        err.to_string(),
        "err:1: validation-failed: field 'name is required"
    );
}

#[test]
fn test_error_location_is_the_failing_form() {
    let rt = runtime();
    let results = rt
        .eval_source("(set 'a 1)\n\n(defun f ()\n  (car 1))\n(f)")
        .unwrap();
    let last = results.last().unwrap();
    match last {
        Value::Error(err) => {
            assert_eq!(err.location.as_ref().map(|l| l.line), Some(5));
            assert!(err.to_string().starts_with("err:5: lisp:car:"));
        }
        other => panic!("expected error, got {}", other),
    }
}

#[test]
fn test_locations_can_be_disabled() {
    let rt = Runtime::with_config(RuntimeConfig {
        print_errors_with_location: false,
        ..RuntimeConfig::default()
    });
    let err = rt.evaluate("nope").unwrap_err();
    assert!(err.location.is_none());
    assert_eq!(err.to_string(), "unbound symbol: nope");
}

#[test]
fn test_failed_forms_leave_no_partial_bindings() {
    let rt = runtime();
    let _ = rt.evaluate("(set 'x (car 1))");
    assert!(rt.evaluate("x").is_err());
    let _ = rt.evaluate("(let ((y 1)) (error 'stop \"here\"))");
    assert!(rt.evaluate("y").is_err());
}

#[test]
fn test_errors_inside_higher_order_builtins_propagate() {
    let err = eval_err("(select 'list (lambda (x) (car x)) '(1 2))");
    assert_eq!(err.kind, Symbol::new("TypeError"));
    assert_eq!(err.function.as_deref(), Some("lisp:car"));
}

#[test]
fn test_malformed_special_forms() {
    for code in ["(if)", "(lambda)", "(let (1) 1)", "(defun)", "(lambda (x x) x)", "(cond ())"] {
        assert!(runtime().evaluate(code).is_err(), "{} should fail", code);
    }
    // a clause without a body yields its test value
    assert_eq!(runtime().evaluate("(cond (5))").unwrap(), Value::Integer(5));
}

#[test]
fn test_default_runtime_reports_deep_recursion_as_an_error() {
    let rt = Runtime::new();
    rt.evaluate("(defun down (n) (if (= n 0) 0 (down (- n 1))))")
        .unwrap();
    assert_eq!(rt.evaluate("(down 900)").unwrap(), Value::Integer(0));
    let err = rt.evaluate("(down 2000)").unwrap_err();
    assert_eq!(err.kind, Symbol::new("StackOverflowError"));
    assert_eq!(rt.evaluate("(down 10)").unwrap(), Value::Integer(0));
}

#[test]
fn test_recursive_macro_expansion_is_bounded() {
    let rt = runtime();
    rt.evaluate("(defmacro m () '(m))").unwrap();
    let err = rt.evaluate("(m)").unwrap_err();
    assert_eq!(err.kind, Symbol::new("StackOverflowError"));
}

#[test]
fn test_stray_argument_after_optional_and_key() {
    let err = eval_err("((lambda (&optional o &key k) (list o k)) :k 1)");
    assert_eq!(err.kind, Symbol::new("ArityError"));
    assert_eq!(err.function.as_deref(), Some("lambda"));
    assert_eq!(err.message, "unexpected positional argument 1 after &key");
}
