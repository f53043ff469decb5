// Evaluator - walks code values against an environment chain

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::Form;
use crate::config::RuntimeConfig;
use crate::runtime::environment::Environment;
use crate::runtime::error::{ErrorValue, RuntimeError, RuntimeResult};
use crate::runtime::param_binding::bind_parameters;
use crate::runtime::special_forms;
use crate::runtime::stdlib::StandardLibrary;
use crate::runtime::values::{qualified_builtin_name, Closure, Function, List, Value};

/// Remaining host stack below which evaluation moves to a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each segment allocated when the red zone is reached.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

pub struct Evaluator {
    /// Root frame holding the builtins and every top-level definition.
    pub env: Environment,
    config: RuntimeConfig,
    depth: Cell<usize>,
}

/// Decrements the call depth when a call returns, including on error.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl Evaluator {
    /// Create a new evaluator with the builtin library loaded
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_environment(StandardLibrary::create_global_environment(), config)
    }

    /// Uses `env` as the root frame. The host is responsible for what it holds.
    pub fn with_environment(env: Environment, config: RuntimeConfig) -> Self {
        Evaluator {
            env,
            config,
            depth: Cell::new(0),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Evaluate one top-level form in the root frame. Errors reaching this
    /// level carry the form's location.
    pub fn eval_toplevel(&self, form: &Form) -> Result<Value, ErrorValue> {
        self.depth.set(0);
        self.eval_expr(&form.value, &self.env).map_err(|err| {
            if self.config.print_errors_with_location {
                err.located(&form.location)
            } else {
                err.into_error_value()
            }
        })
    }

    /// Evaluate an expression in the root frame
    pub fn evaluate(&self, expr: &Value) -> RuntimeResult<Value> {
        self.eval_expr(expr, &self.env)
    }

    /// Evaluate an expression in a given environment. The host stack grows on
    /// demand, so nesting is bounded by `max_call_depth` alone.
    pub fn eval_expr(&self, expr: &Value, env: &Environment) -> RuntimeResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expr_inner(expr, env)
        })
    }

    fn eval_expr_inner(&self, expr: &Value, env: &Environment) -> RuntimeResult<Value> {
        match expr {
            Value::Symbol(sym) if sym.is_keyword() => Ok(expr.clone()),
            Value::Symbol(sym) => env.get(sym),
            Value::Quote(inner) => Ok(quote_datum(expr, inner)),
            Value::List(list) => match list.split_first() {
                Some((head, args)) => self.eval_form(head, args, env),
                None => Ok(Value::Nil),
            },
            Value::Error(err) => Err(RuntimeError::Raised(err.clone())),
            _ => Ok(expr.clone()),
        }
    }

    /// Evaluates a sequence, returning the last value or `()` when empty.
    pub fn eval_body(&self, exprs: &[Value], env: &Environment) -> RuntimeResult<Value> {
        let mut result = Value::Nil;
        for expr in exprs {
            result = self.eval_expr(expr, env)?;
        }
        Ok(result)
    }

    pub fn eval_body_list(&self, exprs: &List, env: &Environment) -> RuntimeResult<Value> {
        let mut result = Value::Nil;
        for expr in exprs.iter() {
            result = self.eval_expr(expr, env)?;
        }
        Ok(result)
    }

    fn eval_form(&self, head: &Value, args: &List, env: &Environment) -> RuntimeResult<Value> {
        if let Value::Symbol(sym) = head {
            if let Some(form) = special_forms::lookup(sym) {
                return form(self, args, env);
            }
            if let Some(Value::Macro(mac)) = env.lookup(sym) {
                // held until the expansion has been evaluated too
                let _guard = self.enter()?;
                let expansion = self.expand_macro(&mac, args.to_vec())?;
                return self.eval_expr(&expansion, env);
            }
        }

        let callee = self.eval_expr(head, env)?;
        let mut values = Vec::new();
        for arg in args.iter() {
            values.push(self.eval_expr(arg, env)?);
        }
        self.call_function(callee, values, env)
    }

    /// Applies a callable to already evaluated arguments. A symbol (bare or
    /// quoted) names a function in the root frame.
    pub fn call_function(
        &self,
        callee: Value,
        args: Vec<Value>,
        env: &Environment,
    ) -> RuntimeResult<Value> {
        let _guard = self.enter()?;
        let result = match callee {
            Value::Function(Function::Builtin(builtin)) => {
                if !builtin.arity.accepts(args.len()) {
                    return Err(RuntimeError::arity(
                        &qualified_builtin_name(&builtin.name),
                        &builtin.arity,
                        args.len(),
                    ));
                }
                (builtin.func)(args)?
            }
            Value::Function(Function::BuiltinWithContext(builtin)) => {
                if !builtin.arity.accepts(args.len()) {
                    return Err(RuntimeError::arity(
                        &qualified_builtin_name(&builtin.name),
                        &builtin.arity,
                        args.len(),
                    ));
                }
                (builtin.func)(args, self, env)?
            }
            Value::Function(Function::Closure(closure)) => self.apply_closure(&closure, args)?,
            ref other => match other.as_symbol() {
                Some(sym) if !sym.is_keyword() => {
                    let resolved = env.root().get(sym)?;
                    if resolved.as_symbol().is_some() {
                        return Err(RuntimeError::NotCallable(resolved.to_string()));
                    }
                    return self.call_function(resolved, args, env);
                }
                _ => return Err(RuntimeError::NotCallable(other.to_string())),
            },
        };
        match result {
            Value::Error(err) => Err(RuntimeError::Raised(err)),
            value => Ok(value),
        }
    }

    /// Binds `args` into a fresh frame chained on the captured environment
    /// and evaluates the body there.
    pub fn apply_closure(&self, closure: &Closure, args: Vec<Value>) -> RuntimeResult<Value> {
        let name = closure.error_name();
        let bound = bind_parameters(&closure.params, &name, args)?;
        let frame = Environment::with_parent(&closure.env);
        for (sym, value) in bound {
            frame.define(&sym, value);
        }
        self.eval_body(&closure.body, &frame)
    }

    /// Runs a macro body on unevaluated arguments and returns the expansion.
    /// The caller accounts for the call depth.
    pub fn expand_macro(&self, mac: &Rc<Closure>, args: Vec<Value>) -> RuntimeResult<Value> {
        let expansion = self.apply_closure(mac, args)?;
        tracing::trace!(
            macro_name = %mac.error_name(),
            expansion = %expansion,
            "macro expanded"
        );
        Ok(expansion)
    }

    fn enter(&self) -> RuntimeResult<DepthGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_call_depth {
            tracing::debug!(depth, "maximum call depth exceeded");
            return Err(RuntimeError::StackOverflow(self.config.max_call_depth));
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// The value of `'inner`. One quote level is dropped from self-evaluating
/// data, kept on plain symbols, and a quoted quote is returned as written.
pub fn quote_datum(quoted: &Value, inner: &Value) -> Value {
    match inner {
        Value::Nil => Value::List(List::empty()),
        Value::Symbol(sym) if sym.is_keyword() => inner.clone(),
        Value::Symbol(_) | Value::Quote(_) => quoted.clone(),
        other => other.clone(),
    }
}
