//! Lisp Runtime System
//!
//! High-level entry points. The evaluation logic lives in the submodules
//! listed below.

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod param_binding;
pub mod printer;
pub mod special_forms;
pub mod stdlib;
pub mod values;


pub use environment::Environment;
pub use error::{ErrorValue, RuntimeError, RuntimeResult};
pub use evaluator::Evaluator;
pub use stdlib::StandardLibrary;
pub use values::{Function, List, Value};

use std::path::Path;

use crate::ast::Symbol;
use crate::config::RuntimeConfig;
use crate::parser::{self, ParseError};

/// An evaluator bound to one persistent root environment, fed with source
/// text.
pub struct Runtime {
    evaluator: Evaluator,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Runtime {
            evaluator: Evaluator::with_config(config),
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn env(&self) -> &Environment {
        &self.evaluator.env
    }

    /// Evaluates every top-level form of `text` in order, one result per
    /// form. Evaluation stops at the first failing form, whose error is the
    /// last value returned.
    pub fn eval_source(&self, text: &str) -> Result<Vec<Value>, ParseError> {
        let source_name = self.evaluator.config().source_name.clone();
        self.eval_named_source(&source_name, text)
    }

    pub fn eval_named_source(
        &self,
        source_name: &str,
        text: &str,
    ) -> Result<Vec<Value>, ParseError> {
        let forms = parser::parse(source_name, text)?;
        let mut results = Vec::with_capacity(forms.len());
        for form in &forms {
            match self.evaluator.eval_toplevel(form) {
                Ok(value) => results.push(value),
                Err(err) => {
                    tracing::debug!(error = %err, "top-level form failed");
                    results.push(Value::Error(err));
                    break;
                }
            }
        }
        Ok(results)
    }

    /// Evaluates `text` and returns the value of its last form (`()` for
    /// empty input). Read and evaluation failures both surface as an
    /// `ErrorValue`.
    pub fn evaluate(&self, text: &str) -> Result<Value, ErrorValue> {
        let results = self.eval_source(text).map_err(parse_error_value)?;
        match results.into_iter().last() {
            Some(Value::Error(err)) => Err(err),
            Some(value) => Ok(value),
            None => Ok(Value::Nil),
        }
    }

    /// Evaluates a source file, named by its path in error locations. A
    /// failure is reported as a `LoadError` caused by the underlying error.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value, ErrorValue> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let load_error = |cause: ErrorValue| {
            ErrorValue::new(Symbol::new("LoadError"), format!("failed to load {}", name))
                .with_cause(cause)
        };
        let text = std::fs::read_to_string(path).map_err(|e| {
            load_error(ErrorValue::new(Symbol::new("IOError"), e.to_string()))
        })?;
        tracing::debug!(path = %name, "loading source file");
        let results = self
            .eval_named_source(&name, &text)
            .map_err(|e| load_error(parse_error_value(e)))?;
        match results.into_iter().last() {
            Some(Value::Error(err)) => Err(load_error(err)),
            Some(value) => Ok(value),
            None => Ok(Value::Nil),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error_value(err: ParseError) -> ErrorValue {
    ErrorValue::new(Symbol::new("ParseError"), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn runtime() -> Runtime {
        Runtime::with_config(RuntimeConfig {
            source_name: "test".to_string(),
            max_call_depth: 100,
            ..RuntimeConfig::default()
        })
    }

    #[test]
    fn results_follow_forms() {
        let rt = runtime();
        let results = rt.eval_source("(set 'a 1) (+ a 1) '(x)").unwrap();
        let printed: Vec<String> = results.iter().map(|v| v.to_string()).collect();
        assert_eq!(printed, vec!["1", "2", "'(x)"]);
    }

    #[test]
    fn evaluation_stops_at_first_error() {
        let rt = runtime();
        let results = rt.eval_source("1\n(car 1 2)\n(set 'never 1)").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1].to_string(),
            "test:2: lisp:car: expected 1 arguments, got 2"
        );
        assert!(rt.env().lookup(&Symbol::new("never")).is_none());
    }

    #[test]
    fn environment_persists_between_calls() {
        let rt = runtime();
        rt.evaluate("(defun double (x) (* 2 x))").unwrap();
        assert_eq!(rt.evaluate("(double 21)").unwrap(), Value::Integer(42));
        assert_eq!(rt.evaluate("").unwrap(), Value::Nil);
    }

    #[test]
    fn parse_errors_surface_as_error_values() {
        let rt = runtime();
        let err = rt.evaluate("(+ 1").unwrap_err();
        assert_eq!(err.kind, Symbol::new("ParseError"));
    }

    #[test]
    fn load_file_wraps_failures() {
        let rt = runtime();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(set 'loaded 7)").unwrap();
        writeln!(file, "(error 'boom \"late\")").unwrap();
        let err = rt.load_file(file.path()).unwrap_err();
        assert_eq!(err.kind, Symbol::new("LoadError"));
        let cause = err.cause.as_deref().unwrap();
        assert_eq!(cause.kind, Symbol::new("boom"));
        assert_eq!(cause.location.as_ref().unwrap().line, 2);
        assert_eq!(rt.evaluate("loaded").unwrap(), Value::Integer(7));
        assert_eq!(err.chain().count(), 2);
    }
}
