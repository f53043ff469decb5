// Error handling for the lisp runtime
// Errors are values: `RuntimeError` is what `?` propagates, `ErrorValue` is
// the data form carried by `Value::Error` and surfaced to the host.

use std::fmt;
use thiserror::Error;

use crate::ast::{SourceLocation, Symbol};
use crate::runtime::values::Value;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Kind symbols raised by the evaluator and builtins. Anything else is a
/// user kind raised through `error`.
pub const BUILTIN_ERROR_KINDS: &[&str] = &[
    "UnboundSymbolError",
    "RebindConstantError",
    "ArityError",
    "TypeError",
    "ConversionError",
    "NotCallableError",
    "ArgumentError",
    "ArithmeticError",
    "StackOverflowError",
];

/// Runtime errors that can occur while evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Symbol not bound in any frame of the chain
    #[error("unbound symbol: {0}")]
    UnboundSymbol(Symbol),

    /// `set` on a binding registered as constant
    #[error("{function}: cannot rebind constant: {symbol}")]
    RebindConstant { function: String, symbol: Symbol },

    /// Wrong number of arguments
    #[error("{function}: expected {expected} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Right count, wrong shape: a dangling keyword or a stray positional
    /// argument in the `&key` region
    #[error("{function}: {message}")]
    MalformedArguments { function: String, message: String },

    /// Wrong type for operation
    #[error("{operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    /// A value whose textual or numeric form cannot become the target type
    #[error("{operation}: cannot convert {value} to {target}")]
    ConversionError {
        operation: String,
        value: String,
        target: String,
    },

    #[error("not callable: {0}")]
    NotCallable(String),

    /// Right type, invalid value (bad index, malformed parameter list, ...)
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("{function}: division by zero")]
    DivisionByZero { function: String },

    #[error("maximum call depth exceeded: {0}")]
    StackOverflow(usize),

    /// An error value raised by user code or re-raised after being surfaced
    #[error("{0}")]
    Raised(ErrorValue),
}

impl RuntimeError {
    pub fn type_error(operation: &str, expected: &str, actual: &Value) -> RuntimeError {
        RuntimeError::TypeError {
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> RuntimeError {
        RuntimeError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn arity(function: &str, expected: impl fmt::Display, actual: usize) -> RuntimeError {
        RuntimeError::ArityMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual,
        }
    }

    /// The kind symbol this error carries once it becomes a value.
    pub fn kind(&self) -> Symbol {
        let name = match self {
            RuntimeError::UnboundSymbol(_) => "UnboundSymbolError",
            RuntimeError::RebindConstant { .. } => "RebindConstantError",
            RuntimeError::ArityMismatch { .. } | RuntimeError::MalformedArguments { .. } => {
                "ArityError"
            }
            RuntimeError::TypeError { .. } => "TypeError",
            RuntimeError::ConversionError { .. } => "ConversionError",
            RuntimeError::NotCallable(_) => "NotCallableError",
            RuntimeError::InvalidArgument { .. } => "ArgumentError",
            RuntimeError::DivisionByZero { .. } => "ArithmeticError",
            RuntimeError::StackOverflow(_) => "StackOverflowError",
            RuntimeError::Raised(err) => return err.kind.clone(),
        };
        Symbol::new(name)
    }

    /// The function the error is attributed to, if any.
    pub fn function(&self) -> Option<&str> {
        match self {
            RuntimeError::RebindConstant { function, .. }
            | RuntimeError::ArityMismatch { function, .. }
            | RuntimeError::MalformedArguments { function, .. }
            | RuntimeError::InvalidArgument { function, .. }
            | RuntimeError::DivisionByZero { function } => Some(function),
            RuntimeError::TypeError { operation, .. }
            | RuntimeError::ConversionError { operation, .. } => Some(operation),
            RuntimeError::Raised(err) => err.function.as_deref(),
            RuntimeError::UnboundSymbol(_)
            | RuntimeError::NotCallable(_)
            | RuntimeError::StackOverflow(_) => None,
        }
    }

    /// The message without the function prefix.
    pub fn message(&self) -> String {
        match self {
            RuntimeError::RebindConstant { symbol, .. } => {
                format!("cannot rebind constant: {}", symbol)
            }
            RuntimeError::ArityMismatch {
                expected, actual, ..
            } => format!("expected {} arguments, got {}", expected, actual),
            RuntimeError::TypeError {
                expected, actual, ..
            } => format!("expected {}, got {}", expected, actual),
            RuntimeError::ConversionError { value, target, .. } => {
                format!("cannot convert {} to {}", value, target)
            }
            RuntimeError::InvalidArgument { message, .. }
            | RuntimeError::MalformedArguments { message, .. } => message.clone(),
            RuntimeError::DivisionByZero { .. } => "division by zero".to_string(),
            RuntimeError::Raised(err) => err.message.clone(),
            other => other.to_string(),
        }
    }

    pub fn into_error_value(self) -> ErrorValue {
        match self {
            RuntimeError::Raised(err) => err,
            other => ErrorValue {
                kind: other.kind(),
                message: other.message(),
                function: other.function().map(str::to_string),
                location: None,
                cause: None,
            },
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Error(self.clone().into_error_value())
    }

    /// Attaches a location unless the error already carries one.
    pub fn located(self, location: &SourceLocation) -> ErrorValue {
        let mut err = self.into_error_value();
        if err.location.is_none() {
            err.location = Some(location.clone());
        }
        err
    }
}

impl From<ErrorValue> for RuntimeError {
    fn from(err: ErrorValue) -> Self {
        RuntimeError::Raised(err)
    }
}

/// The data form of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub kind: Symbol,
    pub message: String,
    pub function: Option<String>,
    pub location: Option<SourceLocation>,
    pub cause: Option<Box<ErrorValue>>,
}

impl ErrorValue {
    pub fn new(kind: Symbol, message: impl Into<String>) -> Self {
        ErrorValue {
            kind,
            message: message.into(),
            function: None,
            location: None,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: ErrorValue) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// User kinds are printed before the message, builtin kinds are not.
    pub fn is_user_kind(&self) -> bool {
        !BUILTIN_ERROR_KINDS.contains(&self.kind.name())
    }

    /// This error followed by its causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorValue> {
        std::iter::successors(Some(self), |err| err.cause.as_deref())
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        if self.is_user_kind() {
            write!(f, "{}: ", self.kind)?;
        }
        if let Some(function) = &self.function {
            write!(f, "{}: ", function)?;
        }
        f.write_str(&self.message)?;
        // `{:#}` also prints the cause chain
        if f.alternate() {
            for cause in self.chain().skip(1) {
                write!(f, "\ncaused by: {}", cause)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebind_constant_prints_with_function_prefix() {
        let err = RuntimeError::RebindConstant {
            function: "lisp:set".to_string(),
            symbol: Symbol::new("true"),
        };
        let located = err.located(&SourceLocation::new("test", 1));
        assert_eq!(located.kind, Symbol::new("RebindConstantError"));
        assert_eq!(
            located.to_string(),
            "test:1: lisp:set: cannot rebind constant: true"
        );
    }

    #[test]
    fn unbound_symbol_has_no_function() {
        let err = RuntimeError::UnboundSymbol(Symbol::new("a"));
        assert_eq!(err.function(), None);
        assert_eq!(
            err.located(&SourceLocation::new("test", 1)).to_string(),
            "test:1: unbound symbol: a"
        );
    }

    #[test]
    fn user_kinds_are_printed() {
        let err = ErrorValue::new(Symbol::new("test-error"), "test message");
        assert!(err.is_user_kind());
        assert_eq!(err.to_string(), "test-error: test message");
    }

    #[test]
    fn located_keeps_the_first_location() {
        let mut inner = ErrorValue::new(Symbol::new("boom"), "x");
        inner.location = Some(SourceLocation::new("lib", 3));
        let err = RuntimeError::from(inner).located(&SourceLocation::new("main", 9));
        assert_eq!(err.location, Some(SourceLocation::new("lib", 3)));
    }

    #[test]
    fn alternate_display_walks_the_cause_chain() {
        let err = ErrorValue::new(Symbol::new("outer"), "a")
            .with_cause(ErrorValue::new(Symbol::new("inner"), "b"));
        assert_eq!(err.chain().count(), 2);
        assert_eq!(format!("{:#}", err), "outer: a\ncaused by: inner: b");
    }
}
