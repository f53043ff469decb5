// lisp-eval library
// Reader, evaluator and builtin library for a small embeddable Lisp
pub mod ast;
pub mod config;
pub mod input_handling;
pub mod parser;
pub mod runtime;

// Re-export the pieces a host needs to embed the evaluator.
pub use ast::{Form, MapKey, SourceLocation, Symbol};
pub use config::{ConfigError, RuntimeConfig};
pub use parser::{errors::ParseError, parse, parse_expression};
pub use runtime::error::{ErrorValue, RuntimeError, RuntimeResult};
pub use runtime::evaluator::Evaluator;
pub use runtime::values::{Function, List, Value};
pub use runtime::Runtime;
