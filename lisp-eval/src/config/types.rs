use serde::{Deserialize, Serialize};

/// Evaluator settings. Every field has a default, so an empty TOML
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Nested function calls allowed before `StackOverflowError`
    pub max_call_depth: usize,
    /// Name used in `source:line` error prefixes
    pub source_name: String,
    /// Prefix errors surfaced at top level with their location
    pub print_errors_with_location: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            source_name: "stdin".to_string(),
            print_errors_with_location: true,
        }
    }
}
