// Input handling for the lisp-repl binary
// Resolves where source text comes from: a file, a string, stdin or a terminal

use clap::ValueEnum;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use thiserror::Error;

/// Input source types supported by the REPL binary
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// Line-edited interactive session
    Interactive,
    /// Evaluate a string given on the command line
    String,
    /// Evaluate a file
    File,
    /// Evaluate everything read from stdin
    Pipe,
}

#[derive(Debug, Clone)]
pub struct InputConfig {
    pub source: InputSource,
    pub file_path: Option<PathBuf>,
    pub string_content: Option<String>,
    pub verbose: bool,
}

impl InputConfig {
    pub fn from_file(file_path: PathBuf, verbose: bool) -> Self {
        Self {
            source: InputSource::File,
            file_path: Some(file_path),
            string_content: None,
            verbose,
        }
    }

    pub fn from_string(content: String, verbose: bool) -> Self {
        Self {
            source: InputSource::String,
            file_path: None,
            string_content: Some(content),
            verbose,
        }
    }

    pub fn from_pipe(verbose: bool) -> Self {
        Self {
            source: InputSource::Pipe,
            file_path: None,
            string_content: None,
            verbose,
        }
    }

    pub fn interactive(verbose: bool) -> Self {
        Self {
            source: InputSource::Interactive,
            file_path: None,
            string_content: None,
            verbose,
        }
    }
}

/// Source text together with the name used in error locations
#[derive(Debug)]
pub struct InputContent {
    pub content: String,
    pub source_name: String,
}

/// Reads the whole input for a non-interactive source.
pub fn read_input_content(config: &InputConfig) -> Result<InputContent, InputError> {
    let input = match config.source {
        InputSource::File => {
            let path = config
                .file_path
                .as_ref()
                .ok_or(InputError::MissingFileArgument)?;
            let content = fs::read_to_string(path).map_err(|error| InputError::FileRead {
                path: path.clone(),
                error,
            })?;
            InputContent {
                content,
                source_name: path.display().to_string(),
            }
        }
        InputSource::String => InputContent {
            content: config
                .string_content
                .clone()
                .ok_or(InputError::MissingStringArgument)?,
            source_name: "eval".to_string(),
        },
        InputSource::Pipe => {
            let mut content = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut content)
                .map_err(InputError::StdinRead)?;
            InputContent {
                content,
                source_name: "stdin".to_string(),
            }
        }
        InputSource::Interactive => return Err(InputError::InteractiveNotSupported),
    };
    if config.verbose {
        tracing::info!(
            source = %input.source_name,
            bytes = input.content.len(),
            "read input"
        );
    }
    Ok(input)
}

/// Picks the input source from the command line arguments. With neither a
/// file nor a string, stdin is read when it is not a terminal.
pub fn detect_input_source(
    file_path: &Option<PathBuf>,
    string_content: &Option<String>,
) -> Result<InputSource, InputError> {
    let stdin_is_terminal = io::stdin().is_terminal();
    resolve_input_source(file_path.is_some(), string_content.is_some(), stdin_is_terminal)
}

fn resolve_input_source(
    has_file: bool,
    has_string: bool,
    stdin_is_terminal: bool,
) -> Result<InputSource, InputError> {
    match (has_file, has_string) {
        (true, true) => Err(InputError::MultipleInputSources),
        (true, false) => Ok(InputSource::File),
        (false, true) => Ok(InputSource::String),
        (false, false) if stdin_is_terminal => Ok(InputSource::Interactive),
        (false, false) => Ok(InputSource::Pipe),
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("--file argument required for file input")]
    MissingFileArgument,

    #[error("--eval argument required for string input")]
    MissingStringArgument,

    #[error("error reading file '{}': {error}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("error reading from stdin: {0}")]
    StdinRead(#[source] io::Error),

    #[error("interactive input cannot be read ahead")]
    InteractiveNotSupported,

    #[error("use only one of --file and --eval")]
    MultipleInputSources,
}
