// lisp-repl: evaluate a file, a string, stdin or an interactive session
// Every top-level result is printed in canonical form

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

use lisp_eval::input_handling::{
    detect_input_source, read_input_content, InputConfig, InputSource,
};
use lisp_eval::{Runtime, RuntimeConfig, Value};

#[derive(Parser, Debug)]
#[command(name = "lisp-repl")]
#[command(about = "Evaluate lisp source from a file, a string, stdin or interactively")]
struct Args {
    /// Source file to evaluate
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Source string to evaluate
    #[arg(short, long)]
    eval: Option<String>,

    /// TOML runtime configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if !run(args)? {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "lisp_eval=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns false when the input ended on an error.
fn run(args: Args) -> Result<bool> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    let source = detect_input_source(&args.file, &args.eval)?;
    let input_config = match source {
        InputSource::Interactive => {
            config.source_name = "repl".to_string();
            return run_interactive(Runtime::with_config(config));
        }
        InputSource::File => match args.file {
            Some(path) => InputConfig::from_file(path, args.verbose),
            None => anyhow::bail!("--file is required for file input"),
        },
        InputSource::String => match args.eval {
            Some(text) => InputConfig::from_string(text, args.verbose),
            None => anyhow::bail!("--eval is required for string input"),
        },
        InputSource::Pipe => InputConfig::from_pipe(args.verbose),
    };

    let input = read_input_content(&input_config)?;
    let runtime = Runtime::with_config(config);
    let results = runtime.eval_named_source(&input.source_name, &input.content)?;
    Ok(print_results(&results))
}

fn run_interactive(runtime: Runtime) -> Result<bool> {
    let mut editor = DefaultEditor::new().context("failed to create line editor")?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "lisp> " } else { "...   " };
        match editor.readline(prompt) {
            Ok(line) => {
                if buffer.is_empty() && matches!(line.trim(), "quit" | "exit") {
                    break;
                }
                buffer.push_str(&line);
                buffer.push('\n');
                if needs_more_input(&buffer) {
                    continue;
                }
                let input = std::mem::take(&mut buffer);
                if input.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input.trim_end());
                match runtime.eval_source(&input) {
                    Ok(results) => {
                        print_results(&results);
                    }
                    Err(err) => eprintln!("{}", err.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) => buffer.clear(),
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("reading input"),
        }
    }
    Ok(true)
}

/// Prints each result, errors in red on stderr. Returns false if the last
/// result is an error.
fn print_results(results: &[Value]) -> bool {
    for value in results {
        match value {
            Value::Error(err) => eprintln!("{}", format!("{:#}", err).red()),
            other => println!("{}", other),
        }
    }
    !matches!(results.last(), Some(Value::Error(_)))
}

/// True while `text` has an unclosed list, vector or string.
fn needs_more_input(text: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
    }
    in_string || depth > 0
}
