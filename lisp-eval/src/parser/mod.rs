use pest::Parser;

use crate::ast::{Form, SourceLocation};
use crate::runtime::values::Value;

pub mod errors;
mod expressions;
mod utils;

pub use errors::ParseError;
use expressions::build_expression;

// Define the parser struct using the grammar file
#[derive(pest_derive::Parser)]
#[grammar = "lisp.pest"] // Path relative to src/
pub struct LispParser;

/// Reads every top-level form in `text`. Each form remembers the line it
/// starts on, under `source_name`.
pub fn parse(source_name: &str, text: &str) -> Result<Vec<Form>, ParseError> {
    let mut pairs = LispParser::parse(Rule::program, text)
        .map_err(|e| ParseError::from_pest(source_name, e))?;
    let program = match pairs.next() {
        Some(program) => program,
        None => return Ok(Vec::new()),
    };

    program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|pair| {
            let (line, _) = pair.line_col();
            let value = build_expression(source_name, pair)?;
            Ok(Form {
                value,
                location: SourceLocation::new(source_name, line),
            })
        })
        .collect()
}

/// Reads exactly one expression.
pub fn parse_expression(text: &str) -> Result<Value, ParseError> {
    let mut forms = parse("expression", text)?;
    if forms.len() != 1 {
        return Err(ParseError::ExpressionCount(forms.len()));
    }
    Ok(forms.remove(0).value)
}
