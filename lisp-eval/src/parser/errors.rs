use pest::iterators::Pair;
use thiserror::Error;

use super::Rule;

/// Errors raised while reading source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The grammar rejected the input
    #[error("{source_name}:{line}:{column}: syntax error: {message}")]
    Syntax {
        source_name: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{source_name}:{line}:{column}: invalid escape sequence: {sequence}")]
    InvalidEscapeSequence {
        source_name: String,
        line: usize,
        column: usize,
        sequence: String,
    },

    /// A token the grammar accepts but no value can hold (e.g. an
    /// integer out of range)
    #[error("{source_name}:{line}:{column}: invalid literal: {text}")]
    InvalidLiteral {
        source_name: String,
        line: usize,
        column: usize,
        text: String,
    },

    /// `parse_expression` expects exactly one expression
    #[error("expected a single expression, found {0}")]
    ExpressionCount(usize),
}

impl ParseError {
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::InvalidEscapeSequence { line, .. }
            | ParseError::InvalidLiteral { line, .. } => Some(*line),
            ParseError::ExpressionCount(_) => None,
        }
    }

    pub(super) fn from_pest(source_name: &str, err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        ParseError::Syntax {
            source_name: source_name.to_string(),
            line,
            column,
            message: err.variant.message().to_string(),
        }
    }

    pub(super) fn invalid_literal(source_name: &str, pair: &Pair<Rule>) -> Self {
        let (line, column) = pair.line_col();
        ParseError::InvalidLiteral {
            source_name: source_name.to_string(),
            line,
            column,
            text: pair.as_str().to_string(),
        }
    }

    pub(super) fn invalid_escape(source_name: &str, pair: &Pair<Rule>, sequence: String) -> Self {
        let (line, column) = pair.line_col();
        ParseError::InvalidEscapeSequence {
            source_name: source_name.to_string(),
            line,
            column,
            sequence,
        }
    }
}
