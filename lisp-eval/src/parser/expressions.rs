use pest::iterators::Pair;

use super::errors::ParseError;
use super::utils::unescape;
use super::Rule;
use crate::runtime::values::{List, Value};

/// Builds the code value for one expression.
///
/// Reader macros expand here: `'x` becomes a quote, `[a b]` a quoted list,
/// `` `x `` / `,x` / `,@x` the quasiquote forms, `#'f` `(function f)` and
/// `#^x` `(expr x)`. `()` reads as nil.
pub(super) fn build_expression(source_name: &str, pair: Pair<Rule>) -> Result<Value, ParseError> {
    match pair.as_rule() {
        Rule::quoted => Ok(Value::quote(build_inner(source_name, pair)?)),
        Rule::quasiquoted => wrap(source_name, "quasiquote", pair),
        Rule::unquoted => wrap(source_name, "unquote", pair),
        Rule::unquote_splicing => wrap(source_name, "unquote-splicing", pair),
        Rule::function_ref => wrap(source_name, "function", pair),
        Rule::expr_shorthand => wrap(source_name, "expr", pair),
        Rule::list => {
            let items = build_items(source_name, pair)?;
            if items.is_empty() {
                Ok(Value::Nil)
            } else {
                Ok(Value::list(items))
            }
        }
        Rule::vector => {
            let items = build_items(source_name, pair)?;
            Ok(Value::quote(Value::List(List::from_values(items))))
        }
        Rule::raw_string => {
            let content = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Value::String(content.to_string()))
        }
        Rule::string => {
            let content = pair.clone().into_inner().next().map(|p| p.as_str()).unwrap_or("");
            unescape(content)
                .map(Value::String)
                .map_err(|seq| ParseError::invalid_escape(source_name, &pair, seq))
        }
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ParseError::invalid_literal(source_name, &pair)),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ParseError::invalid_literal(source_name, &pair)),
        Rule::symbol => Ok(Value::symbol(pair.as_str())),
        _ => Err(ParseError::invalid_literal(source_name, &pair)),
    }
}

fn build_inner(source_name: &str, pair: Pair<Rule>) -> Result<Value, ParseError> {
    let outer = pair.clone();
    match pair.into_inner().next() {
        Some(inner) => build_expression(source_name, inner),
        None => Err(ParseError::invalid_literal(source_name, &outer)),
    }
}

fn build_items(source_name: &str, pair: Pair<Rule>) -> Result<Vec<Value>, ParseError> {
    pair.into_inner()
        .map(|item| build_expression(source_name, item))
        .collect()
}

/// `(head inner)`
fn wrap(source_name: &str, head: &str, pair: Pair<Rule>) -> Result<Value, ParseError> {
    let inner = build_inner(source_name, pair)?;
    Ok(Value::list(vec![Value::symbol(head), inner]))
}
