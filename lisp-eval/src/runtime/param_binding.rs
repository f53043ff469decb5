// Parameter lists and argument binding for closures and macros

use crate::ast::Symbol;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::{Arity, List, Value};

pub const OPTIONAL_MARKER: &str = "&optional";
pub const REST_MARKER: &str = "&rest";
pub const KEY_MARKER: &str = "&key";

/// Names bound by a call, in binding order.
pub type BoundParams = Vec<(Symbol, Value)>;

/// `(req... &optional opt... &rest rest &key key...)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSpec {
    pub required: Vec<Symbol>,
    pub optional: Vec<Symbol>,
    pub rest: Option<Symbol>,
    pub keys: Vec<Symbol>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Required,
    Optional,
    Rest,
    AfterRest,
    Key,
}

impl ParamSpec {
    /// Parses a parameter list form. `function` names the form being
    /// defined, for error messages.
    pub fn parse(function: &str, params: &Value) -> RuntimeResult<ParamSpec> {
        let list = params.as_list().ok_or_else(|| {
            RuntimeError::type_error(function, "parameter list", params)
        })?;

        let mut spec = ParamSpec::default();
        let mut section = Section::Required;
        for item in list.iter() {
            let sym = match item {
                Value::Symbol(sym) if !sym.is_keyword() => sym,
                other => {
                    return Err(RuntimeError::invalid_argument(
                        function,
                        format!("invalid parameter: {}", other),
                    ))
                }
            };
            let misplaced = || {
                RuntimeError::invalid_argument(
                    function,
                    format!("misplaced {} in parameter list", sym),
                )
            };
            match sym.name() {
                OPTIONAL_MARKER => {
                    if section != Section::Required {
                        return Err(misplaced());
                    }
                    section = Section::Optional;
                }
                REST_MARKER => {
                    if !matches!(section, Section::Required | Section::Optional) {
                        return Err(misplaced());
                    }
                    section = Section::Rest;
                }
                KEY_MARKER => {
                    if matches!(section, Section::Key | Section::Rest) {
                        return Err(misplaced());
                    }
                    section = Section::Key;
                }
                _ => {
                    if spec.names().any(|name| name == sym) {
                        return Err(RuntimeError::invalid_argument(
                            function,
                            format!("duplicate parameter: {}", sym),
                        ));
                    }
                    match section {
                        Section::Required => spec.required.push(sym.clone()),
                        Section::Optional => spec.optional.push(sym.clone()),
                        Section::Rest => {
                            spec.rest = Some(sym.clone());
                            section = Section::AfterRest;
                        }
                        Section::AfterRest => return Err(misplaced()),
                        Section::Key => spec.keys.push(sym.clone()),
                    }
                }
            }
        }
        if section == Section::Rest {
            return Err(RuntimeError::invalid_argument(
                function,
                "&rest requires a parameter name",
            ));
        }
        Ok(spec)
    }

    /// Every declared name in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &Symbol> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .chain(self.rest.iter())
            .chain(self.keys.iter())
    }

    pub fn arity(&self) -> Arity {
        let required = self.required.len();
        if self.rest.is_some() || !self.keys.is_empty() {
            Arity::Variadic(required)
        } else if self.optional.is_empty() {
            Arity::Fixed(required)
        } else {
            Arity::Range(required, required + self.optional.len())
        }
    }

    /// The parameter list as a form, for printing closures.
    pub fn to_value(&self) -> Value {
        let mut items: Vec<Value> = self.required.iter().cloned().map(Value::Symbol).collect();
        if !self.optional.is_empty() {
            items.push(Value::symbol(OPTIONAL_MARKER));
            items.extend(self.optional.iter().cloned().map(Value::Symbol));
        }
        if let Some(rest) = &self.rest {
            items.push(Value::symbol(REST_MARKER));
            items.push(Value::Symbol(rest.clone()));
        }
        if !self.keys.is_empty() {
            items.push(Value::symbol(KEY_MARKER));
            items.extend(self.keys.iter().cloned().map(Value::Symbol));
        }
        if items.is_empty() {
            Value::Nil
        } else {
            Value::list(items)
        }
    }
}

fn keyword_token(value: &Value) -> Option<&Symbol> {
    match value.unquoted() {
        Value::Symbol(sym) if sym.is_keyword() => Some(sym),
        _ => None,
    }
}

/// Binds call arguments to a parameter spec.
///
/// Required names consume one argument each, then optional names consume
/// what is left in order. With `&key` declared, the trailing arguments are
/// scanned left to right: a keyword followed by a value is a key pair (the
/// first occurrence of a declared key wins, undeclared keys are skipped) and
/// any other token goes to `&rest`.
pub fn bind_parameters(
    spec: &ParamSpec,
    function: &str,
    args: Vec<Value>,
) -> RuntimeResult<BoundParams> {
    let actual = args.len();
    if actual < spec.required.len() {
        return Err(RuntimeError::arity(function, spec.arity(), actual));
    }

    let mut bound: BoundParams = Vec::with_capacity(spec.names().count());
    let mut args = args.into_iter();
    for name in &spec.required {
        // length checked above
        let value = args.next().unwrap_or(Value::Nil);
        bound.push((name.clone(), value));
    }
    for name in &spec.optional {
        bound.push((name.clone(), args.next().unwrap_or(Value::Nil)));
    }

    let remaining: Vec<Value> = args.collect();
    if spec.keys.is_empty() {
        match &spec.rest {
            Some(rest) => bound.push((rest.clone(), Value::List(List::from_values(remaining)))),
            None if !remaining.is_empty() => {
                return Err(RuntimeError::arity(function, spec.arity(), actual))
            }
            None => {}
        }
        return Ok(bound);
    }

    let mut key_values: Vec<Option<Value>> = vec![None; spec.keys.len()];
    let mut rest_values = Vec::new();
    let mut tokens = remaining.into_iter();
    while let Some(token) = tokens.next() {
        if let Some(keyword) = keyword_token(&token) {
            let value = tokens.next().ok_or_else(|| RuntimeError::MalformedArguments {
                function: function.to_string(),
                message: format!("missing value for keyword {}", keyword),
            })?;
            let name = keyword.keyword_name().unwrap_or_default();
            if let Some(i) = spec.keys.iter().position(|k| k.name() == name) {
                if key_values[i].is_none() {
                    key_values[i] = Some(value);
                }
            }
        } else if spec.rest.is_some() {
            rest_values.push(token);
        } else {
            return Err(RuntimeError::MalformedArguments {
                function: function.to_string(),
                message: format!("unexpected positional argument {} after &key", token),
            });
        }
    }

    if let Some(rest) = &spec.rest {
        bound.push((rest.clone(), Value::List(List::from_values(rest_values))));
    }
    for (name, value) in spec.keys.iter().zip(key_values) {
        bound.push((name.clone(), value.unwrap_or(Value::Nil)));
    }
    Ok(bound)
}
