//! Map validator for canonical rule templates.
//!
//! A template pairs each external key with a comma-joined rule expression
//! such as `required,type(int),range(0|128)`. The expression `-` disables
//! validation for its key. Error messages follow the `<key>: <reason>`
//! layout that the error translation table in [`crate::response`] is keyed
//! on, so the wording here must not drift.
use crate::input::{InputMap, InputValue, Kind};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{key}: {message}")]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

/// All failures of one `validate_map` call, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join(&self.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

/// One parsed clause of a rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule<'a> {
    Required,
    Type(Kind),
    In(Vec<&'a str>),
    MinStringLength(usize),
    MaxStringLength(usize),
    Range { min: Option<i64>, max: Option<i64> },
    Unknown,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FieldError {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self { key: key.to_string(), message: message.into() }
    }

    fn rejected(key: &str, value: &InputValue, clause: &str) -> Self {
        Self::new(key, format!("{value} does not validate as {clause}"))
    }
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validates decoded inputs against a rule template.
///
/// - A key missing from `inputs` fails only when its rules include
///   `required`.
/// - A zero value (`""` or `0`) is checked against `required` alone.
/// - Otherwise clauses run in order and the first failing clause is the one
///   reported for that key.
/// - Input keys that the template does not mention are rejected.
pub fn validate_map(inputs: &InputMap, template: &[(&str, &str)]) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for (key, expression) in template {
        if *expression == "-" {
            continue;
        }
        let clauses = split_clauses(expression);
        let required = clauses.contains(&"required");

        let Some(value) = inputs.get(key) else {
            if required {
                errors.push(FieldError::new(key, "required field missing"));
            }
            continue;
        };

        if value.is_zero() {
            if required {
                errors.push(FieldError::new(key, "non zero value required"));
            }
            continue;
        }

        if let Some(clause) = clauses.iter().find(|clause| !check(&parse_rule(clause), value)) {
            errors.push(FieldError::rejected(key, value, clause));
        }
    }

    for key in inputs.keys() {
        if !template.iter().any(|(k, _)| *k == key) {
            errors.push(FieldError::new(key, "all map keys has to be present in the validation map"));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(ValidationErrors(errors)) }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Splits on commas outside parentheses.
fn join(errors: &[FieldError]) -> String {
    errors.iter().map(FieldError::to_string).collect::<Vec<_>>().join(";")
}

fn split_clauses(expression: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(expression[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(expression[start..].trim());
    out.retain(|clause| !clause.is_empty());
    out
}

fn parse_rule(clause: &str) -> Rule<'_> {
    if clause == "required" {
        return Rule::Required;
    }
    let Some((name, args)) = clause
        .strip_suffix(')')
        .and_then(|head| head.split_once('('))
    else {
        return Rule::Unknown;
    };
    match name {
        "type" => Kind::from_name(args).map_or(Rule::Unknown, Rule::Type),
        "in" => Rule::In(args.split('|').collect()),
        "minstringlength" => args.parse().map_or(Rule::Unknown, Rule::MinStringLength),
        "maxstringlength" => args.parse().map_or(Rule::Unknown, Rule::MaxStringLength),
        "range" => parse_range(args).unwrap_or(Rule::Unknown),
        _ => Rule::Unknown,
    }
}

fn parse_range(args: &str) -> Option<Rule<'static>> {
    let (min, max) = args.split_once('|')?;
    let bound = |s: &str| -> Option<Option<i64>> {
        if s.is_empty() { Some(None) } else { s.parse().ok().map(Some) }
    };
    Some(Rule::Range { min: bound(min)?, max: bound(max)? })
}

fn check(rule: &Rule<'_>, value: &InputValue) -> bool {
    match rule {
        Rule::Required => !value.is_zero(),
        Rule::Type(kind) => value.matches_kind(*kind),
        Rule::In(allowed) => {
            let text = value.to_string();
            allowed.iter().any(|candidate| *candidate == text)
        }
        Rule::MinStringLength(min) => value.to_string().chars().count() >= *min,
        Rule::MaxStringLength(max) => value.to_string().chars().count() <= *max,
        Rule::Range { min, max } => {
            let number = match value {
                InputValue::Int(n) => *n,
                InputValue::String(s) => match s.parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => return false,
                },
            };
            min.is_none_or(|min| number >= min) && max.is_none_or(|max| number <= max)
        }
        Rule::Unknown => false,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
