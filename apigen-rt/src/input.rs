//! Typed decoding of form values.
//!
//! `InputField` descriptors are emitted inline by the generator, one per
//! record field, in declaration order. `input_map` turns the raw form into an
//! ordered map of typed values that the validator and the record constructor
//! read from.
use std::fmt;

use indexmap::IndexMap;

use crate::form::FormValues;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Scalar field kinds understood by generated handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int,
    Uint64,
}

/// Decoding instructions for one form key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputField {
    pub param_name: &'static str,
    pub default: &'static str,
    pub kind: Kind,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    String(String),
    /// Holds both `int` and `uint64` fields.
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The message text is matched verbatim by the error translation table.
    #[error("!strconv.Atoi(sv)")]
    NotAnInteger { param: String, value: String },
}

/// Decoded inputs keyed by external parameter name, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputMap {
    values: IndexMap<String, InputValue>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Kind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Uint64 => "uint64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Kind::String),
            "int" => Some(Kind::Int),
            "uint64" => Some(Kind::Uint64),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InputValue {
    /// Zero values are `""` and `0`.
    pub fn is_zero(&self) -> bool {
        match self {
            InputValue::String(s) => s.is_empty(),
            InputValue::Int(n) => *n == 0,
        }
    }

    pub fn matches_kind(&self, kind: Kind) -> bool {
        matches!(
            (self, kind),
            (InputValue::String(_), Kind::String)
                | (InputValue::Int(_), Kind::Int)
                | (InputValue::Int(_), Kind::Uint64)
        )
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::String(s) => f.write_str(s),
            InputValue::Int(n) => write!(f, "{n}"),
        }
    }
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: InputValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&InputValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes a string value; absent or non-string keys yield `""`.
    pub fn take_string(&mut self, key: &str) -> String {
        match self.values.shift_remove(key) {
            Some(InputValue::String(s)) => s,
            _ => String::new(),
        }
    }

    /// Removes an integer value; absent or non-integer keys yield `0`.
    pub fn take_int(&mut self, key: &str) -> i64 {
        match self.values.shift_remove(key) {
            Some(InputValue::Int(n)) => n,
            _ => 0,
        }
    }

    /// Like `take_int`, reinterpreting the decoded `i64` as `u64`.
    ///
    /// `uint64` fields are decoded exactly like `int` fields; negative input
    /// is not rejected here, only by whatever rules the field carries.
    pub fn take_uint64(&mut self, key: &str) -> u64 {
        self.take_int(key) as u64
    }
}

/// Decodes one form key.
///
/// A missing key and an empty value are treated alike: the default is used
/// when `has_default`, otherwise the result is `Ok(None)`.
pub fn to_input_value(
    param_name: &str,
    default: &str,
    kind: Kind,
    has_default: bool,
    form: &FormValues,
) -> Result<Option<InputValue>, InputError> {
    let raw = match form.get(param_name) {
        Some(value) if !value.is_empty() => value,
        _ if has_default => default,
        _ => return Ok(None),
    };

    match kind {
        Kind::String => Ok(Some(InputValue::String(raw.to_string()))),
        Kind::Int | Kind::Uint64 => raw
            .parse::<i64>()
            .map(|n| Some(InputValue::Int(n)))
            .map_err(|_| InputError::NotAnInteger {
                param: param_name.to_string(),
                value: raw.to_string(),
            }),
    }
}

/// Decodes every field in order. Absent values leave no key behind so the
/// validator can tell "missing" apart from "empty"; the first decoding error
/// aborts.
pub fn input_map(fields: &[InputField], form: &FormValues) -> Result<InputMap, InputError> {
    let mut out = InputMap::new();
    for field in fields {
        let value = to_input_value(
            field.param_name,
            field.default,
            field.kind,
            field.has_default,
            form,
        )?;
        if let Some(value) = value {
            out.insert(field.param_name, value);
        }
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
