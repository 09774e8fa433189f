//! Strongly-typed IR for codegen.
//!
//! Built once by [`crate::lower`], linked once, then only read. Everything
//! derives `Serialize` so `--dump-ir` can print it.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Location;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Scalar kinds a record field may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Int,
    Uint64,
}

/// Parsed `apivalidator` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidatorMeta {
    /// At least one clause was seen.
    pub parsed: bool,
    pub required: bool,
    pub param_name: String,
    pub enum_values: Vec<String>,
    pub default: String,
    pub is_min: bool,
    pub min: i64,
    pub is_max: bool,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub raw_tag: String,
    pub meta: ValidatorMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    /// The struct also declares fields without any tag.
    pub has_untagged_fields: bool,
    pub location: Location,
}

/// `apigen:api {...}` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDirective {
    pub url: String,
    pub auth: bool,
    /// Empty means any verb.
    pub method: String,
}

/// How a handler takes the request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextArg {
    ByRef,
    ByValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub receiver_name: String,
    pub handler_name: String,
    pub argument_name: String,
    pub argument_record_name: String,
    pub argument_by_ref: bool,
    pub context: Option<ContextArg>,
    pub result_type_name: String,
    pub directive: MethodDirective,
    /// Index into [`Ir::records`]; set by linking.
    pub linked_record: Option<usize>,
    pub location: Location,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ir {
    pub module: String,
    pub methods: Vec<MethodDescriptor>,
    pub records: Vec<RecordDescriptor>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FieldKind {
    /// Maps a Rust type name to a field kind.
    pub fn from_rust_type(name: &str) -> Option<Self> {
        match name {
            "String" => Some(FieldKind::String),
            "i64" => Some(FieldKind::Int),
            "u64" => Some(FieldKind::Uint64),
            _ => None,
        }
    }

    /// Canonical name used in rule expressions.
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Uint64 => "uint64",
        }
    }

    /// Path of the matching `apigen_rt::Kind` variant in emitted code.
    pub const fn runtime_variant(self) -> &'static str {
        match self {
            FieldKind::String => "Kind::String",
            FieldKind::Int => "Kind::Int",
            FieldKind::Uint64 => "Kind::Uint64",
        }
    }

    /// `InputMap` accessor that moves a decoded value of this kind out.
    pub const fn take_method(self) -> &'static str {
        match self {
            FieldKind::String => "take_string",
            FieldKind::Int => "take_int",
            FieldKind::Uint64 => "take_uint64",
        }
    }
}

impl ValidatorMeta {
    pub fn has_default(&self) -> bool {
        !self.default.is_empty()
    }
}

impl MethodDirective {
    pub fn has_method(&self) -> bool {
        !self.method.is_empty()
    }
}

impl Ir {
    /// Record a method was linked to.
    pub fn linked_record(&self, method: &MethodDescriptor) -> Option<&RecordDescriptor> {
        method.linked_record.and_then(|index| self.records.get(index))
    }

    /// Methods grouped by receiver, both in order of first appearance.
    pub fn receivers(&self) -> IndexMap<&str, Vec<&MethodDescriptor>> {
        let mut out: IndexMap<&str, Vec<&MethodDescriptor>> = IndexMap::new();
        for method in &self.methods {
            out.entry(method.receiver_name.as_str()).or_default().push(method);
        }
        out
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
