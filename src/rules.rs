//! Validator-expression compiler.
//!
//! Lowers a field's [`ValidatorMeta`] into the canonical rule string that
//! `apigen_rt::validate_map` consumes, e.g.
//! `required,type(string),minstringlength(10)`.
//!
//! Clause order is fixed: `required`, `type(..)`, `in(..)`, then bounds.
//! Strings get `minstringlength`/`maxstringlength`; integers get a single
//! `range(min|max)` with either side left empty when unset. A field without
//! a parsed validator compiles to `-`.
use indexmap::IndexMap;

use crate::ir::{FieldDescriptor, FieldKind, RecordDescriptor, ValidatorMeta};

pub fn validator_expression(kind: FieldKind, meta: &ValidatorMeta) -> String {
    if !meta.parsed {
        return "-".to_string();
    }

    let mut clauses = Vec::new();
    if meta.required {
        clauses.push("required".to_string());
    }
    clauses.push(format!("type({})", kind.as_str()));
    if !meta.enum_values.is_empty() {
        clauses.push(format!("in({})", meta.enum_values.join("|")));
    }
    match kind {
        FieldKind::String => {
            if meta.is_min {
                clauses.push(format!("minstringlength({})", meta.min));
            }
            if meta.is_max {
                clauses.push(format!("maxstringlength({})", meta.max));
            }
        }
        FieldKind::Int | FieldKind::Uint64 => match (meta.is_min, meta.is_max) {
            (true, true) => clauses.push(format!("range({}|{})", meta.min, meta.max)),
            (true, false) => clauses.push(format!("range({}|)", meta.min)),
            (false, true) => clauses.push(format!("range(|{})", meta.max)),
            (false, false) => {}
        },
    }
    clauses.join(",")
}

/// Form key of a field: `paramname` when set, else the lowercased name.
pub fn external_key(name: &str, meta: &ValidatorMeta) -> String {
    if meta.param_name.is_empty() {
        name.to_lowercase()
    } else {
        meta.param_name.clone()
    }
}

impl FieldDescriptor {
    pub fn external_key(&self) -> String {
        external_key(&self.name, &self.meta)
    }

    pub fn validator_expression(&self) -> String {
        validator_expression(self.kind, &self.meta)
    }
}

impl RecordDescriptor {
    /// External key → rule expression, in field order.
    pub fn template_map(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .map(|field| (field.external_key(), field.validator_expression()))
            .collect()
    }
}
