//! Annotation grammars.
//!
//! Two small languages live in doc comments of the input file:
//! - `directive`: the `apigen:api {json}` line on handler methods that names
//!   the route, the auth requirement and the verb;
//! - `tag`: struct tags on record fields (`apivalidator:"required,min=10"`),
//!   including the validator clause list.
pub mod directive;
pub mod tag;

pub use directive::{has_directive, parse_directive, DirectiveError, DIRECTIVE_PREFIX};
pub use tag::{has_serialization_tag, is_struct_tag, lookup, parse_validator, TagError, VALIDATOR_TAG};
