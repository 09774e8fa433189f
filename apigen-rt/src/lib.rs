//! Runtime support for apigen-generated dispatch layers.
//!
//! Generated modules import everything they need from this crate: the form
//! decoder, the typed input map, the map validator that consumes the
//! canonical rule templates, the JSON response envelope and the small
//! primitives behind the auth and panic middlewares.
//!
//! `http` and `tracing` are re-exported so a generated module compiles with
//! `apigen-rt` as its only extra dependency.
pub mod context;
pub mod form;
pub mod guard;
pub mod input;
pub mod response;
pub mod validate;

pub use http;
pub use tracing;

pub use context::Context;
pub use form::{parse_form, FormError, FormValues};
pub use guard::{constant_time_eq, panic_message};
pub use input::{input_map, to_input_value, InputError, InputField, InputMap, InputValue, Kind};
pub use response::{business_status, map_error, respond, respond_error, ApiError, Envelope};
pub use validate::{validate_map, FieldError, ValidationErrors};
