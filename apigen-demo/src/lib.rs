//! A small user service whose HTTP layer is generated by `apigen` at build
//! time from the annotations in [`api`].
pub mod api;

pub use api::{MyApi, OtherApi};
