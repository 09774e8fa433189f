//! Primitives behind the generated auth and panic middlewares.
use std::any::Any;

use subtle::ConstantTimeEq;

/// Compares two byte strings without short-circuiting on the first
/// mismatching byte. Only a length mismatch exits early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
