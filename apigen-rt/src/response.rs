//! JSON response envelope, error translation and business error status.
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use http::{header, HeaderValue, Response, StatusCode};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Validator and decoder messages with a friendlier public wording.
static ERROR_MESSAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("login: required field missing", "login must me not empty"),
        ("login: new_m does not validate as minstringlength(10)", "login len must be >= 10"),
        ("age: -1 does not validate as range(0|128)", "age must be >= 0"),
        ("age: 256 does not validate as range(0|128)", "age must be <= 128"),
        (
            "status: adm does not validate as in(user|moderator|admin)",
            "status must be one of [user, moderator, admin]",
        ),
        (
            "class: barbarian does not validate as in(warrior|sorcerer|rouge)",
            "class must be one of [warrior, sorcerer, rouge]",
        ),
        (
            "interface conversion: error is *errors.errorString, not main.ApiError",
            "bad user",
        ),
        ("!strconv.Atoi(sv)", "age must be int"),
    ])
});

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Body of every generated response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
}

/// Error type business methods return to choose the response status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub http_status: StatusCode,
    pub message: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ApiError {
    pub fn new(http_status: StatusCode, message: impl Into<String>) -> Self {
        Self { http_status, message: message.into() }
    }
}

/// Translates a known message; anything else passes through unchanged.
pub fn map_error(message: &str) -> &str {
    ERROR_MESSAGES.get(message).copied().unwrap_or(message)
}

/// `200` with `{"error": "", "response": <value>}`.
pub fn respond<T: Serialize>(value: &T) -> Response<String> {
    let envelope = Envelope { error: String::new(), response: Some(value) };
    match serde_json::to_string(&envelope) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => respond_error(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

/// `status` with `{"error": <mapped message>}`.
pub fn respond_error(status: StatusCode, err: impl fmt::Display) -> Response<String> {
    let message = err.to_string();
    let body = serde_json::json!({ "error": map_error(&message) }).to_string();
    json_response(status, body)
}

/// Status carried by a business error.
///
/// Recognises `ApiError` itself and an `ApiError` boxed as `Box<dyn Error>`
/// (with or without `Send + Sync`); every other error maps to `500`.
pub fn business_status<E: Any>(err: &E) -> StatusCode {
    let any = err as &dyn Any;
    if let Some(api) = any.downcast_ref::<ApiError>() {
        return api.http_status;
    }
    if let Some(boxed) = any.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        if let Some(api) = boxed.downcast_ref::<ApiError>() {
            return api.http_status;
        }
    }
    if let Some(boxed) = any.downcast_ref::<Box<dyn std::error::Error>>() {
        if let Some(api) = boxed.downcast_ref::<ApiError>() {
            return api.http_status;
        }
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

fn json_response(status: StatusCode, body: String) -> Response<String> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
