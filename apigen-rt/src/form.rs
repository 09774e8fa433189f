//! Form decoding (`application/x-www-form-urlencoded`).
use http::{header, Method, Request};
use indexmap::IndexMap;
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Multi-valued form data. Keys keep first-seen order; values keep arrival
/// order, so `get` returns the value that arrived first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: IndexMap<String, Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("invalid form body: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// True when the key was sent at all, even with an empty value.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|xs| xs.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn extend_urlencoded(&mut self, input: &[u8]) {
        for (key, value) in form_urlencoded::parse(input) {
            self.append(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (key, value) in iter {
            out.append(key, value);
        }
        out
    }
}

/// Collects the form values of a request.
///
/// For `POST`, `PUT` and `PATCH` requests with a form content type the body
/// pairs come first, then the query pairs. Any other request only
/// contributes its query string.
pub fn parse_form<B: AsRef<[u8]>>(req: &Request<B>) -> Result<FormValues, FormError> {
    let mut form = FormValues::new();

    if carries_form_body(req) {
        let body = req.body().as_ref();
        std::str::from_utf8(body)?;
        form.extend_urlencoded(body);
    }

    if let Some(query) = req.uri().query() {
        form.extend_urlencoded(query.as_bytes());
    }

    Ok(form)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn carries_form_body<B>(req: &Request<B>) -> bool {
    if ![Method::POST, Method::PUT, Method::PATCH].contains(req.method()) {
        return false;
    }
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
