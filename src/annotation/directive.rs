//! `apigen:api` method directives.
//!
//! ```text
//! /// apigen:api {"url": "/user/create", "auth": true, "method": "POST"}
//! ```
//!
//! The directive starts at the first doc line that begins with the literal
//! prefix. Everything after the prefix is read as one JSON object, which may
//! span lines; prose after the object is ignored.
use crate::ir::MethodDirective;

pub const DIRECTIVE_PREFIX: &str = "apigen:api";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("missing `apigen:api` prefix")]
    MissingPrefix,
    #[error("at JSON path {path} → {message}")]
    Json { path: String, message: String },
    #[error("`url` must not be empty")]
    EmptyUrl,
}

pub fn has_directive(doc: &str) -> bool {
    doc.contains(DIRECTIVE_PREFIX)
}

/// Parses the directive carried by a method's doc text.
pub fn parse_directive(doc: &str) -> Result<MethodDirective, DirectiveError> {
    let rest = directive_body(doc).ok_or(DirectiveError::MissingPrefix)?;

    let de = &mut serde_json::Deserializer::from_str(rest.trim_start());
    let directive = serde_path_to_error::deserialize::<_, MethodDirective>(de)
        .map_err(|err| DirectiveError::Json {
            path: err.path().to_string(),
            message: err.into_inner().to_string(),
        })?;

    if directive.url.is_empty() {
        return Err(DirectiveError::EmptyUrl);
    }
    Ok(directive)
}

fn directive_body(doc: &str) -> Option<&str> {
    let mut offset = 0;
    for line in doc.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with(DIRECTIVE_PREFIX) {
            return Some(&doc[offset + indent + DIRECTIVE_PREFIX.len()..]);
        }
        offset += line.len();
    }
    None
}
