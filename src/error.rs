//! Generation-time errors. Every variant is fatal for the run.
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::annotation::directive::DirectiveError;
use crate::annotation::tag::TagError;

/// `file:line:column` of the declaration an error points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn from_span(file: &str, span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self { file: file.to_string(), line: start.line, column: start.column + 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("failed to read {}: {error}", path.display())]
    Read { path: PathBuf, error: std::io::Error },

    #[error("failed to write {}: {error}", path.display())]
    Write { path: PathBuf, error: std::io::Error },

    #[error("{location}: failed to parse source: {message}")]
    Parse { location: Location, message: String },

    #[error("{location}: unsupported field kind `{kind}` for `{record}.{field}` (expected String, i64 or u64)")]
    UnsupportedKind { location: Location, record: String, field: String, kind: String },

    #[error("{location}: invalid apivalidator tag on `{record}.{field}`: {reason}")]
    InvalidTag { location: Location, record: String, field: String, reason: TagError },

    #[error("{location}: invalid apigen:api directive on `{receiver}::{method}`: {reason}")]
    InvalidDirective { location: Location, receiver: String, method: String, reason: DirectiveError },

    #[error("{location}: unsupported handler signature for `{receiver}::{method}`: {reason}")]
    UnsupportedSignature { location: Location, receiver: String, method: String, reason: String },

    #[error("{location}: `{receiver}::{method}` takes `{record}`, which is not a tagged record in this file")]
    UnresolvedRecord { location: Location, receiver: String, method: String, record: String },
}

impl GenError {
    pub fn parse(file: &str, error: &syn::Error) -> Self {
        GenError::Parse {
            location: Location::from_span(file, error.span()),
            message: error.to_string(),
        }
    }
}
