//! Struct tags on record fields.
//!
//! A field's raw tag is a space-separated list of `key:"value"` pairs, written
//! as a doc line on the field:
//!
//! ```text
//! /// apivalidator:"required,min=10" json:"login"
//! pub login: String,
//! ```
//!
//! The `apivalidator` value is a comma-separated clause list understood by
//! [`parse_validator`].
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::ValidatorMeta;

pub const VALIDATOR_TAG: &str = "apivalidator";

static TAG_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([^\s:"]+):"((?:[^"\\]|\\.)*)""#).expect("static regex"));

static TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?:[^\s:"]+:"(?:[^"\\]|\\.)*"\s*)+$"#).expect("static regex")
});

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("no value for `{0}`")]
    MissingValue(String),
    #[error("`{key}` expects a decimal integer, got `{value}`")]
    InvalidInteger { key: String, value: String },
    #[error("`enum` needs at least one value")]
    EmptyEnum,
    #[error("min ({min}) is greater than max ({max})")]
    InvertedBounds { min: i64, max: i64 },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// True when the whole line is made of `key:"value"` pairs.
pub fn is_struct_tag(line: &str) -> bool {
    TAG_LINE.is_match(line)
}

/// Unquoted value of the first `key:"value"` pair.
pub fn lookup(raw_tag: &str, key: &str) -> Option<String> {
    TAG_PAIR
        .captures_iter(raw_tag)
        .find(|caps| &caps[1] == key)
        .map(|caps| unquote(&caps[2]))
}

/// `json:"<non-empty>"` or any `serde:"..."` pair.
pub fn has_serialization_tag(raw_tag: &str) -> bool {
    lookup(raw_tag, "json").is_some_and(|value| !value.is_empty())
        || lookup(raw_tag, "serde").is_some()
}

/// Parses the `apivalidator` value of a raw tag.
///
/// A missing or empty value yields the default (unparsed) metadata. Unknown
/// keys are accepted and ignored.
pub fn parse_validator(raw_tag: &str) -> Result<ValidatorMeta, TagError> {
    let mut meta = ValidatorMeta::default();
    let Some(body) = lookup(raw_tag, VALIDATOR_TAG).filter(|body| !body.trim().is_empty()) else {
        return Ok(meta);
    };

    for token in body.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value)),
            None => (token, None),
        };
        match (key, value) {
            ("required", _) => meta.required = true,
            (key, None) => return Err(TagError::MissingValue(key.to_string())),
            ("paramname", Some(value)) => meta.param_name = value.to_string(),
            ("enum", Some(value)) => {
                if value.is_empty() {
                    return Err(TagError::EmptyEnum);
                }
                meta.enum_values = value.split('|').map(str::to_string).collect();
            }
            ("default", Some(value)) => meta.default = value.to_string(),
            ("min", Some(value)) => {
                meta.min = parse_bound(key, value)?;
                meta.is_min = true;
            }
            ("max", Some(value)) => {
                meta.max = parse_bound(key, value)?;
                meta.is_max = true;
            }
            _ => {}
        }
    }

    if meta.is_min && meta.is_max && meta.min > meta.max {
        return Err(TagError::InvertedBounds { min: meta.min, max: meta.max });
    }
    meta.parsed = true;
    Ok(meta)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_bound(key: &str, value: &str) -> Result<i64, TagError> {
    value.trim().parse().map_err(|_| TagError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn unquote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn validator(body: &str) -> ValidatorMeta {
        parse_validator(&format!(r#"apivalidator:"{body}""#)).unwrap()
    }

    #[test]
    fn lookup_finds_first_pair() {
        let raw = r#"json:"login" apivalidator:"required" json:"other""#;
        assert_eq!(lookup(raw, "json").as_deref(), Some("login"));
        assert_eq!(lookup(raw, "apivalidator").as_deref(), Some("required"));
        assert_eq!(lookup(raw, "xml"), None);
    }

    #[test]
    fn lookup_unescapes_quotes() {
        let raw = r#"serde:"rename = \"id\"""#;
        assert_eq!(lookup(raw, "serde").as_deref(), Some(r#"rename = "id""#));
    }

    #[test]
    fn struct_tag_lines() {
        assert!(is_struct_tag(r#"apivalidator:"required,min=10""#));
        assert!(is_struct_tag(r#"  json:"id"  apivalidator:"min=1" "#));
        assert!(!is_struct_tag("The user's login."));
        assert!(!is_struct_tag(r#"see apivalidator:"required" below"#));
        assert!(!is_struct_tag(""));
    }

    #[test]
    fn serialization_tags() {
        assert!(has_serialization_tag(r#"json:"id""#));
        assert!(has_serialization_tag(r#"serde:"rename = \"id\"""#));
        assert!(!has_serialization_tag(r#"json:"""#));
        assert!(!has_serialization_tag(r#"apivalidator:"required""#));
    }

    #[test]
    fn required() {
        let meta = validator("required");
        assert!(meta.parsed);
        assert!(meta.required);

        let meta = validator("required,min=10");
        assert!(meta.required);
        assert!(meta.is_min);
        assert_eq!(meta.min, 10);
    }

    #[test]
    fn param_name() {
        assert_eq!(validator("paramname=full_name").param_name, "full_name");
        assert_eq!(validator("paramname=account_name").param_name, "account_name");
    }

    #[test]
    fn enum_and_default() {
        let meta = validator("enum=user|moderator|admin,default=user");
        assert_eq!(meta.enum_values, ["user", "moderator", "admin"]);
        assert_eq!(meta.default, "user");
        assert!(meta.has_default());
    }

    #[test]
    fn bounds() {
        let meta = validator("min=0,max=128");
        assert_eq!((meta.is_min, meta.min, meta.is_max, meta.max), (true, 0, true, 128));

        let meta = validator("min=1");
        assert_eq!((meta.is_min, meta.min, meta.is_max, meta.max), (true, 1, false, 0));
    }

    #[test]
    fn default_next_to_other_keys() {
        assert_eq!(validator("min=1,max=2,default=3,enum=ok|nok").default, "3");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let meta = validator("required,color=blue");
        assert!(meta.parsed);
        assert!(meta.required);
    }

    #[test]
    fn missing_or_empty_tag_is_unparsed() {
        assert_eq!(parse_validator(r#"json:"id""#).unwrap(), ValidatorMeta::default());
        assert!(!parse_validator(r#"apivalidator:"""#).unwrap().parsed);
    }

    #[test]
    fn errors() {
        let parse = |body: &str| parse_validator(&format!(r#"apivalidator:"{body}""#));
        assert_eq!(parse("min"), Err(TagError::MissingValue("min".into())));
        assert_eq!(
            parse("max=lots"),
            Err(TagError::InvalidInteger { key: "max".into(), value: "lots".into() })
        );
        assert_eq!(parse("enum="), Err(TagError::EmptyEnum));
        assert_eq!(parse("min=5,max=1"), Err(TagError::InvertedBounds { min: 5, max: 1 }));
    }
}
