//! Response validators for the resources the server under test exposes.
//!
//! All of them are pure with respect to their input and report problems
//! as structured values; malformed server output must never be able to
//! crash the pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;

use crate::configuration::constants::paths::PROC_MEMINFO;

lazy_static! {
    static ref MEMINFO_KEY: Regex = Regex::new(r"^([^:\s]+)").expect("Regex compilation error");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    LoadAvg,
    MemInfo,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::LoadAvg => write!(f, "loadavg"),
            ResourceKind::MemInfo => write!(f, "meminfo"),
        }
    }
}

/// A structural problem in a response body: which key failed and what
/// was expected of it, not just a boolean.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    Json { detail: String, body: String },
    NotAnObject { found: String },
    KeyCount { expected: usize, found: usize },
    MissingKey { key: String },
    NotInteger { key: String },
    LoadAvgShape { detail: String },
    Callback { detail: String },
    Source { detail: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::Json { detail, body } => {
                write!(f, "invalid JSON object ({}), received: {}", detail, body)
            }
            ValidationError::NotAnObject { found } => {
                write!(f, "expected a JSON object, found {}", found)
            }
            ValidationError::KeyCount { expected, found } => {
                write!(f, "improper number of data items: expected {}, found {}", expected, found)
            }
            ValidationError::MissingKey { key } => write!(f, "{} element missing", key),
            ValidationError::NotInteger { key } => {
                write!(f, "value of {} is not coercible to an integer", key)
            }
            ValidationError::LoadAvgShape { detail } => write!(f, "loadavg entry malformed: {}", detail),
            ValidationError::Callback { detail } => write!(f, "callback wrapping incorrect: {}", detail),
            ValidationError::Source { detail } => {
                write!(f, "cannot read authoritative meminfo source: {}", detail)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_object(body: &str) -> Result<Map<String, Value>, ValidationError> {
    let data: Value = serde_json::from_str(body.trim()).map_err(|e| ValidationError::Json {
        detail: e.to_string(),
        body: body.to_owned(),
    })?;
    match data {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::NotAnObject {
            found: json_type_name(&other).to_owned(),
        }),
    }
}

fn integer_coercible(value: &Value) -> bool {
    match value {
        Value::Number(number) => {
            number.is_i64()
                || number.is_u64()
                || number.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        Value::String(text) => text.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => text.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// A well-formed loadavg body has exactly the three expected keys, with
/// `loadavg` holding exactly three numeric entries.
pub fn check_loadavg(body: &str) -> Result<(), ValidationError> {
    let data = parse_object(body)?;
    if data.len() != 3 {
        return Err(ValidationError::KeyCount {
            expected: 3,
            found: data.len(),
        });
    }
    for key in &["total_threads", "running_threads"] {
        let value = data.get(*key).ok_or_else(|| ValidationError::MissingKey {
            key: (*key).to_owned(),
        })?;
        if !integer_coercible(value) {
            return Err(ValidationError::NotInteger {
                key: (*key).to_owned(),
            });
        }
    }
    let loadavg = data.get("loadavg").ok_or_else(|| ValidationError::MissingKey {
        key: "loadavg".to_owned(),
    })?;
    let entries = loadavg.as_array().ok_or_else(|| ValidationError::LoadAvgShape {
        detail: format!("expected an array, found {}", json_type_name(loadavg)),
    })?;
    if entries.len() != 3 {
        return Err(ValidationError::LoadAvgShape {
            detail: format!("expected 3 entries, found {}", entries.len()),
        });
    }
    for entry in entries {
        if !numeric(entry) {
            return Err(ValidationError::LoadAvgShape {
                detail: format!("non-numeric entry {}", entry),
            });
        }
    }
    Ok(())
}

/// Validates a meminfo body against the live authoritative listing.
///
/// The source is re-read on every call; caching it would let the check
/// drift from the state the server is supposed to be reporting.
pub fn check_meminfo(body: &str) -> Result<(), ValidationError> {
    let source = fs::read_to_string(PROC_MEMINFO).map_err(|e| ValidationError::Source {
        detail: e.to_string(),
    })?;
    check_meminfo_against(body, &source)
}

pub fn check_meminfo_against(body: &str, source: &str) -> Result<(), ValidationError> {
    let data = parse_object(body)?;
    for line in source.lines() {
        let key = match MEMINFO_KEY.captures(line).and_then(|caps| caps.get(1)) {
            Some(found) => found.as_str(),
            None => continue,
        };
        let value = data.get(key).ok_or_else(|| ValidationError::MissingKey {
            key: key.to_owned(),
        })?;
        if !integer_coercible(value) {
            return Err(ValidationError::NotInteger { key: key.to_owned() });
        }
    }
    Ok(())
}

/// A JSONP body must be exactly `callback(inner)`. Whitespace is ignored
/// only around the two literal comparisons; the inner JSON is handed to
/// the validator for `kind` untouched.
pub fn check_callback(body: &str, callback: &str, kind: ResourceKind) -> Result<(), ValidationError> {
    let trimmed = body.trim();
    let without_close = trimmed.strip_suffix(')').ok_or_else(|| ValidationError::Callback {
        detail: "missing close parenthesis".to_owned(),
    })?;
    let after_name = without_close
        .strip_prefix(callback)
        .ok_or_else(|| ValidationError::Callback {
            detail: format!(
                "callback incorrect, was: '{}', expected: '{}('",
                trimmed.chars().take(callback.len() + 1).collect::<String>(),
                callback
            ),
        })?;
    let inner = after_name
        .trim_start()
        .strip_prefix('(')
        .ok_or_else(|| ValidationError::Callback {
            detail: "missing open parenthesis after callback name".to_owned(),
        })?;
    match kind {
        ResourceKind::LoadAvg => check_loadavg(inner),
        ResourceKind::MemInfo => check_meminfo(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_LOADAVG: &str =
        r#"{"total_threads": 128, "loadavg": [0.12, 0.34, 0.56], "running_threads": 3}"#;

    #[test]
    fn test_loadavg_accepts_well_formed_body() {
        assert!(check_loadavg(GOOD_LOADAVG).is_ok());
    }

    #[test]
    fn test_loadavg_accepts_numeric_strings() {
        let body = r#"{"total_threads": "128", "loadavg": ["0.1", "0.2", "0.3"], "running_threads": "3"}"#;
        assert!(check_loadavg(body).is_ok());
    }

    #[test]
    fn test_loadavg_tolerates_surrounding_whitespace() {
        let body = format!("\r\n  {}  \n", GOOD_LOADAVG);
        assert!(check_loadavg(&body).is_ok());
    }

    #[test]
    fn test_loadavg_rejects_garbage() {
        match check_loadavg("<html>oops</html>") {
            Err(ValidationError::Json { body, .. }) => assert!(body.contains("oops")),
            other => panic!("expected a Json error, got {:?}", other),
        }
    }

    #[test]
    fn test_loadavg_rejects_extra_keys() {
        let body = r#"{"total_threads": 1, "loadavg": [0, 0, 0], "running_threads": 1, "bogus": 0}"#;
        assert_eq!(
            check_loadavg(body),
            Err(ValidationError::KeyCount { expected: 3, found: 4 })
        );
    }

    #[test]
    fn test_loadavg_rejects_missing_key() {
        let body = r#"{"total_threads": 1, "loadavg": [0, 0, 0], "sleeping_threads": 1}"#;
        assert_eq!(
            check_loadavg(body),
            Err(ValidationError::MissingKey {
                key: "running_threads".to_owned()
            })
        );
    }

    #[test]
    fn test_loadavg_rejects_short_array() {
        let body = r#"{"total_threads": 1, "loadavg": [0.1, 0.2], "running_threads": 1}"#;
        assert!(matches!(
            check_loadavg(body),
            Err(ValidationError::LoadAvgShape { .. })
        ));
    }

    #[test]
    fn test_loadavg_rejects_non_numeric_entries() {
        let body = r#"{"total_threads": 1, "loadavg": [0.1, "high", 0.2], "running_threads": 1}"#;
        assert!(matches!(
            check_loadavg(body),
            Err(ValidationError::LoadAvgShape { .. })
        ));
    }

    #[test]
    fn test_loadavg_rejects_non_object() {
        assert!(matches!(
            check_loadavg("[1, 2, 3]"),
            Err(ValidationError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_meminfo_matches_authoritative_listing() {
        let source = "MemTotal:       16302000 kB\nMemFree:         8200000 kB\n";
        let body = r#"{"MemTotal": 16302000, "MemFree": "8200000", "Extra": 1}"#;
        assert!(check_meminfo_against(body, source).is_ok());
    }

    #[test]
    fn test_meminfo_rejects_missing_source_key() {
        let source = "MemTotal: 1\nMemFree: 2\n";
        let body = r#"{"MemTotal": 1}"#;
        assert_eq!(
            check_meminfo_against(body, source),
            Err(ValidationError::MissingKey {
                key: "MemFree".to_owned()
            })
        );
    }

    #[test]
    fn test_meminfo_rejects_non_integer_value() {
        let source = "MemTotal: 1\n";
        let body = r#"{"MemTotal": "lots"}"#;
        assert_eq!(
            check_meminfo_against(body, source),
            Err(ValidationError::NotInteger {
                key: "MemTotal".to_owned()
            })
        );
    }

    #[test]
    fn test_meminfo_skips_blank_source_lines() {
        let source = "\nMemTotal: 1\n\n";
        let body = r#"{"MemTotal": 1}"#;
        assert!(check_meminfo_against(body, source).is_ok());
    }

    #[test]
    fn test_callback_wraps_loadavg() {
        let body = format!("callbackmethod({})", GOOD_LOADAVG);
        assert!(check_callback(&body, "callbackmethod", ResourceKind::LoadAvg).is_ok());
    }

    #[test]
    fn test_callback_tolerates_outer_whitespace_only() {
        let body = format!("  callbackmethod ({})  \n", GOOD_LOADAVG);
        assert!(check_callback(&body, "callbackmethod", ResourceKind::LoadAvg).is_ok());
    }

    #[test]
    fn test_callback_rejects_wrong_name() {
        let body = format!("other({})", GOOD_LOADAVG);
        assert!(matches!(
            check_callback(&body, "callbackmethod", ResourceKind::LoadAvg),
            Err(ValidationError::Callback { .. })
        ));
    }

    #[test]
    fn test_callback_rejects_missing_parenthesis() {
        let body = format!("callbackmethod({}", GOOD_LOADAVG);
        assert!(matches!(
            check_callback(&body, "callbackmethod", ResourceKind::LoadAvg),
            Err(ValidationError::Callback { .. })
        ));
    }

    #[test]
    fn test_callback_rejects_bad_inner_json() {
        let body = "callbackmethod(not json)";
        assert!(matches!(
            check_callback(body, "callbackmethod", ResourceKind::LoadAvg),
            Err(ValidationError::Json { .. })
        ));
    }
}
