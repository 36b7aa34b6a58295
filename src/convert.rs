//! Serialization and shape-sniffing deserialization for problem payloads.
//!
//! Deserialization is a fixed-priority chain of speculative parses: payloads
//! that look like they carry a validation `errors` dictionary are tried as
//! [`ValidationProblem`] first, and anything that fails that shape falls back
//! to plain [`Problem`]. Shape mismatches along the way are values, not
//! errors; only the final fallback surfaces a parse failure.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::problem::{pascal_case, Problem, ProblemDetails, ValidationProblem};

/// Nesting depth cap for incoming problem payloads. Deeper documents are
/// rejected as malformed before any shape detection runs.
const MAX_PARSE_DEPTH: u32 = 32;

/// Casing applied to keys this crate itself writes into a problem's
/// extensions, such as the remapped correlation identifier.
///
/// Standard field names on the wire are always camelCase; this policy exists
/// for callers whose API surface Pascal-cases extension members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `correlationId` style. The default.
    #[default]
    CamelCase,
    /// `CorrelationId` style.
    PascalCase,
}

impl NamingPolicy {
    /// Applies the policy to a camelCase key.
    pub fn key(&self, key: &str) -> String {
        match self {
            NamingPolicy::CamelCase => key.to_owned(),
            NamingPolicy::PascalCase => pascal_case(key),
        }
    }
}

/// Why a speculative parse rejected a payload.
///
/// This never crosses the crate boundary from the sniffing path; it is only
/// surfaced (as a [`Error::MalformedProblem`] reason) when the *final* parse
/// attempt fails, or from the typed [`parse_as`] path.
#[derive(Debug, thiserror::Error)]
pub enum ShapeMismatch {
    /// The payload root was not a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON type name of the root value.
        found: &'static str,
    },

    /// A standard field held a value of the wrong JSON type.
    #[error("invalid value for field `{field}`")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
    },
}

/// A problem shape that can be speculatively parsed from a raw payload.
///
/// [`Problem`] and [`ValidationProblem`] are the built-in implementations;
/// applications with bespoke problem contracts implement this for their own
/// types and read them through [`parse_as`] or
/// [`ResponseExt::read_problem_as`](crate::ResponseExt::read_problem_as).
pub trait ProblemShape: Sized {
    /// Cheap textual pre-check deciding whether a full parse is worth
    /// attempting. May return false positives; must be fast.
    fn looks_like(raw: &str) -> bool;

    /// Structural parse from an already-decoded JSON document. `Err` means
    /// "not this shape" and carries no side effects.
    fn from_value(value: &Value) -> std::result::Result<Self, ShapeMismatch>;
}

impl ProblemShape for Problem {
    fn looks_like(_raw: &str) -> bool {
        true
    }

    fn from_value(value: &Value) -> std::result::Result<Self, ShapeMismatch> {
        let object = value.as_object().ok_or(ShapeMismatch::NotAnObject {
            found: json_type_name(value),
        })?;

        let mut problem = Problem::default();
        for (key, entry) in object {
            // standard field names match case-insensitively; when a payload
            // carries several case variants of one field the last one wins,
            // and none of them leak into the extensions
            if key.eq_ignore_ascii_case("type") {
                problem.type_url = string_field(entry, "type")?;
            } else if key.eq_ignore_ascii_case("title") {
                problem.title = string_field(entry, "title")?;
            } else if key.eq_ignore_ascii_case("status") {
                problem.status = status_field(entry)?;
            } else if key.eq_ignore_ascii_case("detail") {
                problem.detail = string_field(entry, "detail")?;
            } else if key.eq_ignore_ascii_case("instance") {
                problem.instance = string_field(entry, "instance")?;
            } else {
                problem.extensions.insert(key.clone(), entry.clone());
            }
        }

        problem.flatten_nested_extensions();
        Ok(problem)
    }
}

impl ProblemShape for ValidationProblem {
    /// A case-insensitive substring check for the quoted `"errors"` key
    /// against the raw text. False positives (the literal appearing inside a
    /// string value) are harmless because the structural parse rejects them.
    fn looks_like(raw: &str) -> bool {
        contains_quoted_key(raw, "errors")
    }

    fn from_value(value: &Value) -> std::result::Result<Self, ShapeMismatch> {
        let mut problem = Problem::from_value(value)?;

        let errors_key = problem
            .extensions
            .keys()
            .find(|key| key.eq_ignore_ascii_case("errors"))
            .cloned();
        let errors = match errors_key.and_then(|key| problem.extensions.shift_remove(&key)) {
            None | Some(Value::Null) => IndexMap::new(),
            Some(value) => errors_field(&value)?,
        };

        Ok(ValidationProblem { problem, errors })
    }
}

/// Parses a raw problem payload into the closed [`ProblemDetails`] set.
///
/// When the raw text contains a quoted `errors` key (case-insensitive), the
/// validation shape is attempted first and accepted
/// only if it parses cleanly with a non-empty `errors` dictionary; everything
/// else lands on plain [`Problem`]. Malformed JSON, payloads nested deeper
/// than 32 levels, and documents that fail even the fallback shape are
/// [`Error::MalformedProblem`].
///
/// # Examples
///
/// ```
/// use mishap::convert::parse;
///
/// let details = parse(r#"{"title":"Nope","status":400,"errors":{"name":["required"]}}"#)?;
/// assert!(details.is_validation());
///
/// let details = parse(r#"{"title":"Nope","status":400,"errors":"just a string"}"#)?;
/// assert!(!details.is_validation());
/// # Ok::<(), mishap::Error>(())
/// ```
pub fn parse(raw: &str) -> Result<ProblemDetails> {
    let value = parse_value(raw)?;

    if ValidationProblem::looks_like(raw) {
        // a mismatch here is the expected "wrong shape" outcome, recovered by
        // the generic fallback below
        if let Ok(validation) = ValidationProblem::from_value(&value) {
            if !validation.errors.is_empty() {
                return Ok(ProblemDetails::Validation(validation));
            }
        }
    }

    let problem = Problem::from_value(&value).map_err(|mismatch| malformed(raw, &mismatch))?;
    Ok(ProblemDetails::Generic(problem))
}

/// Parses a raw payload directly as `T`, bypassing shape sniffing.
///
/// This is the typed-read path for applications that declare their own
/// [`ProblemShape`]. Unlike [`parse`], no emptiness check is applied, so a
/// [`ValidationProblem`] with an empty `errors` dictionary parses as-is.
pub fn parse_as<T: ProblemShape>(raw: &str) -> Result<T> {
    let value = parse_value(raw)?;
    T::from_value(&value).map_err(|mismatch| malformed(raw, &mismatch))
}

/// Serializes a problem to JSON text.
///
/// Emission is deterministic: camelCase standard fields in declaration order
/// (`type`, `title`, `status`, `detail`, `instance`), null fields omitted,
/// then extension entries in insertion order. [`ValidationProblem`] emits its
/// `errors` dictionary last, after the extensions; existing consumers depend
/// on that wire order, so it is load-bearing.
pub fn to_json<T: Serialize>(problem: &T) -> Result<String> {
    serde_json::to_string(problem).map_err(|e| Error::Serialization(e.to_string()))
}

fn parse_value(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).map_err(|e| Error::MalformedProblem {
        raw_response: raw.to_owned(),
        reason: e.to_string(),
    })?;

    if depth_exceeds(&value, MAX_PARSE_DEPTH) {
        return Err(Error::MalformedProblem {
            raw_response: raw.to_owned(),
            reason: format!("payload exceeds the maximum nesting depth of {MAX_PARSE_DEPTH}"),
        });
    }

    Ok(value)
}

fn malformed(raw: &str, mismatch: &ShapeMismatch) -> Error {
    Error::MalformedProblem {
        raw_response: raw.to_owned(),
        reason: mismatch.to_string(),
    }
}

fn depth_exceeds(value: &Value, budget: u32) -> bool {
    if budget == 0 {
        return true;
    }
    match value {
        Value::Object(map) => map.values().any(|v| depth_exceeds(v, budget - 1)),
        Value::Array(items) => items.iter().any(|v| depth_exceeds(v, budget - 1)),
        _ => false,
    }
}

fn contains_quoted_key(raw: &str, key: &str) -> bool {
    let needle = format!("\"{}\"", key.to_ascii_lowercase());
    raw.to_ascii_lowercase().contains(&needle)
}

fn string_field(
    value: &Value,
    field: &'static str,
) -> std::result::Result<Option<String>, ShapeMismatch> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(ShapeMismatch::InvalidField { field }),
    }
}

fn status_field(value: &Value) -> std::result::Result<Option<u16>, ShapeMismatch> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(Some)
            .ok_or(ShapeMismatch::InvalidField { field: "status" }),
        _ => Err(ShapeMismatch::InvalidField { field: "status" }),
    }
}

fn errors_field(
    value: &Value,
) -> std::result::Result<IndexMap<String, Vec<String>>, ShapeMismatch> {
    let object = value
        .as_object()
        .ok_or(ShapeMismatch::InvalidField { field: "errors" })?;

    let mut errors = IndexMap::with_capacity(object.len());
    for (field_name, messages) in object {
        let list = messages
            .as_array()
            .ok_or(ShapeMismatch::InvalidField { field: "errors" })?;
        let mut collected = Vec::with_capacity(list.len());
        for message in list {
            collected.push(
                message
                    .as_str()
                    .ok_or(ShapeMismatch::InvalidField { field: "errors" })?
                    .to_owned(),
            );
        }
        errors.insert(field_name.clone(), collected);
    }
    Ok(errors)
}

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bad_request() -> Problem {
        Problem::new()
            .with_type("https://httpstatuses.com/400")
            .with_title("One or more validation errors occurred.")
            .with_status(400)
            .with_detail("Some details that explain the problem to the user")
    }

    #[test]
    fn serializes_standard_fields_then_extensions_in_insertion_order() {
        let problem = bad_request()
            .with_extension("stringField", "string field value")
            .with_extension("intField", 20);

        let json = to_json(&problem).unwrap();

        assert_eq!(
            json,
            "{\"type\":\"https://httpstatuses.com/400\",\
             \"title\":\"One or more validation errors occurred.\",\
             \"status\":400,\
             \"detail\":\"Some details that explain the problem to the user\",\
             \"stringField\":\"string field value\",\
             \"intField\":20}"
        );
    }

    #[test]
    fn serializes_validation_problem_with_errors_last() {
        let mut problem = ValidationProblem::new()
            .with_error("Reference", "The Reference field is required.")
            .with_error("AccountNumber", "The AccountNumber field is required.");
        problem.problem = bad_request();
        problem.problem.extensions.insert("looseKey".into(), json!(123));

        let json = to_json(&problem).unwrap();

        assert_eq!(
            json,
            "{\"type\":\"https://httpstatuses.com/400\",\
             \"title\":\"One or more validation errors occurred.\",\
             \"status\":400,\
             \"detail\":\"Some details that explain the problem to the user\",\
             \"looseKey\":123,\
             \"errors\":{\"Reference\":[\"The Reference field is required.\"],\
             \"AccountNumber\":[\"The AccountNumber field is required.\"]}}"
        );
    }

    #[test]
    fn omits_null_standard_fields() {
        let problem = Problem::new().with_title("Short");
        assert_eq!(to_json(&problem).unwrap(), "{\"title\":\"Short\"}");
    }

    #[test]
    fn round_trips_the_standard_fields() {
        let problem = bad_request().with_instance("/orders/17");

        let json = to_json(&problem).unwrap();
        let parsed = parse(&json).unwrap();

        assert_eq!(parsed, ProblemDetails::Generic(problem));
    }

    #[test]
    fn round_trips_a_validation_problem_and_detects_the_shape() {
        let mut problem = ValidationProblem::new()
            .with_error("Reference", "The Reference field is required.")
            .with_error("AccountNumber", "The AccountNumber field is required.");
        problem.problem = bad_request();

        let json = to_json(&problem).unwrap();
        let parsed = parse(&json).unwrap();

        assert!(parsed.is_validation());
        assert_eq!(parsed, ProblemDetails::Validation(problem));
    }

    #[test]
    fn detects_validation_shape_with_pascal_cased_errors_key() {
        let raw = r#"{"title":"Nope","status":400,"Errors":{"Name":["required"]}}"#;

        let parsed = parse(raw).unwrap();

        let errors = parsed.errors().expect("validation shape");
        assert_eq!(errors.get("Name"), Some(&vec!["required".to_owned()]));
    }

    #[test]
    fn falls_back_to_problem_when_errors_is_a_string() {
        let raw = r#"{"title":"Nope","status":400,"errors":"not a dictionary"}"#;

        let parsed = parse(raw).unwrap();

        assert!(!parsed.is_validation());
        assert_eq!(
            parsed.base().extensions.get("errors"),
            Some(&json!("not a dictionary"))
        );
    }

    #[test]
    fn falls_back_to_problem_when_errors_is_empty() {
        let raw = r#"{"title":"Nope","status":400,"errors":{}}"#;

        let parsed = parse(raw).unwrap();

        assert!(!parsed.is_validation());
        // the empty dictionary stays behind as an ordinary extension
        assert_eq!(parsed.base().extensions.get("errors"), Some(&json!({})));
    }

    #[test]
    fn falls_back_when_error_messages_are_not_string_arrays() {
        let raw = r#"{"title":"Nope","errors":{"name":"required"}}"#;

        let parsed = parse(raw).unwrap();

        assert!(!parsed.is_validation());
    }

    #[test]
    fn flattens_nested_extensions_during_parse() {
        let raw = r#"{"title":"Nope","status":400,"intField":20,"extensions":{"stringField":"x"}}"#;

        let parsed = parse(raw).unwrap();

        let extensions = &parsed.base().extensions;
        assert_eq!(extensions.get("intField"), Some(&json!(20)));
        assert_eq!(extensions.get("stringField"), Some(&json!("x")));
        assert!(!extensions.contains_key("extensions"));
    }

    #[test]
    fn matches_standard_fields_case_insensitively() {
        let raw = r#"{"Type":"about:blank","TITLE":"Nope","Status":418,"Detail":"d","Instance":"/i"}"#;

        let parsed = parse(raw).unwrap();
        let base = parsed.base();

        assert_eq!(base.type_url.as_deref(), Some("about:blank"));
        assert_eq!(base.title.as_deref(), Some("Nope"));
        assert_eq!(base.status, Some(418));
        assert_eq!(base.detail.as_deref(), Some("d"));
        assert_eq!(base.instance.as_deref(), Some("/i"));
        assert!(base.extensions.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse("not json at all").unwrap_err();
        assert!(matches!(err, Error::MalformedProblem { .. }));
    }

    #[test]
    fn non_object_root_is_an_error() {
        let err = parse("[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::MalformedProblem { .. }));
    }

    #[test]
    fn wrongly_typed_status_is_an_error() {
        let err = parse(r#"{"status":{"nested":true}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedProblem { .. }));
    }

    #[test]
    fn rejects_payloads_nested_too_deeply() {
        let mut raw = String::from(r#"{"title":"deep","x":"#);
        for _ in 0..40 {
            raw.push('[');
        }
        raw.push('1');
        for _ in 0..40 {
            raw.push(']');
        }
        raw.push('}');

        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, Error::MalformedProblem { .. }));
    }

    #[test]
    fn typed_parse_accepts_an_empty_errors_dictionary() {
        let raw = r#"{"title":"Nope","status":400}"#;

        let validation: ValidationProblem = parse_as(raw).unwrap();

        assert!(validation.errors.is_empty());
        assert_eq!(validation.problem.title.as_deref(), Some("Nope"));
    }

    #[test]
    fn typed_parse_surfaces_shape_mismatches() {
        let raw = r#"{"title":"Nope","errors":"wrong shape"}"#;

        let err = parse_as::<ValidationProblem>(raw).unwrap_err();
        assert!(matches!(err, Error::MalformedProblem { .. }));
    }

    #[test]
    fn naming_policy_keys() {
        assert_eq!(NamingPolicy::CamelCase.key("correlationId"), "correlationId");
        assert_eq!(NamingPolicy::PascalCase.key("correlationId"), "CorrelationId");
    }
}
