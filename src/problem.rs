//! RFC 7807 problem details data model.
//!
//! [`Problem`] is the normalized representation of an `application/problem+json`
//! payload: the five standard fields plus an insertion-ordered map of extension
//! members. [`ValidationProblem`] adds the per-field `errors` dictionary that
//! validation-style APIs attach. [`ProblemDetails`] is the closed set of shapes
//! the deserializer can produce.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::convert::NamingPolicy;

/// A normalized RFC 7807 problem details payload.
///
/// All five standard fields are optional on the wire; anything else the server
/// sent lives in [`extensions`](Self::extensions), keyed exactly as received
/// and in document order.
///
/// # Examples
///
/// ```
/// use mishap::Problem;
///
/// let problem = Problem::new()
///     .with_type("https://httpstatuses.com/400")
///     .with_title("One or more validation errors occurred.")
///     .with_status(400)
///     .with_detail("Some details that explain the problem to the user");
///
/// assert_eq!(problem.status, Some(400));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,

    /// A short, human-readable summary of the problem type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The HTTP status code for this occurrence of the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Extension members: every top-level key beyond the standard five,
    /// in document order. Keys are case-sensitive and unique.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Problem {
    /// Creates an empty problem.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = Some(type_url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Adds an extension member, replacing any existing value under `key`.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Removes the extension entry matching `key`, trying the exact key first
    /// and then its Pascal-cased form, returning the removed value if any.
    ///
    /// Servers disagree on extension-key casing (`traceId` vs `TraceId`), so
    /// removal has to tolerate both.
    ///
    /// # Examples
    ///
    /// ```
    /// use mishap::Problem;
    ///
    /// let mut problem = Problem::new().with_extension("TraceId", "abc");
    /// let removed = problem.remove_extension("traceId");
    ///
    /// assert_eq!(removed, Some("abc".into()));
    /// assert!(problem.extensions.is_empty());
    /// ```
    pub fn remove_extension(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.extensions.shift_remove(key) {
            return Some(value);
        }
        self.extensions.shift_remove(&pascal_case(key))
    }

    /// Repairs the double-nesting artifact where a whole `extensions` object
    /// ends up as a single entry *inside* the extension map. If such an entry
    /// exists (exact key, then Pascal-cased) and its value is a JSON object,
    /// it is removed and its members merged into the top-level map. Runs once,
    /// non-recursively; a non-object value under that key is left in place.
    pub(crate) fn flatten_nested_extensions(&mut self) {
        for key in ["extensions", "Extensions"] {
            if matches!(self.extensions.get(key), Some(Value::Object(_))) {
                if let Some(Value::Object(nested)) = self.extensions.shift_remove(key) {
                    for (nested_key, nested_value) in nested {
                        self.extensions.insert(nested_key, nested_value);
                    }
                }
                return;
            }
        }
    }

    /// Renames a server-assigned `traceId` extension to `correlationId` so the
    /// identifier survives into the caller's own tracing without colliding
    /// with it. The replacement key's casing follows `policy`.
    pub(crate) fn remap_trace_id(&mut self, policy: NamingPolicy) {
        if let Some(trace_id) = self.remove_extension("traceId") {
            self.extensions.insert(policy.key("correlationId"), trace_id);
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.title, self.status) {
            (Some(title), Some(status)) => write!(f, "{title} (status {status})"),
            (Some(title), None) => write!(f, "{title}"),
            (None, Some(status)) => write!(f, "problem details (status {status})"),
            (None, None) => write!(f, "problem details"),
        }
    }
}

/// A problem details payload carrying per-field validation errors.
///
/// The wire shape is a [`Problem`] plus an `errors` object mapping field names
/// to lists of messages. The shape-sniffing deserializer only settles on this
/// type when `errors` is present, dictionary-shaped, and non-empty; the typed
/// parse path accepts an empty map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationProblem {
    /// The standard problem fields and loose extensions.
    #[serde(flatten)]
    pub problem: Problem,

    /// Field name to validation messages, in document order.
    pub errors: IndexMap<String, Vec<String>>,
}

impl ValidationProblem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validation message for `field`.
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.entry(field.into()).or_default().push(message.into());
        self
    }
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.problem.fmt(f)
    }
}

/// The closed set of problem shapes the deserializer produces.
///
/// Shape selection is best-effort structural sniffing: payloads that carry a
/// usable `errors` dictionary become [`Validation`](Self::Validation),
/// everything else becomes [`Generic`](Self::Generic). Applications that need
/// further shapes implement [`ProblemShape`](crate::convert::ProblemShape)
/// and use the typed read path instead of extending this enum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProblemDetails {
    /// A payload with a non-empty validation `errors` dictionary.
    Validation(ValidationProblem),
    /// Any other problem payload.
    Generic(Problem),
}

impl ProblemDetails {
    /// The standard problem fields, whichever variant this is.
    pub fn base(&self) -> &Problem {
        match self {
            ProblemDetails::Validation(v) => &v.problem,
            ProblemDetails::Generic(p) => p,
        }
    }

    /// Mutable access to the standard problem fields.
    pub fn base_mut(&mut self) -> &mut Problem {
        match self {
            ProblemDetails::Validation(v) => &mut v.problem,
            ProblemDetails::Generic(p) => p,
        }
    }

    /// The `status` field, if the payload carried one.
    pub fn status(&self) -> Option<u16> {
        self.base().status
    }

    /// The `title` field, if the payload carried one.
    pub fn title(&self) -> Option<&str> {
        self.base().title.as_deref()
    }

    /// The validation errors, when this is the validation shape.
    pub fn errors(&self) -> Option<&IndexMap<String, Vec<String>>> {
        match self {
            ProblemDetails::Validation(v) => Some(&v.errors),
            ProblemDetails::Generic(_) => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ProblemDetails::Validation(_))
    }

    pub(crate) fn remap_trace_id(&mut self, policy: NamingPolicy) {
        self.base_mut().remap_trace_id(policy);
    }
}

impl fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.base().fmt(f)
    }
}

impl From<Problem> for ProblemDetails {
    fn from(problem: Problem) -> Self {
        ProblemDetails::Generic(problem)
    }
}

impl From<ValidationProblem> for ProblemDetails {
    fn from(problem: ValidationProblem) -> Self {
        ProblemDetails::Validation(problem)
    }
}

/// Uppercases the first character, leaving the rest untouched.
pub(crate) fn pascal_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
