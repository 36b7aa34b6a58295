//! Error types for HTTP API calls.
//!
//! The taxonomy separates the three ways a response can fail the guard: a
//! structured problem payload ([`Error::Problem`]), a bare non-success status
//! ([`Error::Http`]), and a response that *claimed* to be a problem payload
//! but could not be parsed as one ([`Error::MalformedProblem`]). The latter is
//! surfaced as a parse failure rather than downgraded to a status error,
//! since the server already violated the media-type contract.

use http::StatusCode;

use crate::problem::ProblemDetails;

/// The main error type for HTTP API calls.
///
/// # Examples
///
/// ```no_run
/// use mishap::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.get::<serde_json::Value>("/endpoint").await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(Error::Problem { details }) => {
///         eprintln!("Server reported a problem: {}", details);
///         if let Some(errors) = details.errors() {
///             for (field, messages) in errors {
///                 eprintln!("  {}: {}", field, messages.join(", "));
///             }
///         }
///     }
///     Err(Error::Http { status }) => eprintln!("HTTP error {}", status),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The response carried an `application/problem+json` payload.
    ///
    /// The payload has already been normalized: shape-detected, extension
    /// flattening applied, and any `traceId` remapped to `correlationId`.
    #[error("problem details response: {details}")]
    Problem {
        /// The normalized problem payload.
        details: Box<ProblemDetails>,
    },

    /// The server returned a non-2xx status without a problem payload.
    ///
    /// Only the status code is available; the body was not read.
    #[error("HTTP error {status}")]
    Http {
        /// The HTTP status code.
        status: StatusCode,
    },

    /// The response declared the problem details media type but its body
    /// could not be parsed even as a plain problem.
    #[error("malformed problem details payload: {reason}")]
    MalformedProblem {
        /// The raw response body that failed to parse.
        raw_response: String,
        /// What went wrong during parsing.
        reason: String,
    },

    /// A network-level error (connection failure, DNS, timeout, TLS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A successful response body failed to deserialize into the caller's
    /// expected type.
    #[error("failed to deserialize response (status {status}): {serde_error}")]
    Deserialization {
        /// The raw response body that failed to deserialize.
        raw_response: String,
        /// The serde error message.
        serde_error: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// The request body could not be serialized to JSON.
    #[error("failed to serialize request: {0}")]
    Serialization(String),

    /// Invalid client or request configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the problem details payload if this is a problem response.
    pub fn problem_details(&self) -> Option<&ProblemDetails> {
        match self {
            Error::Problem { details } => Some(details),
            _ => None,
        }
    }

    /// Consumes the error, returning the problem details payload if present.
    pub fn into_problem_details(self) -> Option<ProblemDetails> {
        match self {
            Error::Problem { details } => Some(*details),
            _ => None,
        }
    }

    /// Returns `true` if this error carries a structured problem payload.
    pub fn is_problem(&self) -> bool {
        matches!(self, Error::Problem { .. })
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// For [`Error::Problem`] this is the payload's own `status` field.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Problem { details } => details
                .status()
                .and_then(|code| StatusCode::from_u16(code).ok()),
            Error::Http { status } => Some(*status),
            Error::Deserialization { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error preserved one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::MalformedProblem { raw_response, .. } => Some(raw_response),
            Error::Deserialization { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for HTTP API calls.
pub type Result<T> = std::result::Result<T, Error>;
