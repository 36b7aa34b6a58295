//! Content-type sniffing for problem details responses.
//!
//! The guard only treats a body as a problem payload when the server labels it
//! with the RFC 7807 media type. Sniffing is deliberately strict: no wildcard
//! matching, no falling back to `application/json`.

use http::{header, HeaderMap};

/// The RFC 7807 media type for problem details payloads.
pub const PROBLEM_DETAILS_MEDIA_TYPE: &str = "application/problem+json";

/// Returns `true` iff the `Content-Type` header declares the problem details
/// media type.
///
/// Media-type parameters such as `charset=utf-8` are ignored; the comparison
/// is against the parsed essence only. A missing or unparseable header is
/// `false`, never an error.
///
/// # Examples
///
/// ```
/// use http::{header, HeaderMap, HeaderValue};
/// use mishap::media::is_problem_details;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     header::CONTENT_TYPE,
///     HeaderValue::from_static("application/problem+json; charset=utf-8"),
/// );
/// assert!(is_problem_details(&headers));
///
/// headers.insert(
///     header::CONTENT_TYPE,
///     HeaderValue::from_static("application/json"),
/// );
/// assert!(!is_problem_details(&headers));
/// ```
pub fn is_problem_details(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|media_type| media_type.essence_str() == PROBLEM_DETAILS_MEDIA_TYPE)
        .unwrap_or(false)
}
