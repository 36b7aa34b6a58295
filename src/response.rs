//! Response wrapper that preserves both parsed data and raw response details.

use std::time::Duration;

use http::{HeaderMap, StatusCode};

/// A successful, decoded HTTP response.
///
/// Wraps the deserialized body together with the raw text, status, headers,
/// and request latency, so callers can log or inspect the exchange without
/// re-fetching anything.
///
/// # Examples
///
/// ```no_run
/// use mishap::Client;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Order {
///     id: u64,
/// }
///
/// # async fn example() -> Result<(), mishap::Error> {
/// # let client = Client::builder().base_url("https://api.example.com")?.build()?;
/// let response = client.get::<Order>("/orders/17").await?;
///
/// println!("order: {}", response.data.id);
/// println!("status: {}", response.status);
/// if response.latency > std::time::Duration::from_secs(1) {
///     println!("slow response body: {}", response.raw_body);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The deserialized response data.
    pub data: T,

    /// The raw response body as received.
    pub raw_body: String,

    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request to receiving the response headers and
    /// body.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Creates a new `Response`. Called by the client after decoding.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the decoded data to a different type, keeping the metadata.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
