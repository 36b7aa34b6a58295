//! HTTP client with built-in problem details handling.
//!
//! The [`Client`] type wraps [`reqwest`] with JSON convenience methods that
//! route every response through the problem details guard before decoding the
//! body: a problem payload becomes [`Error::Problem`](crate::Error::Problem)
//! instead of a half-decoded success or a bare status failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::convert::NamingPolicy;
use crate::ensure::ResponseExt;
use crate::{Error, Response, Result};

/// An HTTP client for JSON APIs that report errors as RFC 7807 problem
/// details.
///
/// The client is cheap to clone and designed to be reused across requests; it
/// shares one connection pool and one configuration.
///
/// # Examples
///
/// ```no_run
/// use mishap::Client;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct CreateOrder {
///     reference: String,
/// }
///
/// #[derive(Deserialize)]
/// struct Order {
///     id: u64,
///     reference: String,
/// }
///
/// # async fn example() -> Result<(), mishap::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .default_header("User-Agent", "orders-app/1.0")?
///     .build()?;
///
/// let order: mishap::Response<Order> = client.get("/orders/17").await?;
/// println!("order {} took {:?}", order.data.id, order.latency);
///
/// let created: mishap::Response<Order> = client
///     .post("/orders", &CreateOrder { reference: "r-1".into() })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    naming_policy: NamingPolicy,
}

/// Description of a single request: method, path, extra headers, and query
/// parameters. Used with [`Client::send`] when the verb helpers are not
/// enough.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The HTTP method.
    pub method: Method,
    /// The request path, relative to the client's base URL.
    pub path: String,
    /// Additional headers for this request only.
    pub headers: HeaderMap,
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
}

impl RequestSpec {
    /// Creates a spec with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
        }
    }

    /// Adds a header to this request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to this request.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl Client {
    /// Creates a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The casing policy this client applies to the remapped correlation key.
    pub fn naming_policy(&self) -> NamingPolicy {
        self.inner.naming_policy
    }

    /// Sends a request described by `spec` and decodes the success body.
    ///
    /// Every response passes through the problem details guard first, so a
    /// failure surfaces as [`Error::Problem`](crate::Error::Problem),
    /// [`Error::Http`](crate::Error::Http), or
    /// [`Error::MalformedProblem`](crate::Error::MalformedProblem) before any
    /// decoding of `Res` is attempted.
    pub async fn send<Req, Res>(&self, spec: RequestSpec, body: Option<&Req>) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let start = Instant::now();

        let response = self.execute(&spec, body).await?;
        let response = response
            .ensure_success_with(self.inner.naming_policy)
            .await?;

        let latency = start.elapsed();
        self.decode(response, latency).await
    }

    /// Makes a GET request.
    pub async fn get<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.send::<(), Res>(RequestSpec::new(Method::GET, path), None)
            .await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send(RequestSpec::new(Method::POST, path), Some(body))
            .await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send(RequestSpec::new(Method::PUT, path), Some(body))
            .await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send(RequestSpec::new(Method::PATCH, path), Some(body))
            .await
    }

    /// Makes a DELETE request.
    pub async fn delete<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.send::<(), Res>(RequestSpec::new(Method::DELETE, path), None)
            .await
    }

    async fn execute<Req>(&self, spec: &RequestSpec, body: Option<&Req>) -> Result<reqwest::Response>
    where
        Req: Serialize,
    {
        let mut url = self.inner.base_url.clone();
        url.set_path(&spec.path);
        for (key, value) in &spec.query {
            url.query_pairs_mut().append_pair(key, value);
        }

        tracing::debug!(method = %spec.method, url = %url, "executing HTTP request");

        let mut request = self.inner.http_client.request(spec.method.clone(), url);

        for (name, value) in &self.inner.default_headers {
            request = request.header(name, value);
        }
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            let json =
                serde_json::to_value(body).map_err(|e| Error::Serialization(e.to_string()))?;
            request = request.json(&json);
        }

        Ok(request.send().await?)
    }

    async fn decode<Res>(&self, response: reqwest::Response, latency: Duration) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let status = response.status();
        let headers = response.headers().clone();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            "received HTTP response"
        );

        let raw_body = response.text().await?;

        match serde_json::from_str::<Res>(&raw_body) {
            Ok(data) => Ok(Response::new(data, raw_body, status, headers, latency)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %raw_body,
                    "failed to deserialize response"
                );
                Err(Error::Deserialization {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }
}

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    naming_policy: NamingPolicy,
}

impl ClientBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            naming_policy: NamingPolicy::default(),
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a default header included in every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header value: {e}")))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the casing policy for the remapped correlation key.
    ///
    /// Defaults to [`NamingPolicy::CamelCase`].
    pub fn naming_policy(mut self, policy: NamingPolicy) -> Self {
        self.naming_policy = policy;
        self
    }

    /// Builds the configured [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or the underlying HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Configuration("base URL is required".to_owned()))?;

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                timeout: self.timeout,
                naming_policy: self.naming_policy,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
