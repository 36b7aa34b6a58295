//! Response guard: turns problem responses into typed errors.
//!
//! [`ResponseExt`] extends [`reqwest::Response`] with the guard methods. The
//! decision is driven by content type, not status code: a response labelled
//! `application/problem+json` takes the problem path regardless of status
//! (a 2xx carrying a well-formed problem body still fails — the server said
//! it was reporting a problem), while anything else passes or fails on the
//! usual 2xx check.

use async_trait::async_trait;

use crate::convert::{self, NamingPolicy, ProblemShape};
use crate::error::{Error, Result};
use crate::media;
use crate::problem::ProblemDetails;

/// Guard methods for [`reqwest::Response`].
///
/// All methods consume the response; the successful paths hand it back
/// unchanged with the body still unread.
///
/// # Examples
///
/// ```no_run
/// use mishap::ResponseExt;
///
/// # async fn example() -> Result<(), mishap::Error> {
/// let response = reqwest::get("https://api.example.com/orders/17").await?;
/// let order: serde_json::Value = response.ensure_success().await?.json().await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ResponseExt: Sized {
    /// Fails unless the response is successful.
    ///
    /// A problem details response raises [`Error::Problem`] with the parsed,
    /// correlation-remapped payload; any other non-2xx raises
    /// [`Error::Http`]; a 2xx without a problem payload passes the response
    /// back. Drop-in replacement for `error_for_status` when talking to an
    /// RFC 7807 API.
    async fn ensure_success(self) -> Result<Self>;

    /// Like [`ensure_success`](Self::ensure_success) with an explicit casing
    /// policy for the remapped correlation key.
    async fn ensure_success_with(self, policy: NamingPolicy) -> Result<Self>;

    /// Fails only when the response is a problem details payload; performs no
    /// status-code check of its own.
    async fn ensure_not_problem(self, policy: NamingPolicy) -> Result<Self>;

    /// Reads the body as a problem details payload.
    ///
    /// Returns `Ok(None)` when the response does not declare the problem
    /// media type. No correlation remapping is applied here; this is the
    /// inspection path, not the failure path.
    async fn read_problem_details(self) -> Result<Option<ProblemDetails>>;

    /// Reads the body directly as a caller-declared problem shape, bypassing
    /// shape sniffing.
    async fn read_problem_as<T>(self) -> Result<Option<T>>
    where
        T: ProblemShape + Send;
}

#[async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_success(self) -> Result<Self> {
        self.ensure_success_with(NamingPolicy::default()).await
    }

    async fn ensure_success_with(self, policy: NamingPolicy) -> Result<Self> {
        if media::is_problem_details(self.headers()) {
            return self.ensure_not_problem(policy).await;
        }

        let status = self.status();
        if status.is_success() {
            Ok(self)
        } else {
            tracing::warn!(
                status = status.as_u16(),
                "non-success response without a problem payload"
            );
            Err(Error::Http { status })
        }
    }

    async fn ensure_not_problem(self, policy: NamingPolicy) -> Result<Self> {
        if !media::is_problem_details(self.headers()) {
            return Ok(self);
        }

        let status = self.status();
        let raw = self.text().await?;
        // a parse failure here propagates as MalformedProblem: the content
        // type already proved this was meant to be a problem response
        let mut details = convert::parse(&raw)?;
        details.remap_trace_id(policy);

        tracing::warn!(
            status = status.as_u16(),
            problem = %details,
            validation = details.is_validation(),
            "problem details response"
        );

        Err(Error::Problem {
            details: Box::new(details),
        })
    }

    async fn read_problem_details(self) -> Result<Option<ProblemDetails>> {
        if !media::is_problem_details(self.headers()) {
            return Ok(None);
        }

        let raw = self.text().await?;
        convert::parse(&raw).map(Some)
    }

    async fn read_problem_as<T>(self) -> Result<Option<T>>
    where
        T: ProblemShape + Send,
    {
        if !media::is_problem_details(self.headers()) {
            return Ok(None);
        }

        let raw = self.text().await?;
        convert::parse_as(&raw).map(Some)
    }
}
