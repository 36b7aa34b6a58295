//! # Mishap - typed RFC 7807 problem details for HTTP clients
//!
//! Mishap teaches a `reqwest`-based client to recognize
//! `application/problem+json` error responses and raise them as a structured,
//! typed error instead of a generic status failure. Point it at a JSON API
//! that follows RFC 7807 and failed calls hand you the problem's type, title,
//! status, detail, validation errors, and extension members — already parsed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mishap::{Client, Error};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Order {
//!     id: u64,
//!     reference: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .build()?;
//!
//!     match client.get::<Order>("/orders/17").await {
//!         Ok(response) => println!("order {}", response.data.reference),
//!         Err(Error::Problem { details }) => {
//!             // the server sent application/problem+json; everything is
//!             // already normalized, including validation errors
//!             eprintln!("problem: {}", details);
//!             if let Some(errors) = details.errors() {
//!                 for (field, messages) in errors {
//!                     eprintln!("  {field}: {}", messages.join(", "));
//!                 }
//!             }
//!         }
//!         Err(e) => eprintln!("request failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Guarding responses you already have
//!
//! The guard also works directly on a [`reqwest::Response`] via
//! [`ResponseExt`], for callers that manage their own client:
//!
//! ```no_run
//! use mishap::ResponseExt;
//!
//! # async fn example() -> Result<(), mishap::Error> {
//! let response = reqwest::get("https://api.example.com/orders/17").await?;
//! let body = response.ensure_success().await?.text().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## How detection works
//!
//! - **Media type first.** Only responses whose `Content-Type` essence is
//!   exactly `application/problem+json` take the problem path; everything
//!   else (including `application/json`) falls back to a plain status check.
//!   A problem-labelled body is trusted over the status code, so a 2xx
//!   carrying a problem payload still fails.
//! - **Shape sniffing.** Payloads that contain a quoted `errors` key are
//!   speculatively parsed as [`ValidationProblem`]; if that parse fails, or
//!   the `errors` dictionary is empty, the payload falls back to a plain
//!   [`Problem`]. The fallback is driven by values, not exceptions — only a
//!   payload that fails even the plain shape surfaces
//!   [`Error::MalformedProblem`].
//! - **Correlation remapping.** A server-assigned `traceId` extension is
//!   renamed to `correlationId` (casing per [`NamingPolicy`]) so it cannot
//!   collide with the caller's own tracing when the problem is re-reported.
//!
//! ## Error Handling
//!
//! Callers that do not special-case problem responses still observe an error
//! on every non-2xx response — "fail loudly on non-success" is preserved:
//!
//! ```no_run
//! use mishap::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.get::<serde_json::Value>("/endpoint").await {
//!     Ok(response) => println!("{:?}", response.data),
//!     Err(Error::Problem { details }) => eprintln!("problem: {details}"),
//!     Err(Error::Http { status }) => eprintln!("HTTP {status}, no problem body"),
//!     Err(Error::MalformedProblem { reason, .. }) => {
//!         eprintln!("server sent a broken problem payload: {reason}");
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Typed problem details** - [`Problem`] and [`ValidationProblem`] with
//!   insertion-ordered extension members
//! - **Best-effort shape detection** - validation payloads recognized by
//!   structure, with a value-driven fallback chain
//! - **Correlation identifier remapping** - `traceId` → `correlationId`,
//!   casing configurable per client
//! - **Drop-in response guard** - [`ResponseExt::ensure_success`] for any
//!   `reqwest::Response`
//! - **Convenience client** - GET/POST/PUT/PATCH/DELETE helpers that guard
//!   and decode in one call
//! - **Custom problem shapes** - [`convert::ProblemShape`] for APIs with
//!   bespoke problem contracts
//! - **Structured logging** - `tracing` instrumentation on every exchange

mod client;
pub mod convert;
mod ensure;
mod error;
pub mod media;
pub mod problem;
mod response;

pub use client::{Client, ClientBuilder, RequestSpec};
pub use convert::NamingPolicy;
pub use ensure::ResponseExt;
pub use error::{Error, Result};
pub use media::PROBLEM_DETAILS_MEDIA_TYPE;
pub use problem::{Problem, ProblemDetails, ValidationProblem};
pub use response::Response;
