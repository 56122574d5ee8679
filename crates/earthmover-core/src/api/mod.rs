//! Typed client for the Earthmover REST backend.
//!
//! One [`ApiClient`] per backend base URL. Every response travels in the
//! uniform `{ success, message, data }` envelope decoded by [`envelope`];
//! the per-category operations live in the sibling modules and share the
//! request helpers here.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::util::is_http_url;

mod auth;
mod bookings;
mod envelope;
mod machines;
mod profile;

pub use auth::Credentials;
pub use bookings::BookingRequest;
pub use envelope::{decode_ack, decode_envelope, ApiEnvelope};
pub use profile::ProfileUpdate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status with whatever message could be salvaged.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The server answered with an HTML error page instead of JSON.
    #[error("Server returned an HTML error page (HTTP {status})")]
    HtmlBody { status: u16 },
    /// The envelope arrived with `success == false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
    /// The body was not the expected envelope shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// A successful envelope without the required `data` payload.
    #[error("Response did not include the expected data payload")]
    MissingData,
    #[error("No operator is assigned to machine {machine_id}")]
    NoOperatorAssigned { machine_id: i64 },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Transient failures the poller retries on the next tick; everything
    /// else indicates a caller or contract problem.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::HtmlBody { .. } | Self::Malformed(_)
        )
    }
}

/// Trim and validate a backend base URL.
pub fn normalize_base_url(raw: &str) -> ApiResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ApiError::InvalidBaseUrl("URL must not be empty".to_string()));
    }
    if !is_http_url(trimmed) {
        return Err(ApiError::InvalidBaseUrl(format!(
            "'{trimmed}' must include http:// or https://"
        )));
    }
    Ok(trimmed.to_string())
}

/// Client for one backend instance. Cheap to clone; the underlying HTTP
/// client is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url, http })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }

    async fn post_data<T, B>(&self, path: &str, payload: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.http.post(self.url(path)).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }

    async fn post_ack<B>(&self, path: &str, payload: &B) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let response = self.http.post(self.url(path)).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_ack(status, &body)
    }
}
