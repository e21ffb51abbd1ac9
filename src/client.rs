//! Audit service boundary.
//!
//! `AuditApi` is the contract the lifecycle needs from the backend: create,
//! fetch, attach email. `ApiClient` implements it over HTTP; tests swap in
//! scripted fakes. Each operation is a single round trip with no retry.

use crate::model::{Audit, ClientConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Errors surfaced by the audit service boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input, rejected before or by the backend.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("audit not found: {id}")]
    NotFound { id: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// The three remote operations the audit lifecycle needs.
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// Create an audit for a normalized URL. The backend assigns the id and
    /// returns the audit in `queued` state.
    async fn create_audit(&self, url: &str, email: Option<&str>) -> Result<Audit, ApiError>;

    /// Fetch the current audit state. Idempotent.
    async fn fetch_audit(&self, id: &str) -> Result<Audit, ApiError>;

    /// Attach the contact email to an existing audit.
    async fn attach_email(&self, id: &str, email: &str) -> Result<Audit, ApiError>;
}

/// Normalize user input into an absolute HTTP(S) URL.
///
/// Trims whitespace, assumes `https://` when no scheme is given, and
/// rejects input whose host is empty or contains no dot (so `localhost`
/// and bare words are not auditable targets).
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&with_scheme).ok()?;
    match parsed.host_str() {
        Some(host) if host.contains('.') => Some(parsed.to_string()),
        _ => None,
    }
}

/// Check an email address locally so malformed input never reaches the
/// network. Returns the trimmed address.
pub fn validate_email(input: &str) -> Result<String, ApiError> {
    let trimmed = input.trim();
    let malformed = || ApiError::Validation(format!("malformed email address: {trimmed:?}"));
    let (local, domain) = trimmed.split_once('@').ok_or_else(malformed)?;
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.contains('@')
        || trimmed.contains(char::is_whitespace)
    {
        return Err(malformed());
    }
    Ok(trimmed.to_string())
}

#[derive(Serialize)]
struct CreateAuditBody<'a> {
    url: &'a str,
    email: Option<&'a str>,
}

#[derive(Serialize)]
struct AttachEmailBody<'a> {
    email: &'a str,
}

/// HTTP implementation of [`AuditApi`], constructed from an explicit
/// [`ClientConfig`] rather than process-global state.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| ApiError::Validation(format!("invalid base URL {:?}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "invalid base URL {:?}: not an absolute HTTP URL",
                cfg.base_url
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base is rejected in new(), so path_segments_mut succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Pull a human-readable message out of an error response body. The backend
/// sends `{"message": "..."}`; anything else falls back to the raw body.
async fn error_message(resp: reqwest::Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text)
}

async fn audit_from_response(resp: reqwest::Response, id: Option<&str>) -> Result<Audit, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<Audit>().await.map_err(ApiError::from_transport);
    }
    let message = error_message(resp).await;
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(ApiError::NotFound { id: id.to_string() });
        }
    }
    if status.is_client_error() {
        Err(ApiError::Validation(message))
    } else {
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AuditApi for ApiClient {
    async fn create_audit(&self, url: &str, email: Option<&str>) -> Result<Audit, ApiError> {
        let url = normalize_url(url)
            .ok_or_else(|| ApiError::Validation(format!("not a valid website URL: {url:?}")))?;
        let email = email.map(validate_email).transpose()?;
        let resp = self
            .http
            .post(self.endpoint(&["audits"]))
            .json(&CreateAuditBody {
                url: &url,
                email: email.as_deref(),
            })
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        audit_from_response(resp, None).await
    }

    async fn fetch_audit(&self, id: &str) -> Result<Audit, ApiError> {
        let resp = self
            .http
            .get(self.endpoint(&["audits", id]))
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        audit_from_response(resp, Some(id)).await
    }

    async fn attach_email(&self, id: &str, email: &str) -> Result<Audit, ApiError> {
        let email = validate_email(email)?;
        let resp = self
            .http
            .patch(self.endpoint(&["audits", id, "email"]))
            .json(&AttachEmailBody { email: &email })
            .send()
            .await
            .map_err(ApiError::from_transport)?;
        audit_from_response(resp, Some(id)).await
    }
}
