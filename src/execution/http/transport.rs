//! HTTP transport abstraction.
//!
//! Adapters describe a request as a [`WireRequest`]; an [`HttpTransport`]
//! performs the exchange. The default [`ReqwestTransport`] posts JSON with
//! `reqwest`; tests and embedders can inject their own implementation to
//! observe the final URL/headers/body or return synthetic responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::LlmError;

/// Longest error body excerpt carried in a [`LlmError::TransportError`].
const ERROR_BODY_LIMIT: usize = 2048;

/// Provider request ready to be sent: a JSON POST.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// Provider id of the adapter that built the request
    pub provider: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Successful provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Custom HTTP transport for JSON requests.
///
/// Implementations return [`LlmError::TransportError`] for network failures
/// (`status: None`) and non-success statuses (`status: Some(code)`).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, LlmError>;
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::with_client(reqwest::Client::new())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, LlmError> {
        let WireRequest {
            provider,
            url,
            headers,
            body,
        } = request;

        tracing::debug!(provider = %provider, url = %url, "sending provider request");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| with_provider(LlmError::from(e), &provider))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| with_provider(LlmError::from(e), &provider))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(LlmError::transport(
                provider,
                Some(status.as_u16()),
                error_excerpt(&text),
            ));
        }

        let body = serde_json::from_slice(&bytes).map_err(|e| {
            LlmError::malformed(
                provider.as_str(),
                format!("response body is not JSON: {e}"),
                Some(String::from_utf8_lossy(&bytes).into_owned()),
            )
        })?;

        Ok(WireResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn with_provider(error: LlmError, provider: &str) -> LlmError {
    match error {
        LlmError::TransportError {
            status, message, ..
        } => LlmError::transport(provider, status, message),
        other => other,
    }
}

fn error_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_excerpt_truncates_long_bodies() {
        let long = "x".repeat(ERROR_BODY_LIMIT + 10);
        let excerpt = error_excerpt(&long);
        assert_eq!(excerpt.len(), ERROR_BODY_LIMIT + 3);
        assert_eq!(error_excerpt("  "), "empty response body");
        assert_eq!(error_excerpt("{\"error\":\"boom\"}"), "{\"error\":\"boom\"}");
    }

    #[test]
    fn provider_is_attached_to_transport_errors() {
        let err = with_provider(LlmError::transport("http", None, "refused"), "ollama");
        assert!(matches!(
            err,
            LlmError::TransportError { ref provider, status: None, .. } if provider == "ollama"
        ));
    }
}
