//! Ollama provider adapter

use std::sync::Arc;

use reqwest::header::HeaderMap;

use super::config::OllamaConfig;
use super::utils::{PROVIDER_ID, build_chat_request, build_headers, parse_chat_response};
use crate::error::LlmError;
use crate::execution::http::{HttpTransport, ReqwestTransport, WireRequest, WireResponse};
use crate::traits::ProviderAdapter;
use crate::types::{ChatMessage, ChatOptions, ParsedStep, ToolSet};

/// Adapter for Ollama's native `/api/chat` endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use unillm::providers::ollama::{OllamaAdapter, OllamaConfig};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let adapter = OllamaAdapter::new(OllamaConfig::from_env()?)?;
/// let response = unillm::text()
///     .using(adapter, "qwen2.5:14b")
///     .with_prompt("Who are you?")
///     .as_text()
///     .await?;
/// println!("{}", response.text);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaAdapter {
    config: OllamaConfig,
    headers: HeaderMap,
}

impl OllamaAdapter {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let headers = build_headers(&config)?;
        Ok(Self { config, headers })
    }

    /// Adapter for a local server on the default port.
    pub fn local() -> Result<Self, LlmError> {
        Self::new(OllamaConfig::default())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

impl ProviderAdapter for OllamaAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: &ToolSet,
        options: &ChatOptions,
    ) -> Result<WireRequest, LlmError> {
        let request = build_chat_request(messages, tools, options, &self.config)?;
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = tools.len(),
            "built ollama chat request"
        );
        Ok(WireRequest {
            provider: PROVIDER_ID.to_string(),
            url: self.config.chat_url(),
            headers: self.headers.clone(),
            body: serde_json::to_value(&request)?,
        })
    }

    fn parse_response(&self, response: WireResponse) -> Result<ParsedStep, LlmError> {
        parse_chat_response(&response.body)
    }

    /// A `reqwest` transport using the configured timeout.
    fn default_transport(&self) -> Result<Arc<dyn HttpTransport>, LlmError> {
        Ok(Arc::new(ReqwestTransport::new(self.config.timeout)?))
    }
}
