//! Provider adapter contract
//!
//! An adapter is a pure translator between the canonical data model and one
//! provider's wire format. It performs no network I/O: the
//! [`StepExecutor`](crate::execution::StepExecutor) hands the built request
//! to an [`HttpTransport`](crate::execution::http::HttpTransport) and the
//! response body back to the adapter.

use std::sync::Arc;

use crate::error::LlmError;
use crate::execution::http::{HttpTransport, ReqwestTransport, WireRequest, WireResponse};
use crate::types::{ChatMessage, ChatOptions, ParsedStep, ToolSet};

/// Translate conversations to provider requests and provider responses back.
pub trait ProviderAdapter: Send + Sync {
    /// Provider identifier, used in errors and logs
    fn provider_id(&self) -> &str;

    /// Build the wire request for a conversation.
    ///
    /// Fails with [`LlmError::UnsupportedContent`] when the conversation holds
    /// something the provider cannot express and with
    /// [`LlmError::MediaUnavailable`] when attachment bytes cannot be loaded.
    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: &ToolSet,
        options: &ChatOptions,
    ) -> Result<WireRequest, LlmError>;

    /// Parse a successful response body.
    ///
    /// Fails with [`LlmError::MalformedResponse`] when required fields are
    /// missing or mistyped.
    fn parse_response(&self, response: WireResponse) -> Result<ParsedStep, LlmError>;

    /// Transport used when the caller does not supply one.
    fn default_transport(&self) -> Result<Arc<dyn HttpTransport>, LlmError> {
        Ok(Arc::new(ReqwestTransport::default()))
    }
}
