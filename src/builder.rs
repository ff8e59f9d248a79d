//! Fluent entry point for text generation
//!
//! ```rust,no_run
//! use unillm::providers::ollama::OllamaAdapter;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let response = unillm::text()
//!     .using(OllamaAdapter::local()?, "qwen2.5:14b")
//!     .with_system_prompt("Answer in one sentence.")
//!     .with_prompt("What is the capital of France?")
//!     .as_text()
//!     .await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{LlmError, RunError};
use crate::execution::StepExecutor;
use crate::execution::http::HttpTransport;
use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::retry::RetryPolicy;
use crate::traits::ProviderAdapter;
use crate::types::{ChatMessage, ChatOptions, Response, Step, Tool, ToolSet};
use crate::utils::cancel::CancelHandle;

/// Start building a text generation request.
pub fn text() -> TextRequestBuilder {
    TextRequestBuilder::default()
}

/// Collects the conversation, tools and options of one run.
#[derive(Default)]
pub struct TextRequestBuilder {
    adapter: Option<Arc<dyn ProviderAdapter>>,
    transport: Option<Arc<dyn HttpTransport>>,
    model: String,
    system_prompts: Vec<String>,
    messages: Vec<ChatMessage>,
    prompt: Option<String>,
    tools: Vec<Tool>,
    chat_options: Option<ChatOptions>,
    orchestrator: OrchestratorOptions,
}

impl std::fmt::Debug for TextRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRequestBuilder")
            .field(
                "provider",
                &self.adapter.as_ref().map(|a| a.provider_id().to_string()),
            )
            .field("model", &self.model)
            .field("system_prompts", &self.system_prompts)
            .field("messages", &self.messages.len())
            .field("prompt", &self.prompt)
            .field("tools", &self.tools.len())
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl TextRequestBuilder {
    /// Select the provider adapter and model.
    pub fn using(mut self, adapter: impl ProviderAdapter + 'static, model: impl Into<String>) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self.model = model.into();
        self
    }

    /// Same as [`using`](Self::using) for an adapter that is already shared.
    pub fn using_shared(mut self, adapter: Arc<dyn ProviderAdapter>, model: impl Into<String>) -> Self {
        self.adapter = Some(adapter);
        self.model = model.into();
        self
    }

    /// Add a system prompt. System prompts are sent first, in call order.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompts.push(prompt.into());
        self
    }

    /// Set the trailing user prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Append prior conversation messages.
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.orchestrator = self.orchestrator.with_max_steps(max_steps);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.chat_options = Some(self.take_chat_options().with_temperature(temperature));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.chat_options = Some(self.take_chat_options().with_max_tokens(max_tokens));
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.chat_options = Some(self.take_chat_options().with_top_p(top_p));
        self
    }

    /// Pass a provider-specific option through unchanged (for Ollama:
    /// `keep_alive`, `format`).
    pub fn with_provider_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.chat_options = Some(self.take_chat_options().with_provider_option(key, value));
        self
    }

    /// Replace the adapter's default HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.orchestrator = self.orchestrator.with_retry(policy);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.orchestrator = self.orchestrator.with_cancel(cancel);
        self
    }

    /// Wall-clock budget for the whole run.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_deadline(deadline);
        self
    }

    pub fn on_step_finish(mut self, callback: impl Fn(&Step) + Send + Sync + 'static) -> Self {
        self.orchestrator = self.orchestrator.on_step_finish(callback);
        self
    }

    /// Conversation as it will be sent on the first step.
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let mut conversation: Vec<ChatMessage> = self
            .system_prompts
            .iter()
            .map(|prompt| ChatMessage::system(prompt.clone()))
            .collect();
        conversation.extend(self.messages.iter().cloned());
        if let Some(prompt) = &self.prompt {
            conversation.push(ChatMessage::user(prompt.clone()));
        }
        conversation
    }

    /// Run the orchestrated loop and return the final response.
    pub async fn as_text(self) -> Result<Response, RunError> {
        let conversation = self.conversation();
        let Some(adapter) = self.adapter else {
            return Err(RunError::before_run(
                "unknown",
                LlmError::ConfigurationError(
                    "no provider selected; call `using` before `as_text`".to_string(),
                ),
            ));
        };
        let provider = adapter.provider_id().to_string();
        let fail = |e: LlmError| RunError::before_run(&provider, e);

        if conversation.is_empty() {
            return Err(fail(LlmError::ConfigurationError(
                "nothing to send; add a prompt or messages".to_string(),
            )));
        }

        let tools = ToolSet::new(self.tools).map_err(fail)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => adapter.default_transport().map_err(fail)?,
        };
        let mut chat_options = self.chat_options.unwrap_or_default();
        chat_options.model = self.model;

        let executor = StepExecutor::new(adapter, transport, tools);
        let orchestrator = Orchestrator::new(executor, self.orchestrator).map_err(fail)?;
        orchestrator.run(conversation, &chat_options).await
    }

    fn take_chat_options(&mut self) -> ChatOptions {
        self.chat_options.take().unwrap_or_default()
    }
}
