//! # unillm - A provider-agnostic LLM chat interface
//!
//! unillm sends a conversation to a language model, runs the tools the model
//! asks for, feeds the results back and repeats until the model answers in
//! plain text or a step budget runs out.
#![deny(unsafe_code)]

//! ## Layers
//!
//! - [`types`]: the canonical data model (messages, tools, steps, responses).
//! - [`traits::ProviderAdapter`]: a pure translator between that model and one
//!   provider's wire format. [`providers::ollama`] implements `/api/chat`.
//! - [`execution`]: HTTP transport and the single-step executor.
//! - [`orchestrator`]: the bounded multi-step loop.
//! - [`text`]: the fluent entry point tying them together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unillm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let weather = Tool::builder("weather")
//!         .description("Current weather for a city")
//!         .string_parameter("city", "City name")
//!         .handler(|args| async move {
//!             let city = args.get("city").and_then(|v| v.as_str()).unwrap_or("?");
//!             Ok::<_, String>(format!("Sunny in {city}"))
//!         })
//!         .build()?;
//!
//!     let response = unillm::text()
//!         .using(OllamaAdapter::local()?, "qwen2.5:14b")
//!         .with_tools([weather])
//!         .with_max_steps(4)
//!         .with_prompt("What's the weather in Paris?")
//!         .as_text()
//!         .await?;
//!
//!     println!("{} ({} steps)", response.text, response.steps.len());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod error;
pub mod execution;
pub mod orchestrator;
pub mod providers;
pub mod retry;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod utils;

pub use builder::{TextRequestBuilder, text};
pub use error::{LlmError, RunError};
pub use types::{
    AdditionalContent, ChatMessage, ChatOptions, FinishReason, FinishStatus, Image, Response,
    ResponseMeta, Step, Tool, ToolCall, ToolSet, Usage,
};

static_assertions::assert_impl_all!(Response: Send, Sync);
static_assertions::assert_impl_all!(ChatMessage: Send, Sync);
static_assertions::assert_impl_all!(Tool: Send, Sync, Clone);
static_assertions::assert_impl_all!(LlmError: Send, Sync, std::error::Error);
static_assertions::assert_impl_all!(RunError: Send, Sync, std::error::Error);

/// Commonly used items.
pub mod prelude {
    pub use crate::builder::{TextRequestBuilder, text};
    pub use crate::error::{ErrorCategory, LlmError, RunError};
    pub use crate::execution::StepExecutor;
    pub use crate::execution::http::{HttpTransport, ReqwestTransport};
    pub use crate::orchestrator::{Orchestrator, OrchestratorOptions};
    pub use crate::providers::ollama::{OllamaAdapter, OllamaConfig};
    pub use crate::retry::RetryPolicy;
    pub use crate::traits::ProviderAdapter;
    pub use crate::types::*;
    pub use crate::utils::cancel::CancelHandle;
}
