//! Orchestrator for multi-step tool calling (non-streaming)
//!
//! This module implements a bounded loop: ask → tool calls → tool exec →
//! re-ask. Each iteration runs one step through the
//! [`StepExecutor`](crate::execution::StepExecutor); the loop ends when the
//! model answers without tool calls, when the step budget runs out, or when
//! the caller cancels.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use unillm::execution::StepExecutor;
//! use unillm::orchestrator::{Orchestrator, OrchestratorOptions};
//! use unillm::providers::ollama::OllamaAdapter;
//! use unillm::traits::ProviderAdapter;
//! use unillm::types::{ChatMessage, ChatOptions, ToolSet};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter = OllamaAdapter::local()?;
//! let transport = adapter.default_transport()?;
//! let executor = StepExecutor::new(Arc::new(adapter), transport, ToolSet::default());
//! let orchestrator = Orchestrator::new(executor, OrchestratorOptions::new().with_max_steps(4))?;
//!
//! let response = orchestrator
//!     .run(vec![ChatMessage::user("Who are you?")], &ChatOptions::new("qwen2.5:14b"))
//!     .await?;
//! println!("{} ({:?})", response.text, response.status);
//! # Ok(())
//! # }
//! ```

mod generate;
pub mod types;


pub use generate::Orchestrator;
pub use types::{DEFAULT_MAX_STEPS, OrchestratorOptions, RunState, StepCallback};
