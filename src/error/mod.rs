//! Error Handling Module
//!
//! This module provides error handling for the library, including:
//! - Core error types (`LlmError`, `ErrorCategory`)
//! - The run-level wrapper (`RunError`) carrying partial step history
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust
//! use unillm::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::transport("ollama", Some(503), "Service Unavailable");
//! assert_eq!(error.category(), ErrorCategory::Transport);
//! assert!(error.is_retryable());
//! ```

// Module declarations
mod conversions;
pub mod types;

// Re-exports for public API
pub use types::*;
