//! Core error types.

use thiserror::Error;

use crate::types::Step;

/// Error raised anywhere between message construction and tool execution.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// A tool definition (or a tool set) is invalid.
    #[error("Invalid tool spec: {0}")]
    InvalidToolSpec(String),

    /// The conversation contains something the provider cannot express.
    #[error("{provider} does not support {message}")]
    UnsupportedContent { provider: String, message: String },

    /// The provider answered with a body we could not interpret.
    #[error("Malformed {provider} response: {message}")]
    MalformedResponse {
        provider: String,
        message: String,
        /// Raw response body, when one was received.
        raw: Option<String>,
    },

    /// The model asked for a tool that is not part of the request.
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// A tool handler (or its argument validation) failed.
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecutionError { tool: String, message: String },

    /// Bytes for a media attachment could not be obtained.
    #[error("Media unavailable ({origin}): {message}")]
    MediaUnavailable { origin: String, message: String },

    /// Network, timeout or non-success HTTP status.
    #[error("{provider} transport error{}: {message}", status_suffix(.status))]
    TransportError {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// Invalid caller-supplied configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    JsonError(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Coarse grouping used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller-side mistakes: tool specs, unsupported content.
    Client,
    /// The provider returned something unusable.
    Provider,
    /// Local tool resolution or execution.
    Tool,
    /// Network or HTTP-status failures.
    Transport,
    /// Media attachment loading.
    Media,
    /// Configuration validation.
    Configuration,
}

impl LlmError {
    /// Shorthand for a [`LlmError::TransportError`].
    pub fn transport(
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::TransportError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a [`LlmError::MalformedResponse`].
    pub fn malformed(
        provider: impl Into<String>,
        message: impl Into<String>,
        raw: Option<String>,
    ) -> Self {
        Self::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
            raw,
        }
    }

    /// Shorthand for a [`LlmError::UnsupportedContent`].
    pub fn unsupported(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedContent {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`LlmError::MediaUnavailable`].
    pub fn media_unavailable(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MediaUnavailable {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`LlmError::ToolExecutionError`].
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecutionError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Error category.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidToolSpec(_) | Self::UnsupportedContent { .. } => ErrorCategory::Client,
            Self::MalformedResponse { .. } | Self::JsonError(_) => ErrorCategory::Provider,
            Self::UnknownTool { .. } | Self::ToolExecutionError { .. } => ErrorCategory::Tool,
            Self::MediaUnavailable { .. } => ErrorCategory::Media,
            Self::TransportError { .. } => ErrorCategory::Transport,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether a retry policy may attempt the failed exchange again.
    ///
    /// Only transport failures qualify: connection-level errors (no status),
    /// request timeouts, rate limiting and server errors.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::TransportError { status, .. } => match status {
                None => true,
                Some(code) => *code == 408 || *code == 429 || *code >= 500,
            },
            _ => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::TransportError { status, .. } => *status,
            _ => None,
        }
    }
}

/// Failure of a whole orchestrated run.
///
/// Carries the steps that completed before the failure so callers can
/// inspect progress without re-running the conversation.
#[derive(Debug, Clone, Error)]
#[error("{provider} run failed at step {step_index}: {source}")]
pub struct RunError {
    /// Zero-based index of the step that failed.
    pub step_index: usize,
    /// Provider id of the adapter in use.
    pub provider: String,
    /// Steps completed before the failure.
    pub steps: Vec<Step>,
    /// Underlying error.
    #[source]
    pub source: LlmError,
}

impl RunError {
    /// Wrap an error raised before any step ran (configuration, tool set).
    pub fn before_run(provider: impl Into<String>, source: LlmError) -> Self {
        Self {
            step_index: 0,
            provider: provider.into(),
            steps: Vec::new(),
            source,
        }
    }

    /// Borrow the underlying error.
    pub const fn error(&self) -> &LlmError {
        &self.source
    }

    /// Discard the partial history and keep the underlying error.
    pub fn into_inner(self) -> LlmError {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_classify_retryability_by_status() {
        assert!(LlmError::transport("ollama", None, "connection refused").is_retryable());
        assert!(LlmError::transport("ollama", Some(429), "slow down").is_retryable());
        assert!(LlmError::transport("ollama", Some(502), "bad gateway").is_retryable());
        assert!(!LlmError::transport("ollama", Some(404), "model not found").is_retryable());
        assert!(!LlmError::UnknownTool { name: "x".into() }.is_retryable());
    }

    #[test]
    fn transport_display_includes_status_when_present() {
        let err = LlmError::transport("ollama", Some(500), "boom");
        assert_eq!(err.to_string(), "ollama transport error (HTTP 500): boom");

        let err = LlmError::transport("ollama", None, "timed out");
        assert_eq!(err.to_string(), "ollama transport error: timed out");
    }

    #[test]
    fn run_error_exposes_context() {
        let err = RunError {
            step_index: 2,
            provider: "ollama".into(),
            steps: Vec::new(),
            source: LlmError::UnknownTool {
                name: "weather".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "ollama run failed at step 2: Unknown tool: weather"
        );
        assert_eq!(err.error().category(), ErrorCategory::Tool);
        assert!(matches!(err.into_inner(), LlmError::UnknownTool { .. }));
    }
}
