//! Per-request generation options

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LlmError;

/// Generation options shared by all providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Model name
    pub model: String,

    /// Temperature parameter (must be non-negative)
    pub temperature: Option<f64>,

    /// Maximum output tokens
    pub max_tokens: Option<u32>,

    /// `top_p` parameter (0.0 to 1.0)
    pub top_p: Option<f64>,

    /// Provider-specific fields, passed through by adapters that know them
    /// (for Ollama: `keep_alive`, `format`).
    pub provider_options: Map<String, Value>,
}

impl ChatOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_provider_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.provider_options.insert(key.into(), value.into());
        self
    }

    pub fn provider_option(&self, key: &str) -> Option<&Value> {
        self.provider_options.get(key)
    }

    /// Check the options before any request is built.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "model must not be empty".to_string(),
            ));
        }
        if let Some(temperature) = self.temperature {
            if !temperature.is_finite() || temperature < 0.0 {
                return Err(LlmError::ConfigurationError(format!(
                    "temperature must be non-negative, got {temperature}"
                )));
            }
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(LlmError::ConfigurationError(format!(
                    "top_p must be between 0.0 and 1.0, got {top_p}"
                )));
            }
        }
        Ok(())
    }
}
