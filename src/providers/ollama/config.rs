//! Ollama configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

/// Default local Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default request timeout; local models can be slow to load.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for an Ollama server.
#[derive(Clone)]
pub struct OllamaConfig {
    /// Server base URL (without `/api/chat`)
    pub base_url: String,
    /// Bearer token for hosted or proxied servers
    pub api_key: Option<SecretString>,
    /// Per-request timeout used by the default transport
    pub timeout: Duration,
    /// How long the server keeps the model loaded (e.g. `"5m"`)
    pub keep_alive: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            keep_alive: None,
        }
    }
}

impl std::fmt::Debug for OllamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaConfig")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("timeout", &self.timeout)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Read settings from the environment.
    ///
    /// - `OLLAMA_BASE_URL` (or `OLLAMA_URL`)
    /// - `OLLAMA_API_KEY`
    /// - `OLLAMA_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let mut config = Self::default();
        if let Some(url) = lookup("OLLAMA_BASE_URL").or_else(|| lookup("OLLAMA_URL")) {
            config.base_url = url;
        }
        if let Some(key) = lookup("OLLAMA_API_KEY").filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(SecretString::from(key));
        }
        if let Some(secs) = lookup("OLLAMA_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                LlmError::ConfigurationError(format!("invalid OLLAMA_TIMEOUT_SECS '{secs}': {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(LlmError::ConfigurationError(
                "Ollama base URL must not be empty".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(LlmError::ConfigurationError(format!(
                "Ollama base URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.timeout.is_zero() {
            return Err(LlmError::ConfigurationError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Full chat endpoint URL.
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn bearer_token(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_server() {
        let config = OllamaConfig::default();
        assert_eq!(config.chat_url(), "http://localhost:11434/api/chat");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.bearer_token().is_none());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = OllamaConfig::from_lookup(lookup(&[
            ("OLLAMA_URL", "http://gpu-box:11434/"),
            ("OLLAMA_API_KEY", "secret"),
            ("OLLAMA_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.chat_url(), "http://gpu-box:11434/api/chat");
        assert_eq!(config.bearer_token(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn base_url_takes_precedence_over_alias() {
        let config = OllamaConfig::from_lookup(lookup(&[
            ("OLLAMA_BASE_URL", "http://primary:11434"),
            ("OLLAMA_URL", "http://alias:11434"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://primary:11434");
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let err = OllamaConfig::from_lookup(lookup(&[("OLLAMA_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));

        let err = OllamaConfig::new("localhost:11434").validate().unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }
}
