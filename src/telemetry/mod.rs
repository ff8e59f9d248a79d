//! Telemetry and tracing utilities
//!
//! The library only emits `tracing` events and spans (one `unillm.run` span
//! per orchestrated run). Applications that do not install their own
//! subscriber can use the helpers here.
//!
//! ## Example
//!
//! ```rust,no_run
//! use unillm::telemetry::{OutputFormat, SubscriberConfig, init_subscriber};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config).expect("tracing init");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::LlmError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format
    Json,
    /// Compact JSON format
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Log level
    pub log_level: tracing::Level,
    /// Output format
    pub output_format: OutputFormat,
    /// Log file path; when set, logs go to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    /// Create a new builder for SubscriberConfig
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Create a debug configuration
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Read the configuration from the environment
    ///
    /// - `UNILLM_LOG_LEVEL`: trace, debug, info, warn, error
    /// - `UNILLM_LOG_FORMAT`: text, json, json-compact
    /// - `UNILLM_LOG_FILE`: log file path
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let mut builder = Self::builder();
        if let Some(level) = lookup("UNILLM_LOG_LEVEL") {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = lookup("UNILLM_LOG_FORMAT") {
            builder = builder.output_format(format.parse()?);
        }
        if let Some(path) = lookup("UNILLM_LOG_FILE") {
            builder = builder.log_file(PathBuf::from(path));
        }
        Ok(builder.build())
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    /// Set the log level
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let parsed = level.trim().parse::<tracing::Level>().map_err(|_| {
            LlmError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(parsed);
        Ok(self)
    }

    /// Set the output format
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set the log file path
    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// Initialize tracing subscriber with the given configuration
///
/// Returns the appender guard when file logging is enabled; keep it alive
/// for the duration of the program so buffered lines are flushed. An
/// already-installed global subscriber is left in place.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let level = config.log_level.as_str().to_lowercase();
    let filter = format!("unillm={level}");

    let (writer, guard, ansi) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Json => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .flatten_event(true)
            .try_init(),
        OutputFormat::Text => builder.try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let error_msg = e.to_string();
            // Another subscriber (or `log` bridge) is already installed.
            if error_msg.contains("already") {
                Ok(guard)
            } else {
                Err(LlmError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

fn file_writer(path: &std::path::Path) -> Result<(BoxMakeWriter, WorkerGuard), LlmError> {
    let file_name = path.file_name().ok_or_else(|| {
        LlmError::ConfigurationError(format!("log file path has no file name: {}", path.display()))
    })?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(|e| {
            LlmError::ConfigurationError(format!("cannot open log file {}: {e}", path.display()))
        })?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(non_blocking), guard))
}

/// Initialize tracing subscriber with default configuration
pub fn init_default() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::default())
}

/// Initialize tracing subscriber from `UNILLM_LOG_*` environment variables
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::from_env()?)
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
    fn config_from_environment() {
        let config = SubscriberConfig::from_lookup(lookup(&[
            ("UNILLM_LOG_LEVEL", "debug"),
            ("UNILLM_LOG_FORMAT", "json-compact"),
            ("UNILLM_LOG_FILE", "/tmp/unillm.log"),
        ]))
        .unwrap();

        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/unillm.log")));
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = SubscriberConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.log_level, tracing::Level::INFO);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(SubscriberConfig::from_lookup(lookup(&[("UNILLM_LOG_LEVEL", "loud")])).is_err());
        assert!(SubscriberConfig::from_lookup(lookup(&[("UNILLM_LOG_FORMAT", "xml")])).is_err());
    }
}
