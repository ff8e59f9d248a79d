//! Ollama provider
//!
//! Talks to Ollama's native `/api/chat` endpoint (non-streaming). Images are
//! sent inline as base64; tool calls use Ollama's function-calling format.

pub mod adapter;
pub mod config;
pub mod types;
pub mod utils;

pub use adapter::OllamaAdapter;
pub use config::OllamaConfig;
