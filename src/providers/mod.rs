//! Provider adapters

pub mod ollama;
