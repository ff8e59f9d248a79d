//! Ollama `/api/chat` wire types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ollama chat request
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest {
    /// Model name
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<OllamaChatMessage>,
    /// Tools available to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OllamaTool>>,
    /// Whether to stream the response
    pub stream: bool,
    /// Output format (json or schema)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    /// Additional model options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    /// Keep model loaded duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

/// Ollama chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    /// Role of the message sender
    pub role: String,
    /// Content of the message
    pub content: String,
    /// Images for multimodal models (base64 encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Tool calls made by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
    /// Name of the tool whose result this message carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl OllamaChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            images: None,
            tool_calls: None,
            tool_name: None,
        }
    }
}

/// Ollama tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaTool {
    /// Type of tool (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function definition
    pub function: OllamaFunction,
}

/// Ollama function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaFunction {
    pub name: String,
    pub description: String,
    /// Function parameters schema
    pub parameters: Value,
}

/// Ollama tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaToolCall {
    /// Only some server versions assign call ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function being called
    pub function: OllamaFunctionCall,
}

/// Ollama function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaFunctionCall {
    pub name: String,
    /// Function arguments: an object, or a JSON-encoded object string
    #[serde(default)]
    pub arguments: Value,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse {
    /// Response id (not sent by stock Ollama)
    #[serde(default)]
    pub id: Option<String>,
    /// Model used
    #[serde(default)]
    pub model: Option<String>,
    /// Creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Response message
    pub message: OllamaChatMessage,
    /// Reason for completion
    #[serde(default)]
    pub done_reason: Option<String>,
    /// Prompt evaluation count
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    /// Evaluation count
    #[serde(default)]
    pub eval_count: Option<u32>,
}
