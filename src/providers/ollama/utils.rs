//! Ollama utility functions (protocol layer)
//!
//! Conversions between the canonical data model and `/api/chat` payloads.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde_json::{Map, Value, json};

use super::config::OllamaConfig;
use super::types::*;
use crate::error::LlmError;
use crate::execution::http::HttpHeaderBuilder;
use crate::types::{
    AdditionalContent, ChatMessage, ChatOptions, FinishReason, ParsedStep, ResponseMeta, Tool,
    ToolCall, ToolSet, Usage,
};

pub(crate) const PROVIDER_ID: &str = "ollama";

/// Build HTTP headers for Ollama requests
pub fn build_headers(config: &OllamaConfig) -> Result<HeaderMap, LlmError> {
    let version = env!("CARGO_PKG_VERSION");
    let mut builder = HttpHeaderBuilder::new()
        .with_json_content_type()
        .with_user_agent(&format!("unillm/{version}"))?;
    if let Some(token) = config.bearer_token() {
        builder = builder.with_bearer_auth(token)?;
    }
    Ok(builder.build())
}

/// Convert a canonical message to Ollama format
pub fn convert_chat_message(message: &ChatMessage) -> Result<OllamaChatMessage, LlmError> {
    match message {
        ChatMessage::System { content } => Ok(OllamaChatMessage::new("system", content)),
        ChatMessage::User {
            content,
            additional_content,
        } => {
            let mut ollama_message = OllamaChatMessage::new("user", content);
            let mut images = Vec::new();
            for part in additional_content {
                match part {
                    AdditionalContent::Image(image) => {
                        if let Some(url) = image.url() {
                            return Err(LlmError::unsupported(
                                PROVIDER_ID,
                                format!("image URLs ({url}); attach the bytes instead"),
                            ));
                        }
                        images.push(image.base64()?);
                    }
                    AdditionalContent::ToolCall(call) => {
                        return Err(LlmError::unsupported(
                            PROVIDER_ID,
                            format!("tool call '{}' on a user message", call.name),
                        ));
                    }
                }
            }
            if !images.is_empty() {
                ollama_message.images = Some(images);
            }
            Ok(ollama_message)
        }
        ChatMessage::Assistant {
            content,
            additional_content,
        } => {
            let mut ollama_message = OllamaChatMessage::new("assistant", content);
            let mut tool_calls = Vec::new();
            for part in additional_content {
                match part {
                    AdditionalContent::ToolCall(call) => tool_calls.push(OllamaToolCall {
                        id: None,
                        function: OllamaFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    }),
                    AdditionalContent::Image(_) => {
                        return Err(LlmError::unsupported(
                            PROVIDER_ID,
                            "images on assistant messages",
                        ));
                    }
                }
            }
            if !tool_calls.is_empty() {
                ollama_message.tool_calls = Some(tool_calls);
            }
            Ok(ollama_message)
        }
        ChatMessage::ToolResult {
            tool_name, result, ..
        } => {
            let mut ollama_message = OllamaChatMessage::new("tool", result);
            ollama_message.tool_name = Some(tool_name.clone());
            Ok(ollama_message)
        }
    }
}

/// Convert a tool to Ollama format
pub fn convert_tool(tool: &Tool) -> OllamaTool {
    OllamaTool {
        tool_type: "function".to_string(),
        function: OllamaFunction {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.schema().clone(),
        },
    }
}

/// Build model options from common parameters
pub fn build_model_options(options: &ChatOptions) -> Map<String, Value> {
    let mut model_options = Map::new();
    if let Some(temperature) = options.temperature {
        model_options.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(top_p) = options.top_p {
        model_options.insert("top_p".to_string(), json!(top_p));
    }
    if let Some(max_tokens) = options.max_tokens {
        model_options.insert("num_predict".to_string(), json!(max_tokens));
    }
    model_options
}

fn parse_format_value(format: &Value) -> Option<Value> {
    match format {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) if s == "json" => Some(Value::String("json".to_string())),
        Value::String(s) => match serde_json::from_str(s) {
            Ok(schema) => Some(schema),
            Err(_) => Some(Value::String(s.clone())),
        },
        other => Some(other.clone()),
    }
}

/// Build an Ollama `/api/chat` request.
///
/// `keep_alive` and `format` are taken from the provider options, falling
/// back to the configured `keep_alive`.
pub fn build_chat_request(
    messages: &[ChatMessage],
    tools: &ToolSet,
    options: &ChatOptions,
    config: &OllamaConfig,
) -> Result<OllamaChatRequest, LlmError> {
    validate_model_name(&options.model)?;

    let messages = messages
        .iter()
        .map(convert_chat_message)
        .collect::<Result<Vec<_>, _>>()?;

    let tools = if tools.is_empty() {
        None
    } else {
        Some(tools.iter().map(convert_tool).collect())
    };

    let keep_alive = options
        .provider_option("keep_alive")
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .or_else(|| config.keep_alive.clone());

    let format = options.provider_option("format").and_then(parse_format_value);

    let model_options = build_model_options(options);

    Ok(OllamaChatRequest {
        model: options.model.clone(),
        messages,
        tools,
        stream: false,
        format,
        options: if model_options.is_empty() {
            None
        } else {
            Some(model_options)
        },
        keep_alive,
    })
}

/// Validate model name format
pub fn validate_model_name(model: &str) -> Result<(), LlmError> {
    if model.is_empty() {
        return Err(LlmError::ConfigurationError(
            "Model name cannot be empty".to_string(),
        ));
    }
    if model.chars().any(char::is_whitespace) {
        return Err(LlmError::ConfigurationError(format!(
            "Model name contains whitespace: '{model}'"
        )));
    }
    Ok(())
}

/// Parse an `/api/chat` response body.
pub fn parse_chat_response(body: &Value) -> Result<ParsedStep, LlmError> {
    let malformed = |message: String| LlmError::malformed(PROVIDER_ID, message, Some(body.to_string()));

    let Some(object) = body.as_object() else {
        return Err(malformed("response body is not a JSON object".to_string()));
    };
    if let Some(error) = object.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(malformed(format!("provider reported an error: {message}")));
    }
    let Some(message) = object.get("message") else {
        return Err(malformed("missing 'message'".to_string()));
    };
    if !message.get("role").is_some_and(Value::is_string) {
        return Err(malformed("missing or non-string 'message.role'".to_string()));
    }
    if !message.get("content").is_some_and(Value::is_string) {
        return Err(malformed(
            "missing or non-string 'message.content'".to_string(),
        ));
    }

    let response: OllamaChatResponse = serde_json::from_value(body.clone())
        .map_err(|e| malformed(format!("unexpected response shape: {e}")))?;

    let tool_calls = response
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(convert_tool_call)
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed)?;

    let finish_reason = if tool_calls.is_empty() {
        map_done_reason(response.done_reason.as_deref())
    } else {
        FinishReason::ToolCalls
    };

    Ok(ParsedStep {
        text: response.message.content,
        tool_calls,
        usage: Usage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        ),
        meta: ResponseMeta {
            id: response.id.unwrap_or_default(),
            model: response.model.unwrap_or_default(),
            created_at: response.created_at.as_deref().and_then(parse_created_at),
        },
        finish_reason,
    })
}

fn convert_tool_call(call: OllamaToolCall) -> Result<ToolCall, String> {
    let name = call.function.name;
    if name.is_empty() {
        return Err("tool call without a function name".to_string());
    }
    let arguments = match call.function.arguments {
        Value::String(raw) if raw.trim().is_empty() => Value::Object(Map::new()),
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| format!("arguments of tool call '{name}' are not valid JSON: {e}"))?,
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    Ok(ToolCall::new(call.id.unwrap_or_default(), name, arguments))
}

/// Map Ollama's `done_reason`
pub fn map_done_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("") | None => FinishReason::Unknown,
        Some(other) => FinishReason::Other(other.to_string()),
    }
}

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(created_at = raw, error = %e, "ignoring unparseable created_at");
            None
        }
    }
}
