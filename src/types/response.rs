//! Step and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::tools::ToolCall;
use super::usage::Usage;

/// Response metadata reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Response id; empty when the provider does not assign one.
    pub id: String,
    /// Model that produced the response
    pub model: String,
    /// Creation time, when reported
    pub created_at: Option<DateTime<Utc>>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Completed naturally.
    Stop,
    /// Reached the token limit.
    Length,
    /// Requested tool calls.
    ToolCalls,
    /// Provider-specific reason.
    Other(String),
    /// Not reported.
    Unknown,
}

/// How an orchestrated run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishStatus {
    /// The model answered without requesting tools.
    Done,
    /// The step budget ran out while the model still wanted tools.
    BudgetExceeded,
    /// Cancelled by the caller or the deadline.
    Cancelled,
}

/// Provider-neutral result of parsing one response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStep {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
    pub meta: ResponseMeta,
    pub finish_reason: FinishReason,
}

/// One request/response exchange plus the tool executions it triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Assistant text of this exchange (may be empty)
    pub text: String,
    /// Tool calls requested, in provider order
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
    pub meta: ResponseMeta,
    pub finish_reason: FinishReason,
    /// The assistant message followed by one tool result per call.
    pub messages: Vec<ChatMessage>,
}

impl Step {
    /// Whether the model asked for tools in this step
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Tool result messages produced by this step
    pub fn tool_results(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.is_tool_result())
    }
}

/// Final result of an orchestrated run.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Text of the last step
    pub text: String,
    /// Every executed step, in order
    pub steps: Vec<Step>,
    /// Sum of the usage of all steps
    pub usage: Usage,
    /// Metadata of the last step
    pub meta: ResponseMeta,
    pub status: FinishStatus,
}

impl Response {
    /// Assemble a response from completed steps.
    ///
    /// Text and meta come from the last step (empty when no step completed);
    /// usage is summed across all steps.
    pub fn from_steps(steps: Vec<Step>, status: FinishStatus) -> Self {
        let usage = steps.iter().map(|s| s.usage).sum();
        let (text, meta) = steps
            .last()
            .map(|s| (s.text.clone(), s.meta.clone()))
            .unwrap_or_default();
        Self {
            text,
            steps,
            usage,
            meta,
            status,
        }
    }

    /// True when the run stopped before the model produced a final answer.
    pub fn is_truncated(&self) -> bool {
        self.status != FinishStatus::Done
    }

    /// Full message history produced by the run.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.steps.iter().flat_map(|s| s.messages.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(text: &str, id: &str, usage: Usage) -> Step {
        Step {
            text: text.to_string(),
            tool_calls: Vec::new(),
            usage,
            meta: ResponseMeta {
                id: id.to_string(),
                model: "qwen2.5:14b".to_string(),
                created_at: None,
            },
            finish_reason: FinishReason::Stop,
            messages: vec![ChatMessage::assistant(text)],
        }
    }

    #[test]
    fn response_takes_last_step_text_and_meta() {
        let steps = vec![
            step("", "first", Usage::new(10, 2)),
            step("done", "", Usage::new(20, 4)),
        ];
        let response = Response::from_steps(steps, FinishStatus::Done);

        assert_eq!(response.text, "done");
        assert_eq!(response.meta.id, "");
        assert_eq!(response.usage, Usage::new(30, 6));
        assert!(!response.is_truncated());
        assert_eq!(response.messages().count(), 2);
    }

    #[test]
    fn empty_cancelled_response() {
        let response = Response::from_steps(Vec::new(), FinishStatus::Cancelled);
        assert_eq!(response.text, "");
        assert_eq!(response.usage, Usage::default());
        assert!(response.is_truncated());
    }
}
