//! Step executor
//!
//! One step is a single request/response exchange with the provider plus the
//! tool executions the response asked for.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::LlmError;
use crate::execution::http::{HttpTransport, WireRequest, WireResponse};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::traits::ProviderAdapter;
use crate::types::{ChatMessage, ChatOptions, Step, Tool, ToolSet};

/// Runs single steps against one provider.
#[derive(Clone)]
pub struct StepExecutor {
    adapter: Arc<dyn ProviderAdapter>,
    transport: Arc<dyn HttpTransport>,
    tools: ToolSet,
    retry: Option<RetryExecutor>,
}

impl StepExecutor {
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        transport: Arc<dyn HttpTransport>,
        tools: ToolSet,
    ) -> Self {
        Self {
            adapter,
            transport,
            tools,
            retry: None,
        }
    }

    /// Retry failed transport exchanges with `policy`.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(RetryExecutor::new(policy));
        self
    }

    pub fn provider_id(&self) -> &str {
        self.adapter.provider_id()
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Run one step over `conversation`.
    ///
    /// Every requested tool is resolved before any of them runs, so an
    /// unknown tool name fails the step without side effects. Tools then run
    /// concurrently; their results are appended in the order the provider
    /// listed the calls.
    pub async fn run_step(
        &self,
        conversation: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<Step, LlmError> {
        let request = self
            .adapter
            .build_request(conversation, &self.tools, options)?;
        let response = self.exchange(request).await?;
        let parsed = self.adapter.parse_response(response)?;

        let resolved: Vec<&Tool> = parsed
            .tool_calls
            .iter()
            .map(|call| self.tools.resolve(&call.name))
            .collect::<Result<_, _>>()?;

        let outputs = join_all(
            resolved
                .iter()
                .zip(&parsed.tool_calls)
                .map(|(tool, call)| tool.invoke(call.arguments.clone())),
        )
        .await;

        let mut messages = Vec::with_capacity(parsed.tool_calls.len() + 1);
        messages.push(ChatMessage::assistant_with_tool_calls(
            parsed.text.clone(),
            parsed.tool_calls.clone(),
        ));
        for (call, output) in parsed.tool_calls.iter().zip(outputs) {
            let result = output?;
            tracing::debug!(tool = %call.name, call_id = %call.id, "tool call completed");
            messages.push(ChatMessage::tool_result(&call.id, &call.name, result));
        }

        Ok(Step {
            text: parsed.text,
            tool_calls: parsed.tool_calls,
            usage: parsed.usage,
            meta: parsed.meta,
            finish_reason: parsed.finish_reason,
            messages,
        })
    }

    async fn exchange(&self, request: WireRequest) -> Result<WireResponse, LlmError> {
        match &self.retry {
            Some(retry) => {
                retry
                    .execute(|| {
                        let request = request.clone();
                        async move { self.transport.send(request).await }
                    })
                    .await
            }
            None => self.transport.send(request).await,
        }
    }
}

impl std::fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepExecutor")
            .field("provider", &self.adapter.provider_id())
            .field("tools", &self.tools.len())
            .field("retry", &self.retry.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use crate::providers::ollama::OllamaAdapter;
    use crate::types::{FinishReason, ToolArguments, Usage};

    /// Transport returning canned bodies in order and recording requests.
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<Value, LlmError>>>,
        requests: Mutex<Vec<Value>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Value, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: WireRequest) -> Result<WireResponse, LlmError> {
            self.requests.lock().unwrap().push(request.body);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(LlmError::transport("mock", None, "no more responses"));
            }
            responses.remove(0).map(|body| WireResponse { status: 200, body })
        }
    }

    fn tool_call_body(calls: Value) -> Value {
        json!({
            "model": "qwen2.5:14b",
            "message": {"role": "assistant", "content": "", "tool_calls": calls},
            "done_reason": "stop",
            "prompt_eval_count": 20,
            "eval_count": 8
        })
    }

    fn slow_tool(name: &str, delay_ms: u64, output: &'static str) -> Tool {
        Tool::builder(name)
            .description("test tool")
            .string_parameter("input", "input")
            .handler(move |_args: ToolArguments| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok::<_, String>(output.to_string())
            })
            .build()
            .unwrap()
    }

    fn executor(transport: Arc<ScriptedTransport>, tools: Vec<Tool>) -> StepExecutor {
        StepExecutor::new(
            Arc::new(OllamaAdapter::local().unwrap()),
            transport,
            ToolSet::new(tools).unwrap(),
        )
    }

    #[tokio::test]
    async fn tool_results_follow_call_order() {
        let transport = ScriptedTransport::new(vec![Ok(tool_call_body(json!([
            {"function": {"name": "slow", "arguments": {"input": "a"}}},
            {"function": {"name": "fast", "arguments": {"input": "b"}}}
        ])))]);
        let executor = executor(
            transport,
            vec![slow_tool("slow", 30, "slow done"), slow_tool("fast", 0, "fast done")],
        );

        let step = executor
            .run_step(&[ChatMessage::user("go")], &ChatOptions::new("qwen2.5:14b"))
            .await
            .unwrap();

        assert_eq!(step.finish_reason, FinishReason::ToolCalls);
        assert_eq!(step.usage, Usage::new(20, 8));
        assert_eq!(step.messages.len(), 3);
        assert_eq!(step.messages[0].tool_calls().count(), 2);
        let results: Vec<&str> = step.tool_results().map(ChatMessage::text).collect();
        assert_eq!(results, vec!["slow done", "fast done"]);
    }

    #[tokio::test]
    async fn unknown_tools_fail_before_any_tool_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let known = Tool::builder("known")
            .handler(move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("ran".to_string())
                }
            })
            .build()
            .unwrap();

        let transport = ScriptedTransport::new(vec![Ok(tool_call_body(json!([
            {"function": {"name": "known", "arguments": {}}},
            {"function": {"name": "missing", "arguments": {}}}
        ])))]);
        let err = executor(transport, vec![known])
            .run_step(&[ChatMessage::user("go")], &ChatOptions::new("llama3"))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::UnknownTool { ref name } if name == "missing"));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retry_policy_wraps_the_exchange() {
        let transport = ScriptedTransport::new(vec![
            Err(LlmError::transport("ollama", Some(503), "loading model")),
            Ok(json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": "hello"}
            })),
        ]);
        let executor = executor(transport.clone(), vec![]).with_retry(
            RetryPolicy::new()
                .with_initial_delay(Duration::from_millis(1))
                .with_jitter(false),
        );

        let step = executor
            .run_step(&[ChatMessage::user("hi")], &ChatOptions::new("llama3"))
            .await
            .unwrap();
        assert_eq!(step.text, "hello");
        assert_eq!(transport.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn without_retry_transport_errors_surface_immediately() {
        let transport = ScriptedTransport::new(vec![Err(LlmError::transport(
            "ollama",
            Some(503),
            "loading model",
        ))]);
        let err = executor(transport.clone(), vec![])
            .run_step(&[ChatMessage::user("hi")], &ChatOptions::new("llama3"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }
}
