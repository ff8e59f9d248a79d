//! Non-streaming orchestrator implementation.

use std::future::Future;

use tokio::time::Instant;
use tracing::Instrument;

use super::types::{OrchestratorOptions, RunState};
use crate::error::{LlmError, RunError};
use crate::execution::StepExecutor;
use crate::types::{ChatMessage, ChatOptions, FinishStatus, Response, Step};

/// Drives the ask → tool calls → tool results → re-ask loop.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    executor: StepExecutor,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Fails with [`LlmError::ConfigurationError`] when the options are invalid.
    pub fn new(executor: StepExecutor, options: OrchestratorOptions) -> Result<Self, LlmError> {
        options.validate()?;
        let executor = match &options.retry {
            Some(policy) => executor.with_retry(policy.clone()),
            None => executor,
        };
        Ok(Self { executor, options })
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Run the loop until the model answers without tool calls, the step
    /// budget is exhausted, or the run is cancelled.
    ///
    /// Budget exhaustion and cancellation are not errors: they yield a
    /// [`Response`] whose status says why the run stopped. Any error raised
    /// by a step aborts the run with the steps completed so far.
    pub async fn run(
        &self,
        conversation: Vec<ChatMessage>,
        chat_options: &ChatOptions,
    ) -> Result<Response, RunError> {
        let span = tracing::info_span!(
            "unillm.run",
            run_id = %uuid::Uuid::new_v4(),
            provider = %self.executor.provider_id(),
            model = %chat_options.model,
        );
        self.run_inner(conversation, chat_options)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        conversation: Vec<ChatMessage>,
        chat_options: &ChatOptions,
    ) -> Result<Response, RunError> {
        let provider = self.executor.provider_id().to_string();
        chat_options
            .validate()
            .map_err(|e| RunError::before_run(&provider, e))?;

        let max_steps = self.options.max_steps;
        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        let mut history = conversation;
        let mut steps: Vec<Step> = Vec::new();
        let mut state = RunState::Running;

        while state == RunState::Running {
            let step_index = steps.len();
            if self.is_cancelled(deadline) {
                state = RunState::Cancelled;
                break;
            }

            let outcome = self
                .guarded(deadline, self.executor.run_step(&history, chat_options))
                .await;
            let step = match outcome {
                Some(Ok(step)) => step,
                Some(Err(source)) => {
                    tracing::warn!(step = step_index, error = %source, "step failed");
                    return Err(RunError {
                        step_index,
                        provider,
                        steps,
                        source,
                    });
                }
                None => {
                    state = RunState::Cancelled;
                    break;
                }
            };

            tracing::info!(
                step = step_index,
                tool_calls = step.tool_calls.len(),
                prompt_tokens = step.usage.prompt_tokens,
                completion_tokens = step.usage.completion_tokens,
                "step completed"
            );
            if let Some(callback) = &self.options.on_step_finish {
                callback(&step);
            }

            history.extend(step.messages.iter().cloned());
            state = RunState::after_step(&step, step_index + 1, max_steps);
            steps.push(step);
        }

        let status = state.finish_status().unwrap_or(FinishStatus::Done);
        match status {
            FinishStatus::BudgetExceeded => {
                tracing::warn!(max_steps, "step budget exhausted with tool calls pending");
            }
            FinishStatus::Cancelled => {
                tracing::warn!(completed_steps = steps.len(), "run cancelled");
            }
            FinishStatus::Done => {}
        }

        Ok(Response::from_steps(steps, status))
    }

    fn is_cancelled(&self, deadline: Option<Instant>) -> bool {
        let cancelled = self
            .options
            .cancel
            .as_ref()
            .is_some_and(|c| c.is_cancelled());
        let expired = deadline.is_some_and(|at| Instant::now() >= at);
        cancelled || expired
    }

    /// Await `work` unless cancellation or the deadline fires first.
    async fn guarded<T>(&self, deadline: Option<Instant>, work: impl Future<Output = T>) -> Option<T> {
        let cancelled = async {
            match &self.options.cancel {
                Some(cancel) => cancel.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => None,
            _ = expired => None,
            out = work => Some(out),
        }
    }
}
