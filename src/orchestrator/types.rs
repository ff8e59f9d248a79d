//! Orchestrator types

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;
use crate::retry::RetryPolicy;
use crate::types::{FinishStatus, Step};
use crate::utils::cancel::CancelHandle;

/// Default step budget.
pub const DEFAULT_MAX_STEPS: usize = 8;

/// Step-finish callback.
pub type StepCallback = Arc<dyn Fn(&Step) + Send + Sync>;

/// Orchestrator options for non-streaming runs.
#[derive(Clone)]
pub struct OrchestratorOptions {
    /// Maximum steps to perform (including the final response step).
    pub max_steps: usize,
    /// Retry policy for each provider exchange; `None` disables retries.
    pub retry: Option<RetryPolicy>,
    /// Cancellation signal observed between and during steps.
    pub cancel: Option<CancelHandle>,
    /// Wall-clock budget for the whole run.
    pub deadline: Option<Duration>,
    /// Called after every completed step.
    pub on_step_finish: Option<StepCallback>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            retry: None,
            cancel: None,
            deadline: None,
            on_step_finish: None,
        }
    }
}

impl std::fmt::Debug for OrchestratorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorOptions")
            .field("max_steps", &self.max_steps)
            .field("retry", &self.retry)
            .field("cancel", &self.cancel.is_some())
            .field("deadline", &self.deadline)
            .field("on_step_finish", &self.on_step_finish.is_some())
            .finish()
    }
}

impl OrchestratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn on_step_finish(mut self, callback: impl Fn(&Step) + Send + Sync + 'static) -> Self {
        self.on_step_finish = Some(Arc::new(callback));
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.max_steps == 0 {
            return Err(LlmError::ConfigurationError(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// State of an orchestrated run.
///
/// `Running` is the only non-terminal state; each loop iteration performs
/// exactly one step and then either stays in `Running` or moves to one of
/// the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Done,
    BudgetExceeded,
    Cancelled,
}

impl RunState {
    /// State after a step completed.
    pub fn after_step(step: &Step, completed_steps: usize, max_steps: usize) -> Self {
        if !step.has_tool_calls() {
            Self::Done
        } else if completed_steps >= max_steps {
            Self::BudgetExceeded
        } else {
            Self::Running
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Finish status of a terminal state.
    pub const fn finish_status(&self) -> Option<FinishStatus> {
        match self {
            Self::Running => None,
            Self::Done => Some(FinishStatus::Done),
            Self::BudgetExceeded => Some(FinishStatus::BudgetExceeded),
            Self::Cancelled => Some(FinishStatus::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FinishReason, ResponseMeta, ToolCall, Usage};
    use serde_json::json;

    fn step(with_tools: bool) -> Step {
        let tool_calls = if with_tools {
            vec![ToolCall::new("", "search", json!({}))]
        } else {
            Vec::new()
        };
        Step {
            text: String::new(),
            tool_calls,
            usage: Usage::default(),
            meta: ResponseMeta::default(),
            finish_reason: FinishReason::Stop,
            messages: Vec::new(),
        }
    }

    #[test]
    fn transitions() {
        assert_eq!(RunState::after_step(&step(false), 3, 3), RunState::Done);
        assert_eq!(RunState::after_step(&step(true), 3, 3), RunState::BudgetExceeded);
        assert_eq!(RunState::after_step(&step(true), 1, 3), RunState::Running);
        assert!(!RunState::Running.is_terminal());
        assert_eq!(
            RunState::Cancelled.finish_status(),
            Some(FinishStatus::Cancelled)
        );
    }

    #[test]
    fn zero_step_budget_is_rejected() {
        let err = OrchestratorOptions::new().with_max_steps(0).validate().unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
        assert!(OrchestratorOptions::default().validate().is_ok());
    }
}
