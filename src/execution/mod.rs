//! Request execution: HTTP plumbing and the single-step executor.

pub mod http;
pub mod step;

pub use step::StepExecutor;
