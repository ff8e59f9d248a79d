//! Core data model
//!
//! Provider-neutral messages, tools, usage and results. Adapters translate
//! these to and from each provider's wire format.

pub mod media;
pub mod message;
pub mod options;
pub mod response;
pub mod tools;
pub mod usage;

pub use media::{Image, MediaSource};
pub use message::{AdditionalContent, ChatMessage, MessageRole};
pub use options::ChatOptions;
pub use response::{FinishReason, FinishStatus, ParsedStep, Response, ResponseMeta, Step};
pub use tools::{ParameterType, Tool, ToolArguments, ToolBuilder, ToolCall, ToolParameter, ToolSet};
pub use usage::Usage;
