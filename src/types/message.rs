//! Chat message types
//!
//! A conversation is an ordered `Vec<ChatMessage>`; order is the turn order
//! sent to the provider. Messages are plain values: constructing one never
//! performs I/O (image bytes are loaded lazily, see [`Image`]).

use super::media::Image;
use super::tools::ToolCall;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Content attached to a user or assistant message besides its text.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalContent {
    /// Media attachment (user messages).
    Image(Image),
    /// A tool call the model requested (assistant messages).
    ToolCall(ToolCall),
}

impl AdditionalContent {
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::ToolCall(call) => Some(call),
            _ => None,
        }
    }
}

/// Chat message
///
/// # Examples
///
/// ```rust
/// use unillm::types::{AdditionalContent, ChatMessage, Image};
///
/// let system = ChatMessage::system("You are terse.");
/// let user = ChatMessage::user_with(
///     "What is this image?",
///     vec![AdditionalContent::Image(Image::from_path("diamond.png"))],
/// );
/// assert_eq!(user.images().count(), 1);
/// assert_eq!(system.text(), "You are terse.");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
        additional_content: Vec<AdditionalContent>,
    },
    Assistant {
        content: String,
        additional_content: Vec<AdditionalContent>,
    },
    /// Output of one tool call, fed back to the model.
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: String,
    },
}

impl ChatMessage {
    /// Creates a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::user_with(content, Vec::new())
    }

    /// Creates a user message with attachments
    pub fn user_with(content: impl Into<String>, additional: Vec<AdditionalContent>) -> Self {
        Self::User {
            content: content.into(),
            additional_content: additional,
        }
    }

    /// Creates an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::assistant_with_tool_calls(content, Vec::new())
    }

    /// Creates an assistant message recording the tool calls it requested
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            additional_content: calls.into_iter().map(AdditionalContent::ToolCall).collect(),
        }
    }

    /// Creates a tool result message
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            result: result.into(),
        }
    }

    /// Attach an image (user and assistant messages; ignored otherwise).
    pub fn with_image(mut self, image: Image) -> Self {
        match &mut self {
            Self::User {
                additional_content, ..
            }
            | Self::Assistant {
                additional_content, ..
            } => additional_content.push(AdditionalContent::Image(image)),
            Self::System { .. } | Self::ToolResult { .. } => {}
        }
        self
    }

    pub const fn role(&self) -> MessageRole {
        match self {
            Self::System { .. } => MessageRole::System,
            Self::User { .. } => MessageRole::User,
            Self::Assistant { .. } => MessageRole::Assistant,
            Self::ToolResult { .. } => MessageRole::Tool,
        }
    }

    /// Text content (the result text for tool results)
    pub fn text(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content, .. }
            | Self::Assistant { content, .. } => content,
            Self::ToolResult { result, .. } => result,
        }
    }

    pub fn additional_content(&self) -> &[AdditionalContent] {
        match self {
            Self::User {
                additional_content, ..
            }
            | Self::Assistant {
                additional_content, ..
            } => additional_content,
            Self::System { .. } | Self::ToolResult { .. } => &[],
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.additional_content()
            .iter()
            .filter_map(AdditionalContent::as_image)
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.additional_content()
            .iter()
            .filter_map(AdditionalContent::as_tool_call)
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builders_preserve_attachment_order() {
        let first = Image::from_bytes(vec![1], "image/png");
        let second = Image::from_bytes(vec![2], "image/png");
        let msg = ChatMessage::user("two images")
            .with_image(first.clone())
            .with_image(second.clone());

        let images: Vec<_> = msg.images().cloned().collect();
        assert_eq!(images, vec![first, second]);
        assert_eq!(msg.role(), MessageRole::User);
    }

    #[test]
    fn assistant_records_tool_calls() {
        let call = ToolCall::new("call_1", "weather", json!({"city": "Detroit"}));
        let msg = ChatMessage::assistant_with_tool_calls("", vec![call.clone()]);
        assert_eq!(msg.tool_calls().collect::<Vec<_>>(), vec![&call]);
        assert_eq!(msg.images().count(), 0);
    }

    #[test]
    fn images_are_ignored_on_system_messages() {
        let msg = ChatMessage::system("persona").with_image(Image::from_bytes(vec![1], "image/png"));
        assert!(msg.additional_content().is_empty());
    }

    #[test]
    fn tool_result_text_is_the_result() {
        let msg = ChatMessage::tool_result("call_1", "search", "3pm");
        assert_eq!(msg.text(), "3pm");
        assert_eq!(msg.role().as_str(), "tool");
        assert!(msg.is_tool_result());
    }
}
