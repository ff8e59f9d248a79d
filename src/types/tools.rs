//! Tool calling and function definition types
//!
//! A [`Tool`] couples a JSON-Schema-described signature with an async
//! handler. The schema is generated from the declared parameters once, when
//! the tool is defined, and reused both for the provider wire format and for
//! validating the arguments a model sends back.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::LlmError;

/// Arguments passed to a tool handler: the JSON object the model produced.
pub type ToolArguments = Map<String, Value>;

type ToolHandler = Arc<dyn Fn(ToolArguments) -> BoxFuture<'static, Result<String, String>> + Send + Sync>;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id; empty when the provider does not assign one.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// JSON type of a tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    /// A string restricted to the listed values.
    Enum(Vec<String>),
    /// A list whose items have the given type.
    Array(Box<ParameterType>),
}

impl ParameterType {
    fn schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Number => json!({ "type": "number" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Enum(values) => json!({ "type": "string", "enum": values }),
            Self::Array(items) => json!({ "type": "array", "items": items.schema() }),
        }
    }
}

/// A named, typed, described tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub param_type: ParameterType,
    pub required: bool,
}

impl ToolParameter {
    /// A required parameter.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        param_type: ParameterType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type,
            required: true,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterType::String)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterType::Number)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterType::Integer)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterType::Boolean)
    }

    /// Mark the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn schema(&self) -> Value {
        let mut schema = self.param_type.schema();
        if let Value::Object(map) = &mut schema {
            map.insert(
                "description".to_string(),
                Value::String(self.description.clone()),
            );
        }
        schema
    }
}

/// A callable tool.
///
/// # Examples
///
/// ```rust
/// use unillm::types::{Tool, ToolArguments};
///
/// let weather = Tool::builder("get_weather")
///     .description("Current weather for a city")
///     .string_parameter("city", "City name")
///     .handler(|args: ToolArguments| async move {
///         let city = args["city"].as_str().unwrap_or_default().to_string();
///         Ok::<_, std::convert::Infallible>(format!("Sunny in {city}"))
///     })
///     .build()
///     .unwrap();
/// assert_eq!(weather.name(), "get_weather");
/// ```
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    schema: Value,
    validator: Arc<jsonschema::Validator>,
    handler: ToolHandler,
}

impl Tool {
    /// Define a tool from its parts.
    ///
    /// Fails with [`LlmError::InvalidToolSpec`] when the name is blank or a
    /// parameter name is declared twice.
    pub fn define<F, Fut, E>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ToolParameter>,
        handler: F,
    ) -> Result<Self, LlmError>
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::from_parts(name.into(), description.into(), parameters, box_handler(handler))
    }

    /// Start a fluent tool definition.
    pub fn builder(name: impl Into<String>) -> ToolBuilder {
        ToolBuilder::new(name)
    }

    fn from_parts(
        name: String,
        description: String,
        parameters: Vec<ToolParameter>,
        handler: ToolHandler,
    ) -> Result<Self, LlmError> {
        if name.trim().is_empty() {
            return Err(LlmError::InvalidToolSpec(
                "tool name must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for param in &parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(LlmError::InvalidToolSpec(format!(
                    "tool '{name}' declares parameter '{}' more than once",
                    param.name
                )));
            }
        }

        let schema = parameters_schema(&parameters);
        let validator = jsonschema::validator_for(&schema).map_err(|e| {
            LlmError::InvalidToolSpec(format!("tool '{name}' has an invalid schema: {e}"))
        })?;

        Ok(Self {
            name,
            description,
            parameters,
            schema,
            validator: Arc::new(validator),
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    /// JSON Schema object describing the parameters.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate `arguments` against the schema and run the handler.
    ///
    /// Validation failures, handler errors and handler panics all surface as
    /// [`LlmError::ToolExecutionError`].
    pub async fn invoke(&self, arguments: Value) -> Result<String, LlmError> {
        let instance = match arguments {
            Value::Object(_) => arguments,
            Value::Null => Value::Object(Map::new()),
            other => {
                return Err(LlmError::tool_failed(
                    &self.name,
                    format!("arguments must be a JSON object, got {other}"),
                ));
            }
        };

        let violations: Vec<String> = self
            .validator
            .iter_errors(&instance)
            .take(3)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            return Err(LlmError::tool_failed(
                &self.name,
                format!("invalid arguments: {}", violations.join("; ")),
            ));
        }

        let arguments = match instance {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let handler = async { (self.handler)(arguments).await };
        match AssertUnwindSafe(handler).catch_unwind().await {
            Ok(result) => result.map_err(|message| LlmError::tool_failed(&self.name, message)),
            Err(payload) => Err(LlmError::tool_failed(
                &self.name,
                format!("handler panicked: {}", panic_message(&*payload)),
            )),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

fn box_handler<F, Fut, E>(handler: F) -> ToolHandler
where
    F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, E>> + Send + 'static,
    E: fmt::Display,
{
    Arc::new(move |args| {
        let fut = handler(args);
        Box::pin(async move { fut.await.map_err(|e| e.to_string()) })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn parameters_schema(parameters: &[ToolParameter]) -> Value {
    let properties: Map<String, Value> = parameters
        .iter()
        .map(|p| (p.name.clone(), p.schema()))
        .collect();
    let required: Vec<&str> = parameters
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Fluent builder for [`Tool`].
pub struct ToolBuilder {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    handler: Option<ToolHandler>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn string_parameter(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameter(ToolParameter::string(name, description))
    }

    pub fn number_parameter(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.parameter(ToolParameter::number(name, description))
    }

    pub fn integer_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter(ToolParameter::integer(name, description))
    }

    pub fn boolean_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter(ToolParameter::boolean(name, description))
    }

    pub fn enum_parameter<I, S>(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.parameter(ToolParameter::new(
            name,
            description,
            ParameterType::Enum(values),
        ))
    }

    pub fn array_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        items: ParameterType,
    ) -> Self {
        self.parameter(ToolParameter::new(
            name,
            description,
            ParameterType::Array(Box::new(items)),
        ))
    }

    pub fn optional_string_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter(ToolParameter::string(name, description).optional())
    }

    pub fn optional_number_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter(ToolParameter::number(name, description).optional())
    }

    pub fn optional_integer_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter(ToolParameter::integer(name, description).optional())
    }

    pub fn optional_boolean_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter(ToolParameter::boolean(name, description).optional())
    }

    /// Set the async handler.
    pub fn handler<F, Fut, E>(mut self, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, E>> + Send + 'static,
        E: fmt::Display,
    {
        self.handler = Some(box_handler(handler));
        self
    }

    /// Finish the definition. A handler is required.
    pub fn build(self) -> Result<Tool, LlmError> {
        let Some(handler) = self.handler else {
            return Err(LlmError::InvalidToolSpec(format!(
                "tool '{}' has no handler",
                self.name
            )));
        };
        Tool::from_parts(self.name, self.description, self.parameters, handler)
    }
}

/// The tools offered in one request. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<Tool>,
}

impl ToolSet {
    /// Fails with [`LlmError::InvalidToolSpec`] when two tools share a name.
    pub fn new(tools: Vec<Tool>) -> Result<Self, LlmError> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name()) {
                return Err(LlmError::InvalidToolSpec(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
        }
        Ok(Self { tools })
    }

    /// Find the tool a provider-reported call refers to.
    pub fn resolve(&self, name: &str) -> Result<&Tool, LlmError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| LlmError::UnknownTool {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    pub fn as_slice(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool(name: &str) -> Tool {
        Tool::builder(name)
            .description("Echo the text")
            .string_parameter("text", "Text to echo")
            .optional_integer_parameter("times", "Repetitions")
            .handler(|args: ToolArguments| async move {
                let text = args["text"].as_str().unwrap_or_default().to_string();
                let times = args.get("times").and_then(Value::as_u64).unwrap_or(1);
                Ok::<_, String>(text.repeat(times as usize))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn schema_lists_required_parameters() {
        let tool = Tool::builder("lookup")
            .description("Look something up")
            .string_parameter("query", "Search query")
            .enum_parameter("unit", "Unit", ["celsius", "fahrenheit"])
            .array_parameter("tags", "Tags", ParameterType::String)
            .optional_boolean_parameter("verbose", "Verbose output")
            .handler(|_| async { Ok::<_, String>(String::new()) })
            .build()
            .unwrap();

        let schema = tool.schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["query"]["description"], "Search query");
        assert_eq!(schema["properties"]["unit"]["enum"], json!(["celsius", "fahrenheit"]));
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["required"], json!(["query", "unit", "tags"]));
    }

    #[test]
    fn blank_names_and_duplicate_parameters_are_rejected() {
        let err = Tool::define("  ", "", vec![], |_| async { Ok::<_, String>(String::new()) })
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidToolSpec(_)));

        let err = Tool::define(
            "dup",
            "",
            vec![ToolParameter::string("a", ""), ToolParameter::number("a", "")],
            |_| async { Ok::<_, String>(String::new()) },
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::InvalidToolSpec(_)));
    }

    #[test]
    fn builder_requires_a_handler() {
        let err = Tool::builder("nothing").build().unwrap_err();
        assert!(matches!(err, LlmError::InvalidToolSpec(_)));
    }

    #[tokio::test]
    async fn invoke_runs_the_handler() {
        let tool = echo_tool("echo");
        let out = tool.invoke(json!({"text": "ab", "times": 2})).await.unwrap();
        assert_eq!(out, "abab");
    }

    #[tokio::test]
    async fn invoke_validates_arguments() {
        let tool = echo_tool("echo");

        let missing = tool.invoke(json!({})).await.unwrap_err();
        assert!(matches!(missing, LlmError::ToolExecutionError { ref tool, .. } if tool == "echo"));

        let wrong_type = tool.invoke(json!({"text": 5})).await.unwrap_err();
        assert!(matches!(wrong_type, LlmError::ToolExecutionError { .. }));

        let not_object = tool.invoke(json!(["text"])).await.unwrap_err();
        assert!(matches!(not_object, LlmError::ToolExecutionError { .. }));
    }

    #[tokio::test]
    async fn handler_errors_become_tool_execution_errors() {
        let tool = Tool::define("fail", "Always fails", vec![], |_| async {
            Err::<String, _>("backend down")
        })
        .unwrap();

        match tool.invoke(Value::Null).await.unwrap_err() {
            LlmError::ToolExecutionError { tool, message } => {
                assert_eq!(tool, "fail");
                assert_eq!(message, "backend down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_panics_become_tool_execution_errors() {
        let tool = Tool::define("explode", "Panics", vec![], |args: ToolArguments| async move {
            if args.is_empty() {
                panic!("handler blew up");
            }
            Ok::<_, String>("unreachable".to_string())
        })
        .unwrap();

        match tool.invoke(Value::Null).await.unwrap_err() {
            LlmError::ToolExecutionError { tool, message } => {
                assert_eq!(tool, "explode");
                assert!(message.contains("handler blew up"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn tool_set_rejects_duplicates_and_resolves_names() {
        let err = ToolSet::new(vec![echo_tool("echo"), echo_tool("echo")]).unwrap_err();
        assert!(matches!(err, LlmError::InvalidToolSpec(_)));

        let set = ToolSet::new(vec![echo_tool("echo"), echo_tool("shout")]).unwrap();
        assert_eq!(set.resolve("shout").unwrap().name(), "shout");
        assert!(matches!(
            set.resolve("whisper"),
            Err(LlmError::UnknownTool { ref name }) if name == "whisper"
        ));
    }
}
