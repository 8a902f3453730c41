use serde::Serialize;
use serde_json::Value;

use crate::core::{ChatRole, ConversationMessage, LlmError, Tool, ToolChoice};

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub model: String,

    pub messages: Vec<RequestMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Alter this or temperature but not both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "serialize_tools")]
    pub tools: Option<Box<[Tool]>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "serialize_tool_choice")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

fn serialize_tool_choice<S>(
    tool_choice: &Option<ToolChoice>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match tool_choice {
        Some(tc) => create_tool_choice(tc.clone()).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

fn serialize_tools<S>(tools: &Option<Box<[Tool]>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match tools {
        Some(tools) => {
            let serializable_tools: Vec<SerializableTool> =
                tools.iter().map(create_serializable_tool).collect();
            serializable_tools.serialize(serializer)
        }
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RequestMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<RequestToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: FunctionType,
    pub function: RequestFunctionCall,
}

/// `arguments` travels as a JSON-encoded string.
#[derive(Debug, Clone, Serialize)]
pub struct RequestFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionType {
    Function,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SerializableToolChoice {
    Mode(ToolMode),
    Definite(FunctionToolChoice),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum ToolMode {
    None,
    Auto,
    Required,
}

#[derive(Debug, Serialize)]
struct FunctionToolChoice {
    #[serde(rename = "type")]
    r#type: FunctionType,
    function: FunctionName,
}

#[derive(Debug, Serialize)]
struct FunctionName {
    name: String,
}

fn create_tool_choice(tool_choice: ToolChoice) -> SerializableToolChoice {
    match tool_choice {
        ToolChoice::None => SerializableToolChoice::Mode(ToolMode::None),
        ToolChoice::Auto => SerializableToolChoice::Mode(ToolMode::Auto),
        ToolChoice::Required => SerializableToolChoice::Mode(ToolMode::Required),
        ToolChoice::Function { name } => SerializableToolChoice::Definite(FunctionToolChoice {
            r#type: FunctionType::Function,
            function: FunctionName { name },
        }),
    }
}

/// `{"type":"function","function":{...}}`
#[derive(Debug, Serialize)]
struct SerializableTool {
    #[serde(rename = "type")]
    r#type: FunctionType,
    function: FunctionTool,
}

#[derive(Debug, Serialize)]
struct FunctionTool {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: Value,
    strict: bool,
}

fn create_serializable_tool(tool: &Tool) -> SerializableTool {
    let strict = tool.strict.unwrap_or(true);
    let mut parameters = tool.parameters.clone();

    // Strict mode requires every property to be listed as required
    if strict && let Some(properties) = parameters.get("properties").and_then(Value::as_object) {
        let all_property_names: Vec<Value> = properties
            .keys()
            .map(|k| Value::String(k.clone()))
            .collect();

        if let Some(params_obj) = parameters.as_object_mut() {
            params_obj.insert("required".to_string(), Value::Array(all_property_names));
        }
    }

    SerializableTool {
        r#type: FunctionType::Function,
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters,
            strict,
        },
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaFormat },
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

/// Convert core messages to the chat completions message list.
pub(crate) fn convert_messages(
    messages: &[ConversationMessage],
) -> Result<Vec<RequestMessage>, LlmError> {
    messages
        .iter()
        .map(|msg| match msg {
            ConversationMessage::Chat(m) => Ok(match m.role {
                ChatRole::System => RequestMessage::System {
                    content: m.content.clone(),
                },
                ChatRole::User => RequestMessage::User {
                    content: m.content.clone(),
                },
                ChatRole::Assistant => RequestMessage::Assistant {
                    content: Some(m.content.clone()),
                    tool_calls: Vec::new(),
                },
            }),
            ConversationMessage::ToolCalls { content, calls } => {
                let tool_calls = calls
                    .iter()
                    .map(|call| {
                        Ok(RequestToolCall {
                            id: call.id.clone(),
                            r#type: FunctionType::Function,
                            function: RequestFunctionCall {
                                name: call.name.clone(),
                                arguments: encode_json(&call.arguments, "tool call arguments")?,
                            },
                        })
                    })
                    .collect::<Result<Vec<_>, LlmError>>()?;

                Ok(RequestMessage::Assistant {
                    content: content.clone(),
                    tool_calls,
                })
            }
            ConversationMessage::ToolCallResult(result) => Ok(RequestMessage::Tool {
                tool_call_id: result.tool_call_id.clone(),
                content: encode_json(&result.content, "tool result")?,
            }),
        })
        .collect()
}

fn encode_json(value: &Value, what: &str) -> Result<String, LlmError> {
    serde_json::to_string(value).map_err(|e| LlmError::Parse {
        message: format!("Failed to serialize {what}"),
        source: Box::new(e),
    })
}
