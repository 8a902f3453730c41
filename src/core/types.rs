use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A function call requested by the model. `arguments` is already decoded JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationMessage {
    Chat(Message),
    /// Assistant turn that asked for tool calls
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
    ToolCallResult(ToolCallResult),
}

impl From<Message> for ConversationMessage {
    fn from(message: Message) -> Self {
        ConversationMessage::Chat(message)
    }
}

impl From<ToolCallResult> for ConversationMessage {
    fn from(result: ToolCallResult) -> Self {
        ConversationMessage::ToolCallResult(result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Value,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Function { name: String },
}

/// Configuration for tool calling behavior
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolConfig {
    /// Available tools for the model to call
    pub tools: Option<Box<[Tool]>>,
    /// Strategy for choosing which tools to call
    pub tool_choice: Option<ToolChoice>,
    /// Whether the model may request several calls in one turn
    pub parallel_tool_calls: Option<bool>,
}

/// Sampling parameters. Unset fields are not sent at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationConfig {
    pub max_tokens: Option<u32>,

    pub temperature: Option<f32>,

    /// Nucleus sampling. Some gateways reject requests that set both this and
    /// `temperature`.
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ConversationMessage>,
    pub tool_config: Option<ToolConfig>,
    pub generation_config: Option<GenerationConfig>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            tool_config: None,
            generation_config: None,
        }
    }

    pub fn message(mut self, message: impl Into<ConversationMessage>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn messages(mut self, messages: Vec<ConversationMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tool_config.get_or_insert_with(ToolConfig::default).tools =
            Some(tools.into_boxed_slice());
        self
    }

    pub fn tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_config
            .get_or_insert_with(ToolConfig::default)
            .tool_choice = Some(tool_choice);
        self
    }

    pub fn parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.tool_config
            .get_or_insert_with(ToolConfig::default)
            .parallel_tool_calls = Some(parallel);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LanguageModelUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl From<&str> for FinishReason {
    fn from(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// The assistant turn of a completion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantMessage {
    pub content: Option<String>,
    pub refusal: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantMessage {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

impl From<AssistantMessage> for ConversationMessage {
    fn from(message: AssistantMessage) -> Self {
        if message.tool_calls.is_empty() {
            ConversationMessage::Chat(Message::assistant(message.content.unwrap_or_default()))
        } else {
            ConversationMessage::ToolCalls {
                content: message.content,
                calls: message.tool_calls,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub id: String,
    pub model: String,
    pub message: AssistantMessage,
    pub finish_reason: Option<FinishReason>,
    pub usage: LanguageModelUsage,
}

/// A completion requested with a JSON schema response format.
///
/// `parsed` is `None` when the model called tools or refused instead of answering.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCompletion<T> {
    pub completion: Completion,
    pub parsed: Option<T>,
}

impl<T> ParsedCompletion<T> {
    pub fn refusal(&self) -> Option<&str> {
        self.completion.message.refusal.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_only_sets_requested_sampling_fields() {
        let request = ChatRequest::new("gpt-4o")
            .message(Message::user("hi"))
            .temperature(0.7);

        let generation = request.generation_config.expect("generation config");
        assert_eq!(generation.temperature, Some(0.7));
        assert!(generation.top_p.is_none());
        assert!(generation.max_tokens.is_none());
        assert!(request.tool_config.is_none());
    }

    #[test]
    fn test_assistant_message_with_calls_becomes_tool_call_turn() {
        let message = AssistantMessage {
            content: None,
            refusal: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "search_kb".into(),
                arguments: serde_json::json!({ "question": "returns?" }),
            }],
        };

        match ConversationMessage::from(message) {
            ConversationMessage::ToolCalls { calls, .. } => assert_eq!(calls[0].name, "search_kb"),
            other => panic!("unexpected conversion: {other:?}"),
        }
    }

    #[test]
    fn test_finish_reason_from_wire() {
        assert_eq!(FinishReason::from("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(
            FinishReason::from("eos"),
            FinishReason::Other("eos".to_string())
        );
    }
}
