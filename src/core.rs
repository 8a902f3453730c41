pub mod error;
pub mod http;
pub mod tool;
pub mod types;

pub use error::LlmError;
pub use http::{HttpClient, HttpClientConfig};
pub use tool::{ToolFunction, ToolRegistry, ToolSet};
pub use types::{
    AssistantMessage, BoxFuture, ChatRequest, ChatRole, Completion, ConversationMessage,
    FinishReason, GenerationConfig, LanguageModelUsage, Message, ParsedCompletion, Tool, ToolCall,
    ToolCallResult, ToolChoice, ToolConfig,
};
