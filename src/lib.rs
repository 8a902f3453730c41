//! # chatflow
//!
//! Small building blocks for talking to OpenAI-compatible chat completion endpoints,
//! and for showing models what a structured answer should look like.
//!
//! - [`ChatClient`]: completions, structured output and tool-call rounds
//! - [`example`]: deterministic example JSON for a schema, for use in prompts
//! - [`config`]: environment configuration with `.env` support
//! - [`perf`]: phase timing for demo workflows
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatflow::{ChatRequest, Message, completion_schema, config, model_to_json};
//!
//! #[completion_schema]
//! struct CalendarEvent {
//!     name: String,
//!     date: String,
//!     participants: Vec<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = config::shared_client()?;
//!     let system = format!(
//!         "Extract the event information. Example:\n{}",
//!         model_to_json::<CalendarEvent>()?
//!     );
//!
//!     let request = ChatRequest::new(client.model())
//!         .message(Message::system(system))
//!         .message(Message::user("Alice and Bob are going to a science fair on Friday."));
//!
//!     let event = client.parse::<CalendarEvent>(&request).await?;
//!     if let Some(event) = event.parsed {
//!         println!("{} on {} with {:?}", event.name, event.date, event.participants);
//!     }
//!     Ok(())
//! }
//! ```

extern crate self as chatflow;

pub mod chat;
pub mod config;
pub mod core;
pub mod example;
pub mod perf;

pub use chat::ChatClient;
pub use config::ClientConfig;
pub use crate::core::{
    AssistantMessage, ChatRequest, ChatRole, Completion, ConversationMessage, FinishReason,
    GenerationConfig, LanguageModelUsage, LlmError, Message, ParsedCompletion, Tool, ToolCall,
    ToolCallResult, ToolChoice, ToolConfig, ToolFunction, ToolRegistry, ToolSet, types::BoxFuture,
};
pub use example::{ExampleValue, SchemaDescriptor, Synthesizer, TypeExpr, model_to_json};
pub use perf::PerfLog;

pub use chatflow_macros::{completion_schema, tool, toolset};
