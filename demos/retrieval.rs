//! Mock retrieval: `search_kb` hands the whole knowledge base to the model, which
//! answers with a `KBResponse` citing the record id.

use std::path::Path;

use chatflow::{
    ChatRequest, ConversationMessage, LlmError, Message, PerfLog, completion_schema, config, tool,
    toolset,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions from the knowledge base about our e-commerce store.";

#[tool]
/// Get the answer to the user's question from the knowledge base.
/// question: The user's question
fn search_kb(question: String) -> Value {
    tracing::debug!(%question, "search_kb called; returning every record");
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/kb.json");
    match load_kb(&path) {
        Ok(records) => records,
        Err(e) => json!({ "error": format!("{}: {e}", path.display()) }),
    }
}

fn load_kb(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[completion_schema]
struct KBResponse {
    /// The answer to the user's question.
    answer: String,
    /// The record id of the answer.
    source: i64,
}

#[tokio::main]
async fn main() -> Result<(), LlmError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = config::shared_client()?;
    let mut perf = PerfLog::new(client.model());

    let toolset = toolset![search_kb];
    let tools = toolset.tools()?;

    let mut messages: Vec<ConversationMessage> = vec![
        Message::system(SYSTEM_PROMPT).into(),
        Message::user("What is the return policy?").into(),
    ];

    let request = ChatRequest::new(client.model())
        .messages(messages.clone())
        .tools(tools.clone());
    let completion = perf
        .timed("initial_create", client.complete(&request))
        .await?;

    client
        .dispatch_tool_calls(&completion.message, &mut messages, &toolset.registry)
        .await?;

    let request = ChatRequest::new(client.model())
        .messages(messages)
        .tools(tools.clone());
    let completion = perf
        .timed("kb_parse", client.parse::<KBResponse>(&request))
        .await?;

    let answer = completion
        .parsed
        .ok_or_else(|| LlmError::MissingContent("Model did not return a KBResponse".into()))?;
    println!("Answer: {}", answer.answer);
    println!("Source ID: {}", answer.source);

    // A question the knowledge base cannot answer should not trigger the tool
    let request = ChatRequest::new(client.model())
        .message(Message::system(SYSTEM_PROMPT))
        .message(Message::user("What is the weather in Tokyo?"))
        .tools(tools);
    let completion = perf
        .timed("non_kb_create", client.complete(&request))
        .await?;
    println!(
        "Non-KB question response: {}",
        completion.message.content.unwrap_or_default()
    );

    perf.report();
    Ok(())
}
