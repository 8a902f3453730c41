//! One plain completion.
//!
//! Only `temperature` is sent. Some gateways (Bedrock-backed Anthropic models among
//! them) reject requests that carry both `temperature` and `top_p`.

use chatflow::{ChatRequest, LlmError, Message, config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), LlmError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = config::shared_client()?;

    let request = ChatRequest::new(client.model())
        .message(Message::system("You're a helpful assistant."))
        .message(Message::user(
            "Write a limerick about the Rust programming language.",
        ))
        .temperature(0.7);

    let completion = client.complete(&request).await?;
    println!("{}", completion.message.content.unwrap_or_default());

    Ok(())
}
