//! Structured output: extract a `CalendarEvent` from free text.

use chatflow::{ChatRequest, LlmError, Message, PerfLog, completion_schema, config, model_to_json};
use tracing_subscriber::EnvFilter;

#[completion_schema]
#[derive(Debug)]
struct CalendarEvent {
    name: String,
    date: String,
    participants: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), LlmError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = config::shared_client()?;
    let mut perf = PerfLog::new(client.model());

    let system_prompt = format!(
        "Extract the event information and return ONLY valid JSON matching the schema.\n\
         Schema fields: name (string), date (string), participants (list of strings).\n\
         Example response JSON (do not include comments):\n{}",
        model_to_json::<CalendarEvent>()?
    );

    let request = ChatRequest::new(client.model())
        .message(Message::system(system_prompt))
        .message(Message::user(
            "Jeff and Gary will be at the moon landing on July 20th.",
        ));

    let completion = perf
        .timed("structured_parse", client.parse::<CalendarEvent>(&request))
        .await?;

    let event = completion.parsed.ok_or_else(|| {
        LlmError::MissingContent("Model did not return a structured CalendarEvent".into())
    })?;

    println!("\n--- Parsed CalendarEvent ---");
    println!("Event Name: {}", event.name);
    println!("Event Date: {}", event.date);
    println!("Participants: {:?}", event.participants);

    perf.report();
    println!("DONE");
    Ok(())
}
