//! Tool calling: the model asks for `get_weather`, we run it, then parse a
//! `WeatherResponse` from the follow-up turn.

use chatflow::{
    ChatRequest, ConversationMessage, LlmError, Message, PerfLog, completion_schema, config, tool,
    toolset,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[tool]
/// Get current temperature for provided coordinates in celsius.
/// latitude: Latitude of the location
/// longitude: Longitude of the location
async fn get_weather(latitude: f64, longitude: f64) -> Value {
    match fetch_current_weather(latitude, longitude).await {
        Ok(current) => current,
        Err(e) => json!({ "error": e.to_string() }),
    }
}

async fn fetch_current_weather(latitude: f64, longitude: f64) -> Result<Value, reqwest::Error> {
    let body: Value = reqwest::Client::new()
        .get(FORECAST_URL)
        .query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", "temperature_2m,wind_speed_10m".to_string()),
            (
                "hourly",
                "temperature_2m,relative_humidity_2m,wind_speed_10m".to_string(),
            ),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(body.get("current").cloned().unwrap_or(Value::Null))
}

#[completion_schema]
struct WeatherResponse {
    /// The current temperature in celsius for the given location.
    temperature: f64,
    /// A natural language response to the user's question.
    response: String,
}

#[tokio::main]
async fn main() -> Result<(), LlmError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = config::shared_client()?;
    let mut perf = PerfLog::new(client.model());

    let toolset = toolset![get_weather];
    let tools = toolset.tools()?;

    let mut messages: Vec<ConversationMessage> = vec![
        Message::system("You are a helpful weather assistant.").into(),
        Message::user("What's the weather like in Paris today?").into(),
    ];

    let request = ChatRequest::new(client.model())
        .messages(messages.clone())
        .tools(tools.clone());
    let completion = perf
        .timed("initial_create", client.complete(&request))
        .await?;

    println!("\n--- Model response ---");
    println!("{:#?}", completion.message);

    client
        .dispatch_tool_calls(&completion.message, &mut messages, &toolset.registry)
        .await?;

    let request = ChatRequest::new(client.model())
        .messages(messages)
        .tools(tools);
    let completion = perf
        .timed("second_parse", client.parse::<WeatherResponse>(&request))
        .await?;

    let weather = completion.parsed.ok_or_else(|| {
        LlmError::MissingContent("Model did not return a WeatherResponse".into())
    })?;

    println!("Temperature: {}", weather.temperature);
    println!("Response: {}", weather.response);

    perf.report();
    println!("DONE");
    Ok(())
}
