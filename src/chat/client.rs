//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Covers the three request shapes the demos need:
//! - plain completions
//! - structured output parsed into a `schemars` type
//! - one round of tool calls dispatched through a [`ToolRegistry`]

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::chat::request::{JsonSchemaFormat, Request, ResponseFormat, convert_messages};
use crate::chat::response::Response;
use crate::config::ClientConfig;
use crate::core::{
    AssistantMessage, ChatRequest, Completion, ConversationMessage, FinishReason, HttpClient,
    LanguageModelUsage, LlmError, ParsedCompletion, ToolCall, ToolCallResult, ToolRegistry,
};

pub struct ChatClient {
    config: ClientConfig,
    http: HttpClient,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self, LlmError> {
        let http = HttpClient::new(&config.http, None)?;
        Ok(Self { config, http })
    }

    /// Default model from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn auth_header(&self) -> (String, String) {
        (
            "Authorization".to_string(),
            format!("Bearer {}", self.config.api_key),
        )
    }

    #[tracing::instrument(
        name = "http_request",
        skip(self, request),
        fields(base_url = %self.config.base_url, model = %request.model),
        err
    )]
    async fn make_api_request(&self, request: &Request) -> Result<Response, LlmError> {
        let url = self.endpoint();
        let headers = vec![self.auth_header()];
        self.http.post_json(&url, &headers, request).await
    }

    /// Send `request` and return the first choice.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Completion, LlmError> {
        let payload = build_request_payload(request, None)?;
        let response = self.make_api_request(&payload).await?;
        convert_to_completion(response)
    }

    /// Send `request` with a strict JSON schema response format generated from `T`
    /// and deserialize the answer.
    ///
    /// `parsed` is `None` when the model asked for tool calls or refused.
    pub async fn parse<T>(&self, request: &ChatRequest) -> Result<ParsedCompletion<T>, LlmError>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let (format, wrapped) = create_format_for_type::<T>()?;
        let payload = build_request_payload(request, Some(format))?;
        let response = self.make_api_request(&payload).await?;
        let completion = convert_to_completion(response)?;

        let message = &completion.message;
        if message.has_tool_calls() || message.refusal.is_some() {
            return Ok(ParsedCompletion {
                completion,
                parsed: None,
            });
        }

        let content = message
            .content
            .as_deref()
            .ok_or_else(|| LlmError::MissingContent("Model returned no content to parse".into()))?;
        let parsed = parse_structured_content::<T>(content, wrapped)?;

        Ok(ParsedCompletion {
            completion,
            parsed: Some(parsed),
        })
    }

    /// Run every tool call of `message` through `registry`.
    ///
    /// Appends the assistant turn once, then one tool result per call, in call order.
    /// Returns the number of calls executed.
    pub async fn dispatch_tool_calls(
        &self,
        message: &AssistantMessage,
        messages: &mut Vec<ConversationMessage>,
        registry: &ToolRegistry,
    ) -> Result<usize, LlmError> {
        if !message.has_tool_calls() {
            return Ok(0);
        }

        info!(
            count = message.tool_calls.len(),
            "Model requested tool execution"
        );
        messages.push(message.clone().into());

        for tool_call in &message.tool_calls {
            debug!(tool = %tool_call.name, id = %tool_call.id, "Executing tool call");
            let result = registry.execute(tool_call).await?;
            messages.push(
                ToolCallResult {
                    tool_call_id: tool_call.id.clone(),
                    content: result,
                }
                .into(),
            );
        }

        Ok(message.tool_calls.len())
    }
}

pub(crate) fn build_request_payload(
    request: &ChatRequest,
    response_format: Option<ResponseFormat>,
) -> Result<Request, LlmError> {
    let mut req = Request {
        model: request.model.clone(),
        messages: convert_messages(&request.messages)?,
        temperature: None,
        top_p: None,
        max_tokens: None,
        tools: None,
        tool_choice: None,
        parallel_tool_calls: None,
        response_format,
    };

    if let Some(tool_config) = &request.tool_config {
        req.tools = tool_config.tools.clone();
        req.tool_choice = tool_config.tool_choice.clone();
        req.parallel_tool_calls = tool_config.parallel_tool_calls;
    }

    if let Some(gen_config) = &request.generation_config {
        req.temperature = gen_config.temperature;
        req.top_p = gen_config.top_p;
        req.max_tokens = gen_config.max_tokens;
    }

    Ok(req)
}

/// Strict JSON schema format for `T`. The flag is set when a non-object root had to
/// be wrapped in `{"value": ...}`.
pub(crate) fn create_format_for_type<T>() -> Result<(ResponseFormat, bool), LlmError>
where
    T: JsonSchema,
{
    let schema = schema_for!(T);
    let schema_value = serde_json::to_value(&schema).map_err(|e| LlmError::Parse {
        message: "Failed to build JSON Schema".to_string(),
        source: Box::new(e),
    })?;
    create_format_from_value(schema_value)
}

pub(crate) fn create_format_from_value(
    mut schema_value: Value,
) -> Result<(ResponseFormat, bool), LlmError> {
    let schema_obj = schema_value.as_object().ok_or_else(|| LlmError::Provider {
        message: "Failed to build JSON Schema: root is not an object".to_string(),
        source: None,
    })?;

    let schema_name = schema_obj
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::Provider {
            message: "Failed to build JSON Schema: Missing schema name".to_string(),
            source: None,
        })?
        .to_owned();

    let needs_wrapping = schema_value
        .get("type")
        .and_then(Value::as_str)
        .map(|t| t != "object")
        .unwrap_or(false);

    if needs_wrapping {
        schema_value = serde_json::json!({
            "type": "object",
            "properties": {
                "value": schema_value
            },
            "required": ["value"],
            "additionalProperties": false
        });
    }

    let format = ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat {
            name: schema_name,
            schema: schema_value,
            strict: true,
        },
    };
    Ok((format, needs_wrapping))
}

fn parse_structured_content<T: DeserializeOwned>(
    content: &str,
    wrapped: bool,
) -> Result<T, LlmError> {
    let parse_error = |e: serde_json::Error| LlmError::Parse {
        message: format!("Failed to parse structured content: {content}"),
        source: Box::new(e),
    };

    if !wrapped {
        return serde_json::from_str(content).map_err(parse_error);
    }

    let mut value: Value = serde_json::from_str(content).map_err(parse_error)?;
    let inner = value
        .get_mut("value")
        .map(Value::take)
        .ok_or_else(|| LlmError::MissingContent("Wrapped response has no 'value' field".into()))?;
    serde_json::from_value(inner).map_err(parse_error)
}

pub(crate) fn convert_to_completion(res: Response) -> Result<Completion, LlmError> {
    let choice = res.choices.into_iter().next().ok_or_else(|| LlmError::Provider {
        message: "No choices in response".to_string(),
        source: None,
    })?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            Ok(ToolCall {
                id: call.id,
                arguments: parse_function_arguments(&call.function.arguments)?,
                name: call.function.name,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    let usage = res
        .usage
        .map(|usage| LanguageModelUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        })
        .unwrap_or_default();

    Ok(Completion {
        id: res.id,
        model: res.model,
        message: AssistantMessage {
            content: choice.message.content,
            refusal: choice.message.refusal,
            tool_calls,
        },
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from),
        usage,
    })
}

/// Empty argument strings are treated as an empty object.
fn parse_function_arguments(arguments: &str) -> Result<Value, LlmError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments).map_err(|e| LlmError::Parse {
        message: format!("Failed to parse tool arguments: {arguments}"),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion_schema;
    use crate::core::{HttpClientConfig, Message, ToolFunction, types::BoxFuture};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    #[completion_schema]
    struct KBResponse {
        answer: String,
        source: i32,
    }

    fn create_client(server: &MockServer) -> ChatClient {
        let config = ClientConfig {
            api_key: "test-token".to_string(),
            base_url: format!("{}/v1", server.uri()),
            model: "test-model".to_string(),
            http: HttpClientConfig {
                timeout: Duration::from_secs(5),
            },
        };
        ChatClient::new(config).expect("Failed to create client")
    }

    fn completion_body(message: Value, finish_reason: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": message,
                "finish_reason": finish_reason
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19 }
        })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({ "model": "test-model", "temperature": 0.7 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                json!({ "role": "assistant", "content": "Silicon dreams awake." }),
                "stop",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model")
            .message(Message::user("Write a haiku"))
            .temperature(0.7);
        let completion = client.complete(&request).await.unwrap();

        assert_eq!(completion.message.content.as_deref(), Some("Silicon dreams awake."));
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.total_tokens, 19);
    }

    #[tokio::test]
    async fn test_parse_deserializes_structured_content() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "KBResponse", "strict": true }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                json!({
                    "role": "assistant",
                    "content": "{\"answer\":\"Within 30 days.\",\"source\":1}"
                }),
                "stop",
            )))
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model").message(Message::user("Return policy?"));
        let parsed = client.parse::<KBResponse>(&request).await.unwrap();

        let answer = parsed.parsed.expect("structured answer");
        assert_eq!(answer.answer, "Within 30 days.");
        assert_eq!(answer.source, 1);
    }

    #[tokio::test]
    async fn test_parse_refusal_has_no_parsed_value() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                json!({ "role": "assistant", "content": null, "refusal": "I can't help with that." }),
                "stop",
            )))
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model").message(Message::user("?"));
        let parsed = client.parse::<KBResponse>(&request).await.unwrap();

        assert!(parsed.parsed.is_none());
        assert_eq!(parsed.refusal(), Some("I can't help with that."));
    }

    #[tokio::test]
    async fn test_parse_rejects_content_that_does_not_match() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                json!({ "role": "assistant", "content": "not json" }),
                "stop",
            )))
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model").message(Message::user("?"));
        let result = client.parse::<KBResponse>(&request).await;

        assert!(matches!(result, Err(LlmError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_api_error_status_is_reported() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model").message(Message::user("hi"));
        match client.complete(&request).await {
            Err(LlmError::Api {
                status_code,
                message,
                ..
            }) => {
                assert_eq!(status_code, Some(401));
                assert!(message.contains("invalid api key"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model").message(Message::user("hi"));
        let result = client.complete(&request).await;

        assert!(matches!(result, Err(LlmError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_empty_choices_is_provider_error() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "test-model",
                "choices": []
            })))
            .mount(&server)
            .await;

        let request = ChatRequest::new("test-model").message(Message::user("hi"));
        let result = client.complete(&request).await;

        assert!(matches!(result, Err(LlmError::Provider { .. })));
    }

    struct EchoTool;

    impl ToolFunction for EchoTool {
        fn schema(&self) -> crate::core::Tool {
            crate::core::Tool {
                name: "echo".to_string(),
                description: None,
                parameters: json!({ "type": "object", "properties": { "text": { "type": "string" } } }),
                strict: Some(true),
            }
        }

        fn execute<'a>(&'a self, params: Value) -> BoxFuture<'a, Result<Value, LlmError>> {
            Box::pin(async move { Ok(json!({ "echo": params["text"] })) })
        }
    }

    #[tokio::test]
    async fn test_dispatch_appends_assistant_turn_once() {
        let server = MockServer::start().await;
        let client = create_client(&server);

        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();

        let message = AssistantMessage {
            content: None,
            refusal: None,
            tool_calls: vec![
                ToolCall {
                    id: "call_1".into(),
                    name: "echo".into(),
                    arguments: json!({ "text": "a" }),
                },
                ToolCall {
                    id: "call_2".into(),
                    name: "echo".into(),
                    arguments: json!({ "text": "b" }),
                },
            ],
        };

        let mut messages: Vec<ConversationMessage> = vec![Message::user("echo twice").into()];
        let executed = client
            .dispatch_tool_calls(&message, &mut messages, &registry)
            .await
            .unwrap();

        assert_eq!(executed, 2);
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[1], ConversationMessage::ToolCalls { .. }));
        assert_eq!(
            messages[3],
            ConversationMessage::ToolCallResult(ToolCallResult {
                tool_call_id: "call_2".into(),
                content: json!({ "echo": "b" }),
            })
        );
    }

    #[test]
    fn test_tool_call_arguments_are_decoded() {
        let response: Response = serde_json::from_value(completion_body(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": { "name": "get_weather", "arguments": "{\"latitude\":48.85,\"longitude\":2.35}" }
                }]
            }),
            "tool_calls",
        ))
        .unwrap();

        let completion = convert_to_completion(response).unwrap();
        let call = &completion.message.tool_calls[0];
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.arguments["latitude"], 48.85);
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn test_non_object_schema_is_wrapped() {
        let (format, wrapped) = create_format_for_type::<Vec<String>>().unwrap();
        assert!(wrapped);

        let value = serde_json::to_value(format).unwrap();
        assert_eq!(value["json_schema"]["schema"]["required"], json!(["value"]));

        let parsed: Vec<String> =
            parse_structured_content("{\"value\":[\"a\",\"b\"]}", true).unwrap();
        assert_eq!(parsed, vec!["a", "b"]);
    }
}
