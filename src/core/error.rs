use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),

    /// The model answered without the content the caller asked for.
    #[error("Missing content: {0}")]
    MissingContent(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool registration failed for '{tool_name}': {message}")]
    ToolRegistration { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ToolExecution {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Schema reflection could not describe the type as a struct with named fields.
    #[error(
        "Schema unavailable for '{schema}': {reason}. Derive schemars::JsonSchema (or use #[completion_schema]) on a struct with named fields"
    )]
    SchemaUnavailable { schema: String, reason: String },
}
