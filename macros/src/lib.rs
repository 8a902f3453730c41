//! Procedural macros for the chatflow crate.
//!
//! - [`completion_schema`] - derives a strict JSON schema for structured responses
//! - [`tool`](fn@tool) - turns a documented function into a callable tool
//! - [`toolset`] - collects `#[tool]` functions into a `chatflow::ToolSet`
//!
//! # Quick Start
//!
//! ```rust
//! use chatflow_macros::{completion_schema, tool, toolset};
//!
//! #[completion_schema]
//! struct CalendarEvent {
//!     name: String,
//!     date: String,
//!     participants: Vec<String>,
//! }
//!
//! #[tool]
//! /// Get current temperature for provided coordinates in celsius.
//! /// latitude: Latitude of the location
//! /// longitude: Longitude of the location
//! fn get_weather(latitude: f64, longitude: f64) -> f64 {
//!     let _ = (latitude, longitude);
//!     21.5
//! }
//!
//! let tools = toolset![get_weather];
//! ```

use proc_macro::TokenStream;
use quote::quote;

mod tool;
mod tools;

/// Attribute macro for types parsed out of `ChatClient::parse::<T>()`.
///
/// Adds `#[derive(serde::Deserialize, schemars::JsonSchema)]` and
/// `#[schemars(deny_unknown_fields)]`. The generated schema then carries
/// `additionalProperties: false`, which strict structured output requires.
///
/// The same schema drives `chatflow::example::model_to_json::<T>()`, so a
/// `#[completion_schema]` type can be both the response format and the source of
/// the example JSON shown to the model.
///
/// ```rust
/// use chatflow_macros::completion_schema;
///
/// #[completion_schema]
/// struct KBResponse {
///     /// The answer to the user's question.
///     answer: String,
///     /// The record id of the answer.
///     source: i64,
/// }
/// ```
#[proc_macro_attribute]
pub fn completion_schema(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_tokens: proc_macro2::TokenStream = item.into();

    let expanded = quote! {
        #[derive(serde::Deserialize, schemars::JsonSchema)]
        #[schemars(deny_unknown_fields)]
        #item_tokens
    };

    TokenStream::from(expanded)
}

/// Attribute macro for marking functions as tools the model can call.
///
/// The first doc lines describe the tool. Every parameter needs its own
/// `name: description` doc line, otherwise compilation fails:
///
/// ```rust
/// use chatflow_macros::tool;
///
/// #[tool]
/// /// Get the answer to the user's question from the knowledge base.
/// /// question: The user's question
/// fn search_kb(question: String) -> String {
///     format!("no records for {question}")
/// }
/// ```
///
/// ```rust,compile_fail
/// use chatflow_macros::tool;
///
/// #[tool]
/// /// Get weather info
/// /// latitude: Latitude of the location
/// fn get_weather(latitude: f64, longitude: f64) -> f64 {
///     latitude + longitude
/// }
/// ```
///
/// Async functions are awaited. `Option<T>` parameters are left out of
/// `required`. The return value is serialized with `serde_json`.
///
/// | Rust Type | JSON Schema Type |
/// |-----------|------------------|
/// | `String` | `string` |
/// | integers | `integer` |
/// | `f32`, `f64` | `number` |
/// | `bool` | `boolean` |
/// | `Vec<T>` | `array` |
/// | `Option<T>` | `T` (optional) |
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    match tool::tool_impl(attr.into(), item.into()) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Builds a `chatflow::ToolSet` from functions annotated with [`tool`](fn@tool).
///
/// ```rust
/// use chatflow_macros::{tool, toolset};
///
/// #[tool]
/// /// Look up a record
/// /// record_id: Identifier of the record
/// fn lookup(record_id: i64) -> i64 {
///     record_id
/// }
///
/// let tools = toolset![lookup];
/// assert_eq!(tools.tools().unwrap().len(), 1);
/// ```
#[proc_macro]
pub fn toolset(input: TokenStream) -> TokenStream {
    match tools::tools_impl(input.into()) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
