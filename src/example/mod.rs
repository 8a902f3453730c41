//! Example payloads for schema types.
//!
//! A [`SchemaDescriptor`] describes a shape; [`Synthesizer`] turns it into a
//! plausible, reproducible example value that can be pasted into a prompt:
//!
//! ```rust
//! use chatflow::example::{SchemaDescriptor, Synthesizer, TypeExpr};
//!
//! let schema = SchemaDescriptor::new("KBResponse")
//!     .field("answer", TypeExpr::string())
//!     .field("source", TypeExpr::integer());
//!
//! let example = Synthesizer::new().synthesize(&schema);
//! assert_eq!(example["answer"], "KBResponse Answer");
//! assert_eq!(example["source"], 0);
//! ```

pub mod descriptor;
pub mod synth;

pub use descriptor::{FieldDescriptor, ScalarKind, SchemaDescriptor, TypeExpr};
pub use synth::Synthesizer;

use schemars::JsonSchema;

use crate::core::LlmError;

/// Synthesized example data. Objects keep field declaration order.
pub type ExampleValue = serde_json::Value;

/// Reflect `T`, synthesize an example and render it as indented JSON.
pub fn model_to_json<T: JsonSchema>() -> Result<String, LlmError> {
    let example = Synthesizer::new().synthesize_model::<T>()?;
    to_json_string(&example)
}

/// Two-space indented JSON text.
pub fn to_json_string(value: &ExampleValue) -> Result<String, LlmError> {
    serde_json::to_string_pretty(value).map_err(|e| LlmError::Parse {
        message: "Failed to render example JSON".to_string(),
        source: Box::new(e),
    })
}
