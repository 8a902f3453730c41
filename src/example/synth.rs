use chrono::{Days, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde_json::{Map, Value, json};

use super::ExampleValue;
use super::descriptor::{ScalarKind, SchemaDescriptor, TypeExpr};
use crate::core::LlmError;

/// Builds example values for schema descriptors.
///
/// Pseudo-random choices (dates, times, id suffixes) come from a generator seeded
/// with `"<schema>:<field>"` and created for that single draw, so the same pair
/// always yields the same value and concurrent callers share nothing.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    today: NaiveDate,
}

impl Synthesizer {
    /// Dates are offset from the local calendar date.
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    /// One example object for `schema`, keys in field declaration order.
    pub fn synthesize(&self, schema: &SchemaDescriptor) -> ExampleValue {
        let object: Map<String, Value> = schema
            .fields()
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    self.synthesize_field(&field.ty, &field.name, schema.name()),
                )
            })
            .collect();
        Value::Object(object)
    }

    /// Reflect `T` and synthesize it.
    pub fn synthesize_model<T: JsonSchema>(&self) -> Result<ExampleValue, LlmError> {
        let schema = SchemaDescriptor::reflect::<T>()?;
        Ok(self.synthesize(&schema))
    }

    pub fn synthesize_field(&self, ty: &TypeExpr, field_name: &str, schema_name: &str) -> ExampleValue {
        match ty {
            TypeExpr::Sequence(element) => {
                let singular = singularize(field_name);
                let first = self.synthesize_field(element, singular, schema_name);
                let mut second = self.synthesize_field(element, singular, schema_name);
                if let (Value::String(a), Value::String(b)) = (&first, &mut second)
                    && *a == *b
                {
                    b.push_str(" 2");
                }
                Value::Array(vec![first, second])
            }
            TypeExpr::Mapping(key, value) => {
                let key = match self.synthesize_field(key, "key", schema_name) {
                    Value::String(key) => key,
                    other => other.to_string(),
                };
                let value = self.synthesize_field(value, &format!("{field_name}_value"), schema_name);

                let mut entry = Map::new();
                entry.insert(key, value);
                Value::Object(entry)
            }
            TypeExpr::Nested(schema) => self.synthesize(schema),
            TypeExpr::Scalar(_) | TypeExpr::Any | TypeExpr::Other(_) => {
                self.leaf(ty, field_name, schema_name)
            }
        }
    }

    /// Field-name heuristics first, declared kind second.
    fn leaf(&self, ty: &TypeExpr, field_name: &str, schema_name: &str) -> ExampleValue {
        let lname = field_name.to_lowercase();

        if lname.contains("date") {
            let days_ahead = seeded_rng(schema_name, field_name).random_range(1..=180u64);
            let date = self.today + Days::new(days_ahead);
            return Value::String(date.format("%Y-%m-%d").to_string());
        }
        if lname.contains("time") {
            let minutes = seeded_rng(schema_name, field_name).random_range(0..=23 * 60 + 59u32);
            return Value::String(format!("{:02}:{:02}", minutes / 60, minutes % 60));
        }
        if lname.contains("name") {
            return Value::String(display_label(schema_name, field_name));
        }
        if lname.ends_with("id") {
            let suffix = seeded_rng(schema_name, field_name).random_range(1000..=9999u32);
            return Value::String(format!(
                "{}_{}_{}",
                schema_name.to_lowercase(),
                lname,
                suffix
            ));
        }

        match ty {
            TypeExpr::Scalar(ScalarKind::String) | TypeExpr::Any => {
                Value::String(display_label(schema_name, field_name))
            }
            TypeExpr::Scalar(ScalarKind::Integer) => json!(0),
            TypeExpr::Scalar(ScalarKind::Float) => json!(0.0),
            TypeExpr::Scalar(ScalarKind::Boolean) => json!(true),
            _ => Value::String(format!("{field_name}_value")),
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn seeded_rng(schema_name: &str, field_name: &str) -> StdRng {
    StdRng::seed_from_u64(seed_key_hash(&format!("{schema_name}:{field_name}")))
}

/// 64-bit FNV-1a; stable across runs and platforms.
fn seed_key_hash(key: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    key.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

/// `"<Schema> <Field Title>"`, e.g. `CalendarEvent` + `start_name` -> `"CalendarEvent Start Name"`.
fn display_label(schema_name: &str, field_name: &str) -> String {
    format!("{schema_name} {}", title_case(&field_name.replace('_', " ")))
}

/// Upper-cases letters that follow a non-letter and lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Strips trailing `s` characters; an all-`s` name is kept as is.
fn singularize(field_name: &str) -> &str {
    match field_name.trim_end_matches('s') {
        "" => field_name,
        singular => singular,
    }
}
