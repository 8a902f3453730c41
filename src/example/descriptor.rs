//! Schema descriptors and their reflection from `schemars` JSON Schema.

use schemars::JsonSchema;
use serde_json::{Map, Value};

use crate::core::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Scalar(ScalarKind),
    Sequence(Box<TypeExpr>),
    /// Key type, value type
    Mapping(Box<TypeExpr>, Box<TypeExpr>),
    Nested(SchemaDescriptor),
    Any,
    /// A type reflection could not classify (unions, enums, recursive references).
    /// The label is informational only.
    Other(String),
}

impl TypeExpr {
    pub fn string() -> Self {
        TypeExpr::Scalar(ScalarKind::String)
    }

    pub fn integer() -> Self {
        TypeExpr::Scalar(ScalarKind::Integer)
    }

    pub fn float() -> Self {
        TypeExpr::Scalar(ScalarKind::Float)
    }

    pub fn boolean() -> Self {
        TypeExpr::Scalar(ScalarKind::Boolean)
    }

    pub fn sequence(element: TypeExpr) -> Self {
        TypeExpr::Sequence(Box::new(element))
    }

    pub fn mapping(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Mapping(Box::new(key), Box::new(value))
    }

    pub fn nested(schema: SchemaDescriptor) -> Self {
        TypeExpr::Nested(schema)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeExpr,
}

/// A named, ordered list of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Describe `T` through its derived `schemars::JsonSchema` implementation.
    ///
    /// Fails with [`LlmError::SchemaUnavailable`] unless `T` reflects to a titled
    /// object schema. A struct without fields gives an empty descriptor.
    pub fn reflect<T: JsonSchema>() -> Result<Self, LlmError> {
        let schema = schemars::schema_for!(T);
        let value = serde_json::to_value(&schema).map_err(|e| LlmError::Parse {
            message: "Failed to build JSON Schema".to_string(),
            source: Box::new(e),
        })?;

        Self::from_json_schema(&value).map_err(|err| match err {
            LlmError::SchemaUnavailable { reason, .. } => LlmError::SchemaUnavailable {
                schema: T::schema_name().into_owned(),
                reason,
            },
            other => other,
        })
    }

    /// Describe a JSON Schema document whose root is a titled object schema.
    pub fn from_json_schema(schema: &Value) -> Result<Self, LlmError> {
        let unavailable = |schema: &str, reason: &str| LlmError::SchemaUnavailable {
            schema: schema.to_string(),
            reason: reason.to_string(),
        };

        let root = schema
            .as_object()
            .ok_or_else(|| unavailable("<unknown>", "schema root is not an object"))?;

        let title = root
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| unavailable("<unknown>", "schema has no title"))?;

        // A struct without fields reflects to a bare object schema.
        let empty = Map::new();
        let properties = match root.get("properties").and_then(Value::as_object) {
            Some(properties) => properties,
            None if is_fieldless_object(root) => &empty,
            None => return Err(unavailable(title, "schema has no named properties")),
        };

        let defs = root
            .get("$defs")
            .or_else(|| root.get("definitions"))
            .and_then(Value::as_object);

        let mut reflector = Reflector {
            defs,
            visiting: vec![title.to_string()],
        };
        Ok(reflector.object(title, properties))
    }
}

fn is_fieldless_object(root: &Map<String, Value>) -> bool {
    root.get("type").and_then(Value::as_str) == Some("object")
        && !root.get("additionalProperties").is_some_and(Value::is_object)
}

/// Keywords that only annotate a schema and never constrain it.
const ANNOTATION_KEYWORDS: &[&str] = &[
    "title",
    "description",
    "default",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
    "$schema",
    "$comment",
];

struct Reflector<'a> {
    defs: Option<&'a Map<String, Value>>,
    /// Definition names on the current path; a repeat is a recursive type.
    visiting: Vec<String>,
}

impl Reflector<'_> {
    fn object(&mut self, name: &str, properties: &Map<String, Value>) -> SchemaDescriptor {
        let fields = properties
            .iter()
            .map(|(field_name, schema)| FieldDescriptor {
                name: field_name.clone(),
                ty: self.type_expr(schema, field_name),
            })
            .collect();

        SchemaDescriptor {
            name: name.to_string(),
            fields,
        }
    }

    fn type_expr(&mut self, schema: &Value, field_name: &str) -> TypeExpr {
        let obj = match schema {
            Value::Bool(true) => return TypeExpr::Any,
            Value::Object(obj) => obj,
            other => return TypeExpr::Other(other.to_string()),
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return self.reference(reference, field_name);
        }

        for keyword in ["enum", "const", "anyOf", "oneOf", "allOf"] {
            if obj.contains_key(keyword) {
                return TypeExpr::Other(keyword.to_string());
            }
        }

        match obj.get("type") {
            Some(Value::String(ty)) => self.typed(ty, obj, field_name),
            Some(Value::Array(types)) => TypeExpr::Other(
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" | "),
            ),
            Some(other) => TypeExpr::Other(other.to_string()),
            None if obj
                .keys()
                .all(|key| ANNOTATION_KEYWORDS.contains(&key.as_str())) =>
            {
                TypeExpr::Any
            }
            None => TypeExpr::Other("untyped".to_string()),
        }
    }

    fn typed(&mut self, ty: &str, obj: &Map<String, Value>, field_name: &str) -> TypeExpr {
        match ty {
            "string" => TypeExpr::string(),
            "integer" => TypeExpr::integer(),
            "number" => TypeExpr::float(),
            "boolean" => TypeExpr::boolean(),
            "array" => {
                let items = obj
                    .get("items")
                    .or_else(|| obj.get("prefixItems").and_then(|items| items.get(0)));
                match items {
                    Some(items) => TypeExpr::sequence(self.type_expr(items, field_name)),
                    None => TypeExpr::sequence(TypeExpr::Any),
                }
            }
            "object" => {
                if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
                    let name = obj
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or(field_name);
                    return TypeExpr::nested(self.object(name, properties));
                }
                let value = match obj.get("additionalProperties") {
                    Some(Value::Bool(false)) | None => TypeExpr::Any,
                    Some(schema) => self.type_expr(schema, field_name),
                };
                TypeExpr::mapping(TypeExpr::string(), value)
            }
            other => TypeExpr::Other(other.to_string()),
        }
    }

    fn reference(&mut self, reference: &str, field_name: &str) -> TypeExpr {
        let name = reference.rsplit('/').next().unwrap_or(reference);
        let Some(def) = self.defs.and_then(|defs| defs.get(name)) else {
            return TypeExpr::Other(name.to_string());
        };
        if self.visiting.iter().any(|visited| visited == name) {
            return TypeExpr::Other(name.to_string());
        }

        self.visiting.push(name.to_string());
        let ty = match def.get("properties").and_then(Value::as_object) {
            Some(properties) => TypeExpr::nested(self.object(name, properties)),
            None => self.type_expr(def, field_name),
        };
        self.visiting.pop();
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_and_container_mapping() {
        let schema = json!({
            "title": "Order",
            "type": "object",
            "properties": {
                "code": { "type": "string" },
                "quantity": { "type": "integer", "format": "uint32", "minimum": 0 },
                "price": { "type": "number", "format": "double" },
                "paid": { "type": "boolean" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "totals": { "type": "object", "additionalProperties": { "type": "number" } },
                "extra": true
            }
        });

        let descriptor = SchemaDescriptor::from_json_schema(&schema).unwrap();
        assert_eq!(descriptor.name(), "Order");

        let types: Vec<(&str, &TypeExpr)> = descriptor
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), &f.ty))
            .collect();
        assert_eq!(
            types,
            vec![
                ("code", &TypeExpr::string()),
                ("quantity", &TypeExpr::integer()),
                ("price", &TypeExpr::float()),
                ("paid", &TypeExpr::boolean()),
                ("tags", &TypeExpr::sequence(TypeExpr::string())),
                (
                    "totals",
                    &TypeExpr::mapping(TypeExpr::string(), TypeExpr::float())
                ),
                ("extra", &TypeExpr::Any),
            ]
        );
    }

    #[test]
    fn test_refs_resolve_to_nested_descriptors() {
        let schema = json!({
            "title": "Invoice",
            "type": "object",
            "properties": {
                "customer": { "$ref": "#/$defs/Customer" },
                "status": { "$ref": "#/$defs/Status" }
            },
            "$defs": {
                "Customer": {
                    "type": "object",
                    "properties": { "email": { "type": "string" } }
                },
                "Status": { "type": "string", "enum": ["Open", "Paid"] }
            }
        });

        let descriptor = SchemaDescriptor::from_json_schema(&schema).unwrap();
        let customer = SchemaDescriptor::new("Customer").field("email", TypeExpr::string());
        assert_eq!(descriptor.fields()[0].ty, TypeExpr::nested(customer));
        assert_eq!(descriptor.fields()[1].ty, TypeExpr::Other("enum".to_string()));
    }

    #[test]
    fn test_recursive_reference_stops_at_other() {
        let schema = json!({
            "title": "Node",
            "type": "object",
            "properties": {
                "children": { "type": "array", "items": { "$ref": "#/$defs/Node" } }
            },
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": { "type": "array", "items": { "$ref": "#/$defs/Node" } }
                    }
                }
            }
        });

        let descriptor = SchemaDescriptor::from_json_schema(&schema).unwrap();
        assert_eq!(
            descriptor.fields()[0].ty,
            TypeExpr::sequence(TypeExpr::Other("Node".to_string()))
        );
    }

    #[test]
    fn test_nullable_union_is_unclassified() {
        let schema = json!({
            "title": "Contact",
            "type": "object",
            "properties": { "phone": { "type": ["string", "null"] } }
        });

        let descriptor = SchemaDescriptor::from_json_schema(&schema).unwrap();
        assert_eq!(
            descriptor.fields()[0].ty,
            TypeExpr::Other("string | null".to_string())
        );
    }

    #[test]
    fn test_missing_title_is_schema_unavailable() {
        let err = SchemaDescriptor::from_json_schema(&json!({ "type": "object" })).unwrap_err();
        match err {
            LlmError::SchemaUnavailable { reason, .. } => assert!(reason.contains("no title")),
            other => panic!("expected SchemaUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_fieldless_object_has_no_fields() {
        let descriptor = SchemaDescriptor::from_json_schema(&json!({
            "title": "Empty",
            "type": "object",
            "additionalProperties": false
        }))
        .unwrap();
        assert_eq!(descriptor.name(), "Empty");
        assert!(descriptor.fields().is_empty());
    }

    #[test]
    fn test_map_root_is_schema_unavailable() {
        let err = SchemaDescriptor::from_json_schema(&json!({
            "title": "Scores",
            "type": "object",
            "additionalProperties": { "type": "integer" }
        }))
        .unwrap_err();
        assert!(matches!(err, LlmError::SchemaUnavailable { .. }));
    }

    #[test]
    fn test_non_object_root_is_schema_unavailable() {
        let err = SchemaDescriptor::from_json_schema(&json!(true)).unwrap_err();
        assert!(err.to_string().contains("schemars::JsonSchema"));
    }
}
