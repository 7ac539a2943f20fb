//! Schema inference from a sample document.
//!
//! - Objects become object schemas; every key present is required
//! - Arrays take their item schema from the first element
//! - Scalars map to their JSON type

use patchlens_core::JsonTypeName;
use serde_json::Value;

use crate::schema::{JsonSchema, DRAFT_07};

/// Infer a root schema for `value`.
pub fn infer_schema(value: &Value) -> JsonSchema {
    let mut schema = infer_type(value);
    schema.dialect = Some(DRAFT_07.to_string());
    schema
}

fn infer_type(value: &Value) -> JsonSchema {
    match value {
        Value::Array(items) => match items.first() {
            Some(first) => JsonSchema::array_of(infer_type(first)),
            None => JsonSchema::typed(JsonTypeName::Array),
        },
        Value::Object(fields) => fields
            .iter()
            .fold(JsonSchema::object(), |schema, (key, field)| {
                schema.with_property(key.clone(), infer_type(field))
            }),
        scalar => JsonSchema::typed(JsonTypeName::of(scalar)),
    }
}
