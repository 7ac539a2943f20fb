//! Default-value synthesis.
//!
//! A lens can introduce fields no source op ever writes (`add`, or a field
//! whose writes were dropped). Whenever a converted patch creates an object,
//! the object's properties are seeded with their defaults right after it;
//! later ops in the patch overwrite them as usual.

use indexmap::IndexMap;
use patchlens_core::{JsonTypeName, Patch, PatchOp};
use serde_json::{Map, Value};

use crate::schema::{default_for_type, JsonSchema};

/// The default value of `schema`, with object values filled recursively.
pub fn default_value(schema: &JsonSchema) -> Value {
    let mut value = match (&schema.default, &schema.ty) {
        (Some(default), _) => default.clone(),
        (None, Some(ty)) => default_for_type(ty),
        (None, None) if !schema.properties.is_empty() => Value::Object(Map::new()),
        (None, None) => any_of_default(schema),
    };
    if let Value::Object(fields) = &mut value {
        if let Some(properties) = object_properties(schema) {
            fill_defaults(fields, properties);
        }
    }
    value
}

fn any_of_default(schema: &JsonSchema) -> Value {
    let nullable = schema
        .any_of
        .iter()
        .any(|variant| variant.is_type(JsonTypeName::Null));
    match schema.any_of.first() {
        Some(first) if !nullable => default_value(first),
        _ => Value::Null,
    }
}

fn fill_defaults(fields: &mut Map<String, Value>, properties: &IndexMap<String, JsonSchema>) {
    for (name, property) in properties {
        if !fields.contains_key(name) {
            fields.insert(name.clone(), default_value(property));
        }
    }
}

/// Properties of an object schema, looking through `anyOf`.
fn object_properties(schema: &JsonSchema) -> Option<&IndexMap<String, JsonSchema>> {
    if !schema.properties.is_empty() {
        return Some(&schema.properties);
    }
    schema
        .any_of
        .iter()
        .find(|variant| !variant.properties.is_empty())
        .map(|variant| &variant.properties)
}

/// The minimal document satisfying `schema`.
pub fn default_document(schema: &JsonSchema) -> Value {
    match default_value(schema) {
        Value::Null if schema.ty.is_none() => Value::Object(Map::new()),
        doc => doc,
    }
}

/// Seed every object created by `patch` with its schema's defaults.
pub fn add_default_values(patch: Patch, schema: &JsonSchema) -> Patch {
    let mut out = Vec::with_capacity(patch.len());
    for op in patch {
        let creates_object =
            matches!(op.write_value(), Some(Value::Object(fields)) if fields.is_empty());
        if !creates_object {
            out.push(op);
            continue;
        }

        let path = op.path().clone();
        out.push(op);
        let Some(properties) = schema.resolve(path.tokens()).and_then(object_properties) else {
            tracing::trace!(path = %path, "no object schema for created object");
            continue;
        };
        for (name, property) in properties {
            out.push(PatchOp::add(path.child(name.as_str()), default_value(property)));
        }
    }
    out
}
