//! The JSON Schema subset lenses operate on (draft-07 shaped).

use indexmap::IndexMap;
use patchlens_core::{JsonTypeName, PathToken, PropertyType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchema {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// In declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, JsonSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<JsonSchema>,
}

impl JsonSchema {
    pub fn typed(ty: impl Into<PropertyType>) -> Self {
        Self {
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    pub fn object() -> Self {
        Self::typed(JsonTypeName::Object)
    }

    pub fn array_of(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(JsonTypeName::Array)
        }
    }

    /// Add a required property.
    pub fn with_property(mut self, name: impl Into<String>, property: JsonSchema) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, property);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_type(&self, name: JsonTypeName) -> bool {
        self.ty.as_ref().is_some_and(|ty| ty.includes(name))
    }

    /// Object-shaped: typed as object or carrying properties.
    pub fn is_object_like(&self) -> bool {
        self.is_type(JsonTypeName::Object) || !self.properties.is_empty()
    }

    /// The schema governing the value at `path`, walking `properties`/`items`
    /// and looking through `anyOf` variants.
    pub fn resolve(&self, path: &[PathToken]) -> Option<&JsonSchema> {
        let Some((token, rest)) = path.split_first() else {
            return Some(self);
        };
        let next = match token {
            PathToken::Index(index) => self
                .items_schema()
                .or_else(|| self.property_schema(&index.to_string())),
            PathToken::Key(key) => self.property_schema(key),
        }?;
        next.resolve(rest)
    }

    fn property_schema(&self, key: &str) -> Option<&JsonSchema> {
        self.properties
            .get(key)
            .or_else(|| self.any_of.iter().find_map(|variant| variant.property_schema(key)))
    }

    fn items_schema(&self) -> Option<&JsonSchema> {
        self.items
            .as_deref()
            .or_else(|| self.any_of.iter().find_map(JsonSchema::items_schema))
    }
}

/// The minimal value of a JSON type.
pub fn default_for_type_name(name: JsonTypeName) -> Value {
    match name {
        JsonTypeName::String => Value::String(String::new()),
        JsonTypeName::Number | JsonTypeName::Integer => Value::from(0),
        JsonTypeName::Boolean => Value::Bool(false),
        JsonTypeName::Object => Value::Object(Map::new()),
        JsonTypeName::Array => Value::Array(Vec::new()),
        JsonTypeName::Null => Value::Null,
    }
}

/// The minimal value of a (possibly multi-) type. Nullable types default to null.
pub fn default_for_type(ty: &PropertyType) -> Value {
    if ty.includes(JsonTypeName::Null) {
        return Value::Null;
    }
    match ty {
        PropertyType::One(name) => default_for_type_name(*name),
        PropertyType::Many(names) => names
            .first()
            .map(|name| default_for_type_name(*name))
            .unwrap_or(Value::Null),
    }
}
