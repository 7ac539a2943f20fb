//! Lens programs: the closed vocabulary of structural rewrites.
//!
//! A [`LensSource`] is authored once (usually as a JSON document) and then
//! run forwards or, via [`LensSource::reverse`], backwards over patches.
//! The wire shape is `{"op": "<tag>", ...}` per operation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub type Name = String;

// ============================================================================
// Property payloads (schema side of `add` / `remove`)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonTypeName {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonTypeName {
    /// The JSON type of a concrete value (`Integer` is never returned).
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonTypeName::Null,
            Value::Bool(_) => JsonTypeName::Boolean,
            Value::Number(_) => JsonTypeName::Number,
            Value::String(_) => JsonTypeName::String,
            Value::Array(_) => JsonTypeName::Array,
            Value::Object(_) => JsonTypeName::Object,
        }
    }
}

/// `"type"` as JSON Schema spells it: one name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyType {
    One(JsonTypeName),
    Many(Vec<JsonTypeName>),
}

impl PropertyType {
    pub fn names(&self) -> Vec<JsonTypeName> {
        match self {
            PropertyType::One(name) => vec![*name],
            PropertyType::Many(names) => names.clone(),
        }
    }

    pub fn includes(&self, name: JsonTypeName) -> bool {
        match self {
            PropertyType::One(one) => *one == name,
            PropertyType::Many(names) => names.contains(&name),
        }
    }
}

impl From<JsonTypeName> for PropertyType {
    fn from(name: JsonTypeName) -> Self {
        PropertyType::One(name)
    }
}

/// A field introduced by `add` or eliminated by `remove`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: Name,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Property>>,
}

impl Property {
    pub fn new(name: impl Into<Name>, ty: impl Into<PropertyType>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_items(mut self, items: Property) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = Some(false);
        self
    }
}

// ============================================================================
// Value mappings (`convert`)
// ============================================================================

/// `[forward, backward]` lookup tables keyed by the stringified source value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping(pub Map<String, Value>, pub Map<String, Value>);

impl ValueMapping {
    pub fn new(forward: Map<String, Value>, backward: Map<String, Value>) -> Self {
        Self(forward, backward)
    }

    /// Build a bijective mapping from `(source, destination)` pairs.
    pub fn bijection<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut forward = Map::new();
        let mut backward = Map::new();
        for (source, destination) in pairs {
            forward.insert(mapping_key(&source), destination.clone());
            backward.insert(mapping_key(&destination), source);
        }
        Self(forward, backward)
    }

    pub fn forward(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn backward(&self) -> &Map<String, Value> {
        &self.1
    }

    pub fn lookup(&self, value: &Value) -> Option<&Value> {
        self.0.get(&mapping_key(value))
    }

    pub fn swapped(&self) -> Self {
        Self(self.1.clone(), self.0.clone())
    }
}

/// Table key for a value: strings as-is, arrays joined with commas, anything
/// else in its JSON form.
pub fn mapping_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_key(n),
        Value::Array(items) => items.iter().map(mapping_key).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Integral floats print without a fraction, so `1.0` and `1` share a key.
fn number_key(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                return (f as i64).to_string();
            }
        }
    }
    n.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertValue {
    pub name: Name,
    pub mapping: ValueMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_type: Option<PropertyType>,
}

// ============================================================================
// Lens operations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum LensOp {
    /// Rename a top-level field.
    Rename { source: Name, destination: Name },
    /// Move `host.name` up to `name`.
    Hoist { host: Name, name: Name },
    /// Move `name` down into `host.name`.
    Plunge { host: Name, name: Name },
    /// Scalar `name` becomes a one-element array.
    Wrap { name: Name },
    /// Array `name` is read through its first element.
    Head { name: Name },
    Add(Property),
    Remove(Property),
    /// Run `lens` on the subtree under `name`.
    In { name: Name, lens: LensSource },
    /// Run `lens` on every element of an array.
    Map { lens: LensSource },
    Convert(ConvertValue),
}

impl LensOp {
    /// The `"op"` tag as it appears in lens documents.
    pub fn kind(&self) -> &'static str {
        match self {
            LensOp::Rename { .. } => "rename",
            LensOp::Hoist { .. } => "hoist",
            LensOp::Plunge { .. } => "plunge",
            LensOp::Wrap { .. } => "wrap",
            LensOp::Head { .. } => "head",
            LensOp::Add(_) => "add",
            LensOp::Remove(_) => "remove",
            LensOp::In { .. } => "in",
            LensOp::Map { .. } => "map",
            LensOp::Convert(_) => "convert",
        }
    }
}

/// An ordered lens program, applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LensSource(Vec<LensOp>);

impl LensSource {
    pub fn new(ops: Vec<LensOp>) -> Self {
        Self(ops)
    }

    /// The identity lens.
    pub fn identity() -> Self {
        Self(Vec::new())
    }

    pub fn ops(&self) -> &[LensOp] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LensOp> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, op: LensOp) {
        self.0.push(op);
    }

    /// `self` followed by `after`.
    pub fn then(&self, after: &LensSource) -> LensSource {
        let mut ops = Vec::with_capacity(self.0.len() + after.0.len());
        ops.extend(self.0.iter().cloned());
        ops.extend(after.0.iter().cloned());
        Self(ops)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<Vec<LensOp>> for LensSource {
    fn from(ops: Vec<LensOp>) -> Self {
        Self(ops)
    }
}

impl FromIterator<LensOp> for LensSource {
    fn from_iter<I: IntoIterator<Item = LensOp>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for LensSource {
    type Item = LensOp;
    type IntoIter = std::vec::IntoIter<LensOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LensSource {
    type Item = &'a LensOp;
    type IntoIter = std::slice::Iter<'a, LensOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A lens as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub lens: LensSource,
}

impl LensDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn rename(source: impl Into<Name>, destination: impl Into<Name>) -> LensOp {
    LensOp::Rename {
        source: source.into(),
        destination: destination.into(),
    }
}

pub fn hoist(host: impl Into<Name>, name: impl Into<Name>) -> LensOp {
    LensOp::Hoist {
        host: host.into(),
        name: name.into(),
    }
}

pub fn plunge(host: impl Into<Name>, name: impl Into<Name>) -> LensOp {
    LensOp::Plunge {
        host: host.into(),
        name: name.into(),
    }
}

pub fn wrap(name: impl Into<Name>) -> LensOp {
    LensOp::Wrap { name: name.into() }
}

pub fn head(name: impl Into<Name>) -> LensOp {
    LensOp::Head { name: name.into() }
}

pub fn add_property(property: Property) -> LensOp {
    LensOp::Add(property)
}

pub fn remove_property(property: Property) -> LensOp {
    LensOp::Remove(property)
}

/// `in` is a keyword, hence the trailing underscore.
pub fn in_(name: impl Into<Name>, lens: impl Into<LensSource>) -> LensOp {
    LensOp::In {
        name: name.into(),
        lens: lens.into(),
    }
}

pub fn map(lens: impl Into<LensSource>) -> LensOp {
    LensOp::Map { lens: lens.into() }
}

pub fn convert(name: impl Into<Name>, mapping: ValueMapping) -> LensOp {
    LensOp::Convert(ConvertValue {
        name: name.into(),
        mapping,
        source_type: None,
        destination_type: None,
    })
}

pub fn convert_typed(
    name: impl Into<Name>,
    mapping: ValueMapping,
    source_type: impl Into<PropertyType>,
    destination_type: impl Into<PropertyType>,
) -> LensOp {
    LensOp::Convert(ConvertValue {
        name: name.into(),
        mapping,
        source_type: Some(source_type.into()),
        destination_type: Some(destination_type.into()),
    })
}
