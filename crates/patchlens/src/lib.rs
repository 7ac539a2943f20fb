//! Translate JSON patches and documents between schema versions.
//!
//! The facade wires the draft-07 [`JsonSchemaOracle`] and the RFC 6902
//! [`JsonPatchEngine`] into the core [`Converter`]:
//!
//! ```no_run
//! use patchlens::{apply_lens_to_doc, lens::rename, LensSource};
//! use serde_json::json;
//!
//! let lens = LensSource::new(vec![rename("title", "name")]);
//! let doc = apply_lens_to_doc(&lens, &json!({"title": "hello"}), None, None)?;
//! assert_eq!(doc, json!({"name": "hello"}));
//! # Ok::<(), patchlens::LensError>(())
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

pub use patchlens_core::{
    expand_patch, lens, parse_patch, reverse_lens, ConvertOptions, Converter, JsonPointer,
    LensDocument, LensError, LensOp, LensSource, Patch, PatchOp, PathToken, Result, TargetMerge,
};
pub use patchlens_jsonpatch::{JsonPatchEngine, PatchError};
pub use patchlens_schema::{infer_schema, update_schema, JsonSchema, JsonSchemaOracle, SchemaError};

pub type DefaultConverter = Converter<JsonSchemaOracle, JsonPatchEngine>;

/// A converter over JSON Schema and JSON Patch with the given options.
pub fn converter(options: ConvertOptions) -> DefaultConverter {
    Converter::new(JsonSchemaOracle, JsonPatchEngine).with_options(options)
}

/// A lens paired with its reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLens {
    /// Old shape to new shape.
    pub right: LensSource,
    /// New shape back to old shape.
    pub left: LensSource,
}

impl CompiledLens {
    pub fn to_right(&self, patch: Patch, schema: &JsonSchema) -> Result<Patch> {
        apply_lens_to_patch(&self.right, patch, schema)
    }

    /// Converts back; `schema` is the schema of the new shape.
    pub fn to_left(&self, patch: Patch, schema: &JsonSchema) -> Result<Patch> {
        apply_lens_to_patch(&self.left, patch, schema)
    }
}

pub fn compile(lens: &LensSource) -> CompiledLens {
    CompiledLens {
        right: lens.clone(),
        left: lens.reverse(),
    }
}

pub fn apply_lens_to_patch(lens: &LensSource, patch: Patch, schema: &JsonSchema) -> Result<Patch> {
    converter(ConvertOptions::default()).convert_patch(lens, patch, schema)
}

/// Convert `doc` through `lens`; see [`Converter::convert_doc`].
pub fn apply_lens_to_doc(
    lens: &LensSource,
    doc: &Value,
    schema: Option<&JsonSchema>,
    target: Option<&Value>,
) -> Result<Value> {
    converter(ConvertOptions::default()).convert_doc(lens, doc, schema, target)
}

/// Read a lens document (`{"name", "description", "lens": [...]}`) from disk.
pub fn load_lens_document(path: impl AsRef<Path>) -> anyhow::Result<LensDocument> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read lens file: {}", path.display()))?;
    let document = LensDocument::from_json_str(&text)
        .with_context(|| format!("invalid lens document: {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        name = document.name.as_deref().unwrap_or(""),
        ops = document.lens.len(),
        "loaded lens document"
    );
    Ok(document)
}
