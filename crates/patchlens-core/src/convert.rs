//! Patch and document conversion through a lens.
//!
//! The interpreter only rewrites operations. Everything that needs a schema
//! (computing the reader's schema, filling in values the lens cannot derive)
//! or a concrete document (diffing, applying) goes through the two
//! collaborator traits below.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BoxError, LensError, Result};
use crate::interpret::apply_lens_to_expanded_patch;
use crate::lens::LensSource;
use crate::patch::Patch;

// ============================================================================
// Collaborators
// ============================================================================

/// Schema-level services: propagation, defaults and inference.
pub trait SchemaOracle {
    type Schema: Clone + fmt::Debug;

    /// The schema satisfied by documents after `lens` has been applied.
    fn propagate(&self, schema: &Self::Schema, lens: &LensSource) -> Result<Self::Schema, BoxError>;

    /// Append/insert ops giving minimal valid values for fields `patch` leaves unset.
    fn synthesize_defaults(&self, patch: Patch, schema: &Self::Schema) -> Result<Patch, BoxError>;

    /// The minimal valid document for `schema`.
    fn default_document(&self, schema: &Self::Schema) -> Result<Value, BoxError>;

    /// Infer a schema from a sample document.
    fn infer(&self, doc: &Value) -> Self::Schema;
}

/// Document-level patch services.
pub trait PatchEngine {
    /// A patch turning `old` into `new`.
    fn diff(&self, old: &Value, new: &Value) -> Patch;

    fn apply(&self, doc: Value, patch: &Patch) -> Result<Value, BoxError>;
}

// ============================================================================
// Configuration
// ============================================================================

/// How a caller-supplied target document is laid over the default base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMerge {
    /// Top-level keys of the target replace those of the base.
    #[default]
    Shallow,
    /// Objects are merged recursively; anything else is replaced.
    Deep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Run default synthesis against the reader's schema after lensing.
    pub synthesize_defaults: bool,
    pub target_merge: TargetMerge,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            synthesize_defaults: true,
            target_merge: TargetMerge::Shallow,
        }
    }
}

// ============================================================================
// Converter
// ============================================================================

/// Drives expansion, interpretation and default synthesis.
#[derive(Debug, Clone, Default)]
pub struct Converter<O, E> {
    oracle: O,
    engine: E,
    options: ConvertOptions,
}

impl<O: SchemaOracle, E: PatchEngine> Converter<O, E> {
    pub fn new(oracle: O, engine: E) -> Self {
        Self {
            oracle,
            engine,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Convert `patch`, written against a document satisfying `source_schema`,
    /// into a patch for the lens's output shape.
    pub fn convert_patch(
        &self,
        lens: &LensSource,
        patch: Patch,
        source_schema: &O::Schema,
    ) -> Result<Patch> {
        let (patch, _) = self.convert_patch_with_schema(lens, patch, source_schema)?;
        Ok(patch)
    }

    fn convert_patch_with_schema(
        &self,
        lens: &LensSource,
        patch: Patch,
        source_schema: &O::Schema,
    ) -> Result<(Patch, O::Schema)> {
        let ops_in = patch.len();
        let lensed = apply_lens_to_expanded_patch(lens, patch)?;
        let lensed_len = lensed.len();

        let reader_schema = self
            .oracle
            .propagate(source_schema, lens)
            .map_err(LensError::Schema)?;

        let out = if self.options.synthesize_defaults {
            self.oracle
                .synthesize_defaults(lensed, &reader_schema)
                .map_err(LensError::Schema)?
        } else {
            lensed
        };

        tracing::debug!(
            lens_ops = lens.len(),
            ops_in,
            ops_lensed = lensed_len,
            ops_out = out.len(),
            "converted patch through lens"
        );
        Ok((out, reader_schema))
    }

    /// Convert a whole document by converting the patch that creates it.
    ///
    /// `input_schema` is inferred from `input` when absent. The converted patch
    /// is applied on top of the reader schema's default document, overlaid
    /// with `target` when given.
    pub fn convert_doc(
        &self,
        lens: &LensSource,
        input: &Value,
        input_schema: Option<&O::Schema>,
        target: Option<&Value>,
    ) -> Result<Value> {
        let input_schema = match input_schema {
            Some(schema) => schema.clone(),
            None => self.oracle.infer(input),
        };

        let creation = self.engine.diff(&Value::Object(Map::new()), input);
        let (patch, output_schema) = self.convert_patch_with_schema(lens, creation, &input_schema)?;

        let mut base = self
            .oracle
            .default_document(&output_schema)
            .map_err(LensError::Schema)?;
        if let Some(target) = target {
            merge_target(&mut base, target, self.options.target_merge);
        }

        self.engine.apply(base, &patch).map_err(LensError::Apply)
    }
}

/// Lay `target` over `base`.
pub fn merge_target(base: &mut Value, target: &Value, strategy: TargetMerge) {
    match (base, target) {
        (Value::Object(base_fields), Value::Object(target_fields)) => {
            for (key, value) in target_fields {
                match (strategy, base_fields.get_mut(key)) {
                    (TargetMerge::Deep, Some(existing)) => merge_target(existing, value, strategy),
                    _ => {
                        base_fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, target) => *base = target.clone(),
    }
}
