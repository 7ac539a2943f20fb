//! RFC 6902 JSON Patch for patchlens: a structural [`diff`] and a lenient
//! [`apply_patch`], packaged as the core's [`PatchEngine`].

pub mod apply;
pub mod diff;
pub mod error;

use patchlens_core::{BoxError, Patch, PatchEngine};
use serde_json::Value;

pub use apply::{apply_op, apply_patch, get};
pub use diff::diff;
pub use error::PatchError;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPatchEngine;

impl PatchEngine for JsonPatchEngine {
    fn diff(&self, old: &Value, new: &Value) -> Patch {
        diff(old, new)
    }

    fn apply(&self, doc: Value, patch: &Patch) -> Result<Value, BoxError> {
        Ok(apply_patch(doc, patch)?)
    }
}
