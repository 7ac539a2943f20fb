//! Patch-level lenses.
//!
//! A lens is a reversible program of small structural rewrites (rename, hoist,
//! wrap, ...). Instead of converting documents between schema versions, this
//! crate converts the *patches* editing them:
//!
//! ```text
//!   patch (old shape) ──expand──► primitive ops ──lens──► ops (new shape)
//!                                                          │
//!                     reader schema ◄──propagate──────────┤
//!                                                          ▼
//!                                          default synthesis ──► patch (new shape)
//! ```
//!
//! Schema handling and JSON Patch diff/apply are collaborators (see
//! [`convert::SchemaOracle`] and [`convert::PatchEngine`]); this crate owns the
//! expansion, the interpreter and the reversal.

pub mod convert;
pub mod error;
pub mod expand;
pub mod interpret;
pub mod lens;
pub mod patch;
pub mod reverse;

pub use convert::{merge_target, ConvertOptions, Converter, PatchEngine, SchemaOracle, TargetMerge};
pub use error::{BoxError, LensError, Result};
pub use expand::{expand_patch, expand_patch_op};
pub use interpret::{apply_lens_to_expanded_patch, apply_lens_to_patch_op, run_lens_op};
pub use lens::{
    ConvertValue, JsonTypeName, LensDocument, LensOp, LensSource, Property, PropertyType,
    ValueMapping,
};
pub use patch::{parse_patch, JsonPointer, Patch, PatchOp, PathToken};
pub use reverse::{reverse_lens, reverse_lens_op};
