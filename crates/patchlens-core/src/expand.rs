//! Patch expansion: compound writes become primitive ones.
//!
//! After expansion every `add`/`replace` carries either a scalar or an empty
//! container, so lens ops only ever have to reason about path shape.

use serde_json::{Map, Value};

use crate::patch::{Patch, PatchOp};

/// Expand one operation into its primitive writes, in document order.
pub fn expand_patch_op(op: PatchOp) -> Patch {
    let mut out = Vec::new();
    expand_into(op, &mut out);
    out
}

/// Expand every operation of `patch`, preserving order.
pub fn expand_patch(patch: Patch) -> Patch {
    let mut out = Vec::with_capacity(patch.len());
    for op in patch {
        expand_into(op, &mut out);
    }
    out
}

fn expand_into(op: PatchOp, out: &mut Patch) {
    let (path, value, is_add) = match op {
        PatchOp::Add { path, value } => (path, value, true),
        PatchOp::Replace { path, value } => (path, value, false),
        other => {
            out.push(other);
            return;
        }
    };
    let write = |path, value| {
        if is_add {
            PatchOp::Add { path, value }
        } else {
            PatchOp::Replace { path, value }
        }
    };

    match value {
        Value::Object(fields) => {
            out.push(write(path.clone(), Value::Object(Map::new())));
            for (key, child) in fields {
                expand_into(write(path.child(key), child), out);
            }
        }
        Value::Array(items) => {
            out.push(write(path.clone(), Value::Array(Vec::new())));
            for (index, child) in items.into_iter().enumerate() {
                expand_into(write(path.child(index), child), out);
            }
        }
        scalar => out.push(write(path, scalar)),
    }
}
