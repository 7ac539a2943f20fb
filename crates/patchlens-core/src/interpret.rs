//! The lens interpreter: rewrites one primitive patch op under one lens op.
//!
//! `None` stands for a dropped operation. Once an op is dropped it stays
//! dropped for the rest of the lens program. Ops a lens op has no rule for
//! pass through unchanged.
//!
//! The interpreter expects primitive (expanded) ops; see [`crate::expand`].

use serde_json::Value;

use crate::error::{LensError, Result};
use crate::expand::expand_patch;
use crate::lens::{mapping_key, ConvertValue, LensOp, LensSource};
use crate::patch::{JsonPointer, Patch, PatchOp, PathToken};

/// Fold a whole lens program over one patch op.
pub fn apply_lens_to_patch_op(lens: &LensSource, patch_op: PatchOp) -> Result<Option<PatchOp>> {
    lens.iter()
        .try_fold(Some(patch_op), |current, lens_op| run_lens_op(lens_op, current))
}

/// Expand `patch` and push every primitive op through `lens`, discarding drops.
///
/// This is the schema-free half of patch conversion.
pub fn apply_lens_to_expanded_patch(lens: &LensSource, patch: Patch) -> Result<Patch> {
    let mut out = Vec::new();
    for op in expand_patch(patch) {
        if let Some(rewritten) = apply_lens_to_patch_op(lens, op)? {
            out.push(rewritten);
        }
    }
    Ok(out)
}

/// Run a single lens op. A dropped op stays dropped.
pub fn run_lens_op(lens_op: &LensOp, patch_op: Option<PatchOp>) -> Result<Option<PatchOp>> {
    let Some(patch_op) = patch_op else {
        return Ok(None);
    };

    let result = match lens_op {
        LensOp::Rename {
            source,
            destination,
        } => Some(rename_op(patch_op, source, destination)),
        LensOp::Hoist { host, name } => Some(hoist_op(patch_op, host, name)),
        LensOp::Plunge { host, name } => Some(plunge_op(patch_op, host, name)),
        LensOp::Wrap { name } => Some(wrap_op(patch_op, name)),
        LensOp::Head { name } => head_op(patch_op, name),
        // New fields get their values from default synthesis, not from here.
        LensOp::Add(_) => Some(patch_op),
        LensOp::Remove(property) => remove_op(patch_op, &property.name),
        LensOp::In { name, lens } => in_op(patch_op, name, lens)?,
        LensOp::Map { lens } => map_op(patch_op, lens)?,
        LensOp::Convert(convert) => Some(convert_op(patch_op, convert)?),
    };

    if result.is_none() {
        tracing::trace!(lens_op = lens_op.kind(), "patch op dropped");
    }
    Ok(result)
}

fn rename_op(patch_op: PatchOp, source: &str, destination: &str) -> PatchOp {
    // move/copy/test are not renamed.
    if !patch_op.is_write() || !patch_op.path().starts_with_name(source) {
        return patch_op;
    }
    let path = patch_op.path().tail().prefixed(destination);
    patch_op.with_path(path)
}

fn hoist_op(patch_op: PatchOp, host: &str, name: &str) -> PatchOp {
    let tokens = patch_op.path().tokens();
    let matches = tokens.len() >= 2 && tokens[0].is_named(host) && tokens[1].is_named(name);
    if !matches {
        return patch_op;
    }
    let path = patch_op.path().tail();
    patch_op.with_path(path)
}

fn plunge_op(patch_op: PatchOp, host: &str, name: &str) -> PatchOp {
    if !patch_op.path().starts_with_name(name) {
        return patch_op;
    }
    let path = patch_op.path().prefixed(host);
    patch_op.with_path(path)
}

fn wrap_op(patch_op: PatchOp, name: &str) -> PatchOp {
    let path = patch_op.path();
    if !path.starts_with_name(name) {
        return patch_op;
    }
    let wrapped = path.inserted(1, PathToken::Index(0));

    // Writing null to the scalar empties the array instead of storing [null].
    let nulls_scalar = path.len() == 1 && patch_op.write_value().is_some_and(Value::is_null);
    if nulls_scalar {
        return PatchOp::remove(wrapped);
    }
    patch_op.with_path(wrapped)
}

fn head_op(patch_op: PatchOp, name: &str) -> Option<PatchOp> {
    let path = patch_op.path();
    if !path.starts_with_name(name) {
        return Some(patch_op);
    }

    let tokens = path.tokens();
    if tokens.get(1) != Some(&PathToken::Index(0)) {
        // The array itself or a non-head element: invisible through the head.
        return None;
    }

    let rest = &tokens[2..];
    let whole_element = rest.is_empty();
    let mut scalar = vec![PathToken::from(name)];
    scalar.extend(rest.iter().cloned());
    let scalar = JsonPointer::new(scalar);

    match patch_op {
        PatchOp::Add { value, .. } => Some(PatchOp::Add {
            path: scalar,
            value,
        }),
        PatchOp::Replace { value, .. } => Some(PatchOp::Replace {
            path: scalar,
            value,
        }),
        // Removing the head element nulls the scalar rather than deleting it.
        PatchOp::Remove { .. } if whole_element => Some(PatchOp::replace(scalar, Value::Null)),
        PatchOp::Remove { .. } => Some(PatchOp::remove(scalar)),
        other => Some(other),
    }
}

fn remove_op(patch_op: PatchOp, name: &str) -> Option<PatchOp> {
    let structural = patch_op.is_write() || matches!(patch_op, PatchOp::Remove { .. });
    if structural && patch_op.path().starts_with_name(name) {
        return None;
    }
    Some(patch_op)
}

fn in_op(patch_op: PatchOp, name: &str, lens: &LensSource) -> Result<Option<PatchOp>> {
    if !patch_op.path().starts_with_name(name) {
        return Ok(Some(patch_op));
    }
    let inner_path = patch_op.path().tail();
    let inner = apply_lens_to_patch_op(lens, patch_op.with_path(inner_path))?;
    Ok(inner.map(|op| {
        let path = op.path().prefixed(name);
        op.with_path(path)
    }))
}

fn map_op(patch_op: PatchOp, lens: &LensSource) -> Result<Option<PatchOp>> {
    let Some(position) = patch_op.path().first_index_position() else {
        return Ok(Some(patch_op));
    };
    let index = patch_op.path().tokens()[position].clone();
    let item_path = patch_op.path().removed(position);

    let item = apply_lens_to_patch_op(lens, patch_op.with_path(item_path))?;
    Ok(item.map(|op| {
        let path = op.path().inserted(position, index);
        op.with_path(path)
    }))
}

fn convert_op(patch_op: PatchOp, convert: &ConvertValue) -> Result<PatchOp> {
    let path = patch_op.path();
    if !patch_op.is_write() || path.len() != 1 || !path.starts_with_name(&convert.name) {
        return Ok(patch_op);
    }
    let Some(value) = patch_op.write_value() else {
        return Ok(patch_op);
    };

    let Some(mapped) = convert.mapping.lookup(value) else {
        return Err(LensError::UnmappedValue {
            field: convert.name.clone(),
            value: mapping_key(value),
        });
    };
    let mapped = mapped.clone();
    let path = path.clone();
    Ok(patch_op.rewrite(path, mapped))
}
