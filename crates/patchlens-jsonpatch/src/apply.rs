//! RFC 6902 patch application.
//!
//! Two cases are lenient because converted patches routinely hit them:
//! `replace` of a missing object key (or of the slot just past an array's
//! end) inserts, and `remove` of a missing location is a no-op.

use patchlens_core::{JsonPointer, Patch, PatchOp, PathToken};
use serde_json::Value;

use crate::error::PatchError;

pub fn apply_patch(mut doc: Value, patch: &Patch) -> Result<Value, PatchError> {
    for op in patch {
        apply_op(&mut doc, op)?;
    }
    Ok(doc)
}

pub fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => add(doc, path, value.clone()),
        PatchOp::Remove { path } => {
            if remove(doc, path)?.is_none() {
                tracing::warn!(path = %path, "remove of missing location ignored");
            }
            Ok(())
        }
        PatchOp::Replace { path, value } => replace(doc, path, value.clone()),
        PatchOp::Move { from, path } => {
            if path.tokens().starts_with(from.tokens()) && path != from {
                return Err(PatchError::MoveIntoChild {
                    from: from.to_string(),
                    path: path.to_string(),
                });
            }
            let value = remove(doc, from)?.ok_or_else(|| not_found(from))?;
            add(doc, path, value)
        }
        PatchOp::Copy { from, path } => {
            let value = get(doc, from).cloned().ok_or_else(|| not_found(from))?;
            add(doc, path, value)
        }
        PatchOp::Test { path, value } => {
            let actual = get(doc, path);
            if actual != Some(value) {
                return Err(PatchError::TestFailed {
                    path: path.to_string(),
                    expected: value.clone(),
                    actual: actual.cloned(),
                });
            }
            Ok(())
        }
    }
}

/// The value at `path`, if present.
pub fn get<'a>(doc: &'a Value, path: &JsonPointer) -> Option<&'a Value> {
    path.tokens().iter().try_fold(doc, |current, token| match (current, token) {
        (Value::Object(fields), token) => fields.get(&token.to_string()),
        (Value::Array(items), PathToken::Index(index)) => items.get(*index),
        _ => None,
    })
}

fn not_found(path: &JsonPointer) -> PatchError {
    PatchError::PathNotFound {
        path: path.to_string(),
    }
}

fn parent_mut<'a>(
    doc: &'a mut Value,
    path: &JsonPointer,
) -> Result<Option<(&'a mut Value, PathToken)>, PatchError> {
    let Some((parent, last)) = path.parent() else {
        return Ok(None);
    };
    let last = last.clone();
    let mut current = doc;
    for token in parent.tokens() {
        current = match (current, token) {
            (Value::Object(fields), token) => fields.get_mut(&token.to_string()),
            (Value::Array(items), PathToken::Index(index)) => items.get_mut(*index),
            _ => None,
        }
        .ok_or_else(|| not_found(&parent))?;
    }
    Ok(Some((current, last)))
}

fn array_index(path: &JsonPointer, token: &PathToken, len: usize) -> Result<usize, PatchError> {
    match token {
        PathToken::Index(index) => Ok(*index),
        PathToken::Key(key) if key == "-" => Ok(len),
        PathToken::Key(key) => Err(PatchError::InvalidIndex {
            path: path.to_string(),
            token: key.clone(),
        }),
    }
}

fn add(doc: &mut Value, path: &JsonPointer, value: Value) -> Result<(), PatchError> {
    let Some((parent, last)) = parent_mut(doc, path)? else {
        *doc = value;
        return Ok(());
    };
    match parent {
        Value::Object(fields) => {
            fields.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(path, &last, items.len())?;
            if index > items.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn remove(doc: &mut Value, path: &JsonPointer) -> Result<Option<Value>, PatchError> {
    let Some((parent, last)) = parent_mut(doc, path)? else {
        return Ok(Some(std::mem::take(doc)));
    };
    match parent {
        Value::Object(fields) => Ok(fields.shift_remove(&last.to_string())),
        Value::Array(items) => {
            let index = array_index(path, &last, items.len())?;
            Ok((index < items.len()).then(|| items.remove(index)))
        }
        _ => Ok(None),
    }
}

fn replace(doc: &mut Value, path: &JsonPointer, value: Value) -> Result<(), PatchError> {
    let Some((parent, last)) = parent_mut(doc, path)? else {
        *doc = value;
        return Ok(());
    };
    match parent {
        Value::Object(fields) => {
            let key = last.to_string();
            if !fields.contains_key(&key) {
                tracing::warn!(path = %path, "replace of missing key inserts it");
            }
            fields.insert(key, value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(path, &last, items.len())?;
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => items[index] = value,
                std::cmp::Ordering::Equal => {
                    tracing::warn!(path = %path, "replace past array end appends");
                    items.push(value);
                }
                std::cmp::Ordering::Greater => {
                    return Err(PatchError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len: items.len(),
                    })
                }
            }
            Ok(())
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}
