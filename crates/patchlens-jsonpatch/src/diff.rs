//! Structural diff producing an RFC 6902 patch.

use patchlens_core::{JsonPointer, Patch, PatchOp};
use serde_json::Value;

/// A patch that turns `old` into `new`.
///
/// Objects are compared key-wise (removals first, then changes and additions
/// in `new`'s key order); arrays index-wise (surplus elements removed from the
/// end, new ones appended). A change of kind replaces the whole value.
pub fn diff(old: &Value, new: &Value) -> Patch {
    let mut out = Vec::new();
    diff_into(old, new, &JsonPointer::root(), &mut out);
    out
}

fn diff_into(old: &Value, new: &Value, path: &JsonPointer, out: &mut Patch) {
    match (old, new) {
        (Value::Object(old_fields), Value::Object(new_fields)) => {
            for key in old_fields.keys() {
                if !new_fields.contains_key(key) {
                    out.push(PatchOp::remove(path.child(key.as_str())));
                }
            }
            for (key, new_value) in new_fields {
                let child = path.child(key.as_str());
                match old_fields.get(key) {
                    Some(old_value) => diff_into(old_value, new_value, &child, out),
                    None => out.push(PatchOp::add(child, new_value.clone())),
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            let shared = old_items.len().min(new_items.len());
            for index in 0..shared {
                diff_into(&old_items[index], &new_items[index], &path.child(index), out);
            }
            for index in (new_items.len()..old_items.len()).rev() {
                out.push(PatchOp::remove(path.child(index)));
            }
            for (index, item) in new_items.iter().enumerate().skip(old_items.len()) {
                out.push(PatchOp::add(path.child(index), item.clone()));
            }
        }
        _ if old == new => {}
        _ => out.push(PatchOp::replace(path.clone(), new.clone())),
    }
}
