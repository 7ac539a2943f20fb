//! End-to-end tests for the complete patchlens pipeline
//!
//! These tests exercise the facade over all crates:
//! - document conversion (diff -> expand -> lens -> defaults -> apply)
//! - patch conversion forward and back through a compiled lens
//! - lens documents loaded from disk
//!
//! Run with: cargo test --test integration_tests

use patchlens::lens::{
    add_property, convert, head, hoist, in_, map, plunge, remove_property, rename, wrap,
};
use patchlens::{
    apply_lens_to_doc, apply_lens_to_patch, compile, converter, infer_schema, load_lens_document,
    update_schema, ConvertOptions, JsonPointer, LensError, LensSource, PatchOp, TargetMerge,
};
use patchlens_core::lens::{JsonTypeName, Property, ValueMapping};
use patchlens_jsonpatch::apply_patch;
use serde_json::{json, Value};
use tempfile::tempdir;

fn ptr(s: &str) -> JsonPointer {
    JsonPointer::parse(s).unwrap()
}

fn convert_doc(lens: &LensSource, doc: Value) -> Value {
    apply_lens_to_doc(lens, &doc, None, None).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("patchlens=trace,patchlens_core=trace")
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Document conversion
// ============================================================================

#[test]
fn test_rename_and_add_fill_new_fields_with_defaults() {
    init_tracing();
    let lens = LensSource::new(vec![
        rename("title", "name"),
        add_property(Property::new("priority", JsonTypeName::Integer)),
    ]);

    let doc = convert_doc(&lens, json!({"title": "Fix login", "done": false}));
    assert_eq!(doc, json!({"name": "Fix login", "done": false, "priority": 0}));
}

#[test]
fn test_added_property_uses_its_declared_default() {
    let lens = LensSource::new(vec![add_property(
        Property::new("status", JsonTypeName::String).with_default(json!("open")),
    )]);

    assert_eq!(convert_doc(&lens, json!({"title": "x"})), json!({"title": "x", "status": "open"}));
}

#[test]
fn test_removed_field_disappears() {
    let lens = LensSource::new(vec![remove_property(Property::new("secret", JsonTypeName::String))]);

    let doc = convert_doc(&lens, json!({"title": "x", "secret": "hunter2"}));
    assert_eq!(doc, json!({"title": "x"}));
}

#[test]
fn test_hoist_and_plunge_move_fields_between_levels() {
    let hoisted = convert_doc(
        &LensSource::new(vec![hoist("meta", "owner")]),
        json!({"title": "x", "meta": {"owner": "ada"}}),
    );
    assert_eq!(hoisted, json!({"title": "x", "meta": {}, "owner": "ada"}));

    // The host is created before the plunged field is written into it.
    let plunged = convert_doc(
        &LensSource::new(vec![plunge("meta", "owner")]),
        json!({"meta": {}, "owner": "ada"}),
    );
    assert_eq!(plunged, json!({"meta": {"owner": "ada"}}));
}

#[test]
fn test_wrap_turns_scalar_into_single_element_array() {
    let lens = LensSource::new(vec![wrap("assignee")]);

    assert_eq!(convert_doc(&lens, json!({"assignee": "ada"})), json!({"assignee": ["ada"]}));
    // A null scalar becomes an empty array, not [null].
    assert_eq!(convert_doc(&lens, json!({"assignee": null})), json!({"assignee": []}));
}

#[test]
fn test_head_keeps_only_the_first_element() {
    let lens = LensSource::new(vec![head("labels")]);

    let doc = convert_doc(&lens, json!({"labels": ["bug", "ui"]}));
    assert_eq!(doc, json!({"labels": "bug"}));
}

#[test]
fn test_in_and_map_rewrite_every_array_element() {
    init_tracing();
    let lens = LensSource::new(vec![in_("items", vec![map(vec![rename("label", "name")])])]);

    let doc = convert_doc(&lens, json!({"items": [{"label": "a"}, {"label": "b"}]}));
    assert_eq!(doc, json!({"items": [{"name": "a"}, {"name": "b"}]}));
}

#[test]
fn test_convert_maps_enum_values() {
    let lens = LensSource::new(vec![convert(
        "status",
        ValueMapping::bijection([(json!("open"), json!(1)), (json!("closed"), json!(0))]),
    )]);

    assert_eq!(convert_doc(&lens, json!({"status": "open"})), json!({"status": 1}));

    let err = apply_lens_to_doc(&lens, &json!({"status": "pending"}), None, None).unwrap_err();
    match err {
        LensError::UnmappedValue { field, value } => {
            assert_eq!(field, "status");
            assert_eq!(value, "pending");
        }
        other => panic!("expected unmapped value, got {other:?}"),
    }
}

#[test]
fn test_wrap_then_reverse_restores_document() {
    let lens = LensSource::new(vec![rename("owner", "owners"), wrap("owners")]);
    let compiled = compile(&lens);

    let original = json!({"owner": "ada", "title": "x"});
    let forward = convert_doc(&compiled.right, original.clone());
    assert_eq!(forward, json!({"owners": ["ada"], "title": "x"}));

    assert_eq!(convert_doc(&compiled.left, forward), original);
}

// ============================================================================
// Target documents and options
// ============================================================================

#[test]
fn test_target_document_overlays_defaults() {
    let lens = LensSource::new(vec![add_property(Property::new("notes", JsonTypeName::String))]);
    let target = json!({"notes": "kept", "archived": true});

    let doc = apply_lens_to_doc(&lens, &json!({"title": "x"}), None, Some(&target)).unwrap();
    assert_eq!(doc, json!({"title": "x", "notes": "kept", "archived": true}));
}

#[test]
fn test_deep_target_merge_keeps_nested_defaults() {
    let lens = LensSource::identity();
    let input = json!({"title": "x"});
    let schema = infer_schema(&json!({"title": "", "meta": {"team": ""}}));
    let target = json!({"meta": {"owner": "ada"}});

    let shallow = converter(ConvertOptions::default())
        .convert_doc(&lens, &input, Some(&schema), Some(&target))
        .unwrap();
    assert_eq!(shallow, json!({"title": "x", "meta": {"owner": "ada"}}));

    let deep = converter(ConvertOptions {
        target_merge: TargetMerge::Deep,
        ..ConvertOptions::default()
    })
    .convert_doc(&lens, &input, Some(&schema), Some(&target))
    .unwrap();
    assert_eq!(deep, json!({"title": "x", "meta": {"team": "", "owner": "ada"}}));
}

#[test]
fn test_default_synthesis_can_be_disabled() {
    let lens = LensSource::new(vec![in_("items", vec![map(vec![rename("label", "name")])])]);
    let schema = infer_schema(&json!({"items": [{"label": "a"}]}));
    let patch = vec![PatchOp::add(ptr("/items/0"), json!({}))];

    let seeded = apply_lens_to_patch(&lens, patch.clone(), &schema).unwrap();
    assert_eq!(
        seeded,
        vec![
            PatchOp::add(ptr("/items/0"), json!({})),
            PatchOp::add(ptr("/items/0/name"), json!("")),
        ]
    );

    let bare = converter(ConvertOptions {
        synthesize_defaults: false,
        ..ConvertOptions::default()
    })
    .convert_patch(&lens, patch, &schema)
    .unwrap();
    assert_eq!(bare, vec![PatchOp::add(ptr("/items/0"), json!({}))]);
}

// ============================================================================
// Patch conversion round trips
// ============================================================================

#[test]
fn test_patch_round_trip_has_same_effect() {
    let lens = LensSource::new(vec![rename("title", "name"), wrap("name")]);
    let compiled = compile(&lens);
    let old_doc = json!({"title": "x", "done": false});
    let old_schema = infer_schema(&old_doc);
    let new_schema = update_schema(&old_schema, &lens).unwrap();

    let edit = vec![
        PatchOp::replace(ptr("/title"), json!("y")),
        PatchOp::replace(ptr("/done"), json!(true)),
    ];
    let forward = compiled.to_right(edit.clone(), &old_schema).unwrap();
    assert_eq!(
        forward,
        vec![
            PatchOp::replace(ptr("/name/0"), json!("y")),
            PatchOp::replace(ptr("/done"), json!(true)),
        ]
    );

    let new_doc = convert_doc(&lens, old_doc.clone());
    assert_eq!(
        apply_patch(new_doc, &forward).unwrap(),
        json!({"name": ["y"], "done": true})
    );

    let back = compiled.to_left(forward, &new_schema).unwrap();
    assert_eq!(
        apply_patch(old_doc.clone(), &back).unwrap(),
        apply_patch(old_doc, &edit).unwrap()
    );
}

#[test]
fn test_scoped_edits_inside_arrays_follow_the_lens() {
    let lens = LensSource::new(vec![in_("items", vec![map(vec![rename("label", "name")])])]);
    let schema = infer_schema(&json!({"items": [{"label": "a"}]}));

    let patch = vec![PatchOp::replace(ptr("/items/3/label"), json!("z"))];
    assert_eq!(
        apply_lens_to_patch(&lens, patch, &schema).unwrap(),
        vec![PatchOp::replace(ptr("/items/3/name"), json!("z"))]
    );
}

// ============================================================================
// Lens documents on disk
// ============================================================================

#[test]
fn test_lens_document_from_disk_drives_conversion() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("v1-to-v2.lens.json");
    std::fs::write(
        &path,
        r#"{
            "name": "v1-to-v2",
            "description": "rename title, wrap assignee, add a priority",
            "lens": [
                {"op": "rename", "source": "title", "destination": "name"},
                {"op": "wrap", "name": "assignee"},
                {"op": "add", "name": "priority", "type": "integer", "default": 3}
            ]
        }"#,
    )?;

    let document = load_lens_document(&path)?;
    assert_eq!(document.name.as_deref(), Some("v1-to-v2"));
    assert_eq!(document.lens.len(), 3);

    let doc = apply_lens_to_doc(&document.lens, &json!({"title": "x", "assignee": "ada"}), None, None)?;
    assert_eq!(doc, json!({"name": "x", "assignee": ["ada"], "priority": 3}));
    Ok(())
}

#[test]
fn test_malformed_lens_document_reports_its_path() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.lens.json");
    std::fs::write(&path, r#"{"lens": [{"op": "rename", "source": "a"}]}"#)?;

    let err = load_lens_document(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.lens.json"));
    Ok(())
}
