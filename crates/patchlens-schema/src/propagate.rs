//! Schema propagation: the schema a lens's *output* satisfies.

use patchlens_core::{ConvertValue, JsonTypeName, LensOp, LensSource, Property, PropertyType};

use crate::error::SchemaError;
use crate::schema::{default_for_type, JsonSchema};

/// Run every op of `lens` over `schema`.
pub fn update_schema(schema: &JsonSchema, lens: &LensSource) -> Result<JsonSchema, SchemaError> {
    lens.iter()
        .try_fold(schema.clone(), |schema, op| update_schema_op(schema, op))
}

pub fn update_schema_op(mut schema: JsonSchema, op: &LensOp) -> Result<JsonSchema, SchemaError> {
    tracing::trace!(op = op.kind(), "propagating schema");
    match op {
        LensOp::Add(property) => {
            if property.name.is_empty() {
                return Err(SchemaError::MissingName { op: "add" });
            }
            if property.required != Some(false) && !schema.required.contains(&property.name) {
                schema.required.push(property.name.clone());
            }
            schema
                .properties
                .insert(property.name.clone(), property_schema(property));
        }

        LensOp::Remove(property) => {
            take_property(&mut schema, "remove", &property.name)?;
            schema.required.retain(|name| name != &property.name);
        }

        LensOp::Rename {
            source,
            destination,
        } => {
            let Some((index, _, moved)) = schema.properties.shift_remove_full(source.as_str()) else {
                return Err(SchemaError::MissingProperty {
                    op: "rename",
                    name: source.clone(),
                });
            };
            schema.properties.shift_insert(index, destination.clone(), moved);
            for name in schema.required.iter_mut() {
                if name == source {
                    *name = destination.clone();
                }
            }
        }

        LensOp::Hoist { host, name } => {
            let host_schema = property_mut(&mut schema, "hoist", host)?;
            let hoisted = take_property(host_schema, "hoist", name)?;
            let was_required = host_schema.required.contains(name);
            host_schema.required.retain(|n| n != name);

            schema.properties.insert(name.clone(), hoisted);
            if was_required && !schema.required.contains(name) {
                schema.required.push(name.clone());
            }
        }

        LensOp::Plunge { host, name } => {
            property_mut(&mut schema, "plunge", host)?;
            let plunged = take_property(&mut schema, "plunge", name)?;
            let was_required = schema.required.contains(name);
            schema.required.retain(|n| n != name);

            let host_schema = property_mut(&mut schema, "plunge", host)?;
            host_schema.properties.insert(name.clone(), plunged);
            if was_required && !host_schema.required.contains(name) {
                host_schema.required.push(name.clone());
            }
        }

        LensOp::Wrap { name } => {
            let property = property_mut(&mut schema, "wrap", name)?;
            let mut items = std::mem::take(property);
            items.ty = items.ty.map(strip_null);
            if items.default.as_ref().is_some_and(|d| d.is_null()) {
                items.default = None;
            }
            *property = JsonSchema {
                default: Some(serde_json::Value::Array(Vec::new())),
                ..JsonSchema::array_of(items)
            };
        }

        LensOp::Head { name } => {
            let property = property_mut(&mut schema, "head", name)?;
            let Some(items) = property.items.take() else {
                return Err(SchemaError::NotAnArray {
                    op: "head",
                    name: name.clone(),
                });
            };
            let mut head = *items;
            head.ty = Some(match head.ty {
                Some(ty) => add_null(ty),
                None => PropertyType::One(JsonTypeName::Null),
            });
            head.default = Some(serde_json::Value::Null);
            *property = head;
        }

        LensOp::In { name, lens } => {
            let property = property_mut(&mut schema, "in", name)?;
            *property = update_schema(property, lens)?;
        }

        LensOp::Map { lens } => {
            let Some(items) = schema.items.as_deref() else {
                return Err(SchemaError::NotAnArray {
                    op: "map",
                    name: "<element>".to_string(),
                });
            };
            let updated = update_schema(items, lens)?;
            schema.items = Some(Box::new(updated));
        }

        LensOp::Convert(ConvertValue {
            name,
            destination_type,
            ..
        }) => {
            let property = property_mut(&mut schema, "convert", name)?;
            if let Some(ty) = destination_type {
                property.ty = Some(ty.clone());
                property.default = Some(default_for_type(ty));
            }
        }
    }
    Ok(schema)
}

/// The schema of a property introduced by `add`.
pub fn property_schema(property: &Property) -> JsonSchema {
    let default = match (&property.default, &property.ty) {
        (Some(default), _) => Some(default.clone()),
        (None, Some(ty)) => Some(default_for_type(ty)),
        (None, None) => None,
    };
    let items = match (&property.ty, &property.items) {
        (Some(ty), Some(items)) if ty.includes(JsonTypeName::Array) => {
            Some(Box::new(property_schema(items)))
        }
        _ => None,
    };
    JsonSchema {
        ty: property.ty.clone(),
        default,
        items,
        ..JsonSchema::default()
    }
}

fn property_mut<'a>(
    schema: &'a mut JsonSchema,
    op: &'static str,
    name: &str,
) -> Result<&'a mut JsonSchema, SchemaError> {
    schema
        .properties
        .get_mut(name)
        .ok_or_else(|| SchemaError::MissingProperty {
            op,
            name: name.to_string(),
        })
}

fn take_property(
    schema: &mut JsonSchema,
    op: &'static str,
    name: &str,
) -> Result<JsonSchema, SchemaError> {
    schema
        .properties
        .shift_remove(name)
        .ok_or_else(|| SchemaError::MissingProperty {
            op,
            name: name.to_string(),
        })
}

fn strip_null(ty: PropertyType) -> PropertyType {
    match ty {
        PropertyType::Many(names) => {
            let mut names: Vec<_> = names.into_iter().filter(|n| *n != JsonTypeName::Null).collect();
            if names.len() == 1 {
                PropertyType::One(names.remove(0))
            } else {
                PropertyType::Many(names)
            }
        }
        one => one,
    }
}

fn add_null(ty: PropertyType) -> PropertyType {
    if ty.includes(JsonTypeName::Null) {
        return ty;
    }
    let mut names = ty.names();
    names.push(JsonTypeName::Null);
    PropertyType::Many(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchlens_core::lens::*;
    use patchlens_core::ValueMapping;
    use serde_json::json;

    fn issue_schema() -> JsonSchema {
        JsonSchema::object()
            .with_property("title", JsonSchema::typed(JsonTypeName::String))
            .with_property("tags", JsonSchema::array_of(JsonSchema::typed(JsonTypeName::String)))
            .with_property(
                "meta",
                JsonSchema::object().with_property("owner", JsonSchema::typed(JsonTypeName::String)),
            )
    }

    fn lens(ops: Vec<LensOp>) -> LensSource {
        LensSource::new(ops)
    }

    #[test]
    fn add_inserts_required_property_with_type_default() {
        let out = update_schema(
            &issue_schema(),
            &lens(vec![add_property(Property::new("done", JsonTypeName::Boolean))]),
        )
        .unwrap();
        assert_eq!(out.properties["done"].default, Some(json!(false)));
        assert!(out.required.contains(&"done".to_string()));
    }

    #[test]
    fn optional_add_is_not_required() {
        let out = update_schema(
            &issue_schema(),
            &lens(vec![add_property(Property::new("note", JsonTypeName::String).optional())]),
        )
        .unwrap();
        assert!(out.properties.contains_key("note"));
        assert!(!out.required.contains(&"note".to_string()));
    }

    #[test]
    fn rename_moves_property_and_requirement() {
        let out = update_schema(&issue_schema(), &lens(vec![rename("title", "name")])).unwrap();
        assert!(!out.properties.contains_key("title"));
        assert!(out.properties.contains_key("name"));
        assert_eq!(out.required, ["name", "tags", "meta"]);
    }

    #[test]
    fn rename_keeps_property_position() {
        let out = update_schema(&issue_schema(), &lens(vec![rename("tags", "labels")])).unwrap();
        let names: Vec<_> = out.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["title", "labels", "meta"]);
    }

    #[test]
    fn remove_of_missing_property_fails() {
        let err = update_schema(
            &issue_schema(),
            &lens(vec![remove_property(Property::new("nope", JsonTypeName::String))]),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingProperty { op: "remove", .. }));
    }

    #[test]
    fn hoist_and_plunge_are_inverse_on_schemas() {
        let hoisted = update_schema(&issue_schema(), &lens(vec![hoist("meta", "owner")])).unwrap();
        assert!(hoisted.properties.contains_key("owner"));
        assert!(hoisted.properties["meta"].properties.is_empty());
        assert!(hoisted.required.contains(&"owner".to_string()));

        let back = update_schema(&hoisted, &lens(vec![plunge("meta", "owner")])).unwrap();
        assert_eq!(back, issue_schema());
    }

    #[test]
    fn wrap_then_head_gives_nullable_scalar() {
        let wrapped = update_schema(&issue_schema(), &lens(vec![wrap("title")])).unwrap();
        assert_eq!(
            wrapped.properties["title"],
            JsonSchema::array_of(JsonSchema::typed(JsonTypeName::String)).with_default(json!([]))
        );

        let headed = update_schema(&wrapped, &lens(vec![head("title")])).unwrap();
        assert_eq!(
            headed.properties["title"].ty,
            Some(PropertyType::Many(vec![JsonTypeName::String, JsonTypeName::Null]))
        );
        assert_eq!(headed.properties["title"].default, Some(json!(null)));
    }

    #[test]
    fn head_requires_an_array() {
        let err = update_schema(&issue_schema(), &lens(vec![head("title")])).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnArray { op: "head", .. }));
    }

    #[test]
    fn in_and_map_recurse() {
        let schema = JsonSchema::object().with_property(
            "items",
            JsonSchema::array_of(
                JsonSchema::object().with_property("title", JsonSchema::typed(JsonTypeName::String)),
            ),
        );
        let out = update_schema(
            &schema,
            &lens(vec![in_("items", vec![map(vec![rename("title", "name")])])]),
        )
        .unwrap();
        let items = out.properties["items"].items.as_deref().unwrap();
        assert!(items.properties.contains_key("name"));
    }

    #[test]
    fn typed_convert_retypes_property() {
        let mapping = ValueMapping::bijection([(json!("open"), json!(true)), (json!("closed"), json!(false))]);
        let schema = JsonSchema::object().with_property("status", JsonSchema::typed(JsonTypeName::String));
        let out = update_schema(
            &schema,
            &lens(vec![convert_typed("status", mapping, JsonTypeName::String, JsonTypeName::Boolean)]),
        )
        .unwrap();
        assert_eq!(out.properties["status"].ty, Some(JsonTypeName::Boolean.into()));
        assert_eq!(out.properties["status"].default, Some(json!(false)));
    }
}
