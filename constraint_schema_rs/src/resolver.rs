//! Nested-object reference resolution.
//!
//! Placeholders left by the builder become `$ref` pointers. In resolved mode each
//! root class additionally carries a definitions block with every class it can
//! reach, each materialized exactly once.

use crate::builder::{BuiltClass, BuiltSchemas, NestedReference, REF_KEY};
use crate::error::SchemaGenError;
use crate::schema::{ClassSchema, Fragment, SchemaMap};
use crate::settings::SchemaSettings;
use indexmap::IndexSet;
use serde_json::Value;
use std::collections::VecDeque;

/// Substitute placeholders in every class, inlining definitions when
/// `settings.resolve_references` is set.
///
/// # Errors
///
/// In resolved mode, returns `SchemaGenError::DanglingReference` when a reachable
/// class has no metadata and `SchemaGenError::DefinitionsCollision` when the
/// definitions block cannot be placed.
pub fn resolve(
    built: &BuiltSchemas,
    settings: &SchemaSettings,
) -> Result<SchemaMap, SchemaGenError> {
    if !settings.resolve_references {
        return Ok(built
            .iter()
            .map(|(name, class)| (name.clone(), substitute(class, settings)))
            .collect());
    }
    built
        .keys()
        .map(|root| Ok((root.clone(), resolve_root(built, root, settings)?)))
        .collect()
}

/// The class schema with every placeholder replaced by `prefix + className`.
#[must_use]
pub fn substitute(class: &BuiltClass, settings: &SchemaSettings) -> ClassSchema {
    let mut schema: ClassSchema = class.schema.clone();
    for reference in live_references(class) {
        if let Some(holder) = placeholder_holder_mut(&mut schema, reference) {
            holder.insert(
                REF_KEY.to_string(),
                Value::String(settings.pointer(&reference.class_name)),
            );
        }
    }
    schema
}

/// References whose placeholder survived the merge; a later constraint writing
/// its own `$ref` replaces the edge.
fn live_references(class: &BuiltClass) -> impl Iterator<Item = &NestedReference> {
    class.references.iter().filter(move |reference| {
        let Some(property) = class.schema.properties.get(&reference.property) else {
            return false;
        };
        let holder: Option<&Fragment> = if reference.each {
            property.get("items").and_then(Value::as_object)
        } else {
            Some(property)
        };
        holder
            .and_then(|holder| holder.get(REF_KEY))
            .and_then(Value::as_str)
            == Some(reference.class_name.as_str())
    })
}

fn placeholder_holder_mut<'s>(
    schema: &'s mut ClassSchema,
    reference: &NestedReference,
) -> Option<&'s mut Fragment> {
    let property: &mut Fragment = schema.properties.get_mut(&reference.property)?;
    if reference.each {
        property.get_mut("items").and_then(Value::as_object_mut)
    } else {
        Some(property)
    }
}

/// Schema for `root` with the definitions block of every class reachable from it.
///
/// `root` itself is only materialized in the block when a reference cycle leads
/// back to it, so every emitted pointer resolves within the document.
///
/// # Errors
///
/// Returns `SchemaGenError::UnknownClass` if `root` is not in `built`,
/// `SchemaGenError::DanglingReference` if a reachable class is not, and
/// `SchemaGenError::DefinitionsCollision` if the definitions block would replace
/// one of the root schema's own keys.
pub fn resolve_root(
    built: &BuiltSchemas,
    root: &str,
    settings: &SchemaSettings,
) -> Result<ClassSchema, SchemaGenError> {
    let root_class: &BuiltClass = built
        .get(root)
        .ok_or_else(|| SchemaGenError::UnknownClass(root.to_string()))?;

    let mut visited: IndexSet<&str> = IndexSet::new();
    let mut pending: VecDeque<(&str, &str)> = live_references(root_class)
        .map(|r| (r.class_name.as_str(), root))
        .collect();
    let mut definitions = Fragment::new();

    while let Some((class_name, referenced_by)) = pending.pop_front() {
        if !visited.insert(class_name) {
            continue;
        }
        let class: &BuiltClass = built.get(class_name).ok_or_else(|| {
            SchemaGenError::DanglingReference {
                class: class_name.to_string(),
                referenced_by: referenced_by.to_string(),
            }
        })?;
        definitions.insert(
            class_name.to_string(),
            serde_json::to_value(substitute(class, settings))?,
        );
        pending.extend(live_references(class).map(|r| (r.class_name.as_str(), class_name)));
    }
    tracing::debug!(
        root,
        definitions = definitions.len(),
        "resolved nested references"
    );

    let mut schema: ClassSchema = substitute(root_class, settings);
    if !definitions.is_empty() {
        place_definitions(&mut schema, &settings.definitions_path(), definitions)?;
    }
    Ok(schema)
}

/// Nest `definitions` under `path` in the schema's flattened definitions map.
/// With an empty path the entries land at the document root.
fn place_definitions(
    schema: &mut ClassSchema,
    path: &[&str],
    definitions: Fragment,
) -> Result<(), SchemaGenError> {
    let Some((head, rest)) = path.split_first() else {
        if let Some(key) = definitions
            .keys()
            .find(|name| ClassSchema::RESERVED_KEYS.contains(&name.as_str()))
        {
            return Err(SchemaGenError::DefinitionsCollision { key: key.clone() });
        }
        schema.definitions.extend(definitions);
        return Ok(());
    };
    if ClassSchema::RESERVED_KEYS.contains(head) {
        return Err(SchemaGenError::DefinitionsCollision {
            key: (*head).to_string(),
        });
    }
    let mut block = Value::Object(definitions);
    for segment in rest.iter().rev() {
        let mut wrapper = Fragment::new();
        wrapper.insert((*segment).to_string(), block);
        block = Value::Object(wrapper);
    }
    schema.definitions.insert((*head).to_string(), block);
    Ok(())
}
