//! Per-class schema assembly.
//!
//! Each property's fragment is the shallow merge of the fragments its
//! constraints contribute, in declaration order. Element-wise constraints merge
//! into a separate `items` fragment. Nested-object properties get a placeholder
//! `$ref` holding the bare class name, recorded as a [`NestedReference`] so the
//! resolver can substitute the real pointer.

use crate::converter::{
    CONDITIONAL_VALIDATION, ConverterTable, IS_DEFINED, IS_OPTIONAL, NESTED_VALIDATION,
};
use crate::metadata::{ConstraintRecord, MetadataIndex};
use crate::schema::{ClassSchema, Fragment};
use crate::settings::SchemaSettings;
use indexmap::IndexMap;
use serde_json::Value;

pub(crate) const REF_KEY: &str = "$ref";

/// A nested-object property awaiting pointer substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedReference {
    pub property: String,
    pub class_name: String,
    /// The placeholder sits under `items` rather than at the property's top level.
    pub each: bool,
}

/// A class schema whose nested-object properties still carry placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltClass {
    pub schema: ClassSchema,
    pub references: Vec<NestedReference>,
}

pub type BuiltSchemas = IndexMap<String, BuiltClass>;

/// Build a placeholder-carrying schema for every class in `index`.
#[must_use]
pub fn build(
    index: &MetadataIndex<'_>,
    converters: &ConverterTable,
    settings: &SchemaSettings,
) -> BuiltSchemas {
    let mut built: BuiltSchemas = IndexMap::with_capacity(index.len());
    for (class_name, properties) in index.classes() {
        let mut schema = ClassSchema::new();
        let mut references: Vec<NestedReference> = Vec::new();
        for (property, records) in properties {
            let fragment: Fragment =
                build_property(property, records, converters, &mut references);
            schema.properties.insert((*property).to_string(), fragment);
            if is_required(records, settings.skip_missing_properties) {
                schema.required.push((*property).to_string());
            }
        }
        tracing::debug!(
            class = class_name,
            properties = schema.properties.len(),
            required = schema.required.len(),
            references = references.len(),
            "built class schema"
        );
        built.insert(class_name.to_string(), BuiltClass { schema, references });
    }
    built
}

fn build_property(
    property: &str,
    records: &[&ConstraintRecord],
    converters: &ConverterTable,
    references: &mut Vec<NestedReference>,
) -> Fragment {
    let mut fragment = Fragment::new();
    let mut items: Option<Fragment> = None;

    for record in records {
        let contribution: Option<Fragment> = if record.constraint == NESTED_VALIDATION {
            record.property_type.as_deref().map(|class_name| {
                references.push(NestedReference {
                    property: property.to_string(),
                    class_name: class_name.to_string(),
                    each: record.each,
                });
                let mut placeholder = Fragment::new();
                placeholder.insert(REF_KEY.to_string(), Value::String(class_name.to_string()));
                placeholder
            })
        } else {
            converters.lookup(&record.constraint, &record.arguments)
        };

        let target: &mut Fragment = if record.each {
            items.get_or_insert_with(Fragment::new)
        } else {
            &mut fragment
        };
        if let Some(contribution) = contribution {
            merge(target, contribution);
        }
    }

    if let Some(items) = items {
        fragment.insert("type".to_string(), Value::String("array".to_string()));
        fragment.insert("items".to_string(), Value::Object(items));
    }
    fragment
}

/// Shallow merge: every key of `source` overwrites the same key in `target`.
fn merge(target: &mut Fragment, source: Fragment) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

fn is_required(records: &[&ConstraintRecord], skip_missing_properties: bool) -> bool {
    if skip_missing_properties {
        records.iter().any(|r| r.constraint == IS_DEFINED)
    } else {
        !records
            .iter()
            .any(|r| r.constraint == CONDITIONAL_VALIDATION || r.constraint == IS_OPTIONAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConverterEntry, IS_EMAIL, IS_STRING, MAX_LENGTH, default_converters};
    use serde_json::json;

    fn user_records() -> Vec<ConstraintRecord> {
        vec![
            ConstraintRecord::new("User", "id", IS_DEFINED),
            ConstraintRecord::new("User", "id", IS_STRING),
            ConstraintRecord::new("User", "email", IS_EMAIL),
            ConstraintRecord::new("User", "tags", IS_OPTIONAL),
            ConstraintRecord::new("User", "tags", MAX_LENGTH)
                .with_arguments(vec![json!(20)])
                .each(),
        ]
    }

    fn build_default(records: &[ConstraintRecord], settings: &SchemaSettings) -> BuiltSchemas {
        let index = MetadataIndex::new(records).unwrap();
        build(&index, default_converters(), settings)
    }

    fn properties(built: &BuiltSchemas, class: &str) -> Value {
        serde_json::to_value(&built[class].schema.properties).unwrap()
    }

    #[test]
    fn user_scenario() {
        let built = build_default(&user_records(), &SchemaSettings::default());
        assert_eq!(
            properties(&built, "User"),
            json!({
                "id": { "not": { "type": "null" }, "type": "string" },
                "email": { "format": "email", "type": "string" },
                "tags": { "type": "array", "items": { "maxLength": 20, "type": "string" } }
            })
        );
        assert_eq!(built["User"].schema.required, vec!["id", "email"]);
        assert!(built["User"].references.is_empty());
    }

    #[test]
    fn properties_keep_declaration_order() {
        let built = build_default(&user_records(), &SchemaSettings::default());
        let keys: Vec<&str> = built["User"]
            .schema
            .properties
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["id", "email", "tags"]);
    }

    #[test]
    fn later_constraint_wins_on_overlapping_key() {
        let records = vec![
            ConstraintRecord::new("Item", "count", "isInt"),
            ConstraintRecord::new("Item", "count", "isNumber"),
        ];
        let built = build_default(&records, &SchemaSettings::default());
        assert_eq!(
            properties(&built, "Item"),
            json!({ "count": { "type": "number" } })
        );
    }

    #[test]
    fn sole_element_wise_constraint_is_wrapped_in_array() {
        let records = vec![ConstraintRecord::new("Item", "codes", IS_EMAIL).each()];
        let built = build_default(&records, &SchemaSettings::default());
        assert_eq!(
            properties(&built, "Item"),
            json!({ "codes": { "type": "array", "items": { "format": "email", "type": "string" } } })
        );
    }

    #[test]
    fn element_wise_constraints_merge_into_items() {
        let records = vec![
            ConstraintRecord::new("Item", "codes", "arrayNotEmpty"),
            ConstraintRecord::new("Item", "codes", IS_EMAIL).each(),
            ConstraintRecord::new("Item", "codes", MAX_LENGTH)
                .with_arguments(vec![json!(64)])
                .each(),
        ];
        let built = build_default(&records, &SchemaSettings::default());
        assert_eq!(
            properties(&built, "Item"),
            json!({
                "codes": {
                    "items": { "format": "email", "type": "string", "maxLength": 64 },
                    "minItems": 1,
                    "type": "array"
                }
            })
        );
    }

    #[test]
    fn unknown_constraint_contributes_nothing() {
        let records = vec![
            ConstraintRecord::new("Item", "name", "isPalindrome"),
            ConstraintRecord::new("Item", "name", IS_STRING),
        ];
        let built = build_default(&records, &SchemaSettings::default());
        assert_eq!(
            properties(&built, "Item"),
            json!({ "name": { "type": "string" } })
        );
    }

    #[test]
    fn skip_missing_properties_requires_only_defined() {
        let built = build_default(
            &user_records(),
            &SchemaSettings::default().with_skip_missing_properties(true),
        );
        assert_eq!(built["User"].schema.required, vec!["id"]);
    }

    #[test]
    fn optional_marker_removes_from_required_even_when_defined() {
        let records = vec![
            ConstraintRecord::new("Item", "note", IS_DEFINED),
            ConstraintRecord::new("Item", "note", CONDITIONAL_VALIDATION),
        ];
        let built = build_default(&records, &SchemaSettings::default());
        assert!(built["Item"].schema.required.is_empty());
    }

    #[test]
    fn overlay_adds_description_without_clobbering_type() {
        let converters = default_converters().overlay(&ConverterTable::new().with(
            IS_STRING,
            ConverterEntry::fixed(json!({ "description": "A string value", "type": "string" })),
        ));
        let records = user_records();
        let index = MetadataIndex::new(&records).unwrap();
        let built = build(&index, &converters, &SchemaSettings::default());
        assert_eq!(
            properties(&built, "User")["id"],
            json!({ "not": { "type": "null" }, "description": "A string value", "type": "string" })
        );
    }

    #[test]
    fn nested_property_gets_placeholder_and_reference() {
        let records = vec![
            ConstraintRecord::new("Post", "user", IS_OPTIONAL),
            ConstraintRecord::new("Post", "user", NESTED_VALIDATION).with_property_type("User"),
            ConstraintRecord::new("Post", "comments", NESTED_VALIDATION)
                .with_property_type("Comment")
                .each(),
        ];
        let built = build_default(&records, &SchemaSettings::default());
        assert_eq!(
            properties(&built, "Post"),
            json!({
                "user": { "$ref": "User" },
                "comments": { "type": "array", "items": { "$ref": "Comment" } }
            })
        );
        assert_eq!(
            built["Post"].references,
            vec![
                NestedReference {
                    property: "user".to_string(),
                    class_name: "User".to_string(),
                    each: false,
                },
                NestedReference {
                    property: "comments".to_string(),
                    class_name: "Comment".to_string(),
                    each: true,
                },
            ]
        );
        assert_eq!(built["Post"].schema.required, vec!["comments"]);
    }
}
