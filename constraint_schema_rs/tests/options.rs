//! End-to-end behavior of every `SchemaSettings` option over a small class graph:
//! `User`, `Post` (references `User`) and `PostUser` (references both).

use constraint_schema_rs::{
    CONDITIONAL_VALIDATION, ClassSchema, ConstraintRecord, ConverterEntry, ConverterTable,
    IS_DEFINED, IS_EMAIL, IS_STRING, MAX_LENGTH, NESTED_VALIDATION, SchemaGenError, SchemaMap,
    SchemaSettings, generate_schema, generate_schemas,
};
use serde_json::{Value, json};

fn optional_nested(class: &str, property: &str, target: &str) -> [ConstraintRecord; 2] {
    [
        ConstraintRecord::new(class, property, CONDITIONAL_VALIDATION),
        ConstraintRecord::new(class, property, NESTED_VALIDATION).with_property_type(target),
    ]
}

fn metadata() -> Vec<ConstraintRecord> {
    let mut records = vec![
        ConstraintRecord::new("User", "id", IS_DEFINED),
        ConstraintRecord::new("User", "id", IS_STRING),
        ConstraintRecord::new("User", "email", IS_EMAIL),
        ConstraintRecord::new("User", "tags", CONDITIONAL_VALIDATION),
        ConstraintRecord::new("User", "tags", MAX_LENGTH)
            .with_arguments(vec![json!(20)])
            .each(),
    ];
    records.extend(optional_nested("Post", "user", "User"));
    records.extend(optional_nested("PostUser", "post", "Post"));
    records.extend(optional_nested("PostUser", "user", "User"));
    records
}

fn to_value(schema: &ClassSchema) -> Value {
    serde_json::to_value(schema).unwrap()
}

fn schemas(settings: &SchemaSettings) -> SchemaMap {
    generate_schemas(&metadata(), settings).unwrap()
}

fn user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "not": { "type": "null" }, "type": "string" },
            "email": { "format": "email", "type": "string" },
            "tags": { "type": "array", "items": { "maxLength": 20, "type": "string" } }
        },
        "required": ["id", "email"]
    })
}

#[test]
fn default_ref_pointer_prefix() {
    let schemas = schemas(&SchemaSettings::default());
    assert_eq!(
        to_value(&schemas["Post"])["properties"]["user"],
        json!({ "$ref": "#/definitions/User" })
    );
}

#[test]
fn custom_ref_pointer_prefix() {
    let settings = SchemaSettings::default().with_ref_pointer_prefix("#/components/schema/");
    let schemas = schemas(&settings);
    assert_eq!(
        to_value(&schemas["Post"])["properties"]["user"],
        json!({ "$ref": "#/components/schema/User" })
    );
}

#[test]
fn additional_converters_override_only_their_keys() {
    let defaults = schemas(&SchemaSettings::default());
    assert_eq!(to_value(&defaults["User"]), user_schema());

    let overlay = ConverterTable::new()
        .with(
            IS_STRING,
            ConverterEntry::fixed(json!({ "description": "A string value", "type": "string" })),
        )
        .with(
            MAX_LENGTH,
            ConverterEntry::function(|args| {
                let max: u64 = args.first()?.as_u64()?;
                let fragment = json!({
                    "exclusiveMaximum": true,
                    "maxLength": max + 1,
                    "type": "string"
                });
                fragment.as_object().cloned()
            }),
        );
    let overridden = schemas(&SchemaSettings::default().with_additional_converters(overlay));
    let user = to_value(&overridden["User"]);

    assert_eq!(
        user["properties"],
        json!({
            "id": { "not": { "type": "null" }, "description": "A string value", "type": "string" },
            "email": { "format": "email", "type": "string" },
            "tags": {
                "type": "array",
                "items": { "exclusiveMaximum": true, "maxLength": 21, "type": "string" }
            }
        })
    );
    assert_eq!(
        user["properties"]["email"],
        to_value(&defaults["User"])["properties"]["email"]
    );
}

#[test]
fn required_follows_skip_missing_properties() {
    let defaults = schemas(&SchemaSettings::default());
    assert_eq!(defaults["User"].required, vec!["id", "email"]);
    assert!(to_value(&defaults["Post"]).get("required").is_none());

    let skipping = schemas(&SchemaSettings::default().with_skip_missing_properties(true));
    assert_eq!(skipping["User"].required, vec!["id"]);
    assert!(to_value(&skipping["Post"]).get("required").is_none());
}

#[test]
fn resolve_references_deduplicates_nested_classes() {
    let schemas = schemas(&SchemaSettings::default().with_resolve_references(true));
    let post_user = to_value(&schemas["PostUser"]);

    assert_eq!(
        post_user,
        json!({
            "type": "object",
            "properties": {
                "post": { "$ref": "#/definitions/Post" },
                "user": { "$ref": "#/definitions/User" }
            },
            "definitions": {
                "Post": {
                    "type": "object",
                    "properties": { "user": { "$ref": "#/definitions/User" } }
                },
                "User": user_schema()
            }
        })
    );
    assert_eq!(post_user["definitions"].as_object().unwrap().len(), 2);
}

#[test]
fn resolve_references_with_custom_prefix() {
    let settings = SchemaSettings::default()
        .with_resolve_references(true)
        .with_ref_pointer_prefix("#/customName/");
    let post_user = to_value(&generate_schema(&metadata(), "PostUser", &settings).unwrap());

    assert!(post_user.get("definitions").is_none());
    assert_eq!(
        post_user["customName"]["Post"]["properties"]["user"],
        json!({ "$ref": "#/customName/User" })
    );
    assert_eq!(post_user["customName"]["User"], user_schema());
    assert_eq!(
        post_user["properties"]["user"],
        json!({ "$ref": "#/customName/User" })
    );
}

#[test]
fn resolve_references_rejects_prefix_over_schema_keys() {
    let settings = SchemaSettings::default()
        .with_resolve_references(true)
        .with_ref_pointer_prefix("#/properties/");
    assert!(matches!(
        generate_schema(&metadata(), "Post", &settings),
        Err(SchemaGenError::DefinitionsCollision { key }) if key == "properties"
    ));
}

#[test]
fn default_table_is_unchanged_after_overlay_call() {
    let overlay = ConverterTable::new().with(IS_EMAIL, ConverterEntry::fixed(json!({})));
    let _ = schemas(&SchemaSettings::default().with_additional_converters(overlay));
    let defaults = schemas(&SchemaSettings::default());
    assert_eq!(
        to_value(&defaults["User"])["properties"]["email"],
        json!({ "format": "email", "type": "string" })
    );
}

#[test]
fn concurrent_calls_see_only_their_own_overlay() {
    let describe = |text: &'static str| {
        SchemaSettings::default().with_additional_converters(ConverterTable::new().with(
            IS_STRING,
            ConverterEntry::fixed(json!({ "description": text, "type": "string" })),
        ))
    };
    let first = describe("first");
    let second = describe("second");

    let (first_id, second_id, default_id) = std::thread::scope(|scope| {
        let a = scope.spawn(|| to_value(&schemas(&first)["User"])["properties"]["id"].clone());
        let b = scope.spawn(|| to_value(&schemas(&second)["User"])["properties"]["id"].clone());
        let c = scope.spawn(|| {
            to_value(&schemas(&SchemaSettings::default())["User"])["properties"]["id"].clone()
        });
        (a.join().unwrap(), b.join().unwrap(), c.join().unwrap())
    });

    assert_eq!(first_id["description"], json!("first"));
    assert_eq!(second_id["description"], json!("second"));
    assert_eq!(
        default_id,
        json!({ "not": { "type": "null" }, "type": "string" })
    );
}
