//! Example matching the README: a small class graph converted with nested
//! references resolved into a definitions block.
//!
//! Contains only the input metadata snapshot and the conversion logic; the
//! generated schemas are written to stdout.

use std::io;

const METADATA_JSON: &str = r#"[
  { "target": "User", "propertyName": "id", "constraint": "isDefined" },
  { "target": "User", "propertyName": "id", "constraint": "isString" },
  { "target": "User", "propertyName": "email", "constraint": "isEmail" },
  { "target": "User", "propertyName": "tags", "constraint": "isOptional" },
  { "target": "User", "propertyName": "tags", "constraint": "maxLength", "arguments": [20], "each": true },
  { "target": "Post", "propertyName": "title", "constraint": "length", "arguments": [1, 120] },
  { "target": "Post", "propertyName": "user", "constraint": "isOptional" },
  { "target": "Post", "propertyName": "user", "constraint": "nestedValidation", "propertyType": "User" }
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout: io::Stdout = io::stdout();
    let settings = constraint_schema_rs::SchemaSettings::default().with_resolve_references(true);
    constraint_schema_rs::generate_to_writer(METADATA_JSON, &mut stdout, &settings)?;
    Ok(())
}
