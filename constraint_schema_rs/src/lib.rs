//! Generate JSON Schema from per-property validation constraints.
//!
//! A metadata snapshot (a flat list of [`ConstraintRecord`]s) is grouped by class
//! and property, each property's constraints are converted to schema fragments
//! through an overridable [`ConverterTable`], and nested-object properties are
//! emitted as `$ref` pointers or, with
//! [`SchemaSettings::resolve_references`], inlined into a deduplicated
//! definitions block.

mod builder;
mod converter;
mod error;
mod metadata;
mod resolver;
mod schema;
mod settings;

pub use builder::{BuiltClass, BuiltSchemas, NestedReference};
pub use converter::{
    CONDITIONAL_VALIDATION, ConverterEntry, ConverterFn, ConverterTable, IS_DEFINED, IS_EMAIL,
    IS_OPTIONAL, IS_STRING, MAX_LENGTH, MIN_LENGTH, NESTED_VALIDATION, default_converters,
};
pub use error::SchemaGenError;
pub use metadata::{ConstraintRecord, MetadataIndex, PropertyConstraints};
pub use schema::{ClassSchema, Fragment, SchemaMap};
pub use settings::{DEFAULT_REF_POINTER_PREFIX, SchemaSettings};

use std::io::Write;
use std::path::Path;

/// Generate a schema for every class in `records`.
///
/// # Errors
///
/// Returns `SchemaGenError::InvalidMetadata` for a record without a class or
/// property name. In resolved mode, returns `SchemaGenError::DanglingReference`
/// when a nested-object property references a class absent from `records`, and
/// `SchemaGenError::DefinitionsCollision` when the ref pointer prefix would place
/// the definitions block over a schema key.
pub fn generate_schemas(
    records: &[ConstraintRecord],
    settings: &SchemaSettings,
) -> Result<SchemaMap, SchemaGenError> {
    let index: MetadataIndex<'_> = MetadataIndex::new(records)?;
    let converters: ConverterTable = settings.converters();
    let built: BuiltSchemas = builder::build(&index, &converters, settings);
    resolver::resolve(&built, settings)
}

/// Generate the schema of a single class.
///
/// In resolved mode only the classes reachable from `class_name` are inlined, so
/// unrelated dangling references elsewhere in the snapshot do not fail the call.
///
/// # Errors
///
/// Returns `SchemaGenError::UnknownClass` if `class_name` has no records, plus the
/// errors of [`generate_schemas`].
pub fn generate_schema(
    records: &[ConstraintRecord],
    class_name: &str,
    settings: &SchemaSettings,
) -> Result<ClassSchema, SchemaGenError> {
    let index: MetadataIndex<'_> = MetadataIndex::new(records)?;
    let converters: ConverterTable = settings.converters();
    let built: BuiltSchemas = builder::build(&index, &converters, settings);
    if settings.resolve_references {
        return resolver::resolve_root(&built, class_name, settings);
    }
    built
        .get(class_name)
        .map(|class| resolver::substitute(class, settings))
        .ok_or_else(|| SchemaGenError::UnknownClass(class_name.to_string()))
}

/// Generate schemas from a JSON metadata snapshot and write them to `writer`.
///
/// The snapshot is a JSON array of constraint records. The output is the
/// pretty-printed map of class name to schema. The writer can be any type
/// implementing `Write`, such as `File`, `Vec<u8>`, or `Cursor<Vec<u8>>`.
///
/// # Errors
///
/// Returns `SchemaGenError` if the snapshot JSON is invalid, conversion fails,
/// or writing to the writer fails.
pub fn generate_to_writer<W: Write>(
    snapshot_json: &str,
    writer: &mut W,
    settings: &SchemaSettings,
) -> Result<(), SchemaGenError> {
    let records: Vec<ConstraintRecord> = serde_json::from_str(snapshot_json)?;
    let schemas: SchemaMap = generate_schemas(&records, settings)?;
    serde_json::to_writer_pretty(&mut *writer, &schemas)?;
    writeln!(writer)?;
    Ok(())
}

/// Generate schemas from a metadata snapshot file and write them to an output file.
///
/// The output file is only created (or replaced) once conversion has succeeded.
///
/// # Errors
///
/// Returns `SchemaGenError` if reading the input file fails, the snapshot JSON is
/// invalid, conversion fails, or writing to the output file fails.
pub fn generate_from_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    settings: &SchemaSettings,
) -> Result<(), SchemaGenError> {
    let snapshot_json: String = std::fs::read_to_string(input_path)?;
    let mut rendered: Vec<u8> = Vec::new();
    generate_to_writer(&snapshot_json, &mut rendered, settings)?;
    std::fs::write(output_path, rendered)?;
    Ok(())
}
