//! Binary to generate JSON Schema from a constraint metadata snapshot.
//!
//! Usage: `constraintschemars [OPTIONS] [INPUT] > schemas.json`
//!
//! Reads a JSON array of constraint records from INPUT (or stdin) and writes the
//! generated schemas to stdout (or `--output`).

use std::fs;
use std::io::{self, Write, read_to_string, stdin};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use constraint_schema_rs::{
    ConstraintRecord, ConverterTable, DEFAULT_REF_POINTER_PREFIX, SchemaGenError, SchemaSettings,
    generate_schema, generate_schemas,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "constraintschemars", version, about)]
struct Cli {
    /// Metadata snapshot file; stdin when omitted.
    input: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix for `$ref` pointers; also names the definitions block.
    #[arg(long, default_value = DEFAULT_REF_POINTER_PREFIX)]
    ref_pointer_prefix: String,

    /// Only require properties marked `isDefined`.
    #[arg(long)]
    skip_missing_properties: bool,

    /// Inline nested classes into a definitions block.
    #[arg(long)]
    resolve_references: bool,

    /// JSON object of constraint id to schema fragment, overlaid on the defaults.
    #[arg(long, value_name = "FILE")]
    converters: Option<PathBuf>,

    /// Emit only this class.
    #[arg(long, value_name = "NAME")]
    class: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), SchemaGenError> {
    let settings: SchemaSettings = settings_from_cli(cli)?;

    let snapshot_json: String = if let Some(path) = &cli.input {
        fs::read_to_string(path)?
    } else {
        read_to_string(stdin())?
    };
    let records: Vec<ConstraintRecord> = serde_json::from_str(&snapshot_json)?;
    tracing::info!(records = records.len(), "loaded metadata snapshot");

    let mut rendered: Vec<u8> = if let Some(class_name) = &cli.class {
        serde_json::to_vec_pretty(&generate_schema(&records, class_name, &settings)?)?
    } else {
        serde_json::to_vec_pretty(&generate_schemas(&records, &settings)?)?
    };
    rendered.push(b'\n');

    // Only touch the output once conversion has succeeded.
    if let Some(path) = &cli.output {
        fs::write(path, &rendered)?;
    } else {
        io::stdout().lock().write_all(&rendered)?;
    }
    Ok(())
}

fn settings_from_cli(cli: &Cli) -> Result<SchemaSettings, SchemaGenError> {
    let mut settings = SchemaSettings::default()
        .with_ref_pointer_prefix(cli.ref_pointer_prefix.clone())
        .with_skip_missing_properties(cli.skip_missing_properties)
        .with_resolve_references(cli.resolve_references);
    if let Some(path) = &cli.converters {
        let overlay: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        settings = settings.with_additional_converters(ConverterTable::from_json(overlay)?);
    }
    Ok(settings)
}
