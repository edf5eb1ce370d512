//! Schema Validator CLI
//!
//! Validates JSON data files against a JSON schema definition and coerces
//! their values towards the declared types.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use simple_schema::{Schema, SchemaConfig, SchemaError, Value, ValidatorRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Validate and typeify JSON data against a schema definition")]
struct Cli {
    /// Config file (defaults to schemas.toml lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a data file against a schema definition
    Validate {
        /// Schema definition (JSON)
        #[arg(short, long)]
        schema: PathBuf,
        /// Data to validate (JSON)
        #[arg(short, long)]
        data: PathBuf,
        /// Do not report required fields that are missing
        #[arg(long)]
        ignore_missing: bool,
    },

    /// Coerce a data file's values towards the schema's types
    Typeify {
        /// Schema definition (JSON)
        #[arg(short, long)]
        schema: PathBuf,
        /// Data to coerce (JSON)
        #[arg(short, long)]
        data: PathBuf,
        /// Output file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_data(path: &Path) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = SchemaConfig::load_from(cli.config.as_deref())?;
    let registry = ValidatorRegistry::default();

    match cli.command {
        Commands::Validate { schema, data, ignore_missing } => {
            let schema = Schema::from_path(&schema, &registry)?;
            let value = read_data(&data)?;

            let mut options = config.validate_options();
            options.ignore_missing |= ignore_missing;

            match schema.validate_with(&value, &options) {
                Ok(()) => {
                    println!("✅ {} - valid", data.display());
                    Ok(true)
                }
                Err(SchemaError::ValidationFailed { failures }) => {
                    println!("❌ {} - {} failure(s)", data.display(), failures.len());
                    for failure in &failures {
                        println!("   └─ {}", failure);
                    }
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::Typeify { schema, data, output } => {
            let schema = Schema::from_path(&schema, &registry)?;
            let value = read_data(&data)?;

            let coerced = schema.typeify(&value);
            let rendered = config.output.format.render(&coerced)?;

            if let Some(path) = output {
                std::fs::write(&path, &rendered)?;
                println!("✅ Typeified data written to {:?}", path);
            } else {
                println!("{}", rendered);
            }
            Ok(true)
        }
    }
}
