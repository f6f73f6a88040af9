pub mod cli;
pub mod coerce;
pub mod compensation;
pub mod config;
pub mod data;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod frequency;
pub mod fx;
pub mod harmonize;
pub mod ingest;
pub mod io_utils;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod quality;
pub mod schema;
pub mod table;
pub mod target;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InitConfigArgs, SchemaArgs, SchemaFormat},
    config::ConfigFile,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("survey_harmonize", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => pipeline::execute_clean(&args),
        Commands::Run(args) => pipeline::execute_run(&args),
        Commands::Schema(args) => handle_schema(&args),
        Commands::InitConfig(args) => handle_init_config(&args),
    }
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let config = ConfigFile::load_or_default(args.config.as_deref())
        .with_context(|| format!("Loading configuration {:?}", args.config))?;
    let schema = &config.registry.schema;
    match args.format {
        SchemaFormat::Yaml => {
            let rendered = serde_yaml::to_string(schema).context("Serialising schema")?;
            print!("{rendered}");
        }
        SchemaFormat::Table => {
            println!(
                "Schema version {} ({} field(s))",
                schema.schema_version,
                schema.len()
            );
            println!("Fingerprint {}", schema.fingerprint());
            let headers = vec![
                "field".to_string(),
                "merged".to_string(),
                "aliases".to_string(),
            ];
            let rows = schema
                .fields
                .iter()
                .map(|field| {
                    vec![
                        field.name.clone(),
                        if schema.is_merge_excluded(&field.name) {
                            "no".to_string()
                        } else {
                            "yes".to_string()
                        },
                        field.aliases.join(", "),
                    ]
                })
                .collect::<Vec<_>>();
            table::print_table(&headers, &rows);
        }
    }
    Ok(())
}

fn handle_init_config(args: &InitConfigArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{:?} already exists; pass --force to overwrite it",
            args.output
        );
    }
    ConfigFile::default()
        .save(&args.output)
        .with_context(|| format!("Writing configuration template to {:?}", args.output))?;
    info!("Configuration template written to {:?}", args.output);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
