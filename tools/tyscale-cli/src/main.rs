// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! tyscale CLI
//!
//! Encode JSON values to the binary wire format of a type registry and
//! decode them back.
//!
//! # Usage
//!
//! ```bash
//! tyscale parse --types types.tys
//! tyscale encode --types types.tys --type "Option<u32>" --value '{"Some": 7}'
//! tyscale decode --types types.tys --type "Option<u32>" --hex 0x0107000000
//! tyscale gen-config --output tyscale.toml
//! tyscale validate --config tyscale.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tyscale_cli::{commands, CliConfig, OutputFormat};

/// tyscale type-driven binary codec
#[derive(Parser, Debug)]
#[command(name = "tyscale")]
#[command(about = "Encode and decode binary values described by a type DSL")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse type files and print the resolved registry
    Parse {
        /// Type definition files (repeatable)
        #[arg(short, long)]
        types: Vec<PathBuf>,
    },

    /// Encode a JSON value
    Encode {
        /// Type definition files (repeatable)
        #[arg(short, long)]
        types: Vec<PathBuf>,

        /// Type to encode: a position or a type expression
        #[arg(long = "type")]
        ty: String,

        /// Value as JSON
        #[arg(long)]
        value: String,

        /// Output format; overrides the config
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,

        /// Write the encoding to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Decode bytes and print the value as JSON
    Decode {
        /// Type definition files (repeatable)
        #[arg(short, long)]
        types: Vec<PathBuf>,

        /// Type to decode: a position or a type expression
        #[arg(long = "type")]
        ty: String,

        /// Input as hex text
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        hex: Option<String>,

        /// Input file with raw bytes
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "tyscale.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file and the type files it names
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CliConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => CliConfig::default(),
    };

    // Initialize logging
    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Parse { types } => {
            let registry = commands::load_registry(&config.type_files(&types))?;
            print!("{}", commands::describe(&registry));
        }
        Commands::Encode {
            types,
            ty,
            value,
            output,
            out,
        } => {
            let registry = commands::load_registry(&config.type_files(&types))?;
            let bytes = commands::encode(&registry, &ty, &value)?;
            let rendered = match output.unwrap_or(config.output) {
                OutputFormat::Hex => format!("0x{}\n", hex::encode(&bytes)).into_bytes(),
                OutputFormat::Binary => bytes,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, &rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!("wrote {} byte(s) to {}", rendered.len(), path.display());
                }
                None => std::io::stdout().write_all(&rendered)?,
            }
        }
        Commands::Decode {
            types,
            ty,
            hex,
            input,
        } => {
            let registry = commands::load_registry(&config.type_files(&types))?;
            let bytes = match (hex, input) {
                (Some(text), _) => commands::parse_hex(&text)?,
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("one of --hex or --input is required"),
            };
            println!("{}", commands::decode(&registry, &ty, &bytes)?);
        }
        Commands::GenConfig { output } => cmd_gen_config(output)?,
        Commands::Validate { config } => cmd_validate(config)?,
    }
    Ok(())
}

fn cmd_gen_config(output: PathBuf) -> Result<()> {
    let config = CliConfig {
        types: vec![PathBuf::from("types/chain.tys")],
        output: OutputFormat::Hex,
        log_level: "warn".into(),
    };

    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# tyscale configuration
# Generated by tyscale gen-config
#
# types:     files concatenated into one registry (relative to this file)
# output:    default output of `encode`, "hex" or "binary"
# log_level: trace, debug, info, warn or error

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<()> {
    let config = match CliConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    };
    match commands::load_registry(&config.types) {
        Ok(registry) => {
            println!("Configuration valid!");
            println!();
            println!("Type files: {}", config.types.len());
            for file in &config.types {
                println!("  {}", file.display());
            }
            println!(
                "Registry: {} position(s), {} name(s), {} generic(s)",
                registry.position_count(),
                registry.names().len(),
                registry.generics().len()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Type files invalid: {:#}", e);
            std::process::exit(1);
        }
    }
}
