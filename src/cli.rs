use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::load_config::load_config;
use content_translator_core::materialize::materializer_from_config;
use content_translator_core::pipeline::{
    apply_translation, build_final_dataset, export_for_translation,
};

/// Printed on stderr when the command line cannot be parsed.
pub const USAGE: &str = "\
Usage: content-translator [--config FILE] <COMMAND>

Commands:
  export [--output FILE]   Print the source dataset and translation instructions as JSON
  apply  [--input FILE]    Validate a translation payload (FILE or stdin) and regenerate derived records
  build  [--output FILE]   Merge source and derived records into the final dataset";

/// CLI for content-translator: export, apply and build bilingual event content.
#[derive(Debug, Parser)]
#[clap(
    name = "content-translator",
    version,
    about = "Export event content for translation, apply the translated reply and build the bilingual dataset"
)]
pub struct Cli {
    /// Optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the source dataset and translation instructions as JSON
    Export {
        /// Write the export to this file instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Validate a translation payload and regenerate the derived records
    Apply {
        /// Read the payload from this file instead of stdin
        #[clap(long)]
        input: Option<PathBuf>,
    },
    /// Merge source and derived records into the final dataset
    Build {
        /// Destination of the merged JSON (default: <data>/events/generated/events.json)
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;
    config.trace_loaded();
    let materializer = materializer_from_config(&config.materializer);

    match cli.command {
        Commands::Export { output } => {
            let exported = export_for_translation(&config, materializer.as_ref()).await?;
            let json = serde_json::to_string_pretty(&exported)?;
            match output {
                Some(path) => {
                    fs::write(&path, format!("{json}\n"))
                        .with_context(|| format!("Failed to write export to {}", path.display()))?;
                    println!("Export written to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Apply { input } => {
            let payload = read_payload(input.as_deref()).await?;
            let applied = apply_translation(&config, materializer.as_ref(), &payload).await?;
            println!("{}", applied.message);
        }
        Commands::Build { output } => {
            let built =
                build_final_dataset(&config, materializer.as_ref(), output.as_deref()).await?;
            println!("{}", built.message);
        }
    }
    Ok(())
}

async fn read_payload(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => {
            tracing::info!(input = %path.display(), "Reading translation payload from file");
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload file {}", path.display()))
        }
        None => {
            tracing::info!("Reading translation payload from stdin");
            let mut payload = String::new();
            tokio::io::stdin()
                .read_to_string(&mut payload)
                .await
                .context("Failed to read payload from stdin")?;
            Ok(payload)
        }
    }
}
