use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use sheetgrid_core::{DecodeConfig, GridReader};
use std::path::PathBuf;

mod formatter;

use formatter::Outcome;

#[derive(Parser)]
#[command(name = "sheetgrid")]
#[command(about = "Decode .xlsx and HTML-based .xls files into rows of cell text", long_about = None)]
#[command(version)]
struct Cli {
    /// Spreadsheet files to decode (.xlsx or .xls)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Treat the first row of each file as column headers
    #[arg(long)]
    headers: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn load_config(cli: &Cli) -> Result<DecodeConfig> {
    if let Some(config_path) = &cli.config {
        return DecodeConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try to load default config from current directory if it exists
    let default_config_path = PathBuf::from("sheetgrid.toml");
    if default_config_path.exists() {
        DecodeConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(DecodeConfig::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let config = load_config(&cli)?;
    let reader = GridReader::with_config(config).context("Invalid configuration")?;

    // Each decode owns its buffers, so files are processed independently
    let outcomes: Vec<Outcome> = cli
        .files
        .par_iter()
        .map(|path| {
            log::debug!("Decoding {}", path.display());
            Outcome {
                path: path.clone(),
                result: reader.read_path(path),
            }
        })
        .collect();

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            log::warn!("Failed to decode {}: {}", outcome.path.display(), e);
        }
    }

    match cli.format {
        OutputFormat::Human => formatter::print_human(&outcomes, cli.headers),
        OutputFormat::Json => formatter::print_json(&outcomes)?,
    }

    let exit_code = if outcomes.iter().all(|o| o.result.is_ok()) {
        0
    } else {
        1
    };

    std::process::exit(exit_code);
}
