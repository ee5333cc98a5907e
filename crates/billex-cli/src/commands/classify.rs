//! Classify command - run extraction over plain text, no OCR involved.

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};

use billex_core::Pipeline;

use super::config::load_config;
use super::process::{format_extraction, print_stats, run_mode, Mode, OutputFormat};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Text file to classify (default: stdin)
    input: Option<PathBuf>,

    /// Extraction mode
    #[arg(short, long, value_enum, default_value = "pattern")]
    mode: Mode,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Chat completions endpoint for model mode
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name for model mode
    #[arg(long = "model")]
    llm: Option<String>,

    /// Show per-line statistics for model mode
    #[arg(long)]
    stats: bool,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(endpoint) = args.endpoint {
        config.structurer.endpoint = endpoint;
    }
    if let Some(llm) = args.llm {
        config.structurer.model = llm;
    }

    let text = match &args.input {
        Some(path) => {
            info!("Reading {}", path.display());
            fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?
        }
        None => io::read_to_string(io::stdin())?,
    };
    debug!("Classifying {} bytes of text", text.len());

    let mode = args.mode;
    let (extraction, stats) = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::new(&config);
        run_mode(&pipeline, &text, &config, mode)
    })
    .await??;

    println!("{}", format_extraction(&extraction, args.format)?);

    if args.stats {
        if let Some(stats) = stats {
            print_stats(&stats);
        }
    }

    Ok(())
}
