//! Batch processing command for multiple bill PDFs.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use billex_core::models::config::BillexConfig;
use billex_core::Extraction;

use super::config::load_config;
use super::process::{extract_pdf, format_extraction, ExtractionArgs, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input PDFs
    #[arg(required = true)]
    input: String,

    /// Directory for per-file results
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    extraction: ExtractionArgs,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    output: Option<PathBuf>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);

    let files = find_pdfs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());
    let stems = unique_stems(&files);

    for (path, stem) in files.into_iter().zip(stems) {
        let file_start = Instant::now();
        let result = process_file(&path, &stem, &args, &config).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => outcomes.push(FileOutcome {
                path,
                output: Some(output),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                outcomes.push(FileOutcome {
                    path,
                    output: None,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let (successful, failed): (Vec<_>, Vec<_>) =
        outcomes.iter().partition(|o| o.error.is_none());

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    for outcome in &successful {
        if let Some(output) = &outcome.output {
            debug!(
                "{} -> {} ({}ms)",
                outcome.path.display(),
                output.display(),
                outcome.processing_time_ms
            );
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn find_pdfs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Extract one PDF and write its result next to the others.
async fn process_file(
    path: &Path,
    stem: &str,
    args: &BatchArgs,
    config: &BillexConfig,
) -> anyhow::Result<PathBuf> {
    // Each document gets its own page image directory so pages do not collide
    let mut config = config.clone();
    config.pdf.output_dir = config.pdf.output_dir.join(stem);

    let input = path.to_path_buf();
    let mode = args.extraction.mode;
    let (extraction, _) =
        tokio::task::spawn_blocking(move || extract_pdf(&input, &config, mode)).await??;

    let output_path = output_path(&args.output_dir, stem, args.format);
    write_result(&output_path, &extraction, args.format)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(output_path)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bill")
        .to_string()
}

/// One stem per input. Inputs sharing a stem (`a/bill.pdf`, `b/bill.pdf`)
/// get `-2`, `-3`... suffixes so no result or page directory is overwritten.
fn unique_stems(files: &[PathBuf]) -> Vec<String> {
    let originals: HashSet<String> = files.iter().map(|p| file_stem(p)).collect();
    let mut used = HashSet::with_capacity(files.len());

    files
        .iter()
        .map(|path| {
            let stem = file_stem(path);
            if used.insert(stem.clone()) {
                return stem;
            }

            let unique = (2..)
                .map(|n| format!("{}-{}", stem, n))
                .find(|candidate| !originals.contains(candidate) && !used.contains(candidate))
                .unwrap_or_else(|| stem.clone());
            warn!(
                "{} shares the name {:?} with another input, writing it as {:?}",
                path.display(),
                stem,
                unique
            );
            used.insert(unique.clone());
            unique
        })
        .collect()
}

fn output_path(output_dir: &Path, stem: &str, format: OutputFormat) -> PathBuf {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Text => "txt",
    };
    output_dir.join(format!("{}.{}", stem, extension))
}

fn write_result(path: &Path, extraction: &Extraction, format: OutputFormat) -> anyhow::Result<()> {
    fs::write(path, format_extraction(extraction, format)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let dir = Path::new("results");
        assert_eq!(
            output_path(dir, "march", OutputFormat::Json),
            PathBuf::from("results/march.json")
        );
        assert_eq!(
            output_path(dir, "march", OutputFormat::Text),
            PathBuf::from("results/march.txt")
        );
    }

    #[test]
    fn test_find_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let files = find_pdfs(&pattern).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_unique_stems_for_same_named_inputs() {
        let files = vec![
            PathBuf::from("a/bill.pdf"),
            PathBuf::from("b/bill.pdf"),
            PathBuf::from("c/bill-2.pdf"),
            PathBuf::from("d/bill.pdf"),
            PathBuf::from("march.pdf"),
        ];

        assert_eq!(
            unique_stems(&files),
            vec!["bill", "bill-3", "bill-2", "bill-4", "march"]
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/tmp/bill_2023.pdf")), "bill_2023");
    }
}
