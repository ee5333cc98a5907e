//! Process command - extract fields from a single bill PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use billex_core::models::config::BillexConfig;
use billex_core::{
    ChatLineStructurer, Extraction, ExtractionResult, KeyedResult, ModelRunStats, PdfRasterizer,
    PdfiumRasterizer, Pipeline, PureOcrEngine, Rasterizer,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    extraction: ExtractionArgs,

    /// Show per-line statistics for model mode
    #[arg(long)]
    stats: bool,
}

/// Options shared by every command that runs the extraction pipeline.
#[derive(Args, Clone)]
pub struct ExtractionArgs {
    /// Extraction mode
    #[arg(short, long, value_enum, default_value = "pattern")]
    pub mode: Mode,

    /// Directory for rendered page images
    #[arg(long)]
    pub pages_dir: Option<PathBuf>,

    /// Rendering resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// OCR model directory
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Chat completions endpoint for model mode
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name for model mode
    #[arg(long = "model")]
    pub llm: Option<String>,
}

impl ExtractionArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut BillexConfig) {
        if let Some(dir) = &self.pages_dir {
            config.pdf.output_dir = dir.clone();
        }
        if let Some(dpi) = self.dpi {
            config.pdf.render_dpi = dpi;
        }
        if let Some(dir) = &self.model_dir {
            config.ocr.model_dir = dir.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.structurer.endpoint = endpoint.clone();
        }
        if let Some(llm) = &self.llm {
            config.structurer.model = llm.clone();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Regex classification of the whole text
    Pattern,
    /// Line-by-line structuring through a language model
    Model,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(match args.extraction.mode {
        Mode::Pattern => "Running OCR and pattern extraction...",
        Mode::Model => "Running OCR and model extraction...",
    });

    let input = args.input.clone();
    let mode = args.extraction.mode;
    let (extraction, stats) =
        tokio::task::spawn_blocking(move || extract_pdf(&input, &config, mode)).await??;

    pb.finish_and_clear();

    let output = format_extraction(&extraction, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.stats {
        if let Some(stats) = stats {
            print_stats(&stats);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the full pipeline on one PDF. Blocking.
pub fn extract_pdf(
    path: &Path,
    config: &BillexConfig,
    mode: Mode,
) -> anyhow::Result<(Extraction, Option<ModelRunStats>)> {
    let recognizer = PureOcrEngine::from_config(&config.ocr).map_err(|e| {
        anyhow::anyhow!(
            "{}\n\nPlace det.onnx, latin_rec.onnx and latin_dict.txt in {} or pass --model-dir.",
            e,
            config.ocr.model_dir.display()
        )
    })?;

    let pipeline = Pipeline::new(config);
    let mut rasterizer = page_rasterizer();
    let document = pipeline.load_document(path, rasterizer.as_mut(), &recognizer)?;

    debug!("Extracted {} pages", document.page_count());

    run_mode(&pipeline, &document.text(), config, mode)
}

/// PDFium when its library is available, else the embedded-scan extractor.
fn page_rasterizer() -> Box<dyn Rasterizer> {
    match PdfiumRasterizer::bind() {
        Ok(rasterizer) => {
            debug!("Rendering pages with PDFium");
            Box::new(rasterizer)
        }
        Err(e) => {
            info!("{}; using embedded page scans only", e);
            Box::new(PdfRasterizer::new())
        }
    }
}

/// Classify already-extracted text with the requested mode. Blocking.
pub fn run_mode(
    pipeline: &Pipeline,
    text: &str,
    config: &BillexConfig,
    mode: Mode,
) -> anyhow::Result<(Extraction, Option<ModelRunStats>)> {
    match mode {
        Mode::Pattern => Ok((Extraction::Pattern(pipeline.classify_text(text)), None)),
        Mode::Model => {
            let structurer = ChatLineStructurer::from_config(&config.structurer)?;
            let run = pipeline.structure_text(text, &structurer);
            Ok((Extraction::Model(run.result), Some(run.stats)))
        }
    }
}

pub fn format_extraction(extraction: &Extraction, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Text => Ok(match extraction {
            Extraction::Pattern(result) => format_pattern_text(result),
            Extraction::Model(result) => format_model_text(result),
        }),
    }
}

fn format_pattern_text(result: &ExtractionResult) -> String {
    let prices: Vec<String> = result.prices.iter().map(|p| format!("{:.2}", p)).collect();
    let dates: Vec<&str> = result.dates.iter().map(String::as_str).collect();
    let others: Vec<&str> = result.others.iter().map(String::as_str).collect();

    let mut output = String::new();
    output.push_str(&format!("Prices: {}\n", prices.join(", ")));
    output.push_str(&format!("Dates:  {}\n", dates.join(", ")));
    output.push_str(&format!("Others: {}\n", others.join(", ")));
    output
}

fn format_model_text(result: &KeyedResult) -> String {
    let mut output = String::new();

    for (title, bucket) in [
        ("Prices", &result.prices),
        ("Dates", &result.dates),
        ("Others", &result.others),
    ] {
        output.push_str(&format!("{}:\n", title));
        for guess in bucket {
            output.push_str(&format!("  {}: {}\n", guess.key, guess.value));
        }
    }

    output
}

pub fn print_stats(stats: &ModelRunStats) {
    eprintln!();
    eprintln!(
        "{} {} lines, {} qualified, {} structured, {} failed",
        style("ℹ").blue(),
        stats.lines,
        stats.qualified,
        stats.structured,
        stats.failed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use billex_core::{FieldGuess, FieldValue};

    #[test]
    fn test_pattern_text_format() {
        let result = Pipeline::default().classify_text("Total due 45.00 on 12/28/2023 ref AB1234");
        let text = format_extraction(&Extraction::Pattern(result), OutputFormat::Text).unwrap();
        assert_eq!(text, "Prices: 45.00\nDates:  12/28/2023\nOthers: AB1234\n");
    }

    #[test]
    fn test_model_text_format() {
        let result = KeyedResult {
            prices: vec![FieldGuess::new("total_bill", FieldValue::Float(499.99))],
            dates: vec![FieldGuess::new("due_date", FieldValue::Text("12/28/15".into()))],
            others: vec![],
        };
        let text = format_extraction(&Extraction::Model(result), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Prices:\n  total_bill: 499.99\nDates:\n  due_date: 12/28/15\nOthers:\n"
        );
    }

    #[test]
    fn test_overrides() {
        let args = ExtractionArgs {
            mode: Mode::Model,
            pages_dir: Some(PathBuf::from("outs")),
            dpi: Some(300),
            model_dir: None,
            endpoint: Some("http://127.0.0.1:11434/v1/chat/completions".into()),
            llm: None,
        };
        let mut config = BillexConfig::default();
        args.apply(&mut config);

        assert_eq!(config.pdf.output_dir, PathBuf::from("outs"));
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.structurer.endpoint, "http://127.0.0.1:11434/v1/chat/completions");
        assert_eq!(config.structurer.model, "Qwen/Qwen2.5-0.5B-Instruct");
    }
}
