//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the billex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillexConfig {
    /// PDF rasterization configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Model endpoint configuration for line structuring.
    pub structurer: StructurerConfig,
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Directory receiving the rendered `page_N.png` files.
    pub output_dir: PathBuf,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 655,
            output_dir: PathBuf::from("temp"),
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters that mark a token as a currency amount.
    pub currency_markers: String,

    /// Digit count that makes a line worth structuring on its own.
    pub min_digits: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            currency_markers: "$€£¥₹".to_string(),
            min_digits: 10,
        }
    }
}

/// Model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructurerConfig {
    /// OpenAI-compatible chat completions URL.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Upper bound on generated tokens per line.
    pub max_tokens: u32,

    /// Bearer token. Falls back to `BILLEX_API_KEY` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds (none by default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for StructurerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            model: "Qwen/Qwen2.5-0.5B-Instruct".to_string(),
            max_tokens: 200,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl BillexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BillexConfig::default();
        assert_eq!(config.pdf.render_dpi, 655);
        assert_eq!(config.pdf.output_dir, PathBuf::from("temp"));
        assert_eq!(config.extraction.min_digits, 10);
        assert_eq!(config.structurer.max_tokens, 200);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let json = r#"{ "pdf": { "render_dpi": 300 } }"#;
        let config: BillexConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.pdf.output_dir, PathBuf::from("temp"));
        assert_eq!(config.extraction.currency_markers, "$€£¥₹");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BillexConfig::default();
        config.structurer.model = "local-model".to_string();
        config.save(&path).unwrap();

        let loaded = BillexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.structurer.model, "local-model");
        assert_eq!(loaded.structurer.api_key, None);
    }
}
