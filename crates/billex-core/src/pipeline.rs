//! End-to-end extraction: PDF pages to OCR text to structured fields.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::{
    parse_response, LineFilter, LineStructurer, ModelResultNormalizer, PatternClassifier,
};
use crate::models::config::{BillexConfig, PdfConfig};
use crate::models::fields::FieldGuesses;
use crate::models::result::{ExtractionResult, KeyedResult};
use crate::ocr::Recognizer;
use crate::pages::{Document, PageExtractor};
use crate::pdf::Rasterizer;

/// Counters for one model-path run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelRunStats {
    /// Lines in the document.
    pub lines: usize,
    /// Lines that passed the qualification filter.
    pub qualified: usize,
    /// Lines whose reply yielded at least one field.
    pub structured: usize,
    /// Lines dropped because the call or the reply failed.
    pub failed: usize,
}

/// Outcome of the model path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRun {
    /// Guesses merged across lines, later keys overwriting earlier ones.
    pub guesses: FieldGuesses,
    /// Normalized buckets.
    pub result: KeyedResult,
    pub stats: ModelRunStats,
}

/// Wires the classification components together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: PatternClassifier,
    filter: LineFilter,
    normalizer: ModelResultNormalizer,
    pdf: PdfConfig,
}

impl Pipeline {
    pub fn new(config: &BillexConfig) -> Self {
        Self {
            classifier: PatternClassifier::from_config(&config.extraction),
            filter: LineFilter::from_config(&config.extraction),
            normalizer: ModelResultNormalizer::new(),
            pdf: config.pdf.clone(),
        }
    }

    /// Load a PDF from disk and OCR every page.
    ///
    /// A missing file, an unreadable PDF or an unwritable output directory
    /// is fatal.
    pub fn load_document<R, O>(
        &self,
        path: &Path,
        rasterizer: &mut R,
        recognizer: &O,
    ) -> Result<Document>
    where
        R: Rasterizer + ?Sized,
        O: Recognizer + ?Sized,
    {
        info!("Loading {}", path.display());
        let data = fs::read(path)?;
        rasterizer.load(&data)?;

        PageExtractor::from_config(&self.pdf).extract(rasterizer, recognizer)
    }

    /// Fast path: regex classification over the whole document text.
    pub fn pattern(&self, document: &Document) -> ExtractionResult {
        self.classify_text(&document.text())
    }

    /// Regex classification over arbitrary text.
    pub fn classify_text(&self, text: &str) -> ExtractionResult {
        self.classifier.parse(text)
    }

    /// Model path over the whole document text.
    pub fn model<S>(&self, document: &Document, structurer: &S) -> ModelRun
    where
        S: LineStructurer + ?Sized,
    {
        self.structure_text(&document.text(), structurer)
    }

    /// Model path over arbitrary text: qualifying lines are structured one
    /// at a time and their guesses merged, then normalized.
    ///
    /// A failing call or unusable reply drops that line only.
    pub fn structure_text<S>(&self, text: &str, structurer: &S) -> ModelRun
    where
        S: LineStructurer + ?Sized,
    {
        let mut stats = ModelRunStats {
            lines: text.lines().count(),
            ..ModelRunStats::default()
        };

        let lines = self.filter.select(text.lines());
        stats.qualified = lines.len();
        info!("Structuring {} of {} lines", stats.qualified, stats.lines);

        let mut guesses = FieldGuesses::new();

        for (i, line) in lines.iter().enumerate() {
            let raw = match structurer.structure(line) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Structurer failed on line {}: {}", i + 1, e);
                    stats.failed += 1;
                    continue;
                }
            };

            match parse_response(&raw) {
                Ok(fields) => {
                    debug!("Line {}: {} fields", i + 1, fields.len());
                    if !fields.is_empty() {
                        stats.structured += 1;
                    }
                    guesses.extend(fields);
                }
                Err(e) => {
                    debug!("Discarding reply for line {}: {}", i + 1, e);
                    stats.failed += 1;
                }
            }
        }

        let result = self.normalizer.normalize(&guesses);

        ModelRun {
            guesses,
            result,
            stats,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&BillexConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructureError;
    use crate::models::fields::{FieldGuess, FieldValue};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Replies from a fixed script and records every line it was asked about.
    struct ScriptedStructurer {
        replies: RefCell<Vec<std::result::Result<String, StructureError>>>,
        seen: RefCell<Vec<String>>,
    }

    impl ScriptedStructurer {
        fn new(replies: Vec<std::result::Result<&str, StructureError>>) -> Self {
            let replies = replies.into_iter().rev().map(|r| r.map(str::to_string)).collect();
            Self {
                replies: RefCell::new(replies),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl LineStructurer for ScriptedStructurer {
        fn structure(&self, line: &str) -> std::result::Result<String, StructureError> {
            self.seen.borrow_mut().push(line.to_string());
            self.replies
                .borrow_mut()
                .pop()
                .unwrap_or(Err(StructureError::NoCompletion))
        }
    }

    #[test]
    fn test_pattern_over_document() {
        let doc = Document::new(vec!["Total due 45.00".into(), "on 12/28/2023 ref AB1234".into()]);
        let result = Pipeline::default().pattern(&doc);

        assert_eq!(result.prices, vec![45.0]);
        assert!(result.dates.contains("12/28/2023"));
        assert!(result.others.contains("AB1234"));
    }

    #[test]
    fn test_model_only_sends_qualifying_lines() {
        let text = "ACME Utilities\nTotal bill 499.99\nThanks!\nDue Date 12/28/15, please pay";
        let structurer = ScriptedStructurer::new(vec![
            Ok(r#"{"total_bill": 499.99}"#),
            Ok("```json\n{\"due_date\": \"12/28/15, please pay\"}\n```"),
        ]);

        let run = Pipeline::default().structure_text(text, &structurer);

        assert_eq!(
            *structurer.seen.borrow(),
            vec!["Total bill 499.99", "Due Date 12/28/15, please pay"]
        );
        assert_eq!(run.result.prices, vec![FieldGuess::new("total_bill", FieldValue::Float(499.99))]);
        assert_eq!(
            run.result.dates,
            vec![FieldGuess::new("due_date", FieldValue::Text("12/28/15".into()))]
        );
        assert_eq!(
            run.stats,
            ModelRunStats {
                lines: 4,
                qualified: 2,
                structured: 2,
                failed: 0
            }
        );
    }

    #[test]
    fn test_failures_never_abort_the_batch() {
        let text = "Total 10.00\nFee 2.50\nTax 1.25\nAcct 123456789012";
        let structurer = ScriptedStructurer::new(vec![
            Ok(r#"{"total": 10.00} as requested"#),
            Err(StructureError::Status {
                status: 500,
                body: "boom".into(),
            }),
            Ok("{'tax': 1.25}"),
            Ok(r#"{"account_number": "123456789012"}"#),
        ]);

        let run = Pipeline::default().structure_text(text, &structurer);

        assert_eq!(run.stats.failed, 3);
        assert_eq!(run.stats.structured, 1);
        assert!(run.result.prices.is_empty());
        assert_eq!(
            run.result.others,
            vec![FieldGuess::new("account_number", FieldValue::Text("123456789012".into()))]
        );
    }

    #[test]
    fn test_later_lines_overwrite_keys() {
        let text = "Total 10.00\nTotal 12.00";
        let structurer = ScriptedStructurer::new(vec![
            Ok(r#"{"total": 10.00}"#),
            Ok(r#"{"total": 12.00}"#),
        ]);

        let run = Pipeline::default().structure_text(text, &structurer);
        assert_eq!(run.guesses.len(), 1);
        assert_eq!(run.result.prices, vec![FieldGuess::new("total", FieldValue::Float(12.0))]);
    }
}
