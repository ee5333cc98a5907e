//! Core library for scanned bill field extraction.
//!
//! This crate provides:
//! - PDF page rasterization at a configurable DPI
//! - OCR of rendered pages (pure Rust ONNX engine)
//! - Regex classification of bill text into prices, dates and other tokens
//! - Model-assisted line structuring with a fault-tolerant reply parser

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pages;
pub mod pdf;
pub mod pipeline;

pub use error::{BillexError, Result};
pub use extract::{
    ChatLineStructurer, LineFilter, LineStructurer, ModelResultNormalizer, PatternClassifier,
};
pub use models::{
    BillexConfig, Extraction, ExtractionResult, FieldGuess, FieldGuesses, FieldValue, KeyedResult,
};
pub use ocr::{OcrResult, Recognizer, TextBox};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pages::{Document, PageExtractor};
#[cfg(feature = "pdfium")]
pub use pdf::PdfiumRasterizer;
pub use pdf::{PdfRasterizer, Rasterizer};
pub use pipeline::{ModelRun, ModelRunStats, Pipeline};
