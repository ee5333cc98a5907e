//! Error types for the billex-core library.

use thiserror::Error;

/// Main error type for the billex library.
#[derive(Error, Debug)]
pub enum BillexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Line structuring error from the model endpoint.
    #[error("structurer error: {0}")]
    Structure(#[from] StructureError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF loading and rasterization.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to obtain an image for a page.
    #[error("failed to extract page image: {0}")]
    ImageExtraction(String),

    /// Page rendering failed.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors raised while asking the model endpoint to structure a line.
#[derive(Error, Debug)]
pub enum StructureError {
    /// Transport-level failure talking to the endpoint.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint answered without any completion choice.
    #[error("endpoint returned no completion")]
    NoCompletion,
}

/// Errors from interpreting the model's raw reply for one line.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// Nothing left after stripping fences.
    #[error("empty response")]
    Empty,

    /// The reply is not valid JSON.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The reply parsed, but not to a JSON object.
    #[error("response is not an object")]
    NotAnObject,
}

/// Result type for the billex library.
pub type Result<T> = std::result::Result<T, BillexError>;
