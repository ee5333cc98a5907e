//! PDF page rasterization.

#[cfg(feature = "pdfium")]
mod pdfium;
mod rasterizer;

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;
pub use rasterizer::PdfRasterizer;

#[cfg(test)]
pub(crate) use rasterizer::tests as rasterizer_tests;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Renders pages of a loaded PDF to images.
pub trait Rasterizer {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Render a page (1-indexed) as an image at the specified DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
