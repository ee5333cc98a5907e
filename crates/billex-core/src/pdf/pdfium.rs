//! Full page rendering through PDFium.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::{Rasterizer, Result};
use crate::error::PdfError;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterizer that renders whole pages, text and vector content included.
///
/// PDFium is loaded at runtime: [`PdfiumRasterizer::bind`] looks in the
/// working directory, then `/opt/pdfium/lib`, then the system library path.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    data: Vec<u8>,
    page_count: u32,
}

impl PdfiumRasterizer {
    /// Bind to a PDFium shared library.
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/pdfium/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfError::Render(format!("failed to bind PDFium: {}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            data: Vec::new(),
            page_count: 0,
        })
    }
}

fn map_pdfium_error(err: PdfiumError) -> PdfError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            PdfError::Encrypted
        }
        other => PdfError::Parse(other.to_string()),
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let page_count = {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(data, None)
                .map_err(map_pdfium_error)?;
            document.pages().len() as u32
        };

        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.data = data.to_vec();
        self.page_count = page_count;
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        if page == 0 || page > self.page_count {
            return Err(PdfError::InvalidPage(page));
        }

        // PdfDocument borrows the bytes, so each render reopens the document
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&self.data, None)
            .map_err(map_pdfium_error)?;
        let pdf_page = document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| PdfError::Render(format!("page {}: {}", page, e)))?;

        let width = (pdf_page.width().value * dpi as f32 / POINTS_PER_INCH).round() as i32;
        let config = PdfRenderConfig::new()
            .set_target_width(width.max(1))
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| PdfError::Render(format!("page {}: {}", page, e)))?;
        let image = bitmap.as_image();

        debug!(
            "Rendered page {} at {} DPI: {}x{}",
            page,
            dpi,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::rasterizer_tests::pdf_with_pages;

    #[test]
    fn test_renders_vector_pages_when_library_present() {
        // PDFium is a runtime dependency; without it binding reports Render
        let mut rasterizer = match PdfiumRasterizer::bind() {
            Ok(rasterizer) => rasterizer,
            Err(err) => {
                assert!(matches!(err, PdfError::Render(_)));
                return;
            }
        };

        rasterizer.load(&pdf_with_pages(&[false, true])).unwrap();
        assert_eq!(rasterizer.page_count(), 2);

        let page = rasterizer.render_page(1, 144).unwrap();
        assert_eq!(page.width(), 144);
        assert!(matches!(rasterizer.render_page(3, 144), Err(PdfError::InvalidPage(3))));
    }
}
