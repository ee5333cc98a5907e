//! Page-by-page text extraction from a rasterized PDF.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::config::PdfConfig;
use crate::ocr::Recognizer;
use crate::pdf::Rasterizer;

/// OCR text of a document, one entry per page in physical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pages: Vec<String>,
}

impl Document {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Page texts; index 0 is page 1.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Text of a 1-indexed page.
    pub fn page(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .map(String::as_str)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with newlines.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }
}

/// Renders every page, stores it as `page_N.png`, and runs OCR on it.
pub struct PageExtractor {
    output_dir: PathBuf,
    dpi: u32,
}

impl PageExtractor {
    pub fn new(output_dir: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            dpi,
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new(config.output_dir.clone(), config.render_dpi)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the rendered image for a 1-indexed page.
    pub fn page_image_path(&self, page: u32) -> PathBuf {
        self.output_dir.join(format!("page_{}.png", page))
    }

    /// Extract text from all pages of a loaded document.
    ///
    /// File errors abort the run. A page that cannot be rendered or
    /// recognized contributes an empty string and writes no image.
    pub fn extract<R, O>(&self, rasterizer: &R, recognizer: &O) -> Result<Document>
    where
        R: Rasterizer + ?Sized,
        O: Recognizer + ?Sized,
    {
        fs::create_dir_all(&self.output_dir)?;

        let page_count = rasterizer.page_count();
        info!("Extracting {} pages at {} DPI", page_count, self.dpi);

        let mut pages = Vec::with_capacity(page_count as usize);

        for page in 1..=page_count {
            let image = match rasterizer.render_page(page, self.dpi) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Cannot render page {}: {}", page, e);
                    pages.push(String::new());
                    continue;
                }
            };

            let path = self.page_image_path(page);
            image.save(&path)?;
            debug!("Saved page {} to {}", page, path.display());

            let saved = image::open(&path)?;
            let text = match recognizer.recognize(&saved) {
                Ok(text) => text,
                Err(e) => {
                    warn!("OCR failed for page {}: {}", page, e);
                    String::new()
                }
            };

            debug!("Page {}: {} chars", page, text.len());
            pages.push(text);
        }

        Ok(Document::new(pages))
    }
}
