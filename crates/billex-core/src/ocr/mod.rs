//! Text recognition on rendered page images.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Turns a page image into text.
pub trait Recognizer {
    /// Recognize all text on the image. An image without text yields `""`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full text, one line per visual row.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from boxes, ordering them for reading.
    pub fn from_boxes(boxes: Vec<TextBox>, image_size: (u32, u32), processing_time_ms: u64) -> Self {
        let mut result = Self {
            boxes,
            text: String::new(),
            processing_time_ms,
            image_size,
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes by reading order and rebuild `text`.
    ///
    /// Boxes whose vertical extents overlap form one visual row. Rows run
    /// top to bottom and are joined with newlines; boxes within a row run
    /// left to right and are joined with spaces.
    pub fn sort_by_reading_order(&mut self) {
        let mut sorted = std::mem::take(&mut self.boxes);
        sorted.sort_by(|a, b| a.rect().1.total_cmp(&b.rect().1));

        let mut rows: Vec<Row> = Vec::new();
        for text_box in sorted {
            let (_, top, _, bottom) = text_box.rect();
            match rows.last_mut() {
                Some(row) if row.accepts(top, bottom) => row.boxes.push(text_box),
                _ => rows.push(Row {
                    top,
                    bottom,
                    boxes: vec![text_box],
                }),
            }
        }

        let mut lines = Vec::with_capacity(rows.len());
        for mut row in rows {
            row.boxes.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));

            let line = row
                .boxes
                .iter()
                .map(|b| b.text.trim())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !line.is_empty() {
                lines.push(line);
            }

            self.boxes.extend(row.boxes);
        }

        self.text = lines.join("\n");
    }
}

/// One visual text row, anchored on the vertical extent of its first box.
struct Row {
    top: f32,
    bottom: f32,
    boxes: Vec<TextBox>,
}

impl Row {
    /// A box joins the row when either vertical centre falls inside the other's extent.
    fn accepts(&self, top: f32, bottom: f32) -> bool {
        let centre = (top + bottom) / 2.0;
        let row_centre = (self.top + self.bottom) / 2.0;
        (self.top..=self.bottom).contains(&centre) || (top..=bottom).contains(&row_centre)
    }
}
