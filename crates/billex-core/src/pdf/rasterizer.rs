//! Scanned-page rasterization using lopdf.
//!
//! Scanned bills carry each page as one embedded image. The rasterizer
//! locates that image, decodes it, and rescales it to the pixel width the
//! page would have at the requested DPI. Pages drawn from text or vector
//! content have no such image; rendering those needs `PdfiumRasterizer`.

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{Rasterizer, Result};
use crate::error::PdfError;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// US Letter, used when a page declares no MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Rasterizer for scanned PDFs backed by lopdf.
pub struct PdfRasterizer {
    document: Option<Document>,
}

impl PdfRasterizer {
    /// Create a rasterizer with no document loaded.
    pub fn new() -> Self {
        Self { document: None }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    /// Largest image placed on the page. A page without an embedded scan
    /// is an error; images are never borrowed from other pages.
    fn page_image(&self, doc: &Document, page: u32, page_id: ObjectId) -> Result<DynamicImage> {
        let mut images = self.page_xobject_images(doc, page_id);
        debug!("Found {} images on page {}", images.len(), page);

        images.sort_by_key(|img| u64::from(img.width()) * u64::from(img.height()));
        images.pop().ok_or_else(|| {
            PdfError::ImageExtraction(format!("page {} has no embedded scan", page))
        })
    }

    fn page_xobject_images(&self, doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
        let mut images = Vec::new();

        let Some(resources) = self.page_attribute(doc, page_id, b"Resources") else {
            return images;
        };
        let Ok((_, Object::Dictionary(resources))) = doc.dereference(&resources) else {
            return images;
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return images;
        };

        if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
            for (_name, obj_ref) in xobj_dict.iter() {
                if let Ok((_, obj)) = doc.dereference(obj_ref) {
                    if let Some(img) = self.try_extract_image_from_object(doc, obj) {
                        images.push(img);
                    }
                }
            }
        }

        images
    }

    /// Look up a page attribute, walking up the page tree for inherited ones.
    fn page_attribute(&self, doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return None;
        };

        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_attribute(doc, *parent_id, key),
            _ => None,
        }
    }

    fn media_box(&self, doc: &Document, page_id: ObjectId) -> [f32; 4] {
        let Some(value) = self.page_attribute(doc, page_id, b"MediaBox") else {
            return DEFAULT_MEDIA_BOX;
        };
        let Ok((_, Object::Array(coords))) = doc.dereference(&value) else {
            return DEFAULT_MEDIA_BOX;
        };

        let numbers: Vec<f32> = coords.iter().filter_map(|o| o.as_float().ok()).collect();
        match numbers.as_slice() {
            [x0, y0, x1, y1] => [*x0, *y0, *x1, *y1],
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    fn try_extract_image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        let subtype = dict.get(b"Subtype").ok()?;
        if subtype.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) if !arr.is_empty() => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    trace!("Decoding JPEG image");
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        decode_raw(&data, width, height, color_space, bits)
    }
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PdfRasterizer {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = *pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let image = self.page_image(doc, page, page_id)?;
        let [x0, _, x1, _] = self.media_box(doc, page_id);

        let target_width = ((x1 - x0).abs() * dpi as f32 / POINTS_PER_INCH).round() as u32;
        Ok(scale_to_width(image, target_width))
    }
}

/// Rescale preserving aspect ratio. Zero or unchanged widths are a no-op.
fn scale_to_width(image: DynamicImage, target_width: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if target_width == 0 || width == 0 || target_width == width {
        return image;
    }

    let target_height =
        ((u64::from(height) * u64::from(target_width)) / u64::from(width)).max(1) as u32;

    debug!(
        "Scaling page image {}x{} -> {}x{}",
        width, height, target_width, target_height
    );
    image.resize_exact(target_width, target_height, FilterType::Lanczos3)
}

fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    trace!(
        "Creating image from raw data: {}x{}, colorspace={:?}, bits={}",
        width,
        height,
        String::from_utf8_lossy(color_space),
        bits_per_component
    );

    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&gray| [gray, gray, gray, 255])
            .collect(),
        _ => {
            trace!("Could not decode image: data_len={}", data.len());
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    /// PDF of 72x36pt pages. `true` pages carry a 4x2 grayscale scan,
    /// `false` pages only draw text.
    pub(crate) fn pdf_with_pages(scans: &[bool]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for &scan in scans {
            let (resources, content) = if scan {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 4,
                        "Height" => 2,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    vec![0, 64, 128, 255, 255, 128, 64, 0],
                ));
                (
                    dictionary! { "XObject" => dictionary! { "Im0" => image_id } },
                    b"q 72 0 0 36 0 0 cm /Im0 Do Q".to_vec(),
                )
            } else {
                (
                    dictionary! { "Font" => dictionary! { "F1" => font_id } },
                    b"BT /F1 10 Tf 2 12 Td (Total 45.00) Tj ET".to_vec(),
                )
            };

            let resources_id = doc.add_object(resources);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 72.into(), 36.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    /// Single-page scanned PDF.
    pub(crate) fn scanned_pdf() -> Vec<u8> {
        pdf_with_pages(&[true])
    }

    #[test]
    fn test_new_has_no_pages() {
        let rasterizer = PdfRasterizer::new();
        assert!(rasterizer.document.is_none());
        assert_eq!(rasterizer.page_count(), 0);
        assert!(matches!(rasterizer.render_page(1, 72), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut rasterizer = PdfRasterizer::new();
        assert!(matches!(rasterizer.load(b"not a pdf"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_render_scales_to_dpi() {
        let mut rasterizer = PdfRasterizer::new();
        rasterizer.load(&scanned_pdf()).unwrap();
        assert_eq!(rasterizer.page_count(), 1);

        // 72pt wide page at 144 DPI is 144px wide
        let image = rasterizer.render_page(1, 144).unwrap();
        assert_eq!((image.width(), image.height()), (144, 72));

        let native = rasterizer.render_page(1, 4).unwrap();
        assert_eq!((native.width(), native.height()), (4, 2));
    }

    #[test]
    fn test_invalid_page() {
        let mut rasterizer = PdfRasterizer::new();
        rasterizer.load(&scanned_pdf()).unwrap();
        assert!(matches!(rasterizer.render_page(2, 72), Err(PdfError::InvalidPage(2))));
    }

    #[test]
    fn test_page_without_scan_never_borrows_another_pages_image() {
        let mut rasterizer = PdfRasterizer::new();
        rasterizer.load(&pdf_with_pages(&[false, true])).unwrap();
        assert_eq!(rasterizer.page_count(), 2);

        assert!(matches!(
            rasterizer.render_page(1, 144),
            Err(PdfError::ImageExtraction(_))
        ));
        let scan = rasterizer.render_page(2, 144).unwrap();
        assert_eq!((scan.width(), scan.height()), (144, 72));
    }

    #[test]
    fn test_decode_raw_rgb() {
        let image = decode_raw(&[255, 0, 0, 0, 255, 0], 2, 1, b"DeviceRGB", 8).unwrap();
        assert_eq!(image.to_rgba8().get_pixel(1, 0).0, [0, 255, 0, 255]);
        assert!(decode_raw(&[0; 6], 2, 1, b"DeviceCMYK", 8).is_none());
        assert!(decode_raw(&[0; 6], 2, 1, b"DeviceRGB", 1).is_none());
    }
}
