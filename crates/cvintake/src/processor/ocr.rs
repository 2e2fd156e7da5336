//! OCR fallback for image-based documents.
//!
//! Rasterized pages and embedded DOCX images are preprocessed and recognized
//! one unit at a time with a fresh Tesseract instance per unit — recognition
//! state must not leak between units, and a single live instance bounds peak
//! memory. A failed pass degrades to a sentinel result; the pipeline always
//! gets some text to continue with.

use std::io::Cursor;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use crate::error::ProcessError;

/// Returned when no unit produced readable text. Deterministic so callers
/// and tests can detect the degraded case.
pub const OCR_FAILURE_TEXT: &str = "OCR could not recover readable text from this document.";

/// A4 raster bounds at 300 DPI. Larger inputs are scaled down before
/// recognition.
const MAX_RASTER_WIDTH: u32 = 2480;
const MAX_RASTER_HEIGHT: u32 = 3508;

/// Result of one full OCR pass over a document.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub text: String,
    /// Mean confidence (0-100) over units that produced non-empty text.
    pub confidence: f64,
    /// Number of units that produced non-empty text.
    pub units_recognized: usize,
}

impl OcrOutcome {
    fn degraded() -> Self {
        Self {
            text: OCR_FAILURE_TEXT.to_string(),
            confidence: 0.0,
            units_recognized: 0,
        }
    }
}

/// Text and confidence recognized from a single page or image.
struct OcrUnit {
    text: String,
    confidence: f64,
}

#[derive(Clone)]
pub struct OcrEngine {
    inner: Arc<OcrEngineInner>,
}

struct OcrEngineInner {
    languages: String,
    dpi: u32,
    max_pages: usize,
}

impl OcrEngine {
    pub fn new(languages: &[String], dpi: u32, max_pages: usize) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(OcrEngineInner {
                languages: lang_str,
                dpi,
                max_pages,
            }),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }

    /// OCR a PDF by rasterizing its leading pages.
    ///
    /// `page_count` comes from the caller's text-layer pass (obtainable even
    /// when the text layer is empty); only the first `max_pages` pages are
    /// rasterized. Any failure in rasterization or recognition degrades to
    /// the sentinel outcome — this method does not fail.
    pub fn recognize_pdf(&self, pdf_bytes: &[u8], page_count: usize) -> OcrOutcome {
        let _span = tracing::info_span!("ocr.pdf", pages = page_count).entered();

        // Scratch dir for the temp PDF and page rasters. Dropping the guard
        // removes every intermediate file on all exit paths.
        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("OCR scratch directory unavailable: {}", e);
                return OcrOutcome::degraded();
            }
        };

        let pdf_path = scratch.path().join("source.pdf");
        if let Err(e) = std::fs::write(&pdf_path, pdf_bytes) {
            tracing::warn!("Failed to stage PDF for rasterization: {}", e);
            return OcrOutcome::degraded();
        }

        let pages = page_count.clamp(1, self.inner.max_pages);
        let mut units = Vec::with_capacity(pages);

        for page_num in 1..=pages {
            match rasterize_page(&pdf_path, page_num as u32, self.inner.dpi, scratch.path()) {
                Ok(image_data) => match self.recognize_unit(&image_data) {
                    Ok(unit) => units.push(unit),
                    Err(e) => tracing::warn!("Recognition failed on page {}: {}", page_num, e),
                },
                Err(e) => tracing::warn!("Rasterization failed on page {}: {}", page_num, e),
            }
        }

        combine_units(units)
    }

    /// OCR a set of images pulled from a DOCX media manifest.
    pub fn recognize_images(&self, images: &[Vec<u8>]) -> OcrOutcome {
        let _span = tracing::info_span!("ocr.images", count = images.len()).entered();

        let mut units = Vec::with_capacity(images.len());
        for (index, image_data) in images.iter().enumerate() {
            match self.recognize_unit(image_data) {
                Ok(unit) => units.push(unit),
                Err(e) => tracing::warn!("Recognition failed on image {}: {}", index, e),
            }
        }

        combine_units(units)
    }

    /// Recognizes one image with an isolated Tesseract instance.
    fn recognize_unit(&self, image_data: &[u8]) -> Result<OcrUnit, ProcessError> {
        let png_data = preprocess_image(image_data)?;

        // Fresh instance per unit; dropped at the end of this scope.
        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))?;

        let confidence = lt.mean_text_conf() as f64;

        Ok(OcrUnit { text, confidence })
    }
}

/// Joins per-unit text with a single blank line and averages confidence over
/// units that produced non-empty text. No page or image markers end up in
/// the output — the text is later embedded in a prompt and separator tokens
/// measurably confuse extraction.
fn combine_units(units: Vec<OcrUnit>) -> OcrOutcome {
    let non_empty: Vec<OcrUnit> = units
        .into_iter()
        .filter(|u| !u.text.trim().is_empty())
        .collect();

    if non_empty.is_empty() {
        return OcrOutcome::degraded();
    }

    let text = non_empty
        .iter()
        .map(|u| u.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n");

    let confidence =
        non_empty.iter().map(|u| u.confidence).sum::<f64>() / non_empty.len() as f64;

    OcrOutcome {
        text,
        confidence,
        units_recognized: non_empty.len(),
    }
}

/// Preprocesses an image for recognition: bound to A4 raster dimensions,
/// greyscale, contrast stretch, sharpen. Returns PNG bytes for Tesseract.
fn preprocess_image(image_data: &[u8]) -> Result<Vec<u8>, ProcessError> {
    let img = image::load_from_memory(image_data)
        .map_err(|e| ProcessError::ImageProcessing(format!("Failed to load image: {}", e)))?;

    let img = if img.width() > MAX_RASTER_WIDTH || img.height() > MAX_RASTER_HEIGHT {
        img.resize(
            MAX_RASTER_WIDTH,
            MAX_RASTER_HEIGHT,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        img
    };

    let img = img.grayscale().adjust_contrast(16.0).unsharpen(1.0, 2);

    let mut png_data = Vec::new();
    let mut cursor = Cursor::new(&mut png_data);
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| ProcessError::ImageProcessing(format!("Failed to encode image: {}", e)))?;

    Ok(png_data)
}

/// Renders one PDF page to a PNG via pdftoppm (poppler-utils), writing into
/// the caller's scratch directory.
fn rasterize_page(
    pdf_path: &Path,
    page_num: u32,
    dpi: u32,
    scratch_dir: &Path,
) -> Result<Vec<u8>, ProcessError> {
    let output_prefix = scratch_dir.join(format!("page_{}", uuid::Uuid::new_v4()));

    let output = Command::new("pdftoppm")
        .args([
            "-png",
            "-r",
            &dpi.to_string(),
            "-f",
            &page_num.to_string(),
            "-l",
            &page_num.to_string(),
        ])
        .arg(pdf_path)
        .arg(&output_prefix)
        .output()
        .map_err(|e| {
            ProcessError::PdfProcessing(format!(
                "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                e
            ))
        })?;

    if !output.status.success() {
        return Err(ProcessError::PdfProcessing(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    // pdftoppm pads the page suffix depending on the document's page count.
    let candidates = [
        format!("{}-{}.png", output_prefix.display(), page_num),
        format!("{}-{:02}.png", output_prefix.display(), page_num),
        format!("{}-{:03}.png", output_prefix.display(), page_num),
    ];

    let image_path = candidates
        .iter()
        .find(|p| Path::new(p).exists())
        .ok_or_else(|| {
            ProcessError::PdfProcessing("Failed to find rendered page image".to_string())
        })?;

    std::fs::read(image_path).map_err(|e| {
        ProcessError::PdfProcessing(format!("Failed to read rendered image: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_joins_languages() {
        let engine = OcrEngine::new(&["eng".to_string(), "deu".to_string()], 300, 2);
        assert_eq!(engine.inner.languages, "eng+deu");
        assert_eq!(engine.dpi(), 300);
    }

    #[test]
    fn test_engine_defaults_to_english() {
        let engine = OcrEngine::new(&[], 300, 2);
        assert_eq!(engine.inner.languages, "eng");
    }

    #[test]
    fn test_combine_joins_with_blank_line() {
        let outcome = combine_units(vec![
            OcrUnit {
                text: "page one\n".to_string(),
                confidence: 90.0,
            },
            OcrUnit {
                text: "page two".to_string(),
                confidence: 70.0,
            },
        ]);
        assert_eq!(outcome.text, "page one\n\npage two");
        assert_eq!(outcome.confidence, 80.0);
        assert_eq!(outcome.units_recognized, 2);
    }

    #[test]
    fn test_combine_excludes_empty_units_from_average() {
        let outcome = combine_units(vec![
            OcrUnit {
                text: "real text".to_string(),
                confidence: 88.0,
            },
            OcrUnit {
                text: "   \n".to_string(),
                confidence: 12.0,
            },
        ]);
        // The empty unit is excluded, not counted as zero.
        assert_eq!(outcome.confidence, 88.0);
        assert_eq!(outcome.units_recognized, 1);
        assert_eq!(outcome.text, "real text");
    }

    #[test]
    fn test_combine_all_empty_yields_sentinel() {
        let outcome = combine_units(vec![OcrUnit {
            text: "  ".to_string(),
            confidence: 50.0,
        }]);
        assert_eq!(outcome.text, OCR_FAILURE_TEXT);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.units_recognized, 0);
    }

    #[test]
    fn test_combine_no_units_yields_sentinel() {
        let outcome = combine_units(Vec::new());
        assert_eq!(outcome.text, OCR_FAILURE_TEXT);
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn test_recognize_pdf_degrades_on_garbage_input() {
        let engine = OcrEngine::new(&["eng".to_string()], 150, 2);
        // Not a PDF at all; rasterization cannot succeed. The pass must
        // degrade, never error.
        let outcome = engine.recognize_pdf(b"definitely not a pdf", 1);
        assert_eq!(outcome.text, OCR_FAILURE_TEXT);
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn test_recognize_images_degrades_on_invalid_images() {
        let engine = OcrEngine::new(&["eng".to_string()], 300, 2);
        let outcome = engine.recognize_images(&[b"not an image".to_vec()]);
        assert_eq!(outcome.text, OCR_FAILURE_TEXT);
        assert_eq!(outcome.units_recognized, 0);
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        let result = preprocess_image(b"garbage");
        assert!(matches!(result, Err(ProcessError::ImageProcessing(_))));
    }

    #[test]
    fn test_preprocess_bounds_oversized_images() {
        // 3000x4000 white image exceeds the A4 bound and must be scaled down.
        let img = image::DynamicImage::new_luma8(3000, 4000);
        let mut raw = Vec::new();
        img.write_to(&mut Cursor::new(&mut raw), image::ImageFormat::Png)
            .unwrap();

        let processed = preprocess_image(&raw).unwrap();
        let reloaded = image::load_from_memory(&processed).unwrap();
        assert!(reloaded.width() <= MAX_RASTER_WIDTH);
        assert!(reloaded.height() <= MAX_RASTER_HEIGHT);
    }
}
