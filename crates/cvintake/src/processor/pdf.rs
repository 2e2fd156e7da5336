use std::path::Path;

use crate::error::ProcessError;
use crate::processor::ocr::OcrEngine;
use crate::processor::{DocumentFormat, ExtractedText, FormatExtractor};

/// A text layer shorter than this (trimmed) marks the document as
/// image-based. Scanned resumes typically extract as empty or a handful of
/// stray glyphs.
const TEXT_LAYER_MIN_CHARS: usize = 10;

pub struct PdfExtractor {
    ocr: Option<OcrEngine>,
}

impl PdfExtractor {
    pub fn new(ocr: Option<OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl FormatExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ProcessError> {
        let _span = tracing::info_span!("extractor.pdf").entered();

        let pdf_bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = lopdf::Document::load_mem(&pdf_bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        // Page count comes from the text-layer pass; it is obtainable even
        // when the text layer is empty, and both paths report it.
        let page_count = doc.get_pages().len();
        let text = extract_text_layer(&doc);

        if text.trim().chars().count() > TEXT_LAYER_MIN_CHARS {
            return Ok(ExtractedText::from_text_layer(&text, Some(page_count as u32)));
        }

        match &self.ocr {
            Some(engine) => {
                let _ocr_span =
                    tracing::info_span!("extractor.ocr_fallback", reason = "empty_text_layer")
                        .entered();
                let outcome = engine.recognize_pdf(&pdf_bytes, page_count);
                Ok(ExtractedText::from_ocr(&outcome, Some(page_count as u32)))
            }
            // OCR disabled: keep whatever the text layer produced.
            None => Ok(ExtractedText::from_text_layer(&text, Some(page_count as u32))),
        }
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

fn extract_text_layer(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ocr::OCR_FAILURE_TEXT;
    use crate::processor::ExtractionMethod;
    use lopdf::{dictionary, Document, Object, Stream};
    use tempfile::NamedTempFile;

    /// Builds a minimal one-page PDF with the given content stream text.
    fn build_pdf(content_text: Option<&str>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            }),
        );

        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            }),
        );

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
        };

        if let Some(text) = content_text {
            let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
            let content_id = doc.new_object_id();
            let content_stream = Stream::new(dictionary! {}, content.into_bytes());
            doc.objects
                .insert(content_id, Object::Stream(content_stream));
            page_dict.set("Contents", content_id);
        }

        doc.objects.insert(page_id, Object::Dictionary(page_dict));

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut pdf_bytes = Vec::new();
        doc.save_to(&mut pdf_bytes).unwrap();
        pdf_bytes
    }

    fn write_temp_pdf(bytes: &[u8]) -> NamedTempFile {
        let temp_file = NamedTempFile::with_suffix(".pdf").unwrap();
        std::fs::write(temp_file.path(), bytes).unwrap();
        temp_file
    }

    #[test]
    fn test_text_layer_extraction() {
        let pdf = build_pdf(Some("Jane Doe - Senior Software Engineer"));
        let temp_file = write_temp_pdf(&pdf);

        let extractor = PdfExtractor::new(None);
        let result = extractor.extract(temp_file.path()).unwrap();

        assert_eq!(result.method, ExtractionMethod::Text);
        assert!(result.text.contains("Jane Doe"));
        assert_eq!(result.page_or_image_count, Some(1));
        assert!(result.ocr_confidence.is_none());
    }

    #[test]
    fn test_empty_text_layer_routes_to_ocr() {
        let pdf = build_pdf(None);
        let temp_file = write_temp_pdf(&pdf);

        let engine = OcrEngine::new(&["eng".to_string()], 150, 2);
        let extractor = PdfExtractor::new(Some(engine));
        let result = extractor.extract(temp_file.path()).unwrap();

        // With no text layer the OCR path must win. Recognition of a blank
        // page (or an absent rasterizer) degrades to the sentinel — either
        // way the method is OCR and a confidence is reported.
        assert_eq!(result.method, ExtractionMethod::Ocr);
        assert!(result.ocr_confidence.is_some());
        assert_eq!(result.page_or_image_count, Some(1));
    }

    #[test]
    fn test_empty_text_layer_without_ocr_stays_text() {
        let pdf = build_pdf(None);
        let temp_file = write_temp_pdf(&pdf);

        let extractor = PdfExtractor::new(None);
        let result = extractor.extract(temp_file.path()).unwrap();

        assert_eq!(result.method, ExtractionMethod::Text);
        assert!(result.text.trim().is_empty());
    }

    #[test]
    fn test_short_text_layer_treated_as_image_based() {
        // Seven visible characters is under the threshold.
        let pdf = build_pdf(Some("abc def"));
        let temp_file = write_temp_pdf(&pdf);

        let engine = OcrEngine::new(&["eng".to_string()], 150, 2);
        let extractor = PdfExtractor::new(Some(engine));
        let result = extractor.extract(temp_file.path()).unwrap();

        assert_eq!(result.method, ExtractionMethod::Ocr);
    }

    #[test]
    fn test_corrupt_pdf_is_fatal() {
        let temp_file = NamedTempFile::with_suffix(".pdf").unwrap();
        std::fs::write(temp_file.path(), b"not a valid pdf").unwrap();

        let extractor = PdfExtractor::new(None);
        let result = extractor.extract(temp_file.path());

        match result {
            Err(ProcessError::PdfProcessing(msg)) => {
                assert!(msg.contains("Failed to load PDF"), "got: {}", msg);
            }
            other => panic!("Expected PdfProcessing error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file_error() {
        let extractor = PdfExtractor::new(None);
        let result = extractor.extract(Path::new("/nonexistent/file.pdf"));

        match result {
            Err(ProcessError::ReadDocument { path, .. }) => {
                assert_eq!(path.to_str().unwrap(), "/nonexistent/file.pdf");
            }
            _ => panic!("Expected ReadDocument error"),
        }
    }

    #[test]
    fn test_supports_pdf_only() {
        let extractor = PdfExtractor::new(None);
        assert!(extractor.supports(DocumentFormat::Pdf));
        assert!(!extractor.supports(DocumentFormat::Docx));
        assert!(!extractor.supports(DocumentFormat::Text));
    }

    #[test]
    fn test_degraded_ocr_reports_sentinel_text() {
        let pdf = build_pdf(None);
        let temp_file = write_temp_pdf(&pdf);

        let engine = OcrEngine::new(&["eng".to_string()], 150, 2);
        let extractor = PdfExtractor::new(Some(engine));
        let result = extractor.extract(temp_file.path()).unwrap();

        if result.ocr_confidence == Some(0.0) {
            assert_eq!(result.text, OCR_FAILURE_TEXT);
        }
    }
}
