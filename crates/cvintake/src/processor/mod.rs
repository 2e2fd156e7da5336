pub mod cleaning;
pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod quality;
pub mod text;

use std::path::Path;

use serde::Serialize;

use crate::config::OcrConfig;
use crate::error::ProcessError;
use crate::processor::ocr::OcrEngine;

/// Resume document formats accepted for upload. The format tag is declared
/// by the upload layer (which already sniffed the file); extension mapping
/// is a convenience for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" | "text" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Text => "txt",
        }
    }

    /// Uppercase tag stored in the resume record's `file_type` column.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Doc => "DOC",
            Self::Text => "TXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Text,
    Ocr,
}

/// Text extracted from one uploaded document. Produced exactly once per
/// input; the text is cleaned before the value is constructed and is never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_or_image_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub extracted_at: chrono::DateTime<chrono::Utc>,
}

impl ExtractedText {
    /// A successful text-layer (or plain-text) extraction.
    pub fn from_text_layer(raw: &str, unit_count: Option<u32>) -> Self {
        Self {
            text: cleaning::clean_text(raw),
            method: ExtractionMethod::Text,
            ocr_confidence: None,
            page_or_image_count: unit_count,
            note: None,
            extracted_at: chrono::Utc::now(),
        }
    }

    /// An OCR extraction (possibly degraded to the sentinel text).
    pub fn from_ocr(outcome: &ocr::OcrOutcome, unit_count: Option<u32>) -> Self {
        Self {
            text: cleaning::clean_text(&outcome.text),
            method: ExtractionMethod::Ocr,
            ocr_confidence: Some(outcome.confidence),
            page_or_image_count: unit_count,
            note: None,
            extracted_at: chrono::Utc::now(),
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

pub trait FormatExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn FormatExtractor>>,
}

impl ExtractorRegistry {
    pub fn new(ocr: &OcrConfig) -> Self {
        let mut extractors: Vec<Box<dyn FormatExtractor>> =
            vec![Box::new(text::TxtExtractor::new())];

        if ocr.enabled {
            let engine = OcrEngine::new(&ocr.languages, ocr.dpi, ocr.max_pages);
            extractors.push(Box::new(pdf::PdfExtractor::new(Some(engine.clone()))));
            extractors.push(Box::new(docx::DocxExtractor::new(Some(engine))));
        } else {
            extractors.push(Box::new(pdf::PdfExtractor::new(None)));
            extractors.push(Box::new(docx::DocxExtractor::new(None)));
        }
        extractors.push(Box::new(docx::DocExtractor::new()));

        Self { extractors }
    }

    /// Dispatches on the declared format. Unknown formats fail with
    /// `UnsupportedFormat`; everything downstream of dispatch wraps its
    /// decode errors in a `ProcessError` variant.
    pub fn extract(
        &self,
        path: &Path,
        format: DocumentFormat,
    ) -> Result<ExtractedText, ProcessError> {
        for extractor in &self.extractors {
            if extractor.supports(format) {
                return extractor.extract(path);
            }
        }

        Err(ProcessError::UnsupportedFormat(
            format.extension().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("doc"), Some(DocumentFormat::Doc));
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_extension("xyz"), None);
        assert_eq!(DocumentFormat::from_extension(""), None);
    }

    #[test]
    fn test_registry_routes_text_format() {
        let registry = ExtractorRegistry::new(&OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        });

        let mut temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(temp_file, "Plain resume content").unwrap();

        let result = registry
            .extract(temp_file.path(), DocumentFormat::Text)
            .unwrap();
        assert!(result.text.contains("Plain resume content"));
        assert_eq!(result.method, ExtractionMethod::Text);
    }

    #[test]
    fn test_extracted_text_is_cleaned_at_construction() {
        let extracted = ExtractedText::from_text_layer("a   b\r\n\r\n\r\n\r\nc", None);
        assert_eq!(extracted.text, "a b\n\nc");
    }

    #[test]
    fn test_registry_with_ocr_enabled_still_routes_text() {
        let registry = ExtractorRegistry::new(&OcrConfig::default());

        let mut temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(temp_file, "hello").unwrap();

        let result = registry.extract(temp_file.path(), DocumentFormat::Text);
        assert!(result.is_ok());
    }
}
