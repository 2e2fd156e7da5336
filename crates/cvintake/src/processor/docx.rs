use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ProcessError;
use crate::processor::ocr::OcrEngine;
use crate::processor::{DocumentFormat, ExtractedText, FormatExtractor};

/// Same acceptance threshold as the PDF text layer: fewer trimmed
/// characters than this and the document is treated as image-based.
const TEXT_LAYER_MIN_CHARS: usize = 10;

/// Archive path prefix for images embedded in a DOCX.
const MEDIA_PREFIX: &str = "word/media/";

pub struct DocxExtractor {
    ocr: Option<OcrEngine>,
}

impl DocxExtractor {
    pub fn new(ocr: Option<OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl FormatExtractor for DocxExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ProcessError> {
        let _span = tracing::info_span!("extractor.docx").entered();

        let text = read_document_text(path)?;

        if text.trim().chars().count() > TEXT_LAYER_MIN_CHARS {
            return Ok(ExtractedText::from_text_layer(&text, None));
        }

        match &self.ocr {
            Some(engine) => {
                let _ocr_span =
                    tracing::info_span!("extractor.ocr_fallback", reason = "empty_document_xml")
                        .entered();
                // No page concept in a DOCX; every embedded image is a
                // candidate unit.
                let images = read_media_images(path)?;
                let image_count = images.len() as u32;
                let outcome = engine.recognize_images(&images);
                Ok(ExtractedText::from_ocr(&outcome, Some(image_count)))
            }
            None => Ok(ExtractedText::from_text_layer(&text, None)),
        }
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

/// Legacy `.doc` uploads get a best-effort pass through the same structural
/// reader. No OCR fallback — legacy support is explicitly best-effort — and
/// the result carries a caveat note instead of a confidence score.
pub struct DocExtractor;

impl DocExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatExtractor for DocExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ProcessError> {
        let _span = tracing::info_span!("extractor.doc").entered();

        let text = read_document_text(path)?;

        Ok(ExtractedText::from_text_layer(&text, None)
            .with_note("DOC file processed - quality may vary"))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Doc)
    }
}

/// Pulls the main document part out of the OOXML archive and flattens its
/// text runs.
fn read_document_text(path: &Path) -> Result<String, ProcessError> {
    let file = std::fs::File::open(path).map_err(|e| ProcessError::ReadDocument {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open archive: {}", e)))?;

    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to find document.xml: {}", e)))?;

    let mut xml_content = String::new();
    document_xml
        .read_to_string(&mut xml_content)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to read document.xml: {}", e)))?;

    parse_document_xml(&xml_content)
}

fn parse_document_xml(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut text = String::new();
    let mut in_text_element = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"t" => in_text_element = true,
                    b"p" => in_paragraph = true,
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"t" => in_text_element = false,
                    b"p" => {
                        if in_paragraph {
                            text.push('\n');
                            in_paragraph = false;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let decoded = e.unescape().unwrap_or_default();
                    text.push_str(&decoded);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}

/// Streams every entry under `word/media/` out of the archive.
fn read_media_images(path: &Path) -> Result<Vec<Vec<u8>>, ProcessError> {
    let file = std::fs::File::open(path).map_err(|e| ProcessError::ReadDocument {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open archive: {}", e)))?;

    let mut images = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            ProcessError::DocxProcessing(format!("Failed to read archive entry: {}", e))
        })?;

        if !entry.name().starts_with(MEDIA_PREFIX) || entry.is_dir() {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data).map_err(|e| {
            ProcessError::DocxProcessing(format!("Failed to read media entry: {}", e))
        })?;
        images.push(data);
    }

    Ok(images)
}
