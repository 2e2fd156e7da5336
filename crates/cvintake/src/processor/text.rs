use std::path::Path;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, ExtractedText, FormatExtractor};

/// Plain-text resumes: read as UTF-8, no fallback path.
pub struct TxtExtractor;

impl TxtExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TxtExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatExtractor for TxtExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ProcessError> {
        let _span = tracing::info_span!("extractor.txt").entered();

        let text = std::fs::read_to_string(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(ExtractedText::from_text_layer(&text, None))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
