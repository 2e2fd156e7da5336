use std::path::{Path, PathBuf};

use crate::error::ProcessError;
use crate::processor::DocumentFormat;

/// One uploaded resume file as handed over by the upload layer: the staged
/// path, the declared format, and the name the candidate gave the file.
/// Immutable for the duration of the pipeline invocation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub format: DocumentFormat,
    pub size: u64,
    pub mime_type: Option<String>,
}

impl UploadedFile {
    pub fn new(path: PathBuf, original_name: &str, format: DocumentFormat) -> Self {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let mime_type = mime_guess::from_ext(format.extension())
            .first()
            .map(|m| m.to_string());

        Self {
            path,
            original_name: original_name.to_string(),
            format,
            size,
            mime_type,
        }
    }

    /// Builds an upload from a staged file, deriving the format from the
    /// file extension. Unknown extensions are rejected before any pipeline
    /// work starts.
    pub fn from_path(path: &Path) -> Result<Self, ProcessError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.to_string()))?;

        let original_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_string();

        Ok(Self::new(path.to_path_buf(), &original_name, format))
    }
}
