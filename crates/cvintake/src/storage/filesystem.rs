use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on
/// same filesystem). Falls back to copy + delete when rename fails — this
/// handles cross-device moves between the upload and processed volumes.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    // Fast path: atomic rename
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    // Slow path: copy then remove original
    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Durable home for uploads that survived text extraction. Files are named
/// after their processing id, so collisions only happen on retries — the
/// numbered-suffix fallback keeps those from clobbering each other.
pub struct FileStorage {
    processed_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(processed_directory: P) -> Self {
        Self {
            processed_directory: processed_directory.as_ref().to_path_buf(),
        }
    }

    pub fn processed_directory(&self) -> &Path {
        &self.processed_directory
    }

    /// Relocates an upload into the processed directory as
    /// `{processing_id}.{extension}` and returns the final path.
    pub fn relocate(
        &self,
        src: &Path,
        processing_id: &str,
        extension: &str,
    ) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.processed_directory).map_err(|e| {
            StorageError::CreateDirectory {
                path: self.processed_directory.clone(),
                source: e,
            }
        })?;

        let destination = self.free_slot(processing_id, extension)?;
        move_file(src, &destination)?;
        Ok(destination)
    }

    /// Removes a stored file (cleanup of failed uploads). Missing files are
    /// not an error.
    pub fn remove(&self, path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Picks the first non-existing `{processing_id}[_n].{extension}` slot.
    fn free_slot(&self, processing_id: &str, extension: &str) -> Result<PathBuf, StorageError> {
        for counter in 1..=1000 {
            let filename = if counter == 1 {
                format!("{}.{}", processing_id, extension)
            } else {
                format!("{}_{}.{}", processing_id, counter, extension)
            };

            let candidate = self.processed_directory.join(filename);
            if !candidate.exists() {
                return Ok(candidate);
            }
        }

        Err(StorageError::NoFreeSlot(
            self.processed_directory.join(processing_id),
        ))
    }
}
