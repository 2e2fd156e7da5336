//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Resume uploads carry personal data in their filenames and paths — these
//! functions keep full paths out of spans and log lines.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields — reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Returns a short deterministic hash of a path for correlation without
/// exposing the actual path.
pub fn hash_path(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    let hash = hasher.finish();
    format!("{:016x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/home/user/uploads/jane_doe_resume.pdf")),
            "jane_doe_resume.pdf"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_hash_path_deterministic() {
        let path = PathBuf::from("/home/user/resume.pdf");
        let h1 = hash_path(&path);
        let h2 = hash_path(&path);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
    }

    #[test]
    fn test_hash_path_different_paths_differ() {
        let h1 = hash_path(Path::new("/a/b"));
        let h2 = hash_path(Path::new("/c/d"));
        assert_ne!(h1, h2);
    }
}
