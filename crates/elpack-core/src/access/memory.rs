//! In-memory package access.

use super::{FileAccess, normalize_path};
use crate::PackageError;
use crate::primitives::DEFAULT_MAX_FILE_SIZE;
use std::collections::BTreeMap;

/// A package held entirely in memory, keyed by normalized relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileAccess {
    label: String,
    files: BTreeMap<String, Vec<u8>>,
    max_file_size: u64,
}

impl MemoryFileAccess {
    /// Create an empty package; `label` is reported as its root.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: BTreeMap::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Builder form of [`MemoryFileAccess::insert`].
    ///
    /// Paths that fail normalization are ignored.
    #[must_use]
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        if let Err(e) = self.insert(path, contents) {
            tracing::warn!(path, error = %e, "ignoring in-memory file");
        }
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) -> Result<(), PackageError> {
        let normalized = normalize_path(path)?;
        self.files.insert(normalized, contents.into());
        Ok(())
    }

    /// Override the per-file size limit.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    fn contents(&self, path: &str) -> Result<&Vec<u8>, PackageError> {
        let normalized = normalize_path(path)?;
        self.files
            .get(&normalized)
            .ok_or_else(|| PackageError::Io(format!("Cannot read '{}': not found", path)))
    }
}

impl FileAccess for MemoryFileAccess {
    fn root(&self) -> &str {
        &self.label
    }

    fn exists(&self, path: &str) -> bool {
        normalize_path(path)
            .map(|p| self.files.contains_key(&p))
            .unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError> {
        let contents = self.contents(path)?;
        let size = contents.len() as u64;
        if size > self.max_file_size {
            return Err(PackageError::FileTooLarge {
                path: path.to_string(),
                size,
                max: self.max_file_size,
            });
        }
        Ok(contents.clone())
    }

    fn file_size(&self, path: &str) -> Result<u64, PackageError> {
        Ok(self.contents(path)?.len() as u64)
    }

    fn list_files(&self) -> Result<Vec<String>, PackageError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn total_size(&self) -> Result<u64, PackageError> {
        Ok(self
            .files
            .values()
            .fold(0u64, |acc, f| acc.saturating_add(f.len() as u64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_normalized_on_insert() {
        let access = MemoryFileAccess::new("pkg").with_file("./a\\b.xml", "x");
        assert!(access.exists("a/b.xml"));
        assert_eq!(access.list_files().expect("list"), vec!["a/b.xml".to_string()]);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut access = MemoryFileAccess::new("pkg");
        assert!(access.insert("../x", "x").is_err());
        assert!(access.list_files().expect("list").is_empty());
    }

    #[test]
    fn size_limit_applies() {
        let access = MemoryFileAccess::new("pkg")
            .with_max_file_size(2)
            .with_file("big.txt", "abc");
        assert!(matches!(
            access.read("big.txt"),
            Err(PackageError::FileTooLarge { size: 3, .. })
        ));
        assert_eq!(access.total_size().expect("size"), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let access = MemoryFileAccess::new("pkg");
        assert!(matches!(access.read("nope"), Err(PackageError::Io(_))));
    }
}
