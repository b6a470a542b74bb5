//! Directory-backed package access.

use super::{FileAccess, normalize_path};
use crate::PackageError;
use crate::primitives::DEFAULT_MAX_FILE_SIZE;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A package extracted to a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalFileAccess {
    root: PathBuf,
    display: String,
    max_file_size: u64,
}

impl LocalFileAccess {
    /// Open a package directory.
    ///
    /// The directory is canonicalized so that symlinked roots and `..`
    /// segments are resolved once, up front.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PackageError> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| {
            PackageError::Io(format!("Invalid package path '{}': {}", root.display(), e))
        })?;
        if !canonical.is_dir() {
            return Err(PackageError::Io(format!(
                "Package path '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            display: canonical.display().to_string(),
            root: canonical,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        })
    }

    /// Override the per-file size limit.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, PackageError> {
        let normalized = normalize_path(path)?;
        Ok(normalized
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }
}

impl FileAccess for LocalFileAccess {
    fn root(&self) -> &str {
        &self.display
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError> {
        let full = self.full_path(path)?;
        let size = self.file_size(path)?;
        if size > self.max_file_size {
            return Err(PackageError::FileTooLarge {
                path: path.to_string(),
                size,
                max: self.max_file_size,
            });
        }
        tracing::debug!(path, bytes = size, "reading package file");
        std::fs::read(&full).map_err(|e| PackageError::Io(format!("Cannot read '{}': {}", path, e)))
    }

    fn file_size(&self, path: &str) -> Result<u64, PackageError> {
        let full = self.full_path(path)?;
        std::fs::metadata(&full)
            .map(|metadata| metadata.len())
            .map_err(|e| PackageError::Io(format!("Cannot read '{}': {}", path, e)))
    }

    fn list_files(&self) -> Result<Vec<String>, PackageError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| PackageError::Io(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(relative.join("/"));
        }
        files.sort();
        Ok(files)
    }

    fn total_size(&self) -> Result<u64, PackageError> {
        let mut total: u64 = 0;
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| PackageError::Io(e.to_string()))?;
            if entry.file_type().is_file() {
                let metadata = entry
                    .metadata()
                    .map_err(|e| PackageError::Io(e.to_string()))?;
                total = total.saturating_add(metadata.len());
            }
        }
        Ok(total)
    }
}
