//! Size-limited view over another package.

use super::FileAccess;
use crate::PackageError;

/// Wraps a [`FileAccess`] and refuses reads of files larger than a limit.
///
/// The parsers wrap whatever access they are given with
/// `ParserOptions::max_file_size`, so the option holds regardless of the
/// limit the underlying access was built with. The stricter of the two wins.
pub struct LimitedFileAccess<'a> {
    inner: &'a dyn FileAccess,
    max_file_size: u64,
}

impl<'a> LimitedFileAccess<'a> {
    #[must_use]
    pub fn new(inner: &'a dyn FileAccess, max_file_size: u64) -> Self {
        Self {
            inner,
            max_file_size,
        }
    }
}

impl FileAccess for LimitedFileAccess<'_> {
    fn root(&self) -> &str {
        self.inner.root()
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError> {
        let size = self.file_size(path)?;
        if size > self.max_file_size {
            return Err(PackageError::FileTooLarge {
                path: path.to_string(),
                size,
                max: self.max_file_size,
            });
        }
        self.inner.read(path)
    }

    fn file_size(&self, path: &str) -> Result<u64, PackageError> {
        self.inner.file_size(path)
    }

    fn list_files(&self) -> Result<Vec<String>, PackageError> {
        self.inner.list_files()
    }

    fn total_size(&self) -> Result<u64, PackageError> {
        self.inner.total_size()
    }
}
