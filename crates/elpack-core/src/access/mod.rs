//! # Package File Access
//!
//! Every parser reads package contents through the [`FileAccess`] trait, so
//! the same parsing code runs over a directory on disk or an in-memory file
//! set.
//!
//! Paths are `/`-separated and relative to the package root. Lookups by
//! [`FileAccess::resolve`] fall back to an ASCII case-insensitive match,
//! because packages authored on Windows routinely disagree with their own
//! manifests about letter case.

mod limited;
mod local;
mod memory;

pub use limited::LimitedFileAccess;
pub use local::LocalFileAccess;
pub use memory::MemoryFileAccess;

use crate::PackageError;

/// Read-only view of a package's files.
pub trait FileAccess {
    /// Display form of the package root (a directory path or a label).
    fn root(&self) -> &str;

    /// Whether a file exists at exactly this relative path.
    fn exists(&self, path: &str) -> bool;

    /// Read a file's bytes.
    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError>;

    /// Size of one file in bytes, without reading it.
    fn file_size(&self, path: &str) -> Result<u64, PackageError>;

    /// All file paths in the package, sorted.
    fn list_files(&self) -> Result<Vec<String>, PackageError>;

    /// Sum of all file sizes in bytes.
    fn total_size(&self) -> Result<u64, PackageError>;

    /// Read a file as text.
    ///
    /// A UTF-8 byte-order mark is dropped. Content that is not valid UTF-8 is
    /// decoded as ISO-8859-1, which is what older AICC authoring tools emit.
    fn read_to_string(&self, path: &str) -> Result<String, PackageError> {
        let bytes = self.read(path)?;
        let bytes = bytes
            .strip_prefix(b"\xEF\xBB\xBF".as_slice())
            .map(<[u8]>::to_vec)
            .unwrap_or(bytes);
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| char::from(b)).collect()))
    }

    /// Resolve a relative path to the name actually stored in the package,
    /// falling back to a case-insensitive match.
    fn resolve(&self, path: &str) -> Result<Option<String>, PackageError> {
        let normalized = normalize_path(path)?;
        if self.exists(&normalized) {
            return Ok(Some(normalized));
        }
        Ok(self
            .list_files()?
            .into_iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(&normalized)))
    }

    /// Files with the given extension (case-insensitive, without the dot).
    fn files_with_extension(&self, extension: &str) -> Result<Vec<String>, PackageError> {
        Ok(self
            .list_files()?
            .into_iter()
            .filter(|path| {
                path.rsplit_once('.')
                    .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Whether any file in the package has this file name, in any directory.
    fn contains_file_named(&self, name: &str) -> Result<bool, PackageError> {
        Ok(self.list_files()?.iter().any(|path| {
            path.rsplit('/')
                .next()
                .map(|file| file.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        }))
    }
}

/// Normalize a relative package path.
///
/// Backslashes become slashes, `.` segments and leading separators are
/// dropped, and `..` segments are folded. A path that climbs above the
/// package root is rejected.
pub fn normalize_path(path: &str) -> Result<String, PackageError> {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PackageError::Io(format!(
                        "path '{}' escapes the package root",
                        path
                    )));
                }
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return Err(PackageError::Io(format!("path '{}' is empty", path)));
    }
    Ok(segments.join("/"))
}

/// Directory portion of a relative path, with a trailing slash (or empty).
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|index| &path[..=index]).unwrap_or("")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_segments() {
        assert_eq!(normalize_path("./a/b/../c.xml").expect("ok"), "a/c.xml");
        assert_eq!(normalize_path("\\meta\\lom.xml").expect("ok"), "meta/lom.xml");
        assert_eq!(normalize_path("a//b").expect("ok"), "a/b");
    }

    #[test]
    fn normalize_rejects_escape() {
        assert!(normalize_path("../secret").is_err());
        assert!(normalize_path("a/../../b").is_err());
        assert!(normalize_path("./").is_err());
    }

    #[test]
    fn parent_dir_keeps_trailing_slash() {
        assert_eq!(parent_dir("meta/lom.xml"), "meta/");
        assert_eq!(parent_dir("lom.xml"), "");
    }

    #[test]
    fn resolve_falls_back_to_case_insensitive() {
        let access = MemoryFileAccess::new("pkg").with_file("COURSE.AU", "x");
        assert_eq!(
            access.resolve("course.au").expect("resolve"),
            Some("COURSE.AU".to_string())
        );
        assert_eq!(access.resolve("missing.au").expect("resolve"), None);
    }

    #[test]
    fn extension_filter_ignores_case() {
        let access = MemoryFileAccess::new("pkg")
            .with_file("a.CRS", "")
            .with_file("b.crs", "")
            .with_file("c.au", "");
        assert_eq!(
            access.files_with_extension("crs").expect("list"),
            vec!["a.CRS".to_string(), "b.crs".to_string()]
        );
    }

    #[test]
    fn read_to_string_handles_bom_and_latin1() {
        let access = MemoryFileAccess::new("pkg")
            .with_file("bom.txt", b"\xEF\xBB\xBFhello".to_vec())
            .with_file("latin1.txt", b"caf\xE9".to_vec());
        assert_eq!(access.read_to_string("bom.txt").expect("read"), "hello");
        assert_eq!(access.read_to_string("latin1.txt").expect("read"), "café");
    }

    #[test]
    fn contains_file_named_searches_subdirectories() {
        let access = MemoryFileAccess::new("pkg").with_file("scripts/xAPI.js", "");
        assert!(access.contains_file_named("xapi.js").expect("search"));
        assert!(!access.contains_file_named("tincan.xml").expect("search"));
    }
}
