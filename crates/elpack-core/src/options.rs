//! # Parser Options
//!
//! Tunables shared by every parser. Deserializable so front ends can load
//! them from a configuration file; every field has a default.

use crate::primitives::{DEFAULT_LANGUAGE, DEFAULT_MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};

/// Options controlling how packages are read and summarised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Largest single file, in bytes, that will be read from a package.
    pub max_file_size: u64,
    /// Follow `adlcp:location` references to external LOM documents.
    pub resolve_external_metadata: bool,
    /// Sum file sizes into `ModuleMetadata::size_on_disk`.
    pub compute_size_on_disk: bool,
    /// Language preferred when a title or description is localized.
    pub preferred_language: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            resolve_external_metadata: true,
            compute_size_on_disk: true,
            preferred_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ParserOptions {
    /// Override the preferred language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.preferred_language = language.into();
        self
    }

    /// Override the per-file size limit.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}
