//! # Core Type Definitions
//!
//! This module contains the types shared by every package format:
//! - Package classification (`ModuleType`, `Scorm2004Edition`)
//! - Error types (`PackageError`)
//!
//! Format-specific models live in their own modules (`scorm12`, `scorm2004`,
//! `aicc`, `cmi5`, `xapi`, `lom`).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// MODULE TYPE
// =============================================================================

/// The packaging standard a module follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// ADL SCORM 1.2 (`imsmanifest.xml`, IMS CP 1.1.2).
    Scorm12,
    /// ADL SCORM 2004, any edition (`imsmanifest.xml`, IMS CP 1.1.4 + IMS SS).
    Scorm2004,
    /// AICC CMI001 course structure files.
    Aicc,
    /// cmi5 course structure (`cmi5.xml`).
    Cmi5,
    /// xAPI / TinCan package (`tincan.xml`).
    Xapi,
}

impl ModuleType {
    /// Human-readable name of the standard.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scorm12 => "SCORM 1.2",
            Self::Scorm2004 => "SCORM 2004",
            Self::Aicc => "AICC",
            Self::Cmi5 => "cmi5",
            Self::Xapi => "xAPI",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SCORM 2004 EDITION
// =============================================================================

/// SCORM 2004 edition, derived from the manifest `<schemaversion>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scorm2004Edition {
    /// "CAM 1.3"
    Second,
    /// "2004 3rd Edition"
    Third,
    /// "2004 4th Edition"
    Fourth,
    /// Missing or unrecognised schema version.
    #[default]
    Unknown,
}

impl Scorm2004Edition {
    /// Map a `<schemaversion>` value onto an edition.
    #[must_use]
    pub fn from_schema_version(version: Option<&str>) -> Self {
        let Some(version) = version else {
            return Self::Unknown;
        };
        match version.trim().to_ascii_lowercase().as_str() {
            "cam 1.3" => Self::Second,
            "2004 3rd edition" => Self::Third,
            "2004 4th edition" => Self::Fourth,
            _ => Self::Unknown,
        }
    }

    /// Whether a `<schemaversion>` value names any SCORM 2004 edition.
    #[must_use]
    pub fn is_scorm2004_version(version: &str) -> bool {
        Self::from_schema_version(Some(version)) != Self::Unknown
    }
}

impl fmt::Display for Scorm2004Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Second => "2nd Edition",
            Self::Third => "3rd Edition",
            Self::Fourth => "4th Edition",
            Self::Unknown => "unknown edition",
        };
        f.write_str(name)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while reading or parsing a package.
///
/// - No silent failures
/// - Use `Result<T, PackageError>` for fallible operations
/// - Parsing never panics; malformed input is always reported here
#[derive(Debug, Error)]
pub enum PackageError {
    /// An I/O error occurred while reading package contents.
    #[error("I/O error: {0}")]
    Io(String),

    /// A required manifest or descriptor file is missing.
    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    /// An XML document could not be parsed.
    #[error("XML error in {file}: {message}")]
    Xml { file: String, message: String },

    /// A JSON document could not be parsed.
    #[error("JSON error in {file}: {message}")]
    Json { file: String, message: String },

    /// An INI or CSV descriptor could not be parsed.
    #[error("Descriptor error in {file}: {message}")]
    Ini { file: String, message: String },

    /// The manifest parsed but violates its schema.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// No launchable entry point could be resolved.
    #[error("Launch URL not found")]
    LaunchUrlNotFound,

    /// The package does not match any supported standard.
    #[error("Unknown module type")]
    UnknownModuleType,

    /// An AICC prerequisite expression is malformed.
    #[error("Invalid prerequisite '{expression}' at position {position}: {message}")]
    InvalidPrerequisite {
        expression: String,
        position: usize,
        message: String,
    },

    /// A duration or timespan value is malformed.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// A package file exceeds the configured size limit.
    #[error("File {path} is {size} bytes, exceeding the {max} byte limit")]
    FileTooLarge { path: String, size: u64, max: u64 },

    /// Parser options could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edition_from_schema_version() {
        assert_eq!(
            Scorm2004Edition::from_schema_version(Some("CAM 1.3")),
            Scorm2004Edition::Second
        );
        assert_eq!(
            Scorm2004Edition::from_schema_version(Some(" 2004 3rd Edition ")),
            Scorm2004Edition::Third
        );
        assert_eq!(
            Scorm2004Edition::from_schema_version(Some("2004 4th edition")),
            Scorm2004Edition::Fourth
        );
        assert_eq!(
            Scorm2004Edition::from_schema_version(Some("1.2")),
            Scorm2004Edition::Unknown
        );
        assert_eq!(
            Scorm2004Edition::from_schema_version(None),
            Scorm2004Edition::Unknown
        );
    }

    #[test]
    fn module_type_names() {
        assert_eq!(ModuleType::Scorm12.to_string(), "SCORM 1.2");
        assert_eq!(ModuleType::Cmi5.name(), "cmi5");
    }

    #[test]
    fn module_type_serializes_snake_case() {
        let json = serde_json::to_string(&ModuleType::Scorm2004).expect("serialize");
        assert_eq!(json, "\"scorm2004\"");
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = PackageError::InvalidPrerequisite {
            expression: "A1 &".to_string(),
            position: 4,
            message: "expected identifier".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid prerequisite 'A1 &' at position 4: expected identifier"
        );
    }
}
