//! # Parser Layer
//!
//! One [`ModuleParser`] per packaging standard, plus the
//! [`ModuleParserFactory`] that detects a package's type and dispatches to
//! the right parser.
//!
//! - Parsers only read through [`FileAccess`]
//! - Every parser returns the typed manifest alongside the derived metadata
//! - Package-wide facts (size on disk, xAPI signature files) are applied
//!   after format-specific parsing, identically for every format

use crate::access::{FileAccess, LimitedFileAccess};
use crate::aicc::{AiccManifest, AiccParser};
use crate::cmi5::{Cmi5Parser, CourseStructure};
use crate::detect::ModuleTypeDetector;
use crate::metadata::ModuleMetadata;
use crate::options::ParserOptions;
use crate::primitives::XAPI_SIGNATURE_FILES;
use crate::scorm12::{Scorm12Manifest, Scorm12Parser};
use crate::scorm2004::{Scorm2004Manifest, Scorm2004Parser};
use crate::types::{ModuleType, PackageError};
use crate::xapi::{TincanManifest, XapiParser};
use crate::xml::{XmlElement, parse_document};
use serde::Serialize;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// The typed manifest of a parsed package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ParsedManifest {
    Scorm12(Box<Scorm12Manifest>),
    Scorm2004(Box<Scorm2004Manifest>),
    Aicc(Box<AiccManifest>),
    Cmi5(Box<CourseStructure>),
    Xapi(Box<TincanManifest>),
}

impl ParsedManifest {
    /// The standard this manifest belongs to.
    #[must_use]
    pub fn module_type(&self) -> ModuleType {
        match self {
            Self::Scorm12(_) => ModuleType::Scorm12,
            Self::Scorm2004(_) => ModuleType::Scorm2004,
            Self::Aicc(_) => ModuleType::Aicc,
            Self::Cmi5(_) => ModuleType::Cmi5,
            Self::Xapi(_) => ModuleType::Xapi,
        }
    }
}

/// Output of a successful parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedModule {
    pub metadata: ModuleMetadata,
    pub manifest: ParsedManifest,
}

// =============================================================================
// PARSER TRAIT
// =============================================================================

/// A parser for one packaging standard.
pub trait ModuleParser {
    /// The standard handled by this parser.
    fn module_type(&self) -> ModuleType;

    /// Read the package's descriptor files and derive its metadata.
    fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError>;
}

// =============================================================================
// FACTORY
// =============================================================================

/// Detects package types and hands out parsers sharing one set of options.
#[derive(Debug, Clone, Default)]
pub struct ModuleParserFactory {
    options: ParserOptions,
}

impl ModuleParserFactory {
    /// Create a factory whose parsers use `options`.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Options handed to every parser.
    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parser for a given standard.
    #[must_use]
    pub fn parser_for(&self, module_type: ModuleType) -> Box<dyn ModuleParser> {
        let options = self.options.clone();
        match module_type {
            ModuleType::Scorm12 => Box::new(Scorm12Parser::new(options)),
            ModuleType::Scorm2004 => Box::new(Scorm2004Parser::new(options)),
            ModuleType::Aicc => Box::new(AiccParser::new(options)),
            ModuleType::Cmi5 => Box::new(Cmi5Parser::new(options)),
            ModuleType::Xapi => Box::new(XapiParser::new(options)),
        }
    }

    /// Detect the package type, then parse with the matching parser.
    pub fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError> {
        let access = &LimitedFileAccess::new(access, self.options.max_file_size);
        let module_type = ModuleTypeDetector::detect(access)?;
        tracing::info!(root = access.root(), %module_type, "detected package type");
        self.parser_for(module_type).parse(access)
    }
}

// =============================================================================
// SHARED PARSER HELPERS
// =============================================================================

/// Locate and parse an XML descriptor at the package root.
///
/// Returns the path as stored in the package together with the root element.
pub(crate) fn read_xml_descriptor(
    access: &dyn FileAccess,
    name: &str,
) -> Result<(String, XmlElement), PackageError> {
    let path = access
        .resolve(name)?
        .ok_or_else(|| PackageError::ManifestNotFound(name.to_string()))?;
    tracing::debug!(path = %path, "reading descriptor");
    let text = access.read_to_string(&path)?;
    let root = parse_document(&text, &path)?;
    Ok((path, root))
}

/// Apply package-wide facts to format-specific metadata.
///
/// - `size_on_disk` when enabled by the options
/// - `xapi_enabled` when any xAPI signature file is present
pub(crate) fn apply_package_facts(
    metadata: &mut ModuleMetadata,
    access: &dyn FileAccess,
    options: &ParserOptions,
) -> Result<(), PackageError> {
    if options.compute_size_on_disk {
        metadata.size_on_disk = Some(access.total_size()?);
    }
    if !metadata.xapi_enabled {
        for name in XAPI_SIGNATURE_FILES {
            if access.contains_file_named(name)? {
                tracing::debug!(file = name, "xAPI signature file present");
                metadata.xapi_enabled = true;
                break;
            }
        }
    }
    Ok(())
}

/// Empty strings count as absent.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// =============================================================================
// TESTS
// =============================================================================
