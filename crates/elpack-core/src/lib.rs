//! # elpack-core
//!
//! Data models and parsers for e-learning content packages.
//!
//! Given a package (a directory on disk or an in-memory file set), the
//! library detects which standard it follows, parses its descriptor files
//! into strongly typed models and derives a uniform [`ModuleMetadata`]
//! summary: title, description, launch URL, duration and the values only
//! one standard defines.
//!
//! ## Supported Standards
//!
//! - SCORM 1.2 and SCORM 2004 (2nd, 3rd and 4th edition), including IMS
//!   Simple Sequencing and IEEE LOM metadata
//! - AICC course structure files and prerequisite expressions
//! - cmi5 course structures
//! - xAPI / TinCan descriptors
//!
//! ## Architectural Constraints
//!
//! - Read-only: packages are never modified
//! - Files are reached only through [`FileAccess`]
//! - Parsing never panics; malformed input is reported as [`PackageError`]
//! - Has NO async, NO network dependencies (pure Rust)

#[macro_use]
mod macros;

// =============================================================================
// MODULES
// =============================================================================

pub mod access;
pub mod aicc;
pub mod cmi5;
pub mod cp;
pub mod detect;
pub mod duration;
pub mod launch;
pub mod lom;
pub mod metadata;
pub mod options;
pub mod parser;
pub mod primitives;
pub mod scorm12;
pub mod scorm2004;
pub mod types;
pub mod xapi;
pub mod xml;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ModuleType, PackageError, Scorm2004Edition};

// =============================================================================
// RE-EXPORTS: Package Access
// =============================================================================

pub use access::{FileAccess, LimitedFileAccess, LocalFileAccess, MemoryFileAccess};

// =============================================================================
// RE-EXPORTS: Parsing
// =============================================================================

pub use detect::ModuleTypeDetector;
pub use metadata::{FormatDetails, ModuleMetadata};
pub use options::ParserOptions;
pub use parser::{ModuleParser, ModuleParserFactory, ParsedManifest, ParsedModule};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use aicc::{AiccManifest, AiccParser, PrerequisiteExpression};
pub use cmi5::{Cmi5Parser, CourseStructure};
pub use lom::Lom;
pub use scorm12::{Scorm12Manifest, Scorm12Parser};
pub use scorm2004::{Scorm2004Manifest, Scorm2004Parser};
pub use xapi::{TincanManifest, XapiParser};
