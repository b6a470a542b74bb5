//! # Package Type Detection
//!
//! Decides which standard a package follows from the descriptor files it
//! contains. Checks run in a fixed order so a package carrying several
//! descriptors (a SCORM package that also ships `tincan.xml`, say) is
//! classified the same way every time:
//!
//! 1. `imsmanifest.xml`: SCORM 2004 or SCORM 1.2
//! 2. `cmi5.xml`: cmi5
//! 3. `tincan.xml` / `tincan.json`: xAPI
//! 4. a `.au` and `.crs` pair: AICC

use crate::access::FileAccess;
use crate::parser::read_xml_descriptor;
use crate::primitives::{
    AICC_AU_EXT, AICC_COURSE_EXT, CMI5_MANIFEST, IMS_MANIFEST, SCORM2004_NAMESPACE_MARKERS,
    TINCAN_JSON_MANIFEST, TINCAN_MANIFEST,
};
use crate::types::{ModuleType, PackageError, Scorm2004Edition};
use crate::xml::XmlElement;

/// Classifies packages by their descriptor files.
pub struct ModuleTypeDetector;

impl ModuleTypeDetector {
    /// Detect the standard a package follows.
    pub fn detect(access: &dyn FileAccess) -> Result<ModuleType, PackageError> {
        if access.resolve(IMS_MANIFEST)?.is_some() {
            let (_, root) = read_xml_descriptor(access, IMS_MANIFEST)?;
            return Ok(Self::scorm_version(&root));
        }
        if access.resolve(CMI5_MANIFEST)?.is_some() {
            return Ok(ModuleType::Cmi5);
        }
        if access.resolve(TINCAN_MANIFEST)?.is_some()
            || access.resolve(TINCAN_JSON_MANIFEST)?.is_some()
        {
            return Ok(ModuleType::Xapi);
        }
        if !access.files_with_extension(AICC_AU_EXT)?.is_empty()
            && !access.files_with_extension(AICC_COURSE_EXT)?.is_empty()
        {
            return Ok(ModuleType::Aicc);
        }
        tracing::debug!(root = access.root(), "no known descriptor files");
        Err(PackageError::UnknownModuleType)
    }

    /// SCORM 2004 when the manifest declares a 2004-only namespace or a
    /// 2004 schema version, SCORM 1.2 otherwise.
    #[must_use]
    pub fn scorm_version(manifest: &XmlElement) -> ModuleType {
        let namespaces = manifest.declared_namespaces();
        let has_marker = namespaces.iter().any(|ns| {
            let ns = ns.to_ascii_lowercase();
            SCORM2004_NAMESPACE_MARKERS
                .iter()
                .any(|marker| ns.contains(marker))
        });
        let schema_version = manifest
            .child("metadata")
            .and_then(|m| m.child_text("schemaversion"));
        if has_marker || schema_version.is_some_and(Scorm2004Edition::is_scorm2004_version) {
            ModuleType::Scorm2004
        } else {
            ModuleType::Scorm12
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemoryFileAccess;

    const SCORM12: &str = r#"<manifest identifier="m"
    xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
    xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
  <metadata><schema>ADL SCORM</schema><schemaversion>1.2</schemaversion></metadata>
</manifest>"#;

    fn detect(access: &MemoryFileAccess) -> Result<ModuleType, PackageError> {
        ModuleTypeDetector::detect(access)
    }

    #[test]
    fn detects_scorm12() {
        let access = MemoryFileAccess::new("p").with_file("imsmanifest.xml", SCORM12);
        assert_eq!(detect(&access).expect("detect"), ModuleType::Scorm12);
    }

    #[test]
    fn detects_scorm2004_by_namespace() {
        let access = MemoryFileAccess::new("p").with_file(
            "imsmanifest.xml",
            r#"<manifest xmlns:imsss="http://www.imsglobal.org/xsd/imsss"/>"#,
        );
        assert_eq!(detect(&access).expect("detect"), ModuleType::Scorm2004);
    }

    #[test]
    fn detects_scorm2004_by_schema_version() {
        let access = MemoryFileAccess::new("p").with_file(
            "IMSMANIFEST.XML",
            "<manifest><metadata><schemaversion>2004 3rd Edition</schemaversion></metadata></manifest>",
        );
        assert_eq!(detect(&access).expect("detect"), ModuleType::Scorm2004);
    }

    #[test]
    fn manifest_wins_over_tincan() {
        let access = MemoryFileAccess::new("p")
            .with_file("imsmanifest.xml", SCORM12)
            .with_file("tincan.xml", "<tincan/>");
        assert_eq!(detect(&access).expect("detect"), ModuleType::Scorm12);
    }

    #[test]
    fn detects_other_formats() {
        let cmi5 = MemoryFileAccess::new("p").with_file("cmi5.xml", "<courseStructure/>");
        assert_eq!(detect(&cmi5).expect("detect"), ModuleType::Cmi5);

        let json = MemoryFileAccess::new("p").with_file("tincan.json", "{}");
        assert_eq!(detect(&json).expect("detect"), ModuleType::Xapi);

        let aicc = MemoryFileAccess::new("p")
            .with_file("course/C.AU", "")
            .with_file("course/c.crs", "");
        assert_eq!(detect(&aicc).expect("detect"), ModuleType::Aicc);
    }

    #[test]
    fn lone_au_file_is_unknown() {
        let access = MemoryFileAccess::new("p").with_file("c.au", "");
        assert!(matches!(detect(&access), Err(PackageError::UnknownModuleType)));
    }
}
