//! # Package Primitives
//!
//! Well-known file names, namespace markers and limits shared by the
//! detectors and parsers.

/// IMS Content Packaging manifest (SCORM 1.2 and SCORM 2004).
pub const IMS_MANIFEST: &str = "imsmanifest.xml";

/// cmi5 course structure file.
pub const CMI5_MANIFEST: &str = "cmi5.xml";

/// TinCan / xAPI package descriptor.
pub const TINCAN_MANIFEST: &str = "tincan.xml";

/// JSON variant of the TinCan descriptor.
pub const TINCAN_JSON_MANIFEST: &str = "tincan.json";

/// AICC descriptor file extensions.
pub const AICC_COURSE_EXT: &str = "crs";
pub const AICC_AU_EXT: &str = "au";
pub const AICC_DESCRIPTOR_EXT: &str = "des";
pub const AICC_STRUCTURE_EXT: &str = "cst";
pub const AICC_PREREQUISITE_EXT: &str = "pre";
pub const AICC_OBJECTIVE_EXT: &str = "ort";

/// Files whose presence anywhere in a package marks it as xAPI-enabled.
pub const XAPI_SIGNATURE_FILES: [&str; 3] = [TINCAN_MANIFEST, "xAPI.js", "sendStatement.js"];

/// Namespace fragments that only appear in SCORM 2004 manifests.
pub const SCORM2004_NAMESPACE_MARKERS: [&str; 3] = ["adlcp_v1p3", "imsss", "adlseq_v1p3"];

/// Namespace fragment of the ADL sequencing extensions (`adlseq:`).
pub const ADLSEQ_NAMESPACE_MARKER: &str = "adlseq";

/// Default upper bound for a single file read from a package (50 MiB).
///
/// Manifests are small; anything larger is almost certainly not a descriptor
/// and is refused rather than buffered.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default language used when choosing between localized strings.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Maximum nesting depth accepted when walking item/block trees.
///
/// Guards recursive traversals against pathological manifests.
pub const MAX_TREE_DEPTH: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_files_include_tincan_manifest() {
        assert!(XAPI_SIGNATURE_FILES.contains(&TINCAN_MANIFEST));
    }

    #[test]
    fn default_max_file_size_is_fifty_mib() {
        assert_eq!(DEFAULT_MAX_FILE_SIZE, 52_428_800);
    }
}
