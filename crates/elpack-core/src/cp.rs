//! # IMS Content Packaging
//!
//! Elements shared by the SCORM 1.2 and SCORM 2004 manifests: the
//! `<metadata>` block, `<resources>`, and the item-tree traversal used to
//! resolve a launch URL. Organization and item types differ between the
//! two SCORM versions and live in their own modules; they plug into the
//! traversal through [`ContentItem`].

use crate::access::{FileAccess, parent_dir};
use crate::launch::{append_parameters, join_base};
use crate::lom::Lom;
use crate::options::ParserOptions;
use crate::primitives::MAX_TREE_DEPTH;
use crate::xml::{XmlElement, parse_document};
use crate::PackageError;
use serde::{Deserialize, Serialize};

// =============================================================================
// METADATA
// =============================================================================

/// A `<metadata>` block of a manifest, organization, item, resource or file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// `<schema>`, e.g. "ADL SCORM".
    pub schema: Option<String>,
    /// `<schemaversion>`, e.g. "1.2" or "2004 4th Edition".
    pub schema_version: Option<String>,
    /// `adlcp:location` of an external LOM document.
    pub location: Option<String>,
    /// Inline LOM, or the external one once resolved.
    pub lom: Option<Lom>,
}

impl ManifestMetadata {
    /// Read a `<metadata>` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            schema: element.child_string("schema"),
            schema_version: element.child_string("schemaversion"),
            location: element.child_string("location"),
            lom: Lom::find_in(element),
        }
    }

    /// Read the optional `<metadata>` child of `parent`.
    #[must_use]
    pub fn child_of(parent: &XmlElement) -> Option<Self> {
        parent.child("metadata").map(Self::from_element)
    }

    /// Replace a missing inline LOM with the external document named by
    /// `location`, resolved relative to the manifest's directory.
    ///
    /// A missing or malformed external document is logged and skipped.
    pub fn resolve_external(
        &mut self,
        access: &dyn FileAccess,
        manifest_path: &str,
        options: &ParserOptions,
    ) -> Result<(), PackageError> {
        if self.lom.is_some() || !options.resolve_external_metadata {
            return Ok(());
        }
        let Some(location) = self.location.as_deref() else {
            return Ok(());
        };
        let candidate = format!("{}{}", parent_dir(manifest_path), location);
        let path = match access.resolve(&candidate) {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::warn!(location, "external metadata file not found");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(location, error = %e, "skipping unresolvable external metadata");
                return Ok(());
            }
        };
        let text = match access.read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "skipping unreadable external metadata");
                return Ok(());
            }
        };
        match parse_document(&text, &path) {
            Ok(root) => {
                tracing::debug!(path = %path, "resolved external LOM metadata");
                self.lom = Lom::find_in(&root);
            }
            Err(e) => tracing::warn!(path = %path, error = %e, "skipping malformed external metadata"),
        }
        Ok(())
    }
}

// =============================================================================
// RESOURCES
// =============================================================================

/// `adlcp:scormtype` (1.2) / `adlcp:scormType` (2004).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScormType {
    Sco,
    Asset,
}

impl ScormType {
    fn parse(value: &str) -> Result<Self, PackageError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sco" => Ok(Self::Sco),
            "asset" => Ok(Self::Asset),
            other => Err(PackageError::InvalidManifest(format!(
                "unknown scormType '{}'",
                other
            ))),
        }
    }
}

/// A `<file>` entry of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceFile {
    pub href: String,
    pub metadata: Option<ManifestMetadata>,
}

/// A `<resource>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub identifier: String,
    /// The `type` attribute, normally "webcontent".
    pub kind: Option<String>,
    pub scorm_type: Option<ScormType>,
    pub href: Option<String>,
    /// `xml:base`
    pub base: Option<String>,
    pub files: Vec<ResourceFile>,
    /// `identifierref`s of `<dependency>` children.
    pub dependencies: Vec<String>,
    pub metadata: Option<ManifestMetadata>,
}

impl Resource {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let identifier = element.attr_string("identifier").ok_or_else(|| {
            PackageError::InvalidManifest("resource without identifier".to_string())
        })?;
        let scorm_type = element
            .attr_trimmed("scormType")
            .map(ScormType::parse)
            .transpose()?;
        Ok(Self {
            identifier,
            kind: element.attr_string("type"),
            scorm_type,
            href: element.attr_string("href"),
            base: element.attr_string("base"),
            files: element
                .children("file")
                .filter_map(|file| {
                    file.attr_string("href").map(|href| ResourceFile {
                        href,
                        metadata: ManifestMetadata::child_of(file),
                    })
                })
                .collect(),
            dependencies: element
                .children("dependency")
                .filter_map(|dep| dep.attr_string("identifierref"))
                .collect(),
            metadata: ManifestMetadata::child_of(element),
        })
    }

    /// Whether this resource is a SCO (talks to the LMS runtime).
    #[must_use]
    pub fn is_sco(&self) -> bool {
        self.scorm_type == Some(ScormType::Sco)
    }
}

/// The `<resources>` block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// `xml:base`
    pub base: Option<String>,
    pub items: Vec<Resource>,
}

impl Resources {
    /// Read a `<resources>` element.
    pub fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            base: element.attr_string("base"),
            items: element
                .children("resource")
                .map(Resource::from_element)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Resource by identifier.
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&Resource> {
        self.items.iter().find(|r| r.identifier == identifier)
    }
}

// =============================================================================
// ITEM TRAVERSAL
// =============================================================================

/// An `<item>` of an organization tree, as seen by the launch traversal.
pub trait ContentItem: Sized {
    fn identifier(&self) -> &str;
    fn identifier_ref(&self) -> Option<&str>;
    fn parameters(&self) -> Option<&str>;
    fn child_items(&self) -> &[Self];
}

/// Visit every item in pre-order.
pub fn walk_items<'a, I: ContentItem>(items: &'a [I], visit: &mut impl FnMut(&'a I)) {
    fn walk<'a, I: ContentItem>(items: &'a [I], depth: usize, visit: &mut impl FnMut(&'a I)) {
        if depth > MAX_TREE_DEPTH {
            tracing::warn!(depth, "item tree too deep; ignoring deeper items");
            return;
        }
        for item in items {
            visit(item);
            walk(item.child_items(), depth + 1, visit);
        }
    }
    walk(items, 0, visit);
}

/// Depth-first search for the first item that references a resource with an href.
#[must_use]
pub fn find_launch_item<'a, I: ContentItem>(
    items: &'a [I],
    resources: &'a Resources,
) -> Option<(&'a I, &'a Resource)> {
    let mut found = None;
    walk_items(items, &mut |item: &'a I| {
        if found.is_some() {
            return;
        }
        let Some(reference) = item.identifier_ref() else {
            return;
        };
        match resources.find(reference) {
            Some(resource) if resource.href.is_some() => found = Some((item, resource)),
            Some(_) => {}
            None => tracing::warn!(
                item = item.identifier(),
                identifierref = reference,
                "item references an unknown resource"
            ),
        }
    });
    found
}

/// Full launch URL of `item` delivered through `resource`.
#[must_use]
pub fn item_launch_url<I: ContentItem>(
    item: &I,
    resource: &Resource,
    resources: &Resources,
) -> Option<String> {
    let href = resource.href.as_deref()?;
    let url = join_base(&[resources.base.as_deref(), resource.base.as_deref()], href);
    Some(append_parameters(&url, item.parameters()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemoryFileAccess;

    struct TestItem {
        id: &'static str,
        reference: Option<&'static str>,
        parameters: Option<&'static str>,
        children: Vec<TestItem>,
    }

    impl ContentItem for TestItem {
        fn identifier(&self) -> &str {
            self.id
        }
        fn identifier_ref(&self) -> Option<&str> {
            self.reference
        }
        fn parameters(&self) -> Option<&str> {
            self.parameters
        }
        fn child_items(&self) -> &[Self] {
            &self.children
        }
    }

    fn resources() -> Resources {
        let root = parse_document(
            r#"<resources xml:base="content/">
                 <resource identifier="ASSET" type="webcontent" scormtype="asset"/>
                 <resource identifier="SCO1" type="webcontent" adlcp:scormtype="sco" href="sco1/index.html" xmlns:adlcp="x">
                   <file href="sco1/index.html"/>
                   <dependency identifierref="COMMON"/>
                 </resource>
               </resources>"#,
            "imsmanifest.xml",
        )
        .expect("xml");
        Resources::from_element(&root).expect("resources")
    }

    #[test]
    fn parses_resources() {
        let resources = resources();
        assert_eq!(resources.base.as_deref(), Some("content/"));
        let sco = resources.find("SCO1").expect("sco");
        assert!(sco.is_sco());
        assert_eq!(sco.files.len(), 1);
        assert_eq!(sco.dependencies, vec!["COMMON".to_string()]);
        assert!(!resources.find("ASSET").expect("asset").is_sco());
    }

    #[test]
    fn resource_requires_identifier() {
        let root = parse_document("<resources><resource href='a.html'/></resources>", "m.xml")
            .expect("xml");
        assert!(Resources::from_element(&root).is_err());
    }

    #[test]
    fn launch_item_skips_hrefless_and_unknown_resources() {
        let items = vec![TestItem {
            id: "ROOT",
            reference: None,
            parameters: None,
            children: vec![
                TestItem { id: "A", reference: Some("MISSING"), parameters: None, children: vec![] },
                TestItem { id: "B", reference: Some("ASSET"), parameters: None, children: vec![] },
                TestItem { id: "C", reference: Some("SCO1"), parameters: Some("?lesson=1"), children: vec![] },
            ],
        }];
        let resources = resources();
        let (item, resource) = find_launch_item(&items, &resources).expect("launch");
        assert_eq!(item.id, "C");
        assert_eq!(
            item_launch_url(item, resource, &resources).as_deref(),
            Some("content/sco1/index.html?lesson=1")
        );
    }

    #[test]
    fn walk_visits_pre_order() {
        let items = vec![TestItem {
            id: "1",
            reference: None,
            parameters: None,
            children: vec![TestItem { id: "1.1", reference: None, parameters: None, children: vec![] }],
        }, TestItem { id: "2", reference: None, parameters: None, children: vec![] }];
        let mut seen = Vec::new();
        walk_items(&items, &mut |item: &TestItem| seen.push(item.id));
        assert_eq!(seen, vec!["1", "1.1", "2"]);
    }

    #[test]
    fn resolves_external_metadata_relative_to_manifest() {
        let access = MemoryFileAccess::new("pkg")
            .with_file("course/imsmanifest.xml", "<manifest/>")
            .with_file(
                "course/meta/lom.xml",
                "<lom><general><title><string>External</string></title></general></lom>",
            );
        let mut metadata = ManifestMetadata {
            location: Some("meta/lom.xml".to_string()),
            ..ManifestMetadata::default()
        };
        metadata
            .resolve_external(&access, "course/imsmanifest.xml", &ParserOptions::default())
            .expect("resolve");
        assert_eq!(metadata.lom.expect("lom").title("en"), Some("External"));
    }

    #[test]
    fn missing_external_metadata_is_skipped() {
        let access = MemoryFileAccess::new("pkg");
        let mut metadata = ManifestMetadata {
            location: Some("nope.xml".to_string()),
            ..ManifestMetadata::default()
        };
        metadata
            .resolve_external(&access, "imsmanifest.xml", &ParserOptions::default())
            .expect("resolve");
        assert!(metadata.lom.is_none());
    }

    #[test]
    fn escaping_external_location_is_skipped() {
        let access = MemoryFileAccess::new("pkg").with_file("imsmanifest.xml", "<manifest/>");
        let mut metadata = ManifestMetadata {
            location: Some("../../etc/lom.xml".to_string()),
            ..ManifestMetadata::default()
        };
        metadata
            .resolve_external(&access, "imsmanifest.xml", &ParserOptions::default())
            .expect("resolve");
        assert!(metadata.lom.is_none());
    }

    #[test]
    fn oversized_external_metadata_is_skipped() {
        let access = MemoryFileAccess::new("pkg")
            .with_max_file_size(16)
            .with_file(
                "lom.xml",
                "<lom><general><title><string>Too big to read</string></title></general></lom>",
            );
        let mut metadata = ManifestMetadata {
            location: Some("lom.xml".to_string()),
            ..ManifestMetadata::default()
        };
        metadata
            .resolve_external(&access, "imsmanifest.xml", &ParserOptions::default())
            .expect("resolve");
        assert!(metadata.lom.is_none());
    }
}
