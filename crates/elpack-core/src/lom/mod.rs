//! # IEEE LOM Metadata
//!
//! Typed mapping of the Learning Object Metadata categories carried inside
//! SCORM manifests, either inline under `<metadata>` or in an external file
//! referenced by `adlcp:location`.
//!
//! Two dialects are accepted transparently:
//! - IMS MD 1.2.1 (SCORM 1.2): `<langstring xml:lang>`, `<datetime>`,
//!   vocabulary values wrapped in langstrings, `<catalogentry>`
//! - IEEE LOMv1.0 (SCORM 2004): `<string language>`, `<dateTime>`,
//!   `<duration>`, bare vocabulary values, `<identifier>`
//!
//! LOM is descriptive only, so parsing is lenient: unparseable numeric
//! values are logged and dropped instead of failing the whole package.

mod langstring;

pub use langstring::{LangString, LangStrings};

use crate::duration::{parse_iso8601, parse_timespan};
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// SHARED VALUE TYPES
// =============================================================================

/// A vocabulary entry: the vocabulary `source` and the chosen `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceValuePair {
    pub source: Option<String>,
    pub value: Option<String>,
}

impl SourceValuePair {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            source: element.child("source").and_then(plain_text),
            value: element.child("value").and_then(plain_text),
        }
    }
}

/// A catalog identifier (`<identifier>` in LOMv1.0, `<catalogentry>` in IMS MD).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identifier {
    pub catalog: Option<String>,
    pub entry: Option<String>,
}

impl Identifier {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            catalog: element.child("catalog").and_then(plain_text),
            entry: element.child("entry").and_then(plain_text),
        }
    }

    fn all_in(element: &XmlElement) -> Vec<Self> {
        element
            .children("identifier")
            .chain(element.children("catalogentry"))
            .map(Self::from_element)
            .collect()
    }
}

/// A contribution to the life cycle or metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contribute {
    pub role: Option<SourceValuePair>,
    /// vCard strings.
    pub entities: Vec<String>,
    pub date: Option<String>,
}

impl Contribute {
    fn from_element(element: &XmlElement) -> Self {
        let entities = element
            .children("entity")
            .filter_map(|e| e.text().map(str::to_string))
            .chain(
                element
                    .children("centity")
                    .filter_map(|e| e.child_string("vcard").or_else(|| e.text().map(str::to_string))),
            )
            .collect();
        Self {
            role: element.child("role").map(SourceValuePair::from_element),
            entities,
            date: element.child("date").and_then(wrapped_value),
        }
    }
}

// =============================================================================
// CATEGORIES
// =============================================================================

/// 1. General
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct General {
    pub identifiers: Vec<Identifier>,
    pub title: LangStrings,
    pub languages: Vec<String>,
    pub descriptions: Vec<LangStrings>,
    pub keywords: Vec<LangStrings>,
    pub coverages: Vec<LangStrings>,
    pub structure: Option<SourceValuePair>,
    pub aggregation_level: Option<SourceValuePair>,
}

impl General {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            identifiers: Identifier::all_in(element),
            title: element
                .child("title")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
            languages: texts(element, "language"),
            descriptions: lang_strings_list(element, "description"),
            keywords: lang_strings_list(element, "keyword"),
            coverages: lang_strings_list(element, "coverage"),
            structure: element.child("structure").map(SourceValuePair::from_element),
            aggregation_level: element
                .child("aggregationLevel")
                .map(SourceValuePair::from_element),
        }
    }
}

/// 2. Life Cycle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifeCycle {
    pub version: LangStrings,
    pub status: Option<SourceValuePair>,
    pub contributes: Vec<Contribute>,
}

impl LifeCycle {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            version: element
                .child("version")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
            status: element.child("status").map(SourceValuePair::from_element),
            contributes: element
                .children("contribute")
                .map(Contribute::from_element)
                .collect(),
        }
    }
}

/// 3. Meta-Metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetaMetadata {
    pub identifiers: Vec<Identifier>,
    pub contributes: Vec<Contribute>,
    pub metadata_schemas: Vec<String>,
    pub language: Option<String>,
}

impl MetaMetadata {
    fn from_element(element: &XmlElement) -> Self {
        let mut metadata_schemas = texts(element, "metadataSchema");
        metadata_schemas.extend(texts(element, "metadatascheme"));
        Self {
            identifiers: Identifier::all_in(element),
            contributes: element
                .children("contribute")
                .map(Contribute::from_element)
                .collect(),
            metadata_schemas,
            language: element.child_string("language"),
        }
    }
}

/// A technical requirement (one alternative of an `orComposite`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: Option<SourceValuePair>,
    pub name: Option<SourceValuePair>,
    pub minimum_version: Option<String>,
    pub maximum_version: Option<String>,
}

impl Requirement {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            kind: element.child("type").map(SourceValuePair::from_element),
            name: element.child("name").map(SourceValuePair::from_element),
            minimum_version: element.child_string("minimumVersion"),
            maximum_version: element.child_string("maximumVersion"),
        }
    }
}

/// 4. Technical
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Technical {
    pub formats: Vec<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    pub locations: Vec<String>,
    pub requirements: Vec<Requirement>,
    pub installation_remarks: LangStrings,
    pub other_platform_requirements: LangStrings,
    pub duration: Option<String>,
}

impl Technical {
    fn from_element(element: &XmlElement) -> Self {
        let requirements = element
            .children("requirement")
            .flat_map(|requirement| {
                let composites: Vec<&XmlElement> = requirement.children("orComposite").collect();
                if composites.is_empty() {
                    vec![Requirement::from_element(requirement)]
                } else {
                    composites.into_iter().map(Requirement::from_element).collect()
                }
            })
            .collect();

        let size = element.child_text("size").and_then(|raw| match raw.parse() {
            Ok(size) => Some(size),
            Err(_) => {
                tracing::warn!(value = raw, "ignoring non-numeric LOM technical size");
                None
            }
        });

        Self {
            formats: texts(element, "format"),
            size,
            locations: texts(element, "location"),
            requirements,
            installation_remarks: element
                .child("installationRemarks")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
            other_platform_requirements: element
                .child("otherPlatformRequirements")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
            duration: element.child("duration").and_then(wrapped_value),
        }
    }
}

/// 5. Educational
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Educational {
    pub interactivity_type: Option<SourceValuePair>,
    pub learning_resource_types: Vec<SourceValuePair>,
    pub interactivity_level: Option<SourceValuePair>,
    pub semantic_density: Option<SourceValuePair>,
    pub intended_end_user_roles: Vec<SourceValuePair>,
    pub contexts: Vec<SourceValuePair>,
    pub typical_age_ranges: Vec<LangStrings>,
    pub difficulty: Option<SourceValuePair>,
    pub typical_learning_time: Option<String>,
    pub descriptions: Vec<LangStrings>,
    pub languages: Vec<String>,
}

impl Educational {
    fn from_element(element: &XmlElement) -> Self {
        let vocab = |name: &str| element.child(name).map(SourceValuePair::from_element);
        let vocab_list = |name: &str| {
            element
                .children(name)
                .map(SourceValuePair::from_element)
                .collect::<Vec<_>>()
        };
        Self {
            interactivity_type: vocab("interactivityType"),
            learning_resource_types: vocab_list("learningResourceType"),
            interactivity_level: vocab("interactivityLevel"),
            semantic_density: vocab("semanticDensity"),
            intended_end_user_roles: vocab_list("intendedEndUserRole"),
            contexts: vocab_list("context"),
            typical_age_ranges: lang_strings_list(element, "typicalAgeRange"),
            difficulty: vocab("difficulty"),
            typical_learning_time: element.child("typicalLearningTime").and_then(wrapped_value),
            descriptions: lang_strings_list(element, "description"),
            languages: texts(element, "language"),
        }
    }
}

/// 6. Rights
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rights {
    pub cost: Option<SourceValuePair>,
    pub copyright_and_other_restrictions: Option<SourceValuePair>,
    pub description: LangStrings,
}

impl Rights {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            cost: element.child("cost").map(SourceValuePair::from_element),
            copyright_and_other_restrictions: element
                .child("copyrightAndOtherRestrictions")
                .map(SourceValuePair::from_element),
            description: element
                .child("description")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
        }
    }
}

/// 7. Relation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relation {
    pub kind: Option<SourceValuePair>,
    pub resource_identifiers: Vec<Identifier>,
    pub resource_descriptions: Vec<LangStrings>,
}

impl Relation {
    fn from_element(element: &XmlElement) -> Self {
        let resource = element.child("resource");
        Self {
            kind: element.child("kind").map(SourceValuePair::from_element),
            resource_identifiers: resource.map(Identifier::all_in).unwrap_or_default(),
            resource_descriptions: resource
                .map(|r| lang_strings_list(r, "description"))
                .unwrap_or_default(),
        }
    }
}

/// 8. Annotation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotation {
    pub entity: Option<String>,
    pub date: Option<String>,
    pub description: LangStrings,
}

impl Annotation {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            entity: element.child_string("entity").or_else(|| {
                element
                    .child("person")
                    .and_then(|p| p.child_string("vcard"))
            }),
            date: element.child("date").and_then(wrapped_value),
            description: element
                .child("description")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
        }
    }
}

/// A single taxon of a classification path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Taxon {
    pub id: Option<String>,
    pub entry: LangStrings,
}

/// A classification path through a taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxonPath {
    pub source: LangStrings,
    pub taxons: Vec<Taxon>,
}

/// 9. Classification
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub purpose: Option<SourceValuePair>,
    pub taxon_paths: Vec<TaxonPath>,
    pub description: LangStrings,
    pub keywords: Vec<LangStrings>,
}

impl Classification {
    fn from_element(element: &XmlElement) -> Self {
        let taxon_paths = element
            .children("taxonPath")
            .map(|path| TaxonPath {
                source: path
                    .child("source")
                    .map(LangStrings::from_container)
                    .unwrap_or_default(),
                taxons: path
                    .children("taxon")
                    .map(|taxon| Taxon {
                        id: taxon.child_string("id"),
                        entry: taxon
                            .child("entry")
                            .map(LangStrings::from_container)
                            .unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            purpose: element.child("purpose").map(SourceValuePair::from_element),
            taxon_paths,
            description: element
                .child("description")
                .map(LangStrings::from_container)
                .unwrap_or_default(),
            keywords: lang_strings_list(element, "keyword"),
        }
    }
}

// =============================================================================
// LOM RECORD
// =============================================================================

/// A complete LOM record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lom {
    pub general: Option<General>,
    pub life_cycle: Option<LifeCycle>,
    pub meta_metadata: Option<MetaMetadata>,
    pub technical: Option<Technical>,
    pub educational: Vec<Educational>,
    pub rights: Option<Rights>,
    pub relations: Vec<Relation>,
    pub annotations: Vec<Annotation>,
    pub classifications: Vec<Classification>,
}

impl Lom {
    /// Build a record from a `<lom>` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            general: element.child("general").map(General::from_element),
            life_cycle: element.child("lifeCycle").map(LifeCycle::from_element),
            meta_metadata: element.child("metaMetadata").map(MetaMetadata::from_element),
            technical: element.child("technical").map(Technical::from_element),
            educational: element
                .children("educational")
                .map(Educational::from_element)
                .collect(),
            rights: element.child("rights").map(Rights::from_element),
            relations: element.children("relation").map(Relation::from_element).collect(),
            annotations: element
                .children("annotation")
                .map(Annotation::from_element)
                .collect(),
            classifications: element
                .children("classification")
                .map(Classification::from_element)
                .collect(),
        }
    }

    /// Find a `<lom>` record in a `<metadata>` container (or the element itself).
    #[must_use]
    pub fn find_in(element: &XmlElement) -> Option<Self> {
        if element.is("lom") {
            return Some(Self::from_element(element));
        }
        element.child("lom").map(Self::from_element)
    }

    /// General title in the preferred language.
    #[must_use]
    pub fn title(&self, language: &str) -> Option<&str> {
        self.general.as_ref()?.title.best(language)
    }

    /// First general description in the preferred language.
    #[must_use]
    pub fn description(&self, language: &str) -> Option<&str> {
        self.general
            .as_ref()?
            .descriptions
            .iter()
            .find_map(|d| d.best(language))
    }

    /// Life-cycle version string.
    #[must_use]
    pub fn version(&self, language: &str) -> Option<&str> {
        self.life_cycle.as_ref()?.version.best(language)
    }

    /// Keywords of the general category, in the preferred language.
    #[must_use]
    pub fn keywords(&self, language: &str) -> Vec<&str> {
        self.general
            .as_ref()
            .map(|g| g.keywords.iter().filter_map(|k| k.best(language)).collect())
            .unwrap_or_default()
    }

    /// First educational typical learning time, as a duration.
    ///
    /// Accepts ISO 8601 durations and CMI timespans.
    #[must_use]
    pub fn typical_learning_time(&self) -> Option<Duration> {
        let raw = self
            .educational
            .iter()
            .find_map(|e| e.typical_learning_time.as_deref())?;
        match parse_iso8601(raw).or_else(|_| parse_timespan(raw)) {
            Ok(duration) => Some(duration),
            Err(e) => {
                tracing::warn!(value = raw, error = %e, "ignoring LOM typical learning time");
                None
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Text of an element that may wrap its value in a `<langstring>`/`<string>`.
fn plain_text(element: &XmlElement) -> Option<String> {
    element
        .child("langstring")
        .or_else(|| element.child("string"))
        .and_then(XmlElement::text)
        .or_else(|| element.text())
        .map(str::to_string)
}

/// Text of a date or duration container (`<dateTime>`, `<datetime>`,
/// `<duration>`, or bare text).
fn wrapped_value(element: &XmlElement) -> Option<String> {
    element
        .child("dateTime")
        .or_else(|| element.child("duration"))
        .and_then(XmlElement::text)
        .or_else(|| element.text())
        .map(str::to_string)
}

fn texts(element: &XmlElement, name: &str) -> Vec<String> {
    element
        .children(name)
        .filter_map(|e| e.text().map(str::to_string))
        .collect()
}

fn lang_strings_list(element: &XmlElement, name: &str) -> Vec<LangStrings> {
    element
        .children(name)
        .map(LangStrings::from_container)
        .filter(|strings| !strings.is_empty())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    const LOM_2004: &str = r#"<lom xmlns="http://ltsc.ieee.org/xsd/LOM">
  <general>
    <identifier><catalog>URI</catalog><entry>com.example.course</entry></identifier>
    <title>
      <string language="fr">Cours de sécurité</string>
      <string language="en-US">Safety Course</string>
    </title>
    <language>en</language>
    <description><string language="en">Covers the basics.</string></description>
    <keyword><string language="en">safety</string></keyword>
    <keyword><string language="en">training</string></keyword>
    <structure><source>LOMv1.0</source><value>hierarchical</value></structure>
  </general>
  <lifeCycle>
    <version><string language="en">2.1</string></version>
    <status><source>LOMv1.0</source><value>final</value></status>
    <contribute>
      <role><source>LOMv1.0</source><value>author</value></role>
      <entity>BEGIN:VCARD FN:Jane Doe END:VCARD</entity>
      <date><dateTime>2020-05-01</dateTime></date>
    </contribute>
  </lifeCycle>
  <technical>
    <format>text/html</format>
    <size>2048</size>
    <location>index.html</location>
    <requirement>
      <orComposite>
        <type><source>LOMv1.0</source><value>browser</value></type>
        <name><source>LOMv1.0</source><value>any</value></name>
      </orComposite>
    </requirement>
    <duration><duration>PT10M</duration></duration>
  </technical>
  <educational>
    <interactivityType><source>LOMv1.0</source><value>active</value></interactivityType>
    <learningResourceType><source>LOMv1.0</source><value>exercise</value></learningResourceType>
    <typicalLearningTime><duration>PT1H30M</duration></typicalLearningTime>
  </educational>
  <rights>
    <cost><source>LOMv1.0</source><value>no</value></cost>
    <copyrightAndOtherRestrictions><source>LOMv1.0</source><value>yes</value></copyrightAndOtherRestrictions>
  </rights>
  <classification>
    <purpose><source>LOMv1.0</source><value>discipline</value></purpose>
    <taxonPath>
      <source><string language="en">ACM</string></source>
      <taxon><id>D.2</id><entry><string language="en">Software</string></entry></taxon>
    </taxonPath>
  </classification>
</lom>"#;

    const LOM_12: &str = r#"<lom xmlns="http://www.imsglobal.org/xsd/imsmd_rootv1p2p1">
  <general>
    <catalogentry><catalog>ISBN</catalog><entry><langstring xml:lang="x-none">0-000</langstring></entry></catalogentry>
    <title><langstring xml:lang="en">Legacy Course</langstring></title>
    <description><langstring xml:lang="en">Old but gold.</langstring></description>
    <structure>
      <source><langstring xml:lang="x-none">LOMv1.0</langstring></source>
      <value><langstring xml:lang="x-none">Hierarchical</langstring></value>
    </structure>
  </general>
  <lifecycle>
    <version><langstring xml:lang="en">1.0</langstring></version>
    <contribute>
      <role><source><langstring xml:lang="x-none">LOMv1.0</langstring></source><value><langstring xml:lang="x-none">Author</langstring></value></role>
      <centity><vcard>BEGIN:VCARD FN:John END:VCARD</vcard></centity>
      <date><datetime>2001-01-01</datetime></date>
    </contribute>
  </lifecycle>
  <metametadata><metadatascheme>IMS 1.2</metadatascheme></metametadata>
  <educational>
    <typicallearningtime><datetime>0000:45:00</datetime></typicallearningtime>
  </educational>
</lom>"#;

    #[test]
    fn parses_lom_2004_general() {
        let root = parse_document(LOM_2004, "lom.xml").expect("xml");
        let lom = Lom::from_element(&root);

        assert_eq!(lom.title("en"), Some("Safety Course"));
        assert_eq!(lom.title("fr"), Some("Cours de sécurité"));
        assert_eq!(lom.description("en"), Some("Covers the basics."));
        assert_eq!(lom.keywords("en"), vec!["safety", "training"]);

        let general = lom.general.as_ref().expect("general");
        assert_eq!(general.identifiers[0].entry.as_deref(), Some("com.example.course"));
        assert_eq!(
            general.structure.as_ref().and_then(|s| s.value.as_deref()),
            Some("hierarchical")
        );
    }

    #[test]
    fn parses_lom_2004_life_cycle_and_technical() {
        let root = parse_document(LOM_2004, "lom.xml").expect("xml");
        let lom = Lom::from_element(&root);

        assert_eq!(lom.version("en"), Some("2.1"));
        let contribute = &lom.life_cycle.as_ref().expect("life cycle").contributes[0];
        assert_eq!(
            contribute.role.as_ref().and_then(|r| r.value.as_deref()),
            Some("author")
        );
        assert_eq!(contribute.date.as_deref(), Some("2020-05-01"));
        assert_eq!(contribute.entities.len(), 1);

        let technical = lom.technical.as_ref().expect("technical");
        assert_eq!(technical.size, Some(2048));
        assert_eq!(technical.formats, vec!["text/html".to_string()]);
        assert_eq!(technical.requirements.len(), 1);
        assert_eq!(technical.duration.as_deref(), Some("PT10M"));
    }

    #[test]
    fn parses_lom_2004_educational_rights_classification() {
        let root = parse_document(LOM_2004, "lom.xml").expect("xml");
        let lom = Lom::from_element(&root);

        assert_eq!(lom.typical_learning_time(), Some(Duration::from_secs(5_400)));
        assert_eq!(
            lom.rights
                .as_ref()
                .and_then(|r| r.cost.as_ref())
                .and_then(|c| c.value.as_deref()),
            Some("no")
        );
        let taxon = &lom.classifications[0].taxon_paths[0].taxons[0];
        assert_eq!(taxon.id.as_deref(), Some("D.2"));
        assert_eq!(taxon.entry.best("en"), Some("Software"));
    }

    #[test]
    fn parses_ims_md_12_dialect() {
        let root = parse_document(LOM_12, "lom.xml").expect("xml");
        let lom = Lom::from_element(&root);

        assert_eq!(lom.title("en"), Some("Legacy Course"));
        assert_eq!(lom.version("en"), Some("1.0"));
        let general = lom.general.as_ref().expect("general");
        assert_eq!(general.identifiers[0].catalog.as_deref(), Some("ISBN"));
        assert_eq!(general.identifiers[0].entry.as_deref(), Some("0-000"));
        assert_eq!(
            general.structure.as_ref().and_then(|s| s.value.as_deref()),
            Some("Hierarchical")
        );

        let contribute = &lom.life_cycle.as_ref().expect("life cycle").contributes[0];
        assert_eq!(contribute.entities, vec!["BEGIN:VCARD FN:John END:VCARD".to_string()]);
        assert_eq!(contribute.date.as_deref(), Some("2001-01-01"));

        assert_eq!(
            lom.meta_metadata.as_ref().expect("meta").metadata_schemas,
            vec!["IMS 1.2".to_string()]
        );
        assert_eq!(lom.typical_learning_time(), Some(Duration::from_secs(2_700)));
    }

    #[test]
    fn find_in_metadata_container() {
        let root = parse_document(
            "<metadata><schema>ADL SCORM</schema><lom><general><title><string>T</string></title></general></lom></metadata>",
            "m.xml",
        )
        .expect("xml");
        let lom = Lom::find_in(&root).expect("lom");
        assert_eq!(lom.title("en"), Some("T"));
    }

    #[test]
    fn non_numeric_size_is_dropped() {
        let root = parse_document(
            "<lom><technical><size>big</size></technical></lom>",
            "lom.xml",
        )
        .expect("xml");
        let lom = Lom::from_element(&root);
        assert_eq!(lom.technical.expect("technical").size, None);
    }
}
