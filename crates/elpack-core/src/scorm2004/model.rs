//! SCORM 2004 manifest model (IMS CP 1.1.4 + ADL CP/NAV/SEQ 2004).

use super::sequencing::{Sequencing, SequencingCollection};
use crate::cp::{ContentItem, ManifestMetadata, Resources};
use crate::scorm12::TimeLimitAction;
use crate::xml::{XmlElement, check_range, parse_decimal};
use crate::PackageError;
use serde::{Deserialize, Serialize};

// =============================================================================
// MANIFEST
// =============================================================================

/// `<manifest>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorm2004Manifest {
    pub identifier: String,
    pub version: Option<String>,
    pub metadata: Option<ManifestMetadata>,
    pub organizations: Organizations,
    pub resources: Resources,
    pub sequencing_collection: Option<SequencingCollection>,
}

impl Scorm2004Manifest {
    /// Build the manifest model from the document root.
    ///
    /// Sequencing elements that reference the collection by `IDRef` are
    /// returned already merged with their collection entry.
    pub fn from_element(root: &XmlElement) -> Result<Self, PackageError> {
        if !root.is("manifest") {
            return Err(PackageError::InvalidManifest(format!(
                "expected <manifest> root, found <{}>",
                root.name
            )));
        }
        let sequencing_collection = root
            .child("sequencingCollection")
            .map(SequencingCollection::from_element)
            .transpose()?;
        let collection = sequencing_collection.as_ref();

        let organizations = match root.child("organizations") {
            Some(element) => Organizations {
                default: element.attr_string("default"),
                items: element
                    .children("organization")
                    .map(|o| Organization::from_element(o, collection))
                    .collect::<Result<_, _>>()?,
            },
            None => Organizations::default(),
        };

        Ok(Self {
            identifier: root.attr_string("identifier").unwrap_or_default(),
            version: root.attr_string("version"),
            metadata: ManifestMetadata::child_of(root),
            organizations,
            resources: root
                .child("resources")
                .map(Resources::from_element)
                .transpose()?
                .unwrap_or_default(),
            sequencing_collection,
        })
    }
}

/// `<organizations>`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Organizations {
    pub default: Option<String>,
    pub items: Vec<Organization>,
}

impl Organizations {
    /// The organization named by `default`, else the first one.
    #[must_use]
    pub fn default_organization(&self) -> Option<&Organization> {
        self.default
            .as_deref()
            .and_then(|id| self.items.iter().find(|o| o.identifier == id))
            .or_else(|| self.items.first())
    }
}

/// `<organization>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub identifier: String,
    pub structure: Option<String>,
    pub title: Option<String>,
    pub items: Vec<Item>,
    pub metadata: Option<ManifestMetadata>,
    pub completion_threshold: Option<CompletionThreshold>,
    pub sequencing: Option<Sequencing>,
    /// `adlseq:objectivesGlobalToSystem`
    pub objectives_global_to_system: bool,
    /// `adlcp:sharedDataGlobalToSystem`
    pub shared_data_global_to_system: bool,
}

impl Organization {
    fn from_element(
        element: &XmlElement,
        collection: Option<&SequencingCollection>,
    ) -> Result<Self, PackageError> {
        Ok(Self {
            identifier: element.attr_string("identifier").unwrap_or_default(),
            structure: element.attr_string("structure"),
            title: element.child_string("title"),
            items: Item::children_of(element, collection)?,
            metadata: ManifestMetadata::child_of(element),
            completion_threshold: element
                .child("completionThreshold")
                .map(CompletionThreshold::from_element)
                .transpose()?,
            sequencing: read_sequencing(element, collection)?,
            objectives_global_to_system: element.attr_bool_or("objectivesGlobalToSystem", true)?,
            shared_data_global_to_system: element
                .attr_bool_or("sharedDataGlobalToSystem", true)?,
        })
    }
}

fn read_sequencing(
    element: &XmlElement,
    collection: Option<&SequencingCollection>,
) -> Result<Option<Sequencing>, PackageError> {
    element
        .child("sequencing")
        .map(|s| Sequencing::from_element(s)?.resolved(collection))
        .transpose()
}

// =============================================================================
// ITEM EXTENSIONS
// =============================================================================

/// `<adlcp:completionThreshold>`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionThreshold {
    pub completed_by_measure: bool,
    /// In [0, 1].
    pub min_progress_measure: f64,
    /// In [0, 1].
    pub progress_weight: f64,
}

impl Default for CompletionThreshold {
    fn default() -> Self {
        Self {
            completed_by_measure: false,
            min_progress_measure: 1.0,
            progress_weight: 1.0,
        }
    }
}

impl CompletionThreshold {
    /// Read either the attribute form (3rd/4th edition) or the text form
    /// (2nd edition, `<adlcp:completionThreshold>0.8</...>`).
    ///
    /// The text form implies `completed_by_measure`.
    pub fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let ranged = |value: Option<f64>, what: &str, default: f64| -> Result<f64, PackageError> {
            value
                .map(|v| check_range(v, 0.0, 1.0, what))
                .transpose()
                .map(|v| v.unwrap_or(default))
        };

        if let Some(text) = element.text() {
            let value = parse_decimal(text, "completionThreshold")?;
            return Ok(Self {
                completed_by_measure: true,
                min_progress_measure: ranged(Some(value), "completionThreshold", 1.0)?,
                progress_weight: 1.0,
            });
        }

        Ok(Self {
            completed_by_measure: element.attr_bool_or("completedByMeasure", false)?,
            min_progress_measure: ranged(
                element.attr_f64("minProgressMeasure")?,
                "completionThreshold@minProgressMeasure",
                1.0,
            )?,
            progress_weight: ranged(
                element.attr_f64("progressWeight")?,
                "completionThreshold@progressWeight",
                1.0,
            )?,
        })
    }
}

vocabulary! {
    /// Navigation controls an LMS may hide (`adlnav:hideLMSUI`).
    pub enum HideLmsUi ("hideLMSUI") {
        Previous => "previous",
        Continue => "continue",
        Exit => "exit",
        ExitAll => "exitAll",
        Abandon => "abandon",
        AbandonAll => "abandonAll",
        SuspendAll => "suspendAll",
    }
}

/// `<adlnav:presentation>`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Presentation {
    pub hide_lms_ui: Vec<HideLmsUi>,
}

impl Presentation {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let hide_lms_ui = element
            .children("navigationInterface")
            .flat_map(|nav| nav.children("hideLMSUI"))
            .filter_map(XmlElement::text)
            .map(HideLmsUi::parse)
            .collect::<Result<_, _>>()?;
        Ok(Self { hide_lms_ui })
    }
}

/// `<adlcp:map>` inside `<adlcp:data>`: shared data buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMap {
    pub target_id: String,
    pub read_shared_data: bool,
    pub write_shared_data: bool,
}

impl DataMap {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            target_id: element.attr_string("targetID").ok_or_else(|| {
                PackageError::InvalidManifest("adlcp:map without targetID".to_string())
            })?,
            read_shared_data: element.attr_bool_or("readSharedData", true)?,
            write_shared_data: element.attr_bool_or("writeSharedData", true)?,
        })
    }
}

// =============================================================================
// ITEM
// =============================================================================

/// `<item>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub identifier: String,
    pub identifier_ref: Option<String>,
    pub is_visible: bool,
    pub parameters: Option<String>,
    pub title: Option<String>,
    pub items: Vec<Item>,
    pub metadata: Option<ManifestMetadata>,
    pub time_limit_action: Option<TimeLimitAction>,
    pub data_from_lms: Option<String>,
    pub completion_threshold: Option<CompletionThreshold>,
    pub sequencing: Option<Sequencing>,
    pub presentation: Option<Presentation>,
    pub data: Vec<DataMap>,
}

impl Item {
    fn children_of(
        element: &XmlElement,
        collection: Option<&SequencingCollection>,
    ) -> Result<Vec<Self>, PackageError> {
        element
            .children("item")
            .map(|item| Self::from_element(item, collection))
            .collect()
    }

    fn from_element(
        element: &XmlElement,
        collection: Option<&SequencingCollection>,
    ) -> Result<Self, PackageError> {
        let identifier = element.attr_string("identifier").ok_or_else(|| {
            PackageError::InvalidManifest("item without identifier".to_string())
        })?;
        Ok(Self {
            identifier_ref: element.attr_string("identifierref"),
            is_visible: element.attr_bool_or("isvisible", true)?,
            parameters: element.attr_string("parameters"),
            title: element.child_string("title"),
            items: Self::children_of(element, collection)?,
            metadata: ManifestMetadata::child_of(element),
            time_limit_action: element
                .child_text("timeLimitAction")
                .map(TimeLimitAction::parse)
                .transpose()?,
            data_from_lms: element.child_string("dataFromLMS"),
            completion_threshold: element
                .child("completionThreshold")
                .map(CompletionThreshold::from_element)
                .transpose()?,
            sequencing: read_sequencing(element, collection)?,
            presentation: element
                .child("presentation")
                .map(Presentation::from_element)
                .transpose()?,
            data: element
                .children("data")
                .flat_map(|data| data.children("map"))
                .map(DataMap::from_element)
                .collect::<Result<_, _>>()?,
            identifier,
        })
    }
}

impl ContentItem for Item {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn identifier_ref(&self) -> Option<&str> {
        self.identifier_ref.as_deref()
    }

    fn parameters(&self) -> Option<&str> {
        self.parameters.as_deref()
    }

    fn child_items(&self) -> &[Self] {
        &self.items
    }
}

// =============================================================================
// TESTS
// =============================================================================
