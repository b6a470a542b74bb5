//! # Module Metadata
//!
//! The summary every parser produces: common fields (title, launch URL,
//! duration, ...) plus a [`FormatDetails`] variant with the values only one
//! standard defines.

use crate::aicc::PrerequisiteExpression;
use crate::cmi5::{LaunchMethod, MoveOn};
use crate::scorm2004::CompletionThreshold;
use crate::types::{ModuleType, Scorm2004Edition};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of a parsed package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleMetadata {
    pub module_type: ModuleType,
    pub title: String,
    pub description: Option<String>,
    /// Entry point, relative to the package root unless absolute.
    pub launch_url: String,
    pub identifier: Option<String>,
    pub version: Option<String>,
    #[serde(serialize_with = "crate::duration::serialize_opt")]
    pub duration: Option<Duration>,
    /// Total bytes of all package files.
    pub size_on_disk: Option<u64>,
    /// Whether the content reports through xAPI.
    pub xapi_enabled: bool,
    pub details: FormatDetails,
}

/// Format-specific derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum FormatDetails {
    Scorm12(Scorm12Details),
    Scorm2004(Scorm2004Details),
    Aicc(AiccDetails),
    Cmi5(Cmi5Details),
    Xapi(XapiDetails),
}

/// SCORM 1.2 values, keyed by item identifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Scorm12Details {
    /// Items whose resource is a SCO, in organization order.
    pub sco_ids: Vec<String>,
    pub mastery_scores: BTreeMap<String, f64>,
    /// Raw `aicc_script` prerequisite expressions.
    pub prerequisites: BTreeMap<String, String>,
    /// `adlcp:datafromlms` values.
    pub custom_data: BTreeMap<String, String>,
}

/// SCORM 2004 values, keyed by item identifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Scorm2004Details {
    pub edition: Scorm2004Edition,
    pub sco_ids: Vec<String>,
    pub has_sequencing: bool,
    pub completion_thresholds: BTreeMap<String, CompletionThreshold>,
    /// Objective identifiers declared in sequencing, in document order.
    pub objective_ids: Vec<String>,
    /// `targetObjectiveID`s of objective maps, deduplicated.
    pub global_objective_ids: Vec<String>,
}

/// AICC values, keyed by AU system id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AiccDetails {
    pub au_ids: Vec<String>,
    /// `.des` titles joined to units by system id.
    pub titles: BTreeMap<String, String>,
    pub mastery_scores: BTreeMap<String, f64>,
    /// Prerequisites per structure element.
    pub prerequisites: BTreeMap<String, PrerequisiteExpression>,
    pub core_vendor: BTreeMap<String, String>,
}

/// cmi5 values, keyed by AU id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Cmi5Details {
    pub au_ids: Vec<String>,
    pub move_on: BTreeMap<String, MoveOn>,
    pub mastery_scores: BTreeMap<String, f64>,
    pub launch_methods: BTreeMap<String, LaunchMethod>,
    pub activity_types: BTreeMap<String, String>,
}

/// xAPI / TinCan values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct XapiDetails {
    pub activity_ids: Vec<String>,
    /// Activity type IRIs keyed by activity id.
    pub activity_types: BTreeMap<String, String>,
}

impl ModuleMetadata {
    /// Ids of the launchable units (SCOs, AUs or activities).
    #[must_use]
    pub fn launchable_ids(&self) -> &[String] {
        match &self.details {
            FormatDetails::Scorm12(d) => &d.sco_ids,
            FormatDetails::Scorm2004(d) => &d.sco_ids,
            FormatDetails::Aicc(d) => &d.au_ids,
            FormatDetails::Cmi5(d) => &d.au_ids,
            FormatDetails::Xapi(d) => &d.activity_ids,
        }
    }

    /// Mastery score of a unit, on the scale its standard uses.
    #[must_use]
    pub fn mastery_score(&self, id: &str) -> Option<f64> {
        let scores = match &self.details {
            FormatDetails::Scorm12(d) => &d.mastery_scores,
            FormatDetails::Aicc(d) => &d.mastery_scores,
            FormatDetails::Cmi5(d) => &d.mastery_scores,
            FormatDetails::Scorm2004(_) | FormatDetails::Xapi(_) => return None,
        };
        scores.get(id).copied()
    }

    /// Whether any unit is gated by a prerequisite.
    #[must_use]
    pub fn has_prerequisites(&self) -> bool {
        match &self.details {
            FormatDetails::Scorm12(d) => !d.prerequisites.is_empty(),
            FormatDetails::Aicc(d) => !d.prerequisites.is_empty(),
            _ => false,
        }
    }

    /// Whether the package carries IMS Simple Sequencing.
    #[must_use]
    pub fn has_sequencing(&self) -> bool {
        matches!(&self.details, FormatDetails::Scorm2004(d) if d.has_sequencing)
    }

    /// cmi5 move-on criterion of an AU.
    #[must_use]
    pub fn move_on(&self, au_id: &str) -> Option<MoveOn> {
        match &self.details {
            FormatDetails::Cmi5(d) => d.move_on.get(au_id).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(details: FormatDetails) -> ModuleMetadata {
        ModuleMetadata {
            module_type: ModuleType::Scorm12,
            title: "Course".to_string(),
            description: None,
            launch_url: "index.html".to_string(),
            identifier: None,
            version: None,
            duration: Some(Duration::from_secs(1_800)),
            size_on_disk: None,
            xapi_enabled: false,
            details,
        }
    }

    #[test]
    fn accessors_follow_details() {
        let mut details = Scorm12Details::default();
        details.sco_ids.push("I1".to_string());
        details.mastery_scores.insert("I1".to_string(), 80.0);
        details.prerequisites.insert("I2".to_string(), "I1".to_string());
        let meta = metadata(FormatDetails::Scorm12(details));

        assert_eq!(meta.launchable_ids(), ["I1".to_string()]);
        assert_eq!(meta.mastery_score("I1"), Some(80.0));
        assert!(meta.has_prerequisites());
        assert!(!meta.has_sequencing());
        assert_eq!(meta.move_on("I1"), None);
    }

    #[test]
    fn serializes_with_format_tag_and_iso_duration() {
        let meta = metadata(FormatDetails::Xapi(XapiDetails::default()));
        let json = serde_json::to_value(&meta).expect("serialize");
        assert_eq!(json["duration"], "PT30M");
        assert_eq!(json["details"]["format"], "xapi");
        assert_eq!(json["module_type"], "scorm12");
    }
}
