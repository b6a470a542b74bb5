//! SCORM 1.2 manifest model (IMS CP 1.1.2 + ADL CP 1.2 extensions).

use crate::cp::{ContentItem, ManifestMetadata, Resources};
use crate::xml::{XmlElement, check_range, parse_decimal};
use crate::PackageError;
use serde::{Deserialize, Serialize};

/// `<manifest>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorm12Manifest {
    pub identifier: String,
    pub version: Option<String>,
    pub metadata: Option<ManifestMetadata>,
    pub organizations: Organizations,
    pub resources: Resources,
}

impl Scorm12Manifest {
    /// Build the manifest model from the document root.
    pub fn from_element(root: &XmlElement) -> Result<Self, PackageError> {
        if !root.is("manifest") {
            return Err(PackageError::InvalidManifest(format!(
                "expected <manifest> root, found <{}>",
                root.name
            )));
        }
        Ok(Self {
            identifier: root.attr_string("identifier").unwrap_or_default(),
            version: root.attr_string("version"),
            metadata: ManifestMetadata::child_of(root),
            organizations: root
                .child("organizations")
                .map(Organizations::from_element)
                .transpose()?
                .unwrap_or_default(),
            resources: root
                .child("resources")
                .map(Resources::from_element)
                .transpose()?
                .unwrap_or_default(),
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
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            default: element.attr_string("default"),
            items: element
                .children("organization")
                .map(Organization::from_element)
                .collect::<Result<_, _>>()?,
        })
    }

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
}

impl Organization {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            identifier: element.attr_string("identifier").unwrap_or_default(),
            structure: element.attr_string("structure"),
            title: element.child_string("title"),
            items: Item::children_of(element)?,
            metadata: ManifestMetadata::child_of(element),
        })
    }
}

/// `<adlcp:prerequisites type="aicc_script">`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisites {
    pub value: String,
    pub kind: Option<String>,
}

/// `<adlcp:timelimitaction>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeLimitAction {
    ExitMessage,
    ExitNoMessage,
    ContinueMessage,
    ContinueNoMessage,
}

impl TimeLimitAction {
    /// Parse the CMI vocabulary (`exit,message`, `continue,no message`, ...).
    pub fn parse(value: &str) -> Result<Self, PackageError> {
        let normalized: String = value
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match normalized.as_str() {
            "exit,message" => Ok(Self::ExitMessage),
            "exit,nomessage" => Ok(Self::ExitNoMessage),
            "continue,message" => Ok(Self::ContinueMessage),
            "continue,nomessage" => Ok(Self::ContinueNoMessage),
            _ => Err(PackageError::InvalidManifest(format!(
                "unknown timelimitaction '{}'",
                value
            ))),
        }
    }
}

/// `<item>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub identifier: String,
    pub identifier_ref: Option<String>,
    pub is_visible: bool,
    pub parameters: Option<String>,
    pub title: Option<String>,
    pub items: Vec<Item>,
    pub prerequisites: Option<Prerequisites>,
    /// Raw CMI timespan.
    pub max_time_allowed: Option<String>,
    pub time_limit_action: Option<TimeLimitAction>,
    pub data_from_lms: Option<String>,
    /// 0..=100
    pub mastery_score: Option<f64>,
    pub metadata: Option<ManifestMetadata>,
}

impl Item {
    fn children_of(element: &XmlElement) -> Result<Vec<Self>, PackageError> {
        element.children("item").map(Self::from_element).collect()
    }

    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let identifier = element.attr_string("identifier").ok_or_else(|| {
            PackageError::InvalidManifest("item without identifier".to_string())
        })?;

        let mastery_score = element
            .child_text("masteryscore")
            .map(|raw| {
                let what = format!("masteryscore of item {}", identifier);
                parse_decimal(raw, &what).and_then(|v| check_range(v, 0.0, 100.0, &what))
            })
            .transpose()?;

        Ok(Self {
            identifier_ref: element.attr_string("identifierref"),
            is_visible: element.attr_bool_or("isvisible", true)?,
            parameters: element.attr_string("parameters"),
            title: element.child_string("title"),
            items: Self::children_of(element)?,
            prerequisites: element.child("prerequisites").and_then(|p| {
                p.text().map(|value| Prerequisites {
                    value: value.to_string(),
                    kind: p.attr_string("type"),
                })
            }),
            max_time_allowed: element.child_string("maxtimeallowed"),
            time_limit_action: element
                .child_text("timelimitaction")
                .map(TimeLimitAction::parse)
                .transpose()?,
            data_from_lms: element.child_string("datafromlms"),
            mastery_score,
            metadata: ManifestMetadata::child_of(element),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn item(xml: &str) -> Result<Item, PackageError> {
        Item::from_element(&parse_document(xml, "m.xml").expect("xml"))
    }

    #[test]
    fn parses_adlcp_item_extensions() {
        let item = item(
            r#"<item identifier="I1" identifierref="R1" isvisible="false" parameters="?x=1">
                 <title>Lesson 1</title>
                 <adlcp:prerequisites type="aicc_script">I0</adlcp:prerequisites>
                 <adlcp:maxtimeallowed>00:30:00</adlcp:maxtimeallowed>
                 <adlcp:timelimitaction>exit,no message</adlcp:timelimitaction>
                 <adlcp:datafromlms>mode=review</adlcp:datafromlms>
                 <adlcp:masteryscore>80</adlcp:masteryscore>
               </item>"#,
        )
        .expect("item");

        assert_eq!(item.identifier, "I1");
        assert!(!item.is_visible);
        assert_eq!(item.title.as_deref(), Some("Lesson 1"));
        assert_eq!(
            item.prerequisites,
            Some(Prerequisites {
                value: "I0".to_string(),
                kind: Some("aicc_script".to_string())
            })
        );
        assert_eq!(item.max_time_allowed.as_deref(), Some("00:30:00"));
        assert_eq!(item.time_limit_action, Some(TimeLimitAction::ExitNoMessage));
        assert_eq!(item.data_from_lms.as_deref(), Some("mode=review"));
        assert_eq!(item.mastery_score, Some(80.0));
    }

    #[test]
    fn rejects_out_of_range_mastery_score() {
        let err = item(r#"<item identifier="I1"><masteryscore>120</masteryscore></item>"#)
            .expect_err("out of range");
        assert!(matches!(err, PackageError::InvalidManifest(_)));
    }

    #[test]
    fn rejects_unknown_time_limit_action() {
        assert!(TimeLimitAction::parse("stop").is_err());
        assert_eq!(
            TimeLimitAction::parse("Continue, Message").expect("parse"),
            TimeLimitAction::ContinueMessage
        );
    }

    #[test]
    fn default_organization_falls_back_to_first() {
        let orgs = Organizations {
            default: Some("MISSING".to_string()),
            items: vec![Organization {
                identifier: "ORG1".to_string(),
                structure: None,
                title: None,
                items: vec![],
                metadata: None,
            }],
        };
        assert_eq!(
            orgs.default_organization().map(|o| o.identifier.as_str()),
            Some("ORG1")
        );
    }
}
