//! SCORM 2004 parser.

use super::model::{Item, Scorm2004Manifest};
use super::sequencing::Sequencing;
use crate::access::{FileAccess, LimitedFileAccess};
use crate::cp::{find_launch_item, item_launch_url, walk_items};
use crate::metadata::{FormatDetails, ModuleMetadata, Scorm2004Details};
use crate::options::ParserOptions;
use crate::parser::{
    ModuleParser, ParsedManifest, ParsedModule, apply_package_facts, non_empty,
    read_xml_descriptor,
};
use crate::primitives::IMS_MANIFEST;
use crate::types::{ModuleType, PackageError, Scorm2004Edition};

/// Parses SCORM 2004 packages (2nd, 3rd and 4th edition).
#[derive(Debug, Clone, Default)]
pub struct Scorm2004Parser {
    options: ParserOptions,
}

impl Scorm2004Parser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Read `imsmanifest.xml` into the typed model.
    pub fn read_manifest(
        &self,
        access: &dyn FileAccess,
    ) -> Result<Scorm2004Manifest, PackageError> {
        let (path, root) = read_xml_descriptor(access, IMS_MANIFEST)?;
        let mut manifest = Scorm2004Manifest::from_element(&root)?;
        if let Some(metadata) = manifest.metadata.as_mut() {
            metadata.resolve_external(access, &path, &self.options)?;
        }
        Ok(manifest)
    }

    /// Derive the module summary from a manifest.
    pub fn summarize(&self, manifest: &Scorm2004Manifest) -> Result<ModuleMetadata, PackageError> {
        let language = self.options.preferred_language.as_str();
        let lom = manifest.metadata.as_ref().and_then(|m| m.lom.as_ref());

        let organization = manifest
            .organizations
            .default_organization()
            .ok_or(PackageError::LaunchUrlNotFound)?;
        let launch_url = find_launch_item(&organization.items, &manifest.resources)
            .and_then(|(item, resource)| item_launch_url(item, resource, &manifest.resources))
            .ok_or(PackageError::LaunchUrlNotFound)?;

        let mut details = Scorm2004Details {
            edition: Scorm2004Edition::from_schema_version(
                manifest
                    .metadata
                    .as_ref()
                    .and_then(|m| m.schema_version.as_deref()),
            ),
            ..Scorm2004Details::default()
        };

        let mut sequencings: Vec<&Sequencing> = Vec::new();
        for org in &manifest.organizations.items {
            sequencings.extend(org.sequencing.as_ref());
            let mut items: Vec<&Item> = Vec::new();
            walk_items(&org.items, &mut |item| items.push(item));
            for item in items {
                let id = &item.identifier;
                let is_sco = item
                    .identifier_ref
                    .as_deref()
                    .and_then(|r| manifest.resources.find(r))
                    .is_some_and(|r| r.is_sco());
                if is_sco && !details.sco_ids.contains(id) {
                    details.sco_ids.push(id.clone());
                }
                if let Some(threshold) = item.completion_threshold {
                    details.completion_thresholds.insert(id.clone(), threshold);
                }
                sequencings.extend(item.sequencing.as_ref());
            }
        }

        details.has_sequencing = !sequencings.is_empty();
        for sequencing in &sequencings {
            push_unique(&mut details.objective_ids, sequencing.objective_ids());
            push_unique(&mut details.global_objective_ids, sequencing.global_objective_ids());
        }

        let duration = lom.and_then(|l| l.typical_learning_time()).or_else(|| {
            organization
                .sequencing
                .as_ref()
                .and_then(|s| s.limit_conditions.as_ref())
                .and_then(|l| l.attempt_absolute_duration())
        });

        Ok(ModuleMetadata {
            module_type: ModuleType::Scorm2004,
            title: organization
                .title
                .clone()
                .or_else(|| lom.and_then(|l| l.title(language)).map(str::to_string))
                .or_else(|| non_empty(&manifest.identifier))
                .unwrap_or_default(),
            description: lom.and_then(|l| l.description(language)).map(str::to_string),
            launch_url,
            identifier: non_empty(&manifest.identifier),
            version: manifest
                .version
                .clone()
                .or_else(|| lom.and_then(|l| l.version(language)).map(str::to_string)),
            duration,
            size_on_disk: None,
            xapi_enabled: false,
            details: FormatDetails::Scorm2004(details),
        })
    }
}

fn push_unique<'a>(target: &mut Vec<String>, ids: impl Iterator<Item = &'a str>) {
    for id in ids {
        if !target.iter().any(|existing| existing == id) {
            target.push(id.to_string());
        }
    }
}

impl ModuleParser for Scorm2004Parser {
    fn module_type(&self) -> ModuleType {
        ModuleType::Scorm2004
    }

    fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError> {
        let access = &LimitedFileAccess::new(access, self.options.max_file_size);
        let manifest = self.read_manifest(access)?;
        let mut metadata = self.summarize(&manifest)?;
        apply_package_facts(&mut metadata, access, &self.options)?;
        tracing::info!(
            title = %metadata.title,
            launch_url = %metadata.launch_url,
            sequencing = metadata.has_sequencing(),
            "parsed SCORM 2004 package"
        );
        Ok(ParsedModule {
            metadata,
            manifest: ParsedManifest::Scorm2004(Box::new(manifest)),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::access::MemoryFileAccess;
    use std::time::Duration;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="com.example.course" version="2"
          xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
          xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3"
          xmlns:adlseq="http://www.adlnet.org/xsd/adlseq_v1p3"
          xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>2004 4th Edition</schemaversion>
  </metadata>
  <organizations default="ORG">
    <organization identifier="ORG">
      <title>Data Literacy</title>
      <item identifier="CH1" identifierref="SCO1">
        <title>Chapter 1</title>
        <adlcp:completionThreshold completedByMeasure="true" minProgressMeasure="0.9"/>
        <imsss:sequencing IDRef="tracked">
          <imsss:objectives>
            <imsss:primaryObjective objectiveID="ch1.primary">
              <imsss:mapInfo targetObjectiveID="global.ch1"/>
            </imsss:primaryObjective>
          </imsss:objectives>
        </imsss:sequencing>
      </item>
      <item identifier="CH2" identifierref="SCO2">
        <title>Chapter 2</title>
        <imsss:sequencing>
          <imsss:objectives>
            <imsss:primaryObjective objectiveID="ch2.primary">
              <imsss:mapInfo targetObjectiveID="global.ch1" readSatisfiedStatus="true"/>
            </imsss:primaryObjective>
          </imsss:objectives>
        </imsss:sequencing>
      </item>
      <imsss:sequencing>
        <imsss:controlMode flow="true"/>
        <imsss:limitConditions attemptAbsoluteDurationLimit="PT45M"/>
      </imsss:sequencing>
    </organization>
  </organizations>
  <resources>
    <resource identifier="SCO1" type="webcontent" adlcp:scormType="sco" href="ch1/index.html"/>
    <resource identifier="SCO2" type="webcontent" adlcp:scormType="sco" href="ch2/index.html"/>
  </resources>
  <imsss:sequencingCollection>
    <imsss:sequencing ID="tracked">
      <imsss:deliveryControls tracked="true" completionSetByContent="true"/>
    </imsss:sequencing>
  </imsss:sequencingCollection>
</manifest>"#;

    #[test]
    fn parses_package() {
        let access = MemoryFileAccess::new("pkg").with_file("imsmanifest.xml", MANIFEST);
        let parsed = Scorm2004Parser::default().parse(&access).expect("parse");
        let metadata = parsed.metadata;

        assert_eq!(metadata.module_type, ModuleType::Scorm2004);
        assert_eq!(metadata.title, "Data Literacy");
        assert_eq!(metadata.launch_url, "ch1/index.html");
        assert_eq!(metadata.version.as_deref(), Some("2"));
        assert_eq!(metadata.duration, Some(Duration::from_secs(45 * 60)));
        assert!(metadata.has_sequencing());

        let FormatDetails::Scorm2004(details) = metadata.details else {
            panic!("expected SCORM 2004 details");
        };
        assert_eq!(details.edition, Scorm2004Edition::Fourth);
        assert_eq!(details.sco_ids, vec!["CH1".to_string(), "CH2".to_string()]);
        let threshold = details.completion_thresholds.get("CH1").expect("threshold");
        assert!(threshold.completed_by_measure);
        assert_eq!(threshold.min_progress_measure, 0.9);
        assert_eq!(
            details.objective_ids,
            vec!["ch1.primary".to_string(), "ch2.primary".to_string()]
        );
        assert_eq!(details.global_objective_ids, vec!["global.ch1".to_string()]);

        let ParsedManifest::Scorm2004(manifest) = parsed.manifest else {
            panic!("expected SCORM 2004 manifest");
        };
        let merged = manifest.organizations.items[0].items[0]
            .sequencing
            .as_ref()
            .expect("sequencing");
        assert!(merged.delivery_controls.expect("delivery").completion_set_by_content);
    }

    #[test]
    fn package_without_sequencing() {
        let manifest = r#"<manifest identifier="m">
  <metadata><schemaversion>CAM 1.3</schemaversion></metadata>
  <organizations><organization identifier="o">
    <item identifier="i" identifierref="r"><title>Only</title></item>
  </organization></organizations>
  <resources><resource identifier="r" adlcp:scormType="asset" href="a.html"/></resources>
</manifest>"#;
        let access = MemoryFileAccess::new("pkg").with_file("imsmanifest.xml", manifest);
        let metadata = Scorm2004Parser::default().parse(&access).expect("parse").metadata;

        assert_eq!(metadata.title, "m");
        assert_eq!(metadata.duration, None);
        assert!(!metadata.has_sequencing());
        let FormatDetails::Scorm2004(details) = metadata.details else {
            panic!("expected SCORM 2004 details");
        };
        assert_eq!(details.edition, Scorm2004Edition::Second);
        assert!(details.sco_ids.is_empty());
    }
}
