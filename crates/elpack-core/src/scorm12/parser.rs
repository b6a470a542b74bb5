//! SCORM 1.2 parser.

use super::model::{Item, Scorm12Manifest};
use crate::access::{FileAccess, LimitedFileAccess};
use crate::cp::{find_launch_item, item_launch_url, walk_items};
use crate::duration::parse_timespan;
use crate::metadata::{FormatDetails, ModuleMetadata, Scorm12Details};
use crate::options::ParserOptions;
use crate::parser::{
    ModuleParser, ParsedManifest, ParsedModule, apply_package_facts, non_empty,
    read_xml_descriptor,
};
use crate::primitives::IMS_MANIFEST;
use crate::types::{ModuleType, PackageError};
use std::time::Duration;

/// Parses SCORM 1.2 packages.
#[derive(Debug, Clone, Default)]
pub struct Scorm12Parser {
    options: ParserOptions,
}

impl Scorm12Parser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Read `imsmanifest.xml` into the typed model, resolving external LOM
    /// metadata when enabled.
    pub fn read_manifest(&self, access: &dyn FileAccess) -> Result<Scorm12Manifest, PackageError> {
        let (path, root) = read_xml_descriptor(access, IMS_MANIFEST)?;
        let mut manifest = Scorm12Manifest::from_element(&root)?;
        if let Some(metadata) = manifest.metadata.as_mut() {
            metadata.resolve_external(access, &path, &self.options)?;
        }
        Ok(manifest)
    }

    /// Derive the module summary from a manifest.
    ///
    /// Launch and title come from the default organization; per-item values
    /// are collected from every organization.
    pub fn summarize(&self, manifest: &Scorm12Manifest) -> Result<ModuleMetadata, PackageError> {
        let language = self.options.preferred_language.as_str();
        let lom = manifest.metadata.as_ref().and_then(|m| m.lom.as_ref());

        let organization = manifest
            .organizations
            .default_organization()
            .ok_or(PackageError::LaunchUrlNotFound)?;
        let launch_url = find_launch_item(&organization.items, &manifest.resources)
            .and_then(|(item, resource)| item_launch_url(item, resource, &manifest.resources))
            .ok_or(PackageError::LaunchUrlNotFound)?;

        let mut items: Vec<&Item> = Vec::new();
        for org in &manifest.organizations.items {
            walk_items(&org.items, &mut |item| items.push(item));
        }

        let mut details = Scorm12Details::default();
        let mut max_time: Option<Duration> = None;
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
            if let Some(score) = item.mastery_score {
                details.mastery_scores.insert(id.clone(), score);
            }
            if let Some(prerequisites) = &item.prerequisites {
                details
                    .prerequisites
                    .insert(id.clone(), prerequisites.value.clone());
            }
            if let Some(data) = &item.data_from_lms {
                details.custom_data.insert(id.clone(), data.clone());
            }
            if let Some(raw) = &item.max_time_allowed {
                let allowed = parse_timespan(raw)?;
                max_time = Some(max_time.unwrap_or_default().saturating_add(allowed));
            }
        }

        Ok(ModuleMetadata {
            module_type: ModuleType::Scorm12,
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
            duration: lom.and_then(|l| l.typical_learning_time()).or(max_time),
            size_on_disk: None,
            xapi_enabled: false,
            details: FormatDetails::Scorm12(details),
        })
    }
}

impl ModuleParser for Scorm12Parser {
    fn module_type(&self) -> ModuleType {
        ModuleType::Scorm12
    }

    fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError> {
        let access = &LimitedFileAccess::new(access, self.options.max_file_size);
        let manifest = self.read_manifest(access)?;
        let mut metadata = self.summarize(&manifest)?;
        apply_package_facts(&mut metadata, access, &self.options)?;
        tracing::info!(
            title = %metadata.title,
            launch_url = %metadata.launch_url,
            scos = metadata.launchable_ids().len(),
            "parsed SCORM 1.2 package"
        );
        Ok(ParsedModule {
            metadata,
            manifest: ParsedManifest::Scorm12(Box::new(manifest)),
        })
    }
}
