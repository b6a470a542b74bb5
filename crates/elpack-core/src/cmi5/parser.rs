//! cmi5 parser.

use super::model::CourseStructure;
use crate::access::{FileAccess, LimitedFileAccess};
use crate::metadata::{Cmi5Details, FormatDetails, ModuleMetadata};
use crate::options::ParserOptions;
use crate::parser::{
    ModuleParser, ParsedManifest, ParsedModule, apply_package_facts, non_empty,
    read_xml_descriptor,
};
use crate::primitives::CMI5_MANIFEST;
use crate::types::{ModuleType, PackageError};

/// Parses cmi5 course structures.
#[derive(Debug, Clone, Default)]
pub struct Cmi5Parser {
    options: ParserOptions,
}

impl Cmi5Parser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Read `cmi5.xml` into the typed model.
    pub fn read_structure(&self, access: &dyn FileAccess) -> Result<CourseStructure, PackageError> {
        let (_, root) = read_xml_descriptor(access, CMI5_MANIFEST)?;
        CourseStructure::from_element(&root)
    }

    /// Derive the module summary from a course structure.
    pub fn summarize(&self, structure: &CourseStructure) -> Result<ModuleMetadata, PackageError> {
        let language = self.options.preferred_language.as_str();
        let units = structure.assignable_units();
        let launch_url = units
            .first()
            .map(|au| au.url.clone())
            .ok_or(PackageError::LaunchUrlNotFound)?;

        let mut details = Cmi5Details::default();
        for au in &units {
            details.au_ids.push(au.id.clone());
            details.move_on.insert(au.id.clone(), au.move_on);
            details.launch_methods.insert(au.id.clone(), au.launch_method);
            if let Some(score) = au.mastery_score {
                details.mastery_scores.insert(au.id.clone(), score);
            }
            if let Some(kind) = &au.activity_type {
                details.activity_types.insert(au.id.clone(), kind.clone());
            }
        }

        let course = &structure.course;
        Ok(ModuleMetadata {
            module_type: ModuleType::Cmi5,
            title: course
                .title
                .best(language)
                .map(str::to_string)
                .or_else(|| non_empty(&course.id))
                .unwrap_or_default(),
            description: course.description.best(language).map(str::to_string),
            launch_url,
            identifier: non_empty(&course.id),
            version: None,
            duration: None,
            size_on_disk: None,
            xapi_enabled: true,
            details: FormatDetails::Cmi5(details),
        })
    }
}

impl ModuleParser for Cmi5Parser {
    fn module_type(&self) -> ModuleType {
        ModuleType::Cmi5
    }

    fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError> {
        let access = &LimitedFileAccess::new(access, self.options.max_file_size);
        let structure = self.read_structure(access)?;
        let mut metadata = self.summarize(&structure)?;
        apply_package_facts(&mut metadata, access, &self.options)?;
        tracing::info!(
            title = %metadata.title,
            launch_url = %metadata.launch_url,
            units = metadata.launchable_ids().len(),
            "parsed cmi5 package"
        );
        Ok(ParsedModule {
            metadata,
            manifest: ParsedManifest::Cmi5(Box::new(structure)),
        })
    }
}
