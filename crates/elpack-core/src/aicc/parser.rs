//! AICC parser.

use super::model::{AiccManifest, AssignableUnit, CourseFile, Descriptor, MemberList, Prerequisite};
use crate::access::{FileAccess, LimitedFileAccess};
use crate::duration::parse_timespan;
use crate::launch::append_parameters;
use crate::metadata::{AiccDetails, FormatDetails, ModuleMetadata};
use crate::options::ParserOptions;
use crate::parser::{ModuleParser, ParsedManifest, ParsedModule, apply_package_facts};
use crate::primitives::{
    AICC_AU_EXT, AICC_COURSE_EXT, AICC_DESCRIPTOR_EXT, AICC_OBJECTIVE_EXT, AICC_PREREQUISITE_EXT,
    AICC_STRUCTURE_EXT,
};
use crate::types::{ModuleType, PackageError};
use std::time::Duration;

/// Parses AICC course structure packages.
#[derive(Debug, Clone, Default)]
pub struct AiccParser {
    options: ParserOptions,
}

impl AiccParser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Read every AICC descriptor file into the typed model.
    pub fn read_manifest(&self, access: &dyn FileAccess) -> Result<AiccManifest, PackageError> {
        let (crs_path, crs) = read_required(access, AICC_COURSE_EXT)?;
        let (au_path, au) = read_required(access, AICC_AU_EXT)?;
        let (des_path, des) = read_required(access, AICC_DESCRIPTOR_EXT)?;
        let (cst_path, cst) = read_required(access, AICC_STRUCTURE_EXT)?;

        let course_file = CourseFile::parse(&crs, &crs_path)?;
        let prerequisites = match read_optional(access, AICC_PREREQUISITE_EXT)? {
            Some((path, text)) => Prerequisite::parse_all(&text, &path)?,
            None => Vec::new(),
        };
        let objective_relationships = match read_optional(access, AICC_OBJECTIVE_EXT)? {
            Some((path, text)) => MemberList::parse_all(&text, &path)?,
            None => Vec::new(),
        };

        Ok(AiccManifest {
            course: course_file.course,
            course_description: course_file.description,
            assignable_units: AssignableUnit::parse_all(&au, &au_path)?,
            descriptors: Descriptor::parse_all(&des, &des_path)?,
            course_structure: MemberList::parse_all(&cst, &cst_path)?,
            prerequisites,
            objective_relationships,
        })
    }

    /// Derive the module summary from the descriptor files.
    pub fn summarize(&self, manifest: &AiccManifest) -> Result<ModuleMetadata, PackageError> {
        let ordered = manifest.ordered_units()?;
        let launch_url = ordered
            .iter()
            .find_map(|au| {
                au.file_name
                    .as_deref()
                    .map(|file| append_parameters(file, au.command_line.as_deref()))
            })
            .filter(|url| !url.is_empty())
            .ok_or(PackageError::LaunchUrlNotFound)?;

        let mut details = AiccDetails::default();
        let mut total = Duration::ZERO;
        let mut any_time = false;
        for au in &ordered {
            details.au_ids.push(au.system_id.clone());
            if let Some(score) = au.mastery_score {
                details.mastery_scores.insert(au.system_id.clone(), score);
            }
            if let Some(vendor) = &au.core_vendor {
                details.core_vendor.insert(au.system_id.clone(), vendor.clone());
            }
            if let Some(limit) = &au.max_time_allowed {
                total = total
                    .checked_add(parse_timespan(limit)?)
                    .ok_or_else(|| PackageError::InvalidDuration(limit.clone()))?;
                any_time = true;
            }
            if let Some(title) = manifest.au_title(&au.system_id) {
                details.titles.insert(au.system_id.clone(), title.to_string());
            }
        }
        for prerequisite in &manifest.prerequisites {
            details.prerequisites.insert(
                prerequisite.structure_element.clone(),
                prerequisite.expression.clone(),
            );
        }

        let course = &manifest.course;
        Ok(ModuleMetadata {
            module_type: ModuleType::Aicc,
            title: course
                .title
                .clone()
                .or_else(|| course.id.clone())
                .unwrap_or_default(),
            description: manifest.course_description.clone(),
            launch_url,
            identifier: course.id.clone(),
            version: course.version.clone(),
            duration: any_time.then_some(total),
            size_on_disk: None,
            xapi_enabled: false,
            details: FormatDetails::Aicc(details),
        })
    }
}

fn read_optional(
    access: &dyn FileAccess,
    extension: &str,
) -> Result<Option<(String, String)>, PackageError> {
    let Some(path) = access.files_with_extension(extension)?.into_iter().next() else {
        return Ok(None);
    };
    tracing::debug!(path = %path, "reading AICC descriptor");
    let text = access.read_to_string(&path)?;
    Ok(Some((path, text)))
}

fn read_required(access: &dyn FileAccess, extension: &str) -> Result<(String, String), PackageError> {
    read_optional(access, extension)?
        .ok_or_else(|| PackageError::ManifestNotFound(format!("*.{}", extension)))
}

impl ModuleParser for AiccParser {
    fn module_type(&self) -> ModuleType {
        ModuleType::Aicc
    }

    fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError> {
        let access = &LimitedFileAccess::new(access, self.options.max_file_size);
        let manifest = self.read_manifest(access)?;
        let mut metadata = self.summarize(&manifest)?;
        apply_package_facts(&mut metadata, access, &self.options)?;
        tracing::info!(
            title = %metadata.title,
            launch_url = %metadata.launch_url,
            units = manifest.assignable_units.len(),
            "parsed AICC package"
        );
        Ok(ParsedModule {
            metadata,
            manifest: ParsedManifest::Aicc(Box::new(manifest)),
        })
    }
}
