//! # xAPI (TinCan)
//!
//! `tincan.xml` package descriptors, with `tincan.json` read when no XML
//! descriptor is present. The launchable activity is the first one that
//! carries a `<launch>` element.

use crate::access::{FileAccess, LimitedFileAccess};
use crate::lom::{LangString, LangStrings};
use crate::metadata::{FormatDetails, ModuleMetadata, XapiDetails};
use crate::options::ParserOptions;
use crate::parser::{
    ModuleParser, ParsedManifest, ParsedModule, apply_package_facts, read_xml_descriptor,
};
use crate::primitives::{TINCAN_JSON_MANIFEST, TINCAN_MANIFEST};
use crate::types::{ModuleType, PackageError};
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// MODEL
// =============================================================================

/// `<tincan>`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TincanManifest {
    pub activities: Vec<Activity>,
}

/// `<activity>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Activity type IRI.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: LangStrings,
    pub description: LangStrings,
    pub launch: Option<LangString>,
}

impl TincanManifest {
    /// Build the model from a `tincan.xml` root.
    pub fn from_element(root: &XmlElement) -> Result<Self, PackageError> {
        if !root.is("tincan") {
            return Err(PackageError::InvalidManifest(format!(
                "expected <tincan> root, found <{}>",
                root.name
            )));
        }
        let activities = root
            .child("activities")
            .map(|list| {
                list.children("activity")
                    .map(Activity::from_element)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();
        Ok(Self { activities })
    }

    /// Parse a `tincan.json` document.
    pub fn from_json(text: &str, file: &str) -> Result<Self, PackageError> {
        let document: JsonManifest = serde_json::from_str(text).map_err(|e| PackageError::Json {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            activities: document
                .activities
                .into_iter()
                .map(JsonActivity::into_activity)
                .collect(),
        })
    }

    /// First activity with a launch location.
    #[must_use]
    pub fn launch_activity(&self) -> Option<&Activity> {
        self.activities.iter().find(|a| a.launch.is_some())
    }
}

impl Activity {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let id = element.attr_string("id").ok_or_else(|| {
            PackageError::InvalidManifest("tincan activity without id".to_string())
        })?;
        let strings = |name: &str| {
            LangStrings(
                element
                    .children(name)
                    .filter_map(LangString::from_element)
                    .collect(),
            )
        };
        Ok(Self {
            id,
            kind: element.attr_string("type"),
            name: strings("name"),
            description: strings("description"),
            launch: element.child("launch").and_then(LangString::from_element),
        })
    }
}

#[derive(Deserialize)]
struct JsonManifest {
    #[serde(default)]
    activities: Vec<JsonActivity>,
}

#[derive(Deserialize)]
struct JsonActivity {
    id: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: BTreeMap<String, String>,
    #[serde(default)]
    description: BTreeMap<String, String>,
    launch: Option<JsonLaunch>,
}

/// `"launch"` is either a plain path or a language map.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLaunch {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl JsonActivity {
    fn into_activity(self) -> Activity {
        let strings = |map: BTreeMap<String, String>| {
            LangStrings(
                map.into_iter()
                    .map(|(language, value)| LangString::new(Some(&language), value))
                    .collect(),
            )
        };
        let launch = match self.launch {
            Some(JsonLaunch::Plain(url)) => Some(LangString::new(None, url)),
            Some(JsonLaunch::Localized(map)) => map
                .into_iter()
                .next()
                .map(|(language, url)| LangString::new(Some(&language), url)),
            None => None,
        };
        Activity {
            id: self.id,
            kind: self.kind,
            name: strings(self.name),
            description: strings(self.description),
            launch: launch.filter(|l| !l.value.trim().is_empty()),
        }
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Parses xAPI / TinCan packages.
#[derive(Debug, Clone, Default)]
pub struct XapiParser {
    options: ParserOptions,
}

impl XapiParser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Read `tincan.xml`, or `tincan.json` when there is no XML descriptor.
    pub fn read_manifest(&self, access: &dyn FileAccess) -> Result<TincanManifest, PackageError> {
        if access.resolve(TINCAN_MANIFEST)?.is_some() {
            let (_, root) = read_xml_descriptor(access, TINCAN_MANIFEST)?;
            return TincanManifest::from_element(&root);
        }
        let path = access
            .resolve(TINCAN_JSON_MANIFEST)?
            .ok_or_else(|| PackageError::ManifestNotFound(TINCAN_MANIFEST.to_string()))?;
        tracing::debug!(path = %path, "reading JSON descriptor");
        TincanManifest::from_json(&access.read_to_string(&path)?, &path)
    }

    /// Derive the module summary from a descriptor.
    pub fn summarize(&self, manifest: &TincanManifest) -> Result<ModuleMetadata, PackageError> {
        let language = self.options.preferred_language.as_str();
        let activity = manifest
            .launch_activity()
            .ok_or(PackageError::LaunchUrlNotFound)?;
        let launch_url = activity
            .launch
            .as_ref()
            .map(|l| l.value.trim().to_string())
            .ok_or(PackageError::LaunchUrlNotFound)?;

        let mut details = XapiDetails::default();
        for a in &manifest.activities {
            details.activity_ids.push(a.id.clone());
            if let Some(kind) = &a.kind {
                details.activity_types.insert(a.id.clone(), kind.clone());
            }
        }

        Ok(ModuleMetadata {
            module_type: ModuleType::Xapi,
            title: activity
                .name
                .best(language)
                .map(str::to_string)
                .unwrap_or_else(|| activity.id.clone()),
            description: activity.description.best(language).map(str::to_string),
            launch_url,
            identifier: Some(activity.id.clone()),
            version: None,
            duration: None,
            size_on_disk: None,
            xapi_enabled: true,
            details: FormatDetails::Xapi(details),
        })
    }
}

impl ModuleParser for XapiParser {
    fn module_type(&self) -> ModuleType {
        ModuleType::Xapi
    }

    fn parse(&self, access: &dyn FileAccess) -> Result<ParsedModule, PackageError> {
        let access = &LimitedFileAccess::new(access, self.options.max_file_size);
        let manifest = self.read_manifest(access)?;
        let mut metadata = self.summarize(&manifest)?;
        apply_package_facts(&mut metadata, access, &self.options)?;
        tracing::info!(
            title = %metadata.title,
            launch_url = %metadata.launch_url,
            activities = manifest.activities.len(),
            "parsed xAPI package"
        );
        Ok(ParsedModule {
            metadata,
            manifest: ParsedManifest::Xapi(Box::new(manifest)),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
