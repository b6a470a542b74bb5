//! AICC course structure files.

use super::csv::{Record, parse_table};
use super::prerequisite::PrerequisiteExpression;
use crate::PackageError;
use crate::primitives::MAX_TREE_DEPTH;
use crate::xml::{check_range, parse_decimal};
use ini::{Ini, ParseOption, Properties};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Section of a `.crs` file holding free text rather than key/value pairs.
const DESCRIPTION_SECTION: &str = "Course_Description";

// =============================================================================
// COURSE (.crs)
// =============================================================================

/// `[Course]` and `[Course_Behavior]` of the `.crs` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Course {
    pub creator: Option<String>,
    pub id: Option<String>,
    pub system: Option<String>,
    pub title: Option<String>,
    pub level: Option<String>,
    pub max_fields_cst: Option<u32>,
    pub max_fields_ort: Option<u32>,
    pub total_aus: Option<u32>,
    pub total_blocks: Option<u32>,
    pub total_objectives: Option<u32>,
    pub total_complex_obj: Option<u32>,
    pub version: Option<String>,
    /// `[Course_Behavior] Max_Normal`
    pub max_normal: Option<u32>,
}

/// Parsed `.crs` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseFile {
    pub course: Course,
    /// `[Course_Description]` free text.
    pub description: Option<String>,
}

impl CourseFile {
    /// Parse a `.crs` file.
    ///
    /// `[Course_Description]` is cut out before the remainder is read as INI,
    /// since its body is prose rather than `key=value` lines.
    pub fn parse(text: &str, file: &str) -> Result<Self, PackageError> {
        let (ini_text, description) = split_description(text);
        let ini = Ini::load_from_str_opt(
            &ini_text,
            ParseOption {
                enabled_escape: false,
                ..ParseOption::default()
            },
        )
        .map_err(|e| PackageError::Ini {
            file: file.to_string(),
            message: e.to_string(),
        })?;

        let course = ini.section(Some("Course")).ok_or_else(|| PackageError::Ini {
            file: file.to_string(),
            message: "missing [Course] section".to_string(),
        })?;
        let number = |props: &Properties, key: &str| -> Result<Option<u32>, PackageError> {
            value(props, key)
                .map(|raw| {
                    raw.parse::<u32>().map_err(|_| PackageError::Ini {
                        file: file.to_string(),
                        message: format!("{} must be a non-negative integer, got '{}'", key, raw),
                    })
                })
                .transpose()
        };

        let max_normal = match ini.section(Some("Course_Behavior")) {
            Some(behavior) => number(behavior, "Max_Normal")?,
            None => None,
        };

        Ok(Self {
            course: Course {
                creator: value(course, "Course_Creator"),
                id: value(course, "Course_ID"),
                system: value(course, "Course_System"),
                title: value(course, "Course_Title"),
                level: value(course, "Level"),
                max_fields_cst: number(course, "Max_Fields_CST")?,
                max_fields_ort: number(course, "Max_Fields_ORT")?,
                total_aus: number(course, "Total_AUs")?,
                total_blocks: number(course, "Total_Blocks")?,
                total_objectives: number(course, "Total_Objectives")?,
                total_complex_obj: number(course, "Total_Complex_Obj")?,
                version: value(course, "Version"),
                max_normal,
            },
            description,
        })
    }
}

fn value(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn section_name(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

fn split_description(text: &str) -> (String, Option<String>) {
    let mut ini_text = String::with_capacity(text.len());
    let mut description: Vec<&str> = Vec::new();
    let mut in_description = false;
    for line in text.lines() {
        if let Some(name) = section_name(line) {
            in_description = name.eq_ignore_ascii_case(DESCRIPTION_SECTION);
            if in_description {
                continue;
            }
        }
        if in_description {
            description.push(line.trim_end());
        } else {
            ini_text.push_str(line);
            ini_text.push('\n');
        }
    }
    let description = description.join("\n").trim().to_string();
    (ini_text, (!description.is_empty()).then_some(description))
}

// =============================================================================
// ASSIGNABLE UNITS (.au)
// =============================================================================

/// One row of the `.au` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignableUnit {
    pub system_id: String,
    pub kind: Option<String>,
    pub command_line: Option<String>,
    pub file_name: Option<String>,
    pub max_score: Option<f64>,
    /// 0..=100
    pub mastery_score: Option<f64>,
    /// Raw CMI timespan.
    pub max_time_allowed: Option<String>,
    pub time_limit_action: Option<String>,
    pub system_vendor: Option<String>,
    pub core_vendor: Option<String>,
    pub web_launch: Option<String>,
    pub au_password: Option<String>,
}

impl AssignableUnit {
    fn from_record(record: &Record<'_>, file: &str) -> Result<Self, PackageError> {
        let system_id = record.string("System_ID").ok_or_else(|| PackageError::Ini {
            file: file.to_string(),
            message: "assignable unit without System_ID".to_string(),
        })?;
        let score = |column: &str| -> Result<Option<f64>, PackageError> {
            record
                .get(column)
                .map(|raw| parse_decimal(raw, &format!("{} of AU {}", column, system_id)))
                .transpose()
        };
        let mastery_score = score("Mastery_Score")?
            .map(|v| check_range(v, 0.0, 100.0, &format!("Mastery_Score of AU {}", system_id)))
            .transpose()?;
        Ok(Self {
            kind: record.string("Type"),
            command_line: record.string("Command_Line"),
            file_name: record.string("File_Name"),
            max_score: score("Max_Score")?,
            mastery_score,
            max_time_allowed: record.string("Max_Time_Allowed"),
            time_limit_action: record.string("Time_Limit_Action"),
            system_vendor: record.string("System_Vendor"),
            core_vendor: record.string("Core_Vendor"),
            web_launch: record.string("Web_Launch"),
            au_password: record.string("AU_Password"),
            system_id,
        })
    }

    /// Parse a `.au` file.
    pub fn parse_all(text: &str, file: &str) -> Result<Vec<Self>, PackageError> {
        parse_table(text, file)?
            .records()
            .map(|record| Self::from_record(&record, file))
            .collect()
    }
}

// =============================================================================
// DESCRIPTORS (.des)
// =============================================================================

/// One row of the `.des` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub system_id: String,
    pub developer_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Descriptor {
    /// Parse a `.des` file. Rows without a system id are skipped.
    pub fn parse_all(text: &str, file: &str) -> Result<Vec<Self>, PackageError> {
        Ok(parse_table(text, file)?
            .records()
            .filter_map(|record| {
                Some(Self {
                    system_id: record.string("System_ID")?,
                    developer_id: record.string("Developer_ID"),
                    title: record.string("Title"),
                    description: record.string("Description"),
                })
            })
            .collect())
    }
}

// =============================================================================
// STRUCTURE (.cst) / OBJECTIVES (.ort)
// =============================================================================

/// A block and its members; the first column names the block.
///
/// Used for both the course structure (`.cst`) and the objective
/// relationships (`.ort`) tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberList {
    pub block: String,
    pub members: Vec<String>,
}

impl MemberList {
    /// Parse a ragged `block,member,member,...` table.
    pub fn parse_all(text: &str, file: &str) -> Result<Vec<Self>, PackageError> {
        Ok(parse_table(text, file)?
            .records()
            .filter_map(|record| {
                Some(Self {
                    block: record.first()?.to_string(),
                    members: record.rest(1),
                })
            })
            .collect())
    }
}

// =============================================================================
// PREREQUISITES (.pre)
// =============================================================================

/// One row of the `.pre` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub structure_element: String,
    pub expression: PrerequisiteExpression,
}

impl Prerequisite {
    /// Parse a `.pre` file. Rows with a blank prerequisite are skipped.
    pub fn parse_all(text: &str, file: &str) -> Result<Vec<Self>, PackageError> {
        let table = parse_table(text, file)?;
        let mut out = Vec::new();
        for record in table.records() {
            let (Some(element), Some(raw)) =
                (record.get("Structure_Element"), record.get("Prerequisite"))
            else {
                continue;
            };
            out.push(Self {
                structure_element: element.to_string(),
                expression: PrerequisiteExpression::parse(raw)?,
            });
        }
        Ok(out)
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

/// All AICC descriptor files of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiccManifest {
    pub course: Course,
    pub course_description: Option<String>,
    pub assignable_units: Vec<AssignableUnit>,
    pub descriptors: Vec<Descriptor>,
    pub course_structure: Vec<MemberList>,
    pub prerequisites: Vec<Prerequisite>,
    pub objective_relationships: Vec<MemberList>,
}

impl AiccManifest {
    /// Assignable unit by system id (ASCII case-insensitive).
    #[must_use]
    pub fn assignable_unit(&self, system_id: &str) -> Option<&AssignableUnit> {
        self.assignable_units
            .iter()
            .find(|au| au.system_id.eq_ignore_ascii_case(system_id))
    }

    /// Descriptor by system id (ASCII case-insensitive).
    #[must_use]
    pub fn descriptor(&self, system_id: &str) -> Option<&Descriptor> {
        self.descriptors
            .iter()
            .find(|d| d.system_id.eq_ignore_ascii_case(system_id))
    }

    /// Descriptor title of an assignable unit.
    #[must_use]
    pub fn au_title(&self, system_id: &str) -> Option<&str> {
        self.descriptor(system_id)?.title.as_deref()
    }

    /// Assignable units in course-structure order.
    ///
    /// Walks the `.cst` depth-first from the `root` block (or the first
    /// block when there is none); units missing from the structure follow
    /// in `.au` file order. Blocks nested deeper than `MAX_TREE_DEPTH` are
    /// rejected.
    pub fn ordered_units(&self) -> Result<Vec<&AssignableUnit>, PackageError> {
        let mut walk = StructureWalk::new(self);
        let start = walk
            .blocks
            .get("root")
            .copied()
            .or_else(|| self.course_structure.first());
        if let Some(start) = start {
            walk.visit(start, 0)?;
        }
        for au in &self.assignable_units {
            walk.push_unit(au);
        }
        Ok(walk.ordered)
    }
}

/// State of one depth-first walk over the course structure.
struct StructureWalk<'a> {
    units: HashMap<String, &'a AssignableUnit>,
    blocks: HashMap<String, &'a MemberList>,
    visited: HashSet<String>,
    placed: HashSet<String>,
    ordered: Vec<&'a AssignableUnit>,
}

impl<'a> StructureWalk<'a> {
    fn new(manifest: &'a AiccManifest) -> Self {
        let mut units = HashMap::new();
        for au in &manifest.assignable_units {
            units.entry(au.system_id.to_ascii_lowercase()).or_insert(au);
        }
        let mut blocks = HashMap::new();
        for block in &manifest.course_structure {
            blocks.entry(block.block.to_ascii_lowercase()).or_insert(block);
        }
        Self {
            units,
            blocks,
            visited: HashSet::new(),
            placed: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    fn push_unit(&mut self, au: &'a AssignableUnit) {
        if self.placed.insert(au.system_id.to_ascii_lowercase()) {
            self.ordered.push(au);
        }
    }

    fn visit(&mut self, block: &'a MemberList, depth: usize) -> Result<(), PackageError> {
        if depth > MAX_TREE_DEPTH {
            return Err(PackageError::InvalidManifest(format!(
                "course structure nested deeper than {} blocks at '{}'",
                MAX_TREE_DEPTH, block.block
            )));
        }
        if !self.visited.insert(block.block.to_ascii_lowercase()) {
            tracing::warn!(block = %block.block, "course structure cycle; skipping block");
            return Ok(());
        }
        for member in &block.members {
            let key = member.to_ascii_lowercase();
            if let Some(au) = self.units.get(&key).copied() {
                self.push_unit(au);
            } else if let Some(child) = self.blocks.get(&key).copied() {
                self.visit(child, depth + 1)?;
            } else {
                tracing::warn!(member = %member, "course structure member is neither AU nor block");
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
