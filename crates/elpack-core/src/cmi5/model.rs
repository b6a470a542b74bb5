//! cmi5 course structure model (`cmi5.xml`, CourseStructure.xsd).

use crate::PackageError;
use crate::lom::LangStrings;
use crate::primitives::MAX_TREE_DEPTH;
use crate::xml::{XmlElement, check_range};
use serde::{Deserialize, Serialize};

vocabulary! {
    /// Criterion for satisfying an AU (`au@moveOn`).
    #[derive(Default)]
    pub enum MoveOn ("moveOn") {
        Passed => "Passed",
        Completed => "Completed",
        CompletedAndPassed => "CompletedAndPassed",
        CompletedOrPassed => "CompletedOrPassed",
        #[default]
        NotApplicable => "NotApplicable",
    }
}

vocabulary! {
    /// Where the LMS opens an AU (`au@launchMethod`).
    #[derive(Default)]
    pub enum LaunchMethod ("launchMethod") {
        #[default]
        AnyWindow => "AnyWindow",
        OwnWindow => "OwnWindow",
    }
}

/// `<courseStructure>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStructure {
    pub course: Course,
    pub objectives: Vec<Objective>,
    /// Top-level blocks and AUs in document order.
    pub content: Vec<CourseNode>,
}

impl CourseStructure {
    /// Build the model from the document root.
    pub fn from_element(root: &XmlElement) -> Result<Self, PackageError> {
        if !root.is("courseStructure") {
            return Err(PackageError::InvalidManifest(format!(
                "expected <courseStructure> root, found <{}>",
                root.name
            )));
        }
        let course = root
            .child("course")
            .ok_or_else(|| PackageError::InvalidManifest("cmi5 course element missing".into()))?;
        let objectives = root
            .child("objectives")
            .map(|list| {
                list.children("objective")
                    .map(Objective::from_element)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let structure = Self {
            course: Course::from_element(course)?,
            objectives,
            content: CourseNode::list(root, 0)?,
        };
        structure.warn_on_unknown_objectives();
        Ok(structure)
    }

    /// AUs depth-first through blocks, in document order.
    #[must_use]
    pub fn assignable_units(&self) -> Vec<&AssignableUnit> {
        let mut out = Vec::new();
        collect_units(&self.content, &mut out);
        out
    }

    /// Declared course objective by id.
    #[must_use]
    pub fn objective(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    fn warn_on_unknown_objectives(&self) {
        let mut refs: Vec<&ObjectiveRef> = Vec::new();
        collect_objective_refs(&self.content, &mut refs);
        for reference in refs {
            if self.objective(&reference.idref).is_none() {
                tracing::warn!(idref = %reference.idref, "objective reference to undeclared objective");
            }
        }
    }
}

fn collect_units<'a>(nodes: &'a [CourseNode], out: &mut Vec<&'a AssignableUnit>) {
    for node in nodes {
        match node {
            CourseNode::Au(au) => out.push(au),
            CourseNode::Block(block) => collect_units(&block.content, out),
        }
    }
}

fn collect_objective_refs<'a>(nodes: &'a [CourseNode], out: &mut Vec<&'a ObjectiveRef>) {
    for node in nodes {
        match node {
            CourseNode::Au(au) => out.extend(&au.objectives),
            CourseNode::Block(block) => {
                out.extend(&block.objectives);
                collect_objective_refs(&block.content, out);
            }
        }
    }
}

/// `<course>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: LangStrings,
    pub description: LangStrings,
}

impl Course {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            id: required_id(element, "id")?,
            title: lang_child(element, "title"),
            description: lang_child(element, "description"),
        })
    }
}

/// Course-level `<objective>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub title: LangStrings,
    pub description: LangStrings,
}

impl Objective {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            id: required_id(element, "id")?,
            title: lang_child(element, "title"),
            description: lang_child(element, "description"),
        })
    }
}

/// `<objective idref=".."/>` under a block or AU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRef {
    pub idref: String,
}

impl ObjectiveRef {
    fn list(parent: &XmlElement) -> Result<Vec<Self>, PackageError> {
        let Some(list) = parent.child("objectives") else {
            return Ok(Vec::new());
        };
        list.children("objective")
            .map(|o| -> Result<Self, PackageError> {
                Ok(Self {
                    idref: required_id(o, "idref")?,
                })
            })
            .collect()
    }
}

/// A block or AU in the course tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum CourseNode {
    Block(Block),
    Au(AssignableUnit),
}

impl CourseNode {
    fn list(parent: &XmlElement, depth: usize) -> Result<Vec<Self>, PackageError> {
        if depth > MAX_TREE_DEPTH {
            return Err(PackageError::InvalidManifest(format!(
                "cmi5 blocks nested deeper than {}",
                MAX_TREE_DEPTH
            )));
        }
        let mut nodes = Vec::new();
        for child in &parent.children {
            if child.is("au") {
                nodes.push(Self::Au(AssignableUnit::from_element(child)?));
            } else if child.is("block") {
                nodes.push(Self::Block(Block::from_element(child, depth + 1)?));
            }
        }
        Ok(nodes)
    }
}

/// `<block>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub title: LangStrings,
    pub description: LangStrings,
    pub objectives: Vec<ObjectiveRef>,
    pub content: Vec<CourseNode>,
}

impl Block {
    fn from_element(element: &XmlElement, depth: usize) -> Result<Self, PackageError> {
        Ok(Self {
            id: required_id(element, "id")?,
            title: lang_child(element, "title"),
            description: lang_child(element, "description"),
            objectives: ObjectiveRef::list(element)?,
            content: CourseNode::list(element, depth)?,
        })
    }
}

/// `<au>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignableUnit {
    pub id: String,
    pub move_on: MoveOn,
    /// 0..=1
    pub mastery_score: Option<f64>,
    pub launch_method: LaunchMethod,
    pub activity_type: Option<String>,
    pub url: String,
    pub title: LangStrings,
    pub description: LangStrings,
    pub objectives: Vec<ObjectiveRef>,
    pub launch_parameters: Option<String>,
    pub entitlement_key: Option<String>,
}

impl AssignableUnit {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let id = required_id(element, "id")?;
        let url = element
            .child_string("url")
            .ok_or_else(|| PackageError::InvalidManifest(format!("cmi5 AU '{}' has no url", id)))?;
        let mastery_score = element
            .attr_f64("masteryScore")?
            .map(|score| check_range(score, 0.0, 1.0, &format!("masteryScore of AU {}", id)))
            .transpose()?;
        Ok(Self {
            move_on: element
                .attr_trimmed("moveOn")
                .map(MoveOn::parse)
                .transpose()?
                .unwrap_or_default(),
            mastery_score,
            launch_method: element
                .attr_trimmed("launchMethod")
                .map(LaunchMethod::parse)
                .transpose()?
                .unwrap_or_default(),
            activity_type: element.attr_string("activityType"),
            url,
            title: lang_child(element, "title"),
            description: lang_child(element, "description"),
            objectives: ObjectiveRef::list(element)?,
            launch_parameters: element.child_string("launchParameters"),
            entitlement_key: element.child_string("entitlementKey"),
            id,
        })
    }
}

fn required_id(element: &XmlElement, attr: &str) -> Result<String, PackageError> {
    element.attr_string(attr).ok_or_else(|| {
        PackageError::InvalidManifest(format!("<{}> is missing its {} attribute", element.name, attr))
    })
}

fn lang_child(element: &XmlElement, name: &str) -> LangStrings {
    element
        .child(name)
        .map(LangStrings::from_container)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn structure(xml: &str) -> Result<CourseStructure, PackageError> {
        CourseStructure::from_element(&parse_document(xml, "cmi5.xml").expect("xml"))
    }

    #[test]
    fn units_are_depth_first() {
        let s = structure(
            r#"<courseStructure>
  <course id="c"><title><langstring>C</langstring></title></course>
  <block id="b1">
    <au id="au1"><url>a1.html</url></au>
    <block id="b2"><au id="au2"><url>a2.html</url></au></block>
  </block>
  <au id="au3"><url>a3.html</url></au>
</courseStructure>"#,
        )
        .expect("parse");
        let ids: Vec<&str> = s.assignable_units().iter().map(|au| au.id.as_str()).collect();
        assert_eq!(ids, vec!["au1", "au2", "au3"]);
        assert_eq!(s.content.len(), 2);
        assert!(matches!(s.content[0], CourseNode::Block(_)));
    }

    #[test]
    fn au_defaults() {
        let s = structure(
            r#"<courseStructure><course id="c"/><au id="a"><url>x.html</url></au></courseStructure>"#,
        )
        .expect("parse");
        let au = s.assignable_units()[0];
        assert_eq!(au.move_on, MoveOn::NotApplicable);
        assert_eq!(au.launch_method, LaunchMethod::AnyWindow);
        assert_eq!(au.mastery_score, None);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_score = r#"<courseStructure><course id="c"/><au id="a" masteryScore="1.5"><url>x</url></au></courseStructure>"#;
        assert!(matches!(structure(bad_score), Err(PackageError::InvalidManifest(_))));

        let bad_move_on = r#"<courseStructure><course id="c"/><au id="a" moveOn="Sometimes"><url>x</url></au></courseStructure>"#;
        assert!(structure(bad_move_on).is_err());

        let no_url = r#"<courseStructure><course id="c"/><au id="a"/></courseStructure>"#;
        assert!(structure(no_url).is_err());

        let no_course = r#"<courseStructure><au id="a"><url>x</url></au></courseStructure>"#;
        assert!(structure(no_course).is_err());
    }
}
