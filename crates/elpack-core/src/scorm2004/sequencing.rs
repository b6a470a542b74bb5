//! # IMS Simple Sequencing
//!
//! The `<imsss:sequencing>` element and the ADL sequencing extensions
//! (`adlseq:constrainedChoiceConsiderations`, `adlseq:rollupConsiderations`,
//! `adlseq:objectives`).
//!
//! Attribute defaults follow the IMS SS 1.0 schema. Vocabulary tokens are
//! closed: an unknown condition, action or timing is an error.
//!
//! `imsss:objectives` and `adlseq:objectives` share a local name and are
//! told apart by namespace.

use crate::PackageError;
use crate::duration::parse_iso8601;
use crate::primitives::ADLSEQ_NAMESPACE_MARKER;
use crate::xml::{XmlElement, check_range, parse_decimal};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// VOCABULARIES
// =============================================================================

vocabulary! {
    /// How the conditions of a rule combine.
    pub enum ConditionCombination ("conditionCombination") {
        All => "all",
        Any => "any",
    }
}

vocabulary! {
    /// Optional negation of a condition.
    #[derive(Default)]
    pub enum ConditionOperator ("condition operator") {
        #[default]
        NoOp => "noOp",
        Not => "not",
    }
}

vocabulary! {
    /// Conditions usable in sequencing and rollup rules.
    pub enum RuleConditionKind ("rule condition") {
        Satisfied => "satisfied",
        ObjectiveStatusKnown => "objectiveStatusKnown",
        ObjectiveMeasureKnown => "objectiveMeasureKnown",
        ObjectiveMeasureGreaterThan => "objectiveMeasureGreaterThan",
        ObjectiveMeasureLessThan => "objectiveMeasureLessThan",
        Completed => "completed",
        ActivityProgressKnown => "activityProgressKnown",
        Attempted => "attempted",
        AttemptLimitExceeded => "attemptLimitExceeded",
        TimeLimitExceeded => "timeLimitExceeded",
        OutsideAvailableTimeRange => "outsideAvailableTimeRange",
        Always => "always",
    }
}

vocabulary! {
    /// Actions of pre-, exit- and post-condition rules.
    pub enum RuleAction ("rule action") {
        Skip => "skip",
        Disabled => "disabled",
        HiddenFromChoice => "hiddenFromChoice",
        StopForwardTraversal => "stopForwardTraversal",
        Exit => "exit",
        ExitParent => "exitParent",
        ExitAll => "exitAll",
        Retry => "retry",
        RetryAll => "retryAll",
        Continue => "continue",
        Previous => "previous",
    }
}

vocabulary! {
    /// Which children a rollup rule looks at.
    #[derive(Default)]
    pub enum ChildActivitySet ("childActivitySet") {
        #[default]
        All => "all",
        Any => "any",
        None => "none",
        AtLeastCount => "atLeastCount",
        AtLeastPercent => "atLeastPercent",
    }
}

vocabulary! {
    /// Result of a rollup rule.
    pub enum RollupAction ("rollup action") {
        Satisfied => "satisfied",
        NotSatisfied => "notSatisfied",
        Completed => "completed",
        Incomplete => "incomplete",
    }
}

vocabulary! {
    /// When randomization or selection happens.
    #[derive(Default)]
    pub enum RandomizationTiming ("randomization timing") {
        #[default]
        Never => "never",
        Once => "once",
        OnEachNewAttempt => "onEachNewAttempt",
    }
}

vocabulary! {
    /// When a child counts towards its parent's rollup.
    #[derive(Default)]
    pub enum RollupConsideration ("rollup consideration") {
        #[default]
        Always => "always",
        IfAttempted => "ifAttempted",
        IfNotSkipped => "ifNotSkipped",
        IfNotSuspended => "ifNotSuspended",
    }
}

fn token<T>(
    element: &XmlElement,
    name: &str,
    parse: fn(&str) -> Result<T, PackageError>,
) -> Result<Option<T>, PackageError> {
    element.attr_trimmed(name).map(parse).transpose()
}

fn ranged(element: &XmlElement, name: &str, min: f64, max: f64) -> Result<Option<f64>, PackageError> {
    element
        .attr_f64(name)?
        .map(|value| check_range(value, min, max, &format!("{}@{}", element.name, name)))
        .transpose()
}

// =============================================================================
// CONTROL MODE
// =============================================================================

/// `<controlMode>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMode {
    pub choice: bool,
    pub choice_exit: bool,
    pub flow: bool,
    pub forward_only: bool,
    pub use_current_attempt_objective_info: bool,
    pub use_current_attempt_progress_info: bool,
}

impl Default for ControlMode {
    fn default() -> Self {
        Self {
            choice: true,
            choice_exit: true,
            flow: false,
            forward_only: false,
            use_current_attempt_objective_info: true,
            use_current_attempt_progress_info: true,
        }
    }
}

impl ControlMode {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let d = Self::default();
        Ok(Self {
            choice: element.attr_bool_or("choice", d.choice)?,
            choice_exit: element.attr_bool_or("choiceExit", d.choice_exit)?,
            flow: element.attr_bool_or("flow", d.flow)?,
            forward_only: element.attr_bool_or("forwardOnly", d.forward_only)?,
            use_current_attempt_objective_info: element
                .attr_bool_or("useCurrentAttemptObjectiveInfo", d.use_current_attempt_objective_info)?,
            use_current_attempt_progress_info: element
                .attr_bool_or("useCurrentAttemptProgressInfo", d.use_current_attempt_progress_info)?,
        })
    }
}

// =============================================================================
// SEQUENCING RULES
// =============================================================================

/// `<ruleCondition>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub referenced_objective: Option<String>,
    /// In [-1, 1].
    pub measure_threshold: Option<f64>,
    pub operator: ConditionOperator,
    pub condition: RuleConditionKind,
}

impl RuleCondition {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            referenced_objective: element.attr_string("referencedObjective"),
            measure_threshold: ranged(element, "measureThreshold", -1.0, 1.0)?,
            operator: token(element, "operator", ConditionOperator::parse)?.unwrap_or_default(),
            condition: token(element, "condition", RuleConditionKind::parse)?.ok_or_else(|| {
                PackageError::InvalidManifest("ruleCondition without condition".to_string())
            })?,
        })
    }
}

/// `<ruleConditions>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConditions {
    pub combination: ConditionCombination,
    pub items: Vec<RuleCondition>,
}

impl Default for RuleConditions {
    fn default() -> Self {
        Self {
            combination: ConditionCombination::All,
            items: Vec::new(),
        }
    }
}

impl RuleConditions {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            combination: token(element, "conditionCombination", ConditionCombination::parse)?
                .unwrap_or(ConditionCombination::All),
            items: element
                .children("ruleCondition")
                .map(RuleCondition::from_element)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// A pre-, exit- or post-condition rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencingRule {
    pub conditions: RuleConditions,
    pub action: RuleAction,
}

impl SequencingRule {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let action = element
            .child("ruleAction")
            .and_then(|a| a.attr_trimmed("action"))
            .ok_or_else(|| {
                PackageError::InvalidManifest(format!("<{}> without ruleAction", element.name))
            })?;
        Ok(Self {
            conditions: element
                .child("ruleConditions")
                .map(RuleConditions::from_element)
                .transpose()?
                .unwrap_or_default(),
            action: RuleAction::parse(action)?,
        })
    }
}

/// `<sequencingRules>`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequencingRules {
    pub pre_condition: Vec<SequencingRule>,
    pub exit_condition: Vec<SequencingRule>,
    pub post_condition: Vec<SequencingRule>,
}

impl SequencingRules {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let rules = |name: &str| -> Result<Vec<SequencingRule>, PackageError> {
            element
                .children(name)
                .map(SequencingRule::from_element)
                .collect()
        };
        Ok(Self {
            pre_condition: rules("preConditionRule")?,
            exit_condition: rules("exitConditionRule")?,
            post_condition: rules("postConditionRule")?,
        })
    }
}

// =============================================================================
// LIMIT CONDITIONS
// =============================================================================

/// `<limitConditions>`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LimitConditions {
    pub attempt_limit: Option<u32>,
    /// ISO 8601 duration, validated on parse.
    pub attempt_absolute_duration_limit: Option<String>,
}

impl LimitConditions {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let duration = element.attr_string("attemptAbsoluteDurationLimit");
        if let Some(raw) = &duration {
            parse_iso8601(raw)?;
        }
        Ok(Self {
            attempt_limit: element.attr_u32("attemptLimit")?,
            attempt_absolute_duration_limit: duration,
        })
    }

    /// The attempt duration limit as a [`Duration`].
    #[must_use]
    pub fn attempt_absolute_duration(&self) -> Option<Duration> {
        self.attempt_absolute_duration_limit
            .as_deref()
            .and_then(|raw| parse_iso8601(raw).ok())
    }
}

// =============================================================================
// ROLLUP RULES
// =============================================================================

/// `<rollupCondition>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupCondition {
    pub operator: ConditionOperator,
    pub condition: RuleConditionKind,
}

/// `<rollupConditions>`; conditions combine with `any` unless stated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConditions {
    pub combination: ConditionCombination,
    pub items: Vec<RollupCondition>,
}

impl RollupConditions {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let items = element
            .children("rollupCondition")
            .map(|c| -> Result<RollupCondition, PackageError> {
                Ok(RollupCondition {
                    operator: token(c, "operator", ConditionOperator::parse)?.unwrap_or_default(),
                    condition: token(c, "condition", RuleConditionKind::parse)?.ok_or_else(|| {
                        PackageError::InvalidManifest("rollupCondition without condition".to_string())
                    })?,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            combination: token(element, "conditionCombination", ConditionCombination::parse)?
                .unwrap_or(ConditionCombination::Any),
            items,
        })
    }
}

/// `<rollupRule>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRule {
    pub child_activity_set: ChildActivitySet,
    pub minimum_count: u32,
    /// In [0, 1].
    pub minimum_percent: f64,
    pub conditions: RollupConditions,
    pub action: RollupAction,
}

impl RollupRule {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let conditions = element.child("rollupConditions").ok_or_else(|| {
            PackageError::InvalidManifest("rollupRule without rollupConditions".to_string())
        })?;
        let action = element
            .child("rollupAction")
            .and_then(|a| a.attr_trimmed("action"))
            .ok_or_else(|| {
                PackageError::InvalidManifest("rollupRule without rollupAction".to_string())
            })?;
        Ok(Self {
            child_activity_set: token(element, "childActivitySet", ChildActivitySet::parse)?
                .unwrap_or_default(),
            minimum_count: element.attr_u32("minimumCount")?.unwrap_or(0),
            minimum_percent: ranged(element, "minimumPercent", 0.0, 1.0)?.unwrap_or(0.0),
            conditions: RollupConditions::from_element(conditions)?,
            action: RollupAction::parse(action)?,
        })
    }
}

/// `<rollupRules>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRules {
    pub rollup_objective_satisfied: bool,
    pub rollup_progress_completion: bool,
    /// In [0, 1].
    pub objective_measure_weight: f64,
    pub rules: Vec<RollupRule>,
}

impl Default for RollupRules {
    fn default() -> Self {
        Self {
            rollup_objective_satisfied: true,
            rollup_progress_completion: true,
            objective_measure_weight: 1.0,
            rules: Vec::new(),
        }
    }
}

impl RollupRules {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            rollup_objective_satisfied: element.attr_bool_or("rollupObjectiveSatisfied", true)?,
            rollup_progress_completion: element.attr_bool_or("rollupProgressCompletion", true)?,
            objective_measure_weight: ranged(element, "objectiveMeasureWeight", 0.0, 1.0)?
                .unwrap_or(1.0),
            rules: element
                .children("rollupRule")
                .map(RollupRule::from_element)
                .collect::<Result<_, _>>()?,
        })
    }
}

// =============================================================================
// OBJECTIVES
// =============================================================================

/// `<imsss:mapInfo>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    pub target_objective_id: String,
    pub read_satisfied_status: bool,
    pub read_normalized_measure: bool,
    pub write_satisfied_status: bool,
    pub write_normalized_measure: bool,
}

impl MapInfo {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            target_objective_id: element.attr_string("targetObjectiveID").ok_or_else(|| {
                PackageError::InvalidManifest("mapInfo without targetObjectiveID".to_string())
            })?,
            read_satisfied_status: element.attr_bool_or("readSatisfiedStatus", true)?,
            read_normalized_measure: element.attr_bool_or("readNormalizedMeasure", true)?,
            write_satisfied_status: element.attr_bool_or("writeSatisfiedStatus", false)?,
            write_normalized_measure: element.attr_bool_or("writeNormalizedMeasure", false)?,
        })
    }
}

/// `<primaryObjective>` or `<objective>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub objective_id: Option<String>,
    pub satisfied_by_measure: bool,
    /// In [-1, 1]; defaults to 1.0.
    pub min_normalized_measure: f64,
    pub map_info: Vec<MapInfo>,
}

impl Objective {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let min_normalized_measure = match element.child_text("minNormalizedMeasure") {
            Some(raw) => {
                let what = "minNormalizedMeasure";
                check_range(parse_decimal(raw, what)?, -1.0, 1.0, what)?
            }
            None => 1.0,
        };
        Ok(Self {
            objective_id: element.attr_string("objectiveID"),
            satisfied_by_measure: element.attr_bool_or("satisfiedByMeasure", false)?,
            min_normalized_measure,
            map_info: element
                .children("mapInfo")
                .map(MapInfo::from_element)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// `<imsss:objectives>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub primary: Objective,
    pub others: Vec<Objective>,
}

impl Objectives {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let primary = element.child("primaryObjective").ok_or_else(|| {
            PackageError::InvalidManifest("objectives without primaryObjective".to_string())
        })?;
        Ok(Self {
            primary: Objective::from_element(primary)?,
            others: element
                .children("objective")
                .map(Objective::from_element)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Primary objective first, then the others.
    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        std::iter::once(&self.primary).chain(self.others.iter())
    }
}

// =============================================================================
// RANDOMIZATION / DELIVERY
// =============================================================================

/// `<randomizationControls>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RandomizationControls {
    pub randomization_timing: RandomizationTiming,
    pub select_count: Option<u32>,
    pub reorder_children: bool,
    pub selection_timing: RandomizationTiming,
}

impl RandomizationControls {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            randomization_timing: token(element, "randomizationTiming", RandomizationTiming::parse)?
                .unwrap_or_default(),
            select_count: element.attr_u32("selectCount")?,
            reorder_children: element.attr_bool_or("reorderChildren", false)?,
            selection_timing: token(element, "selectionTiming", RandomizationTiming::parse)?
                .unwrap_or_default(),
        })
    }
}

/// `<deliveryControls>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryControls {
    pub tracked: bool,
    pub completion_set_by_content: bool,
    pub objective_set_by_content: bool,
}

impl Default for DeliveryControls {
    fn default() -> Self {
        Self {
            tracked: true,
            completion_set_by_content: false,
            objective_set_by_content: false,
        }
    }
}

impl DeliveryControls {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            tracked: element.attr_bool_or("tracked", true)?,
            completion_set_by_content: element.attr_bool_or("completionSetByContent", false)?,
            objective_set_by_content: element.attr_bool_or("objectiveSetByContent", false)?,
        })
    }
}

// =============================================================================
// ADL SEQUENCING EXTENSIONS
// =============================================================================

/// `<adlseq:constrainedChoiceConsiderations>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstrainedChoiceConsiderations {
    pub prevent_activation: bool,
    pub constrain_choice: bool,
}

/// `<adlseq:rollupConsiderations>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConsiderations {
    pub required_for_satisfied: RollupConsideration,
    pub required_for_not_satisfied: RollupConsideration,
    pub required_for_completed: RollupConsideration,
    pub required_for_incomplete: RollupConsideration,
    pub measure_satisfaction_if_active: bool,
}

impl Default for RollupConsiderations {
    fn default() -> Self {
        Self {
            required_for_satisfied: RollupConsideration::Always,
            required_for_not_satisfied: RollupConsideration::Always,
            required_for_completed: RollupConsideration::Always,
            required_for_incomplete: RollupConsideration::Always,
            measure_satisfaction_if_active: true,
        }
    }
}

impl RollupConsiderations {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let required = |name: &str| -> Result<RollupConsideration, PackageError> {
            Ok(token(element, name, RollupConsideration::parse)?.unwrap_or_default())
        };
        Ok(Self {
            required_for_satisfied: required("requiredForSatisfied")?,
            required_for_not_satisfied: required("requiredForNotSatisfied")?,
            required_for_completed: required("requiredForCompleted")?,
            required_for_incomplete: required("requiredForIncomplete")?,
            measure_satisfaction_if_active: element
                .attr_bool_or("measureSatisfactionIfActive", true)?,
        })
    }
}

/// `<adlseq:mapInfo>`: score and completion mapping to a global objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdlMapInfo {
    pub target_objective_id: String,
    pub read_raw_score: bool,
    pub read_min_score: bool,
    pub read_max_score: bool,
    pub read_completion_status: bool,
    pub read_progress_measure: bool,
    pub write_raw_score: bool,
    pub write_min_score: bool,
    pub write_max_score: bool,
    pub write_completion_status: bool,
    pub write_progress_measure: bool,
}

impl AdlMapInfo {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let flag = |name: &str, default: bool| element.attr_bool_or(name, default);
        Ok(Self {
            target_objective_id: element.attr_string("targetObjectiveID").ok_or_else(|| {
                PackageError::InvalidManifest("adlseq:mapInfo without targetObjectiveID".to_string())
            })?,
            read_raw_score: flag("readRawScore", true)?,
            read_min_score: flag("readMinScore", true)?,
            read_max_score: flag("readMaxScore", true)?,
            read_completion_status: flag("readCompletionStatus", true)?,
            read_progress_measure: flag("readProgressMeasure", true)?,
            write_raw_score: flag("writeRawScore", false)?,
            write_min_score: flag("writeMinScore", false)?,
            write_max_score: flag("writeMaxScore", false)?,
            write_completion_status: flag("writeCompletionStatus", false)?,
            write_progress_measure: flag("writeProgressMeasure", false)?,
        })
    }
}

/// `<adlseq:objective>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdlObjective {
    pub objective_id: String,
    pub map_info: Vec<AdlMapInfo>,
}

impl AdlObjective {
    fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            objective_id: element.attr_string("objectiveID").ok_or_else(|| {
                PackageError::InvalidManifest("adlseq:objective without objectiveID".to_string())
            })?,
            map_info: element
                .children("mapInfo")
                .map(AdlMapInfo::from_element)
                .collect::<Result<_, _>>()?,
        })
    }
}

// =============================================================================
// SEQUENCING
// =============================================================================

/// `<imsss:sequencing>`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sequencing {
    /// `ID`, set on entries of a sequencing collection.
    pub id: Option<String>,
    /// `IDRef` to a sequencing collection entry.
    pub id_ref: Option<String>,
    pub control_mode: Option<ControlMode>,
    pub sequencing_rules: Option<SequencingRules>,
    pub limit_conditions: Option<LimitConditions>,
    pub rollup_rules: Option<RollupRules>,
    pub objectives: Option<Objectives>,
    pub randomization_controls: Option<RandomizationControls>,
    pub delivery_controls: Option<DeliveryControls>,
    pub constrained_choice: Option<ConstrainedChoiceConsiderations>,
    pub rollup_considerations: Option<RollupConsiderations>,
    /// `adlseq:objectives`
    pub adl_objectives: Vec<AdlObjective>,
}

impl Sequencing {
    /// Read a `<sequencing>` element.
    pub fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        let mut objectives = None;
        let mut adl_objectives = Vec::new();
        for child in element.children("objectives") {
            if child.in_namespace(ADLSEQ_NAMESPACE_MARKER) {
                for objective in child.children("objective") {
                    adl_objectives.push(AdlObjective::from_element(objective)?);
                }
            } else {
                objectives = Some(Objectives::from_element(child)?);
            }
        }

        Ok(Self {
            id: element.attr_string("ID"),
            id_ref: element.attr_string("IDRef"),
            control_mode: element
                .child("controlMode")
                .map(ControlMode::from_element)
                .transpose()?,
            sequencing_rules: element
                .child("sequencingRules")
                .map(SequencingRules::from_element)
                .transpose()?,
            limit_conditions: element
                .child("limitConditions")
                .map(LimitConditions::from_element)
                .transpose()?,
            rollup_rules: element
                .child("rollupRules")
                .map(RollupRules::from_element)
                .transpose()?,
            objectives,
            randomization_controls: element
                .child("randomizationControls")
                .map(RandomizationControls::from_element)
                .transpose()?,
            delivery_controls: element
                .child("deliveryControls")
                .map(DeliveryControls::from_element)
                .transpose()?,
            constrained_choice: element
                .child("constrainedChoiceConsiderations")
                .map(|c| -> Result<_, PackageError> {
                    Ok(ConstrainedChoiceConsiderations {
                        prevent_activation: c.attr_bool_or("preventActivation", false)?,
                        constrain_choice: c.attr_bool_or("constrainChoice", false)?,
                    })
                })
                .transpose()?,
            rollup_considerations: element
                .child("rollupConsiderations")
                .map(RollupConsiderations::from_element)
                .transpose()?,
            adl_objectives,
        })
    }

    /// Combine with the collection entry this element references.
    ///
    /// Elements present on `self` win; missing ones are taken from `base`.
    #[must_use]
    pub fn merged_with(&self, base: &Sequencing) -> Sequencing {
        Sequencing {
            id: self.id.clone(),
            id_ref: self.id_ref.clone(),
            control_mode: self.control_mode.or(base.control_mode),
            sequencing_rules: self
                .sequencing_rules
                .clone()
                .or_else(|| base.sequencing_rules.clone()),
            limit_conditions: self
                .limit_conditions
                .clone()
                .or_else(|| base.limit_conditions.clone()),
            rollup_rules: self.rollup_rules.clone().or_else(|| base.rollup_rules.clone()),
            objectives: self.objectives.clone().or_else(|| base.objectives.clone()),
            randomization_controls: self.randomization_controls.or(base.randomization_controls),
            delivery_controls: self.delivery_controls.or(base.delivery_controls),
            constrained_choice: self.constrained_choice.or(base.constrained_choice),
            rollup_considerations: self.rollup_considerations.or(base.rollup_considerations),
            adl_objectives: if self.adl_objectives.is_empty() {
                base.adl_objectives.clone()
            } else {
                self.adl_objectives.clone()
            },
        }
    }

    /// Resolve `IDRef` against a sequencing collection.
    pub fn resolved(self, collection: Option<&SequencingCollection>) -> Result<Self, PackageError> {
        let Some(reference) = self.id_ref.as_deref() else {
            return Ok(self);
        };
        let base = collection.and_then(|c| c.find(reference)).ok_or_else(|| {
            PackageError::InvalidManifest(format!(
                "sequencing IDRef '{}' matches no sequencingCollection entry",
                reference
            ))
        })?;
        Ok(self.merged_with(base))
    }

    /// Objective identifiers, primary first, including ADL objectives.
    pub fn objective_ids(&self) -> impl Iterator<Item = &str> {
        self.objectives
            .iter()
            .flat_map(Objectives::iter)
            .filter_map(|o| o.objective_id.as_deref())
            .chain(self.adl_objectives.iter().map(|o| o.objective_id.as_str()))
    }

    /// Global objective identifiers targeted by any map.
    pub fn global_objective_ids(&self) -> impl Iterator<Item = &str> {
        self.objectives
            .iter()
            .flat_map(Objectives::iter)
            .flat_map(|o| o.map_info.iter().map(|m| m.target_objective_id.as_str()))
            .chain(
                self.adl_objectives
                    .iter()
                    .flat_map(|o| o.map_info.iter().map(|m| m.target_objective_id.as_str())),
            )
    }
}

/// `<imsss:sequencingCollection>`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequencingCollection {
    pub items: Vec<Sequencing>,
}

impl SequencingCollection {
    /// Read a `<sequencingCollection>` element.
    pub fn from_element(element: &XmlElement) -> Result<Self, PackageError> {
        Ok(Self {
            items: element
                .children("sequencing")
                .map(Sequencing::from_element)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Entry by `ID`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Sequencing> {
        self.items.iter().find(|s| s.id.as_deref() == Some(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn sequencing(xml: &str) -> Result<Sequencing, PackageError> {
        Sequencing::from_element(&parse_document(xml, "imsmanifest.xml").expect("xml"))
    }

    const FULL: &str = r#"
<imsss:sequencing xmlns:imsss="http://www.imsglobal.org/xsd/imsss"
                  xmlns:adlseq="http://www.adlnet.org/xsd/adlseq_v1p3">
  <imsss:controlMode choice="false" flow="true"/>
  <imsss:sequencingRules>
    <imsss:preConditionRule>
      <imsss:ruleConditions conditionCombination="any">
        <imsss:ruleCondition referencedObjective="OBJ1" condition="satisfied"/>
        <imsss:ruleCondition operator="not" condition="attempted"/>
      </imsss:ruleConditions>
      <imsss:ruleAction action="skip"/>
    </imsss:preConditionRule>
    <imsss:postConditionRule>
      <imsss:ruleConditions>
        <imsss:ruleCondition condition="always"/>
      </imsss:ruleConditions>
      <imsss:ruleAction action="exitAll"/>
    </imsss:postConditionRule>
  </imsss:sequencingRules>
  <imsss:limitConditions attemptLimit="3" attemptAbsoluteDurationLimit="PT1H"/>
  <imsss:rollupRules objectiveMeasureWeight="0.5">
    <imsss:rollupRule childActivitySet="atLeastPercent" minimumPercent="0.75">
      <imsss:rollupConditions>
        <imsss:rollupCondition condition="completed"/>
      </imsss:rollupConditions>
      <imsss:rollupAction action="completed"/>
    </imsss:rollupRule>
  </imsss:rollupRules>
  <imsss:objectives>
    <imsss:primaryObjective objectiveID="PRIMARY" satisfiedByMeasure="true">
      <imsss:minNormalizedMeasure>0.6</imsss:minNormalizedMeasure>
      <imsss:mapInfo targetObjectiveID="GLOBAL1" writeSatisfiedStatus="true"/>
    </imsss:primaryObjective>
    <imsss:objective objectiveID="OBJ1"/>
  </imsss:objectives>
  <imsss:randomizationControls reorderChildren="true" randomizationTiming="onEachNewAttempt"/>
  <imsss:deliveryControls tracked="false"/>
  <adlseq:constrainedChoiceConsiderations constrainChoice="true"/>
  <adlseq:rollupConsiderations requiredForSatisfied="ifNotSkipped"/>
  <adlseq:objectives>
    <adlseq:objective objectiveID="OBJ1">
      <adlseq:mapInfo targetObjectiveID="GLOBAL2" writeRawScore="true"/>
    </adlseq:objective>
  </adlseq:objectives>
</imsss:sequencing>"#;

    #[test]
    fn parses_full_sequencing() {
        let s = sequencing(FULL).expect("sequencing");

        let control = s.control_mode.expect("control mode");
        assert!(!control.choice);
        assert!(control.flow);
        assert!(control.choice_exit);

        let rules = s.sequencing_rules.as_ref().expect("rules");
        assert_eq!(rules.pre_condition.len(), 1);
        let pre = &rules.pre_condition[0];
        assert_eq!(pre.action, RuleAction::Skip);
        assert_eq!(pre.conditions.combination, ConditionCombination::Any);
        assert_eq!(pre.conditions.items[1].operator, ConditionOperator::Not);
        assert_eq!(rules.post_condition[0].action, RuleAction::ExitAll);
        assert_eq!(rules.post_condition[0].conditions.combination, ConditionCombination::All);

        let limits = s.limit_conditions.as_ref().expect("limits");
        assert_eq!(limits.attempt_limit, Some(3));
        assert_eq!(limits.attempt_absolute_duration(), Some(Duration::from_secs(3_600)));

        let rollup = s.rollup_rules.as_ref().expect("rollup");
        assert_eq!(rollup.objective_measure_weight, 0.5);
        assert!(rollup.rollup_objective_satisfied);
        let rule = &rollup.rules[0];
        assert_eq!(rule.child_activity_set, ChildActivitySet::AtLeastPercent);
        assert_eq!(rule.minimum_percent, 0.75);
        assert_eq!(rule.conditions.combination, ConditionCombination::Any);
        assert_eq!(rule.action, RollupAction::Completed);

        let objectives = s.objectives.as_ref().expect("objectives");
        assert!(objectives.primary.satisfied_by_measure);
        assert_eq!(objectives.primary.min_normalized_measure, 0.6);
        assert!(objectives.primary.map_info[0].write_satisfied_status);
        assert!(objectives.primary.map_info[0].read_satisfied_status);
        assert_eq!(objectives.others[0].min_normalized_measure, 1.0);

        let randomization = s.randomization_controls.expect("randomization");
        assert!(randomization.reorder_children);
        assert_eq!(randomization.randomization_timing, RandomizationTiming::OnEachNewAttempt);
        assert_eq!(randomization.selection_timing, RandomizationTiming::Never);

        assert!(!s.delivery_controls.expect("delivery").tracked);
        assert!(s.constrained_choice.expect("constrained").constrain_choice);
        assert_eq!(
            s.rollup_considerations.expect("considerations").required_for_satisfied,
            RollupConsideration::IfNotSkipped
        );
        assert_eq!(s.adl_objectives.len(), 1);
        assert!(s.adl_objectives[0].map_info[0].write_raw_score);

        assert_eq!(s.objective_ids().collect::<Vec<_>>(), vec!["PRIMARY", "OBJ1", "OBJ1"]);
        assert_eq!(
            s.global_objective_ids().collect::<Vec<_>>(),
            vec!["GLOBAL1", "GLOBAL2"]
        );
    }

    #[test]
    fn rejects_unknown_condition_token() {
        let err = sequencing(
            r#"<sequencing><sequencingRules><preConditionRule>
                 <ruleConditions><ruleCondition condition="bored"/></ruleConditions>
                 <ruleAction action="skip"/>
               </preConditionRule></sequencingRules></sequencing>"#,
        )
        .expect_err("unknown condition");
        assert!(matches!(err, PackageError::InvalidManifest(m) if m.contains("bored")));
    }

    #[test]
    fn rejects_out_of_range_measures() {
        assert!(sequencing(
            r#"<sequencing><objectives><primaryObjective>
                 <minNormalizedMeasure>1.5</minNormalizedMeasure>
               </primaryObjective></objectives></sequencing>"#
        )
        .is_err());
        assert!(sequencing(r#"<sequencing><rollupRules objectiveMeasureWeight="2"/></sequencing>"#).is_err());
    }

    #[test]
    fn rejects_bad_duration_limit() {
        let err = sequencing(
            r#"<sequencing><limitConditions attemptAbsoluteDurationLimit="1 hour"/></sequencing>"#,
        )
        .expect_err("bad duration");
        assert!(matches!(err, PackageError::InvalidDuration(_)));
    }

    #[test]
    fn defaults_match_schema() {
        let control = ControlMode::default();
        assert!(control.choice && control.choice_exit && !control.flow && !control.forward_only);
        let delivery = DeliveryControls::default();
        assert!(delivery.tracked && !delivery.completion_set_by_content);
        assert_eq!(RollupRules::default().objective_measure_weight, 1.0);
    }

    #[test]
    fn idref_merges_with_collection_entry() {
        let collection = SequencingCollection::from_element(
            &parse_document(
                r#"<sequencingCollection>
                     <sequencing ID="common">
                       <controlMode flow="true"/>
                       <deliveryControls tracked="false"/>
                     </sequencing>
                   </sequencingCollection>"#,
                "imsmanifest.xml",
            )
            .expect("xml"),
        )
        .expect("collection");

        let own = sequencing(r#"<sequencing IDRef="common"><controlMode choice="false"/></sequencing>"#)
            .expect("sequencing")
            .resolved(Some(&collection))
            .expect("resolved");
        let control = own.control_mode.expect("control");
        assert!(!control.choice);
        assert!(!control.flow);
        assert!(!own.delivery_controls.expect("delivery").tracked);

        let dangling = sequencing(r#"<sequencing IDRef="missing"/>"#).expect("sequencing");
        assert!(dangling.resolved(Some(&collection)).is_err());
    }
}
