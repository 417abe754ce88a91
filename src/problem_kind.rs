//! Problem kinds: the set of modelling features a problem uses.
//!
//! Engines advertise the kind they support; a problem can be handled when
//! its kind is a subset of that (`problem.kind() <= engine_kind`).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single modelling feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    // Problem class
    ActionBased,
    Contingent,

    // Typing
    FlatTyping,
    HierarchicalTyping,

    // Numbers
    ContinuousNumbers,
    DiscreteNumbers,
    BoundedTypes,
    SimpleNumericPlanning,
    GeneralNumericPlanning,

    // Fluents
    NumericFluents,
    ObjectFluents,

    // Conditions
    NegativeConditions,
    DisjunctiveConditions,
    Equalities,
    ExistentialConditions,
    UniversalConditions,

    // Effects
    ConditionalEffects,
    IncreaseEffects,
    DecreaseEffects,

    // Simulated entities
    SimulatedEffects,
    ProbabilisticEffects,

    // Time
    ContinuousTime,

    // Quality metrics
    ActionsCost,
    PlanLength,
    Oversubscription,
    TemporalOversubscription,
    Makespan,
    FinalValue,
}

impl Feature {
    /// The group the feature belongs to.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::ActionBased | Self::Contingent => "PROBLEM_CLASS",
            Self::FlatTyping | Self::HierarchicalTyping => "TYPING",
            Self::ContinuousNumbers
            | Self::DiscreteNumbers
            | Self::BoundedTypes
            | Self::SimpleNumericPlanning
            | Self::GeneralNumericPlanning => "NUMBERS",
            Self::NumericFluents | Self::ObjectFluents => "FLUENTS_TYPE",
            Self::NegativeConditions
            | Self::DisjunctiveConditions
            | Self::Equalities
            | Self::ExistentialConditions
            | Self::UniversalConditions => "CONDITIONS_KIND",
            Self::ConditionalEffects | Self::IncreaseEffects | Self::DecreaseEffects => {
                "EFFECTS_KIND"
            }
            Self::SimulatedEffects | Self::ProbabilisticEffects => "SIMULATED_ENTITIES",
            Self::ContinuousTime => "TIME",
            Self::ActionsCost
            | Self::PlanLength
            | Self::Oversubscription
            | Self::TemporalOversubscription
            | Self::Makespan
            | Self::FinalValue => "QUALITY_METRICS",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::ActionBased => "ACTION_BASED",
            Self::Contingent => "CONTINGENT",
            Self::FlatTyping => "FLAT_TYPING",
            Self::HierarchicalTyping => "HIERARCHICAL_TYPING",
            Self::ContinuousNumbers => "CONTINUOUS_NUMBERS",
            Self::DiscreteNumbers => "DISCRETE_NUMBERS",
            Self::BoundedTypes => "BOUNDED_TYPES",
            Self::SimpleNumericPlanning => "SIMPLE_NUMERIC_PLANNING",
            Self::GeneralNumericPlanning => "GENERAL_NUMERIC_PLANNING",
            Self::NumericFluents => "NUMERIC_FLUENTS",
            Self::ObjectFluents => "OBJECT_FLUENTS",
            Self::NegativeConditions => "NEGATIVE_CONDITIONS",
            Self::DisjunctiveConditions => "DISJUNCTIVE_CONDITIONS",
            Self::Equalities => "EQUALITIES",
            Self::ExistentialConditions => "EXISTENTIAL_CONDITIONS",
            Self::UniversalConditions => "UNIVERSAL_CONDITIONS",
            Self::ConditionalEffects => "CONDITIONAL_EFFECTS",
            Self::IncreaseEffects => "INCREASE_EFFECTS",
            Self::DecreaseEffects => "DECREASE_EFFECTS",
            Self::SimulatedEffects => "SIMULATED_EFFECTS",
            Self::ProbabilisticEffects => "PROBABILISTIC_EFFECTS",
            Self::ContinuousTime => "CONTINUOUS_TIME",
            Self::ActionsCost => "ACTIONS_COST",
            Self::PlanLength => "PLAN_LENGTH",
            Self::Oversubscription => "OVERSUBSCRIPTION",
            Self::TemporalOversubscription => "TEMPORAL_OVERSUBSCRIPTION",
            Self::Makespan => "MAKESPAN",
            Self::FinalValue => "FINAL_VALUE",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A set of features, ordered by inclusion.
///
/// # Examples
///
/// ```
/// use plansim::{Feature, ProblemKind};
///
/// let engine = ProblemKind::from_iter([Feature::ActionBased, Feature::FlatTyping, Feature::NegativeConditions]);
/// let problem = ProblemKind::from_iter([Feature::ActionBased, Feature::FlatTyping]);
/// assert!(problem <= engine);
/// assert!(!(engine <= problem));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemKind {
    features: BTreeSet<Feature>,
}

impl ProblemKind {
    /// Creates an empty kind.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `feature`.
    pub fn set(&mut self, feature: Feature) {
        self.features.insert(feature);
    }

    /// Returns true if `feature` is in the set.
    #[must_use]
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Iterates the features in a stable order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    /// Returns true if no feature is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns true if every feature of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.features.is_subset(&other.features)
    }

    /// Features of `self` missing from `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Vec<Feature> {
        self.features.difference(&other.features).copied().collect()
    }

    /// Union of both sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            features: self.features.union(&other.features).copied().collect(),
        }
    }
}

impl FromIterator<Feature> for ProblemKind {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl PartialOrd for ProblemKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.is_subset(other), other.is_subset(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, feature) in self.features.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}.{feature}", feature.category())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusion_order() {
        let small = ProblemKind::from_iter([Feature::ActionBased]);
        let large = ProblemKind::from_iter([Feature::ActionBased, Feature::Equalities]);
        let other = ProblemKind::from_iter([Feature::ContinuousTime]);
        assert!(small <= large);
        assert!(small < large);
        assert!(!(large <= small));
        assert_eq!(small.partial_cmp(&other), None);
        assert_eq!(large.difference(&small), vec![Feature::Equalities]);
    }

    #[test]
    fn test_display_groups_features() {
        let kind = ProblemKind::from_iter([Feature::ContinuousTime, Feature::ActionBased]);
        assert_eq!(kind.to_string(), "{PROBLEM_CLASS.ACTION_BASED, TIME.CONTINUOUS_TIME}");
    }

    #[test]
    fn test_serde_roundtrip() {
        let kind = ProblemKind::from_iter([Feature::SimulatedEffects, Feature::FlatTyping]);
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"["flat_typing","simulated_effects"]"#);
        let back: ProblemKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
