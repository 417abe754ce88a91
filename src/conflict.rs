//! Conflict detection between effects of the same event.
//!
//! Conflicts are found at two points in time. While an action is being
//! built, an [`EffectLedger`] records the unconditional, non-boolean writes
//! seen so far and rejects a new effect that contradicts them. Boolean and
//! conditional clashes cannot be decided without a state, so they are left
//! to apply-time resolution, which reports them with a [`ConflictKind`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::effect::Effect;
use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::FluentExp;

/// Why two writes to the same fluent inside one event are incompatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// Two assignments produced different values.
    DifferentAssignments,
    /// An assignment followed an increase or decrease.
    AssignmentAfterIncrease,
    /// An increase or decrease followed an assignment.
    AssignmentAndIncrease,
    /// A simulated or probabilistic effect disagreed with a regular effect.
    DifferentValues,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DifferentAssignments => write!(f, "by 2 different assignments"),
            Self::AssignmentAfterIncrease => {
                write!(f, "by 1 assignments and an increase/decrease")
            }
            Self::AssignmentAndIncrease => {
                write!(f, "by an assignment and an increase/decrease")
            }
            Self::DifferentValues => write!(f, "with different values"),
        }
    }
}

/// The group of already-declared effects a new effect collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictTarget {
    /// Assignments (or any regular effect).
    Effects,
    /// Increase and decrease effects.
    IncreaseDecreaseEffects,
    /// The simulated effect.
    SimulatedEffects,
    /// Probabilistic effects.
    ProbabilisticEffects,
}

impl fmt::Display for ConflictTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Effects => write!(f, "effects"),
            Self::IncreaseDecreaseEffects => write!(f, "increase/decrease effects"),
            Self::SimulatedEffects => write!(f, "simulated effects"),
            Self::ProbabilisticEffects => write!(f, "probabilistic effects"),
        }
    }
}

/// Construction-time record of the writes declared for one instant.
///
/// Only unconditional effects on non-boolean fluents are recorded, so a
/// ledger never rejects what add-after-delete could still resolve.
#[derive(Debug, Clone, Default)]
pub struct EffectLedger {
    assigned: HashMap<FluentExp, Expr>,
    inc_dec: HashSet<FluentExp>,
    simulated: HashSet<FluentExp>,
    probabilistic: HashSet<FluentExp>,
}

impl EffectLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `effect` against the recorded writes and records it.
    ///
    /// `subject` names the effect in error messages (e.g. `"effect f := 1"`),
    /// `owner` names what holds the effects (e.g. `"action"`).
    pub fn check_effect(
        &mut self,
        effect: &Effect,
        subject: &str,
        owner: &str,
    ) -> Result<(), ModelError> {
        if effect.is_conditional() || effect.fluent().value_type().is_bool() {
            return Ok(());
        }
        let fluent = effect.fluent();
        let conflict = |target| ModelError::ConflictingEffects {
            subject: subject.to_string(),
            target,
            owner: owner.to_string(),
        };

        if effect.is_assignment() {
            if self.inc_dec.contains(fluent) {
                return Err(conflict(ConflictTarget::IncreaseDecreaseEffects));
            }
            if self.simulated.contains(fluent) {
                return Err(conflict(ConflictTarget::SimulatedEffects));
            }
            if self.probabilistic.contains(fluent) {
                return Err(conflict(ConflictTarget::ProbabilisticEffects));
            }
            match self.assigned.get(fluent) {
                Some(previous) if !same_value(previous, effect.value()) => {
                    Err(conflict(ConflictTarget::Effects))
                }
                Some(_) => Ok(()),
                None => {
                    self.assigned.insert(fluent.clone(), effect.value().clone());
                    Ok(())
                }
            }
        } else {
            if self.assigned.contains_key(fluent) {
                return Err(conflict(ConflictTarget::Effects));
            }
            if self.simulated.contains(fluent) {
                return Err(conflict(ConflictTarget::SimulatedEffects));
            }
            if self.probabilistic.contains(fluent) {
                return Err(conflict(ConflictTarget::ProbabilisticEffects));
            }
            self.inc_dec.insert(fluent.clone());
            Ok(())
        }
    }

    /// Checks the fluents of a simulated effect and records them.
    pub fn check_simulated(
        &mut self,
        fluents: &[FluentExp],
        subject: &str,
        owner: &str,
    ) -> Result<(), ModelError> {
        self.check_computed(fluents, subject, owner, true)?;
        self.simulated = fluents.iter().cloned().collect();
        Ok(())
    }

    /// Checks the fluents of a probabilistic effect and records them.
    pub fn check_probabilistic(
        &mut self,
        fluents: &[FluentExp],
        subject: &str,
        owner: &str,
    ) -> Result<(), ModelError> {
        self.check_computed(fluents, subject, owner, false)?;
        self.probabilistic.extend(fluents.iter().cloned());
        Ok(())
    }

    fn check_computed(
        &self,
        fluents: &[FluentExp],
        subject: &str,
        owner: &str,
        replacing_simulated: bool,
    ) -> Result<(), ModelError> {
        for fluent in fluents {
            let target = if self.assigned.contains_key(fluent) || self.inc_dec.contains(fluent) {
                Some(ConflictTarget::Effects)
            } else if !replacing_simulated && self.simulated.contains(fluent) {
                Some(ConflictTarget::SimulatedEffects)
            } else if self.probabilistic.contains(fluent) {
                Some(ConflictTarget::ProbabilisticEffects)
            } else {
                None
            };
            if let Some(target) = target {
                return Err(ModelError::ConflictingEffects {
                    subject: subject.to_string(),
                    target,
                    owner: owner.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn same_value(a: &Expr, b: &Expr) -> bool {
    match (a.as_constant(), b.as_constant()) {
        (Some(x), Some(y)) => x.same_constant(y),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectKind;
    use crate::environment::Environment;
    use crate::fluent::Fluent;
    use crate::types::Type;

    fn int_fluent(env: &Environment, name: &str) -> FluentExp {
        Fluent::new(env, name, Type::int(), Vec::new())
            .unwrap()
            .call(Vec::new())
            .unwrap()
    }

    fn bool_fluent(env: &Environment, name: &str) -> FluentExp {
        Fluent::new(env, name, Type::Bool, Vec::new())
            .unwrap()
            .call(Vec::new())
            .unwrap()
    }

    fn effect(fluent: &FluentExp, value: i64, kind: EffectKind) -> Effect {
        Effect::new(fluent.clone(), Expr::from(value), Expr::from(true), kind)
    }

    #[test]
    fn test_conflict_kind_messages() {
        assert_eq!(ConflictKind::DifferentAssignments.to_string(), "by 2 different assignments");
        assert_eq!(
            ConflictKind::AssignmentAfterIncrease.to_string(),
            "by 1 assignments and an increase/decrease"
        );
        assert_eq!(ConflictKind::DifferentValues.to_string(), "with different values");
    }

    #[test]
    fn test_same_assignment_twice_is_accepted() {
        let env = Environment::new();
        let f = int_fluent(&env, "f");
        let mut ledger = EffectLedger::new();
        ledger.check_effect(&effect(&f, 5, EffectKind::Assign), "effect", "action").unwrap();
        ledger.check_effect(&effect(&f, 5, EffectKind::Assign), "effect", "action").unwrap();
    }

    #[test]
    fn test_different_assignments_rejected() {
        let env = Environment::new();
        let f = int_fluent(&env, "f");
        let mut ledger = EffectLedger::new();
        ledger.check_effect(&effect(&f, 5, EffectKind::Assign), "effect", "action").unwrap();
        let err = ledger
            .check_effect(&effect(&f, 6, EffectKind::Assign), "effect f := 6", "action")
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::ConflictingEffects {
                target: ConflictTarget::Effects,
                ..
            }
        ));
    }

    #[test]
    fn test_assign_after_increase_rejected() {
        let env = Environment::new();
        let f = int_fluent(&env, "f");
        let mut ledger = EffectLedger::new();
        ledger.check_effect(&effect(&f, 1, EffectKind::Increase), "effect", "action").unwrap();
        ledger.check_effect(&effect(&f, 2, EffectKind::Decrease), "effect", "action").unwrap();
        let err = ledger
            .check_effect(&effect(&f, 5, EffectKind::Assign), "effect", "action")
            .unwrap_err();
        assert!(err.to_string().contains("increase/decrease effects"));
    }

    #[test]
    fn test_boolean_and_conditional_effects_not_recorded() {
        let env = Environment::new();
        let b = bool_fluent(&env, "b");
        let f = int_fluent(&env, "f");
        let mut ledger = EffectLedger::new();
        let add = Effect::new(b.clone(), Expr::from(true), Expr::from(true), EffectKind::Assign);
        let del = Effect::new(b, Expr::from(false), Expr::from(true), EffectKind::Assign);
        ledger.check_effect(&add, "effect", "action").unwrap();
        ledger.check_effect(&del, "effect", "action").unwrap();

        let guard = bool_fluent(&env, "guard");
        let cond = Effect::new(f.clone(), Expr::from(5), Expr::from(guard), EffectKind::Assign);
        ledger.check_effect(&cond, "effect", "action").unwrap();
        ledger.check_effect(&effect(&f, 1, EffectKind::Increase), "effect", "action").unwrap();
    }

    #[test]
    fn test_probabilistic_fluents_clash_with_assignments() {
        let env = Environment::new();
        let f = int_fluent(&env, "f");
        let g = int_fluent(&env, "g");
        let mut ledger = EffectLedger::new();
        ledger.check_effect(&effect(&f, 1, EffectKind::Assign), "effect", "action").unwrap();
        ledger.check_probabilistic(&[g.clone()], "probabilistic effect", "action").unwrap();

        let err = ledger
            .check_probabilistic(&[g.clone()], "probabilistic effect", "action")
            .unwrap_err();
        assert!(err.to_string().contains("probabilistic effects"));
        let err = ledger
            .check_probabilistic(&[f], "probabilistic effect", "action")
            .unwrap_err();
        assert!(err.to_string().contains("the effects already in the action"));
        let err = ledger
            .check_effect(&effect(&g, 3, EffectKind::Assign), "effect", "action")
            .unwrap_err();
        assert!(err.to_string().contains("probabilistic effects"));
    }

    #[test]
    fn test_simulated_effect_replaces_previous() {
        let env = Environment::new();
        let f = int_fluent(&env, "f");
        let mut ledger = EffectLedger::new();
        ledger.check_simulated(&[f.clone()], "simulated effect", "action").unwrap();
        ledger.check_simulated(&[f.clone()], "simulated effect", "action").unwrap();
        let err = ledger
            .check_effect(&effect(&f, 1, EffectKind::Increase), "effect", "action")
            .unwrap_err();
        assert!(err.to_string().contains("simulated effects"));
    }
}
