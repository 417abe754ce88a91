//! Apply-time resolution of the effects of one event.
//!
//! Effects are resolved left to right against a running table of updated
//! values. Assignments and increases of the same fluent conflict; two
//! assignments of different constants conflict unless the fluent is
//! boolean, in which case a `true` write always survives a `false` one.
//! Callback-driven effects are merged last with the same rule.

use std::collections::{HashMap, HashSet};

use crate::conflict::ConflictKind;
use crate::effect::{Effect, EffectKind};
use crate::error::ExecutionError;
use crate::evaluator::StateEvaluator;
use crate::fluent::GroundFluent;
use crate::problem::Problem;
use crate::state::State;
use crate::types::Type;
use crate::value::Value;

use super::event::ComputedEffect;

/// Running resolution state for one event applied to one state.
pub(crate) struct EffectResolver<'p> {
    problem: &'p Problem,
    evaluator: StateEvaluator<'p>,
    updates: HashMap<GroundFluent, Value>,
    assigned: HashSet<GroundFluent>,
}

fn conflict(fluent: &GroundFluent, kind: ConflictKind) -> ExecutionError {
    ExecutionError::ConflictingEffects {
        fluent: fluent.to_string(),
        kind,
    }
}

/// Kind-level type check; numeric bounds are left to the applicability check.
fn same_kind(ty: &Type, value: &Value) -> bool {
    match (ty, value) {
        (Type::Bool, Value::Bool(_))
        | (Type::Int { .. }, Value::Int(_))
        | (Type::Real { .. }, Value::Int(_) | Value::Real(_)) => true,
        (Type::User(expected), Value::Object(o)) => o.user_type().is_subtype_of(expected),
        _ => false,
    }
}

impl<'p> EffectResolver<'p> {
    pub(crate) fn new(problem: &'p Problem) -> Self {
        Self {
            problem,
            evaluator: StateEvaluator::new(problem),
            updates: HashMap::new(),
            assigned: HashSet::new(),
        }
    }

    /// Resolves `effect` and records its result.
    ///
    /// Returns the written fluent and its new value, or `None` when the
    /// effect's condition is false or a `false` write lost to an earlier
    /// `true` write.
    pub(crate) fn apply_effect(
        &mut self,
        effect: &Effect,
        state: &State,
    ) -> Result<Option<(GroundFluent, Value)>, ExecutionError> {
        if effect.is_conditional() && !self.evaluator.evaluate_bool(effect.condition(), state)? {
            return Ok(None);
        }
        let fluent = self.evaluator.ground(effect.fluent(), state)?;
        let value = self.evaluator.evaluate(effect.value(), state)?;
        let resolved = match effect.kind() {
            EffectKind::Assign => self.resolve_assignment(&fluent, value)?,
            EffectKind::Increase | EffectKind::Decrease => {
                Some(self.resolve_increment(effect, &fluent, &value, state)?)
            }
        };
        Ok(resolved.map(|v| {
            let v = fluent.value_type().coerce(v);
            self.updates.insert(fluent.clone(), v.clone());
            (fluent, v)
        }))
    }

    fn resolve_assignment(&mut self, fluent: &GroundFluent, value: Value) -> Result<Option<Value>, ExecutionError> {
        match self.updates.get(fluent) {
            Some(old) if !old.same_constant(&value) => {
                if !fluent.value_type().is_bool() {
                    return Err(conflict(fluent, ConflictKind::DifferentAssignments));
                }
                // add-after-delete
                Ok((old.as_bool() == Some(false)).then_some(value))
            }
            Some(_) if !self.assigned.contains(fluent) => {
                Err(conflict(fluent, ConflictKind::AssignmentAfterIncrease))
            }
            _ => {
                self.assigned.insert(fluent.clone());
                Ok(Some(value))
            }
        }
    }

    fn resolve_increment(
        &self,
        effect: &Effect,
        fluent: &GroundFluent,
        delta: &Value,
        state: &State,
    ) -> Result<Value, ExecutionError> {
        if self.assigned.contains(fluent) {
            return Err(conflict(fluent, ConflictKind::AssignmentAndIncrease));
        }
        let base = match self.updates.get(fluent) {
            Some(v) => v,
            None => state.lookup(fluent)?,
        };
        let result = match effect.kind() {
            EffectKind::Decrease => base.checked_sub(delta),
            _ => base.checked_add(delta),
        };
        result.ok_or_else(|| ExecutionError::Evaluation {
            expr: effect.to_string(),
            reason: format!("arithmetic overflow applying {delta} to {base}"),
        })
    }

    /// Runs a callback-driven effect and checks its output shape.
    pub(crate) fn compute(
        &self,
        effect: ComputedEffect<'_>,
        state: &State,
    ) -> Result<Vec<(GroundFluent, Value)>, ExecutionError> {
        let fluents = effect.fluents();
        let values = effect.compute(self.problem, state);
        if values.len() != fluents.len() {
            return Err(ExecutionError::EffectValueCount {
                fluents: fluents.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                expected: fluents.len(),
                actual: values.len(),
            });
        }
        fluents
            .iter()
            .zip(values)
            .map(|(f, v)| {
                let fluent = self.evaluator.ground(f, state)?;
                let ty = fluent.value_type();
                if !same_kind(ty, &v) {
                    return Err(ExecutionError::EffectValueType {
                        fluent: fluent.to_string(),
                        value: v.to_string(),
                        expected: ty.to_string(),
                    });
                }
                let v = ty.coerce(v);
                Ok((fluent, v))
            })
            .collect()
    }

    /// Merges values produced by a callback into the resolved updates.
    pub(crate) fn merge_computed(&mut self, values: Vec<(GroundFluent, Value)>) -> Result<(), ExecutionError> {
        for (fluent, value) in values {
            let clashes = self
                .updates
                .get(&fluent)
                .map(|old| (!self.assigned.contains(&fluent) || !old.same_constant(&value), old.as_bool()));
            match clashes {
                Some((true, old)) => {
                    if !fluent.value_type().is_bool() {
                        return Err(conflict(&fluent, ConflictKind::DifferentValues));
                    }
                    if old == Some(false) {
                        self.updates.insert(fluent, value);
                    }
                }
                _ => {
                    self.updates.insert(fluent, value);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn into_updates(self) -> HashMap<GroundFluent, Value> {
        self.updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::InstantaneousActionBuilder;
    use crate::effect::effect_fn;
    use crate::environment::Environment;
    use crate::expression::Expr;
    use crate::fluent::Fluent;
    use crate::problem::ProblemBuilder;
    use crate::simulation::event::Event;

    struct Fixture {
        problem: Problem,
        flag: Fluent,
        counter: Fluent,
    }

    fn fixture() -> Fixture {
        let env = Environment::new();
        let flag = Fluent::new(&env, "flag", Type::Bool, vec![]).unwrap();
        let counter = Fluent::new(&env, "counter", Type::int(), vec![]).unwrap();
        let problem = ProblemBuilder::new(&env, "resolve")
            .add_fluent(&flag, Some(Value::Bool(false)))
            .add_fluent(&counter, Some(Value::Int(3)))
            .build()
            .unwrap();
        Fixture { problem, flag, counter }
    }

    fn assign(fluent: &Fluent, value: impl Into<Expr>) -> Effect {
        Effect::new(fluent.call(vec![]).unwrap(), value.into(), Expr::from(true), EffectKind::Assign)
    }

    fn increase(fluent: &Fluent, value: impl Into<Expr>) -> Effect {
        Effect::new(fluent.call(vec![]).unwrap(), value.into(), Expr::from(true), EffectKind::Increase)
    }

    #[test]
    fn test_true_survives_false_in_either_order() {
        let fx = fixture();
        let state = fx.problem.initial_state();
        for order in [[true, false], [false, true]] {
            let mut resolver = EffectResolver::new(&fx.problem);
            for v in order {
                resolver.apply_effect(&assign(&fx.flag, v), &state).unwrap();
            }
            let updates = resolver.into_updates();
            assert_eq!(updates.values().next(), Some(&Value::Bool(true)));
        }
    }

    #[test]
    fn test_increments_accumulate() {
        let fx = fixture();
        let state = fx.problem.initial_state();
        let mut resolver = EffectResolver::new(&fx.problem);
        resolver.apply_effect(&increase(&fx.counter, 2), &state).unwrap();
        let (_, v) = resolver.apply_effect(&increase(&fx.counter, 5), &state).unwrap().unwrap();
        assert_eq!(v, Value::Int(10));
    }

    #[test]
    fn test_assignment_and_increase_conflict() {
        let fx = fixture();
        let state = fx.problem.initial_state();

        let mut resolver = EffectResolver::new(&fx.problem);
        resolver.apply_effect(&assign(&fx.counter, 1), &state).unwrap();
        let err = resolver.apply_effect(&increase(&fx.counter, 1), &state).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::ConflictingEffects { kind: ConflictKind::AssignmentAndIncrease, .. }
        ));

        let mut resolver = EffectResolver::new(&fx.problem);
        resolver.apply_effect(&increase(&fx.counter, 1), &state).unwrap();
        let err = resolver.apply_effect(&assign(&fx.counter, 1), &state).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::ConflictingEffects { kind: ConflictKind::AssignmentAfterIncrease, .. }
        ));
    }

    #[test]
    fn test_equal_assignments_do_not_conflict() {
        let fx = fixture();
        let state = fx.problem.initial_state();
        let mut resolver = EffectResolver::new(&fx.problem);
        resolver.apply_effect(&assign(&fx.counter, 4), &state).unwrap();
        assert!(resolver.apply_effect(&assign(&fx.counter, 4), &state).unwrap().is_some());
    }

    #[test]
    fn test_computed_effect_checks_shape() {
        let fx = fixture();
        let state = fx.problem.initial_state();
        let env = fx.problem.environment();
        let counter = fx.counter.call(vec![]).unwrap();

        let mut builder = InstantaneousActionBuilder::new(env, "bad_count", vec![]).unwrap();
        builder
            .set_simulated_effect(vec![counter.clone()], effect_fn(|_, _, _| vec![]))
            .unwrap();
        let event = Event::from_instantaneous(&builder.build());
        let resolver = EffectResolver::new(&fx.problem);
        let computed = event.computed_effects().next().unwrap();
        assert!(matches!(
            resolver.compute(computed, &state),
            Err(ExecutionError::EffectValueCount { expected: 1, actual: 0, .. })
        ));

        let mut builder = InstantaneousActionBuilder::new(env, "bad_type", vec![]).unwrap();
        builder
            .set_simulated_effect(vec![counter], effect_fn(|_, _, _| vec![Value::Bool(true)]))
            .unwrap();
        let event = Event::from_instantaneous(&builder.build());
        let computed = event.computed_effects().next().unwrap();
        assert!(matches!(
            resolver.compute(computed, &state),
            Err(ExecutionError::EffectValueType { .. })
        ));
    }

    #[test]
    fn test_computed_value_must_agree_with_effects() {
        let fx = fixture();
        let state = fx.problem.initial_state();
        let key = fx.counter.ground(vec![]).unwrap();

        let mut resolver = EffectResolver::new(&fx.problem);
        resolver.apply_effect(&assign(&fx.counter, 7), &state).unwrap();
        resolver.merge_computed(vec![(key.clone(), Value::Int(7))]).unwrap();
        let err = resolver.merge_computed(vec![(key.clone(), Value::Int(8))]).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::ConflictingEffects { kind: ConflictKind::DifferentValues, .. }
        ));

        let flag = fx.flag.ground(vec![]).unwrap();
        let mut resolver = EffectResolver::new(&fx.problem);
        resolver.apply_effect(&assign(&fx.flag, false), &state).unwrap();
        resolver.merge_computed(vec![(flag.clone(), Value::Bool(true))]).unwrap();
        assert_eq!(resolver.into_updates().get(&flag), Some(&Value::Bool(true)));
    }
}
