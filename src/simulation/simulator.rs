//! Sequential simulator.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::action::Action;
use crate::error::{SimError, SimResult};
use crate::evaluator::StateEvaluator;
use crate::expression::Expr;
use crate::fluent::GroundFluent;
use crate::grounder::{Grounder, ProblemGrounder};
use crate::problem::Problem;
use crate::problem_kind::{Feature, ProblemKind};
use crate::state::State;
use crate::value::Value;

use super::config::SimulatorConfig;
use super::event::Event;
use super::resolve::EffectResolver;

const NAME: &str = "sequential_simulator";

type EventKey = (String, Vec<Value>);

/// Checks and applies the events of one problem, one at a time.
///
/// Events are derived lazily from the problem's actions and cached for
/// the lifetime of the simulator. The first call to
/// [`get_applicable_events`](Self::get_applicable_events) grounds every
/// action once; later calls only scan the cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use plansim::{
///     Environment, Expr, Fluent, InstantaneousActionBuilder, ProblemBuilder, SequentialSimulator,
///     SimulatorConfig, Type, Value,
/// };
///
/// let env = Environment::new();
/// let lit = Fluent::new(&env, "lit", Type::Bool, vec![]).unwrap();
/// let mut switch_on = InstantaneousActionBuilder::new(&env, "switch_on", vec![]).unwrap();
/// switch_on
///     .add_precondition(Expr::not(lit.call(vec![]).unwrap()))
///     .unwrap()
///     .add_effect(lit.call(vec![]).unwrap(), true)
///     .unwrap();
/// let problem = ProblemBuilder::new(&env, "lamp")
///     .add_fluent(&lit, Some(Value::Bool(false)))
///     .add_action(switch_on.build())
///     .add_goal(lit.call(vec![]).unwrap())
///     .build()
///     .unwrap();
///
/// let mut simulator = SequentialSimulator::new(Arc::new(problem), SimulatorConfig::default()).unwrap();
/// let initial = simulator.initial_state();
/// let events = simulator.get_applicable_events(&initial).unwrap();
/// assert_eq!(events.len(), 1);
/// let next = simulator.apply(&events[0], &initial).unwrap().unwrap();
/// assert!(simulator.is_goal(&next).unwrap());
/// assert!(simulator.apply(&events[0], &next).unwrap().is_none());
/// ```
pub struct SequentialSimulator {
    problem: Arc<Problem>,
    grounder: Box<dyn Grounder>,
    config: SimulatorConfig,
    events: IndexMap<EventKey, Vec<Event>>,
    all_events_grounded: bool,
}

impl fmt::Debug for SequentialSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialSimulator")
            .field("problem", &self.problem.name())
            .field("config", &self.config)
            .field("cached_groundings", &self.events.len())
            .field("all_events_grounded", &self.all_events_grounded)
            .finish_non_exhaustive()
    }
}

impl SequentialSimulator {
    /// Creates a simulator grounding with a [`ProblemGrounder`].
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, or when the problem uses features
    /// outside [`supported_kind`](Self::supported_kind) and
    /// `error_on_failed_checks` is set.
    pub fn new(problem: Arc<Problem>, config: SimulatorConfig) -> SimResult<Self> {
        let grounder = Box::new(ProblemGrounder::new(Arc::clone(&problem)));
        Self::with_grounder(problem, grounder, config)
    }

    /// Creates a simulator that asks `grounder` for grounded actions.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_grounder(
        problem: Arc<Problem>,
        grounder: Box<dyn Grounder>,
        config: SimulatorConfig,
    ) -> SimResult<Self> {
        config.validate()?;
        let supported = Self::supported_kind();
        if !problem.kind().is_subset(&supported) {
            let features = problem.kind().difference(&supported);
            if config.error_on_failed_checks {
                return Err(SimError::UnsupportedProblem { engine: NAME, features });
            }
            warn!(
                engine = NAME,
                problem = problem.name(),
                unsupported = ?features,
                "cannot establish whether the simulator is able to handle this problem"
            );
        }
        Ok(Self {
            problem,
            grounder,
            config,
            events: IndexMap::new(),
            all_events_grounded: false,
        })
    }

    /// Engine name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        NAME
    }

    /// The simulated problem.
    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Features this simulator can handle.
    #[must_use]
    pub fn supported_kind() -> ProblemKind {
        ProblemKind::from_iter([
            Feature::ActionBased,
            Feature::FlatTyping,
            Feature::HierarchicalTyping,
            Feature::ContinuousNumbers,
            Feature::DiscreteNumbers,
            Feature::BoundedTypes,
            Feature::SimpleNumericPlanning,
            Feature::GeneralNumericPlanning,
            Feature::NumericFluents,
            Feature::ObjectFluents,
            Feature::NegativeConditions,
            Feature::DisjunctiveConditions,
            Feature::Equalities,
            Feature::ExistentialConditions,
            Feature::UniversalConditions,
            Feature::ConditionalEffects,
            Feature::IncreaseEffects,
            Feature::DecreaseEffects,
            Feature::SimulatedEffects,
            Feature::ProbabilisticEffects,
            Feature::ActionsCost,
            Feature::PlanLength,
            Feature::Oversubscription,
            Feature::TemporalOversubscription,
            Feature::Makespan,
            Feature::FinalValue,
        ])
    }

    /// Returns true if a problem of `kind` is within [`supported_kind`](Self::supported_kind).
    #[must_use]
    pub fn supports(kind: &ProblemKind) -> bool {
        kind.is_subset(&Self::supported_kind())
    }

    /// The problem's initial state, flattening after the configured ancestry depth.
    #[must_use]
    pub fn initial_state(&self) -> State {
        State::with_max_ancestors(self.problem.initial_values().clone(), self.config.max_state_ancestors)
    }

    /// Events of `action` grounded with `parameters`.
    ///
    /// An empty list means the grounding can never be applicable. Results
    /// are cached under the parameters coerced to their declared types, so
    /// the grounder is consulted at most once per grounding.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Usage`] if the parameter count or a parameter
    /// type is wrong, if the action is not part of the problem, or if it is
    /// durative.
    pub fn get_events(&mut self, action: &Action, parameters: &[Value]) -> SimResult<Vec<Event>> {
        if action.parameters().len() != parameters.len() {
            return Err(SimError::usage(format!(
                "action '{}' takes {} parameters, got {}",
                action.name(),
                action.parameters().len(),
                parameters.len()
            )));
        }
        if !self.problem.has_action(action) {
            return Err(SimError::usage(format!(
                "action '{}' does not belong to problem '{}'",
                action.name(),
                self.problem.name()
            )));
        }
        let mut values = Vec::with_capacity(parameters.len());
        for (p, v) in action.parameters().iter().zip(parameters) {
            if !p.value_type().accepts(v) {
                return Err(SimError::usage(format!(
                    "parameter '{}' of action '{}' expects {}, got {v}",
                    p.name(),
                    action.name(),
                    p.value_type()
                )));
            }
            values.push(p.value_type().coerce(v.clone()));
        }
        let key = (action.name().to_string(), values);
        if let Some(events) = self.events.get(&key) {
            return Ok(events.clone());
        }
        debug!(action = action.name(), "event cache miss");
        let events = match self.grounder.ground_action(action, &key.1)? {
            Some(grounded) => events_of(&grounded)?,
            None => Vec::new(),
        };
        self.events.insert(key, events.clone());
        Ok(events)
    }

    /// Every cached event applicable in `state`, in cache order.
    ///
    /// The first call grounds every action of the problem.
    ///
    /// # Errors
    ///
    /// Fails if grounding fails, if an action is durative, or if evaluating
    /// an event in `state` fails.
    pub fn get_applicable_events(&mut self, state: &State) -> SimResult<Vec<Event>> {
        if !self.all_events_grounded {
            self.ground_all()?;
        }
        let mut applicable = Vec::new();
        for event in self.events.values().flatten() {
            if self.is_applicable(event, state)? {
                applicable.push(event.clone());
            }
        }
        trace!(candidates = self.events.len(), applicable = applicable.len(), "scanned events");
        Ok(applicable)
    }

    fn ground_all(&mut self) -> SimResult<()> {
        let grounded = self.grounder.grounded_actions()?;
        let total = grounded.len();
        for g in grounded {
            let key = (g.action.name().to_string(), g.parameters);
            if !self.events.contains_key(&key) {
                let events = events_of(&g.grounded)?;
                self.events.insert(key, events);
            }
        }
        self.all_events_grounded = true;
        debug!(
            problem = self.problem.name(),
            grounded_actions = total,
            events = self.events.values().map(Vec::len).sum::<usize>(),
            "grounded every action"
        );
        Ok(())
    }

    /// Returns true if no condition of `event` is unsatisfied in `state`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures and apply-time effect conflicts found
    /// while checking numeric bounds.
    pub fn is_applicable(&self, event: &Event, state: &State) -> SimResult<bool> {
        let applicable = self.get_unsatisfied_conditions(event, state, true)?.is_empty();
        trace!(event = event.name(), applicable, "checked event");
        Ok(applicable)
    }

    /// Conditions of `event` that do not hold in `state`.
    ///
    /// Effects on bounded numeric fluents are resolved in advance; a result
    /// outside the bounds is reported as an extra `lower <= fluent` or
    /// `fluent <= upper` condition. With `early_termination` the scan stops
    /// at the first unsatisfied condition.
    ///
    /// # Errors
    ///
    /// Same as [`is_applicable`](Self::is_applicable).
    pub fn get_unsatisfied_conditions(
        &self,
        event: &Event,
        state: &State,
        early_termination: bool,
    ) -> SimResult<Vec<Expr>> {
        let evaluator = StateEvaluator::new(&self.problem);
        let mut unsatisfied = Vec::new();
        for condition in event.conditions() {
            if evaluator.evaluate(condition, state)?.as_bool() != Some(true) {
                unsatisfied.push(condition.clone());
                if early_termination {
                    return Ok(unsatisfied);
                }
            }
        }

        let mut resolver = EffectResolver::new(&self.problem);
        for effect in event.effects() {
            if !effect.fluent().value_type().has_bounds() {
                continue;
            }
            if let Some((fluent, value)) = resolver.apply_effect(effect, state)? {
                unsatisfied.extend(bound_violations(&fluent, &value));
                if early_termination && !unsatisfied.is_empty() {
                    return Ok(unsatisfied);
                }
            }
        }
        for computed in event.computed_effects() {
            if !computed.fluents().iter().any(|f| f.value_type().has_bounds()) {
                continue;
            }
            for (fluent, value) in resolver.compute(computed, state)? {
                unsatisfied.extend(bound_violations(&fluent, &value));
                if early_termination && !unsatisfied.is_empty() {
                    return Ok(unsatisfied);
                }
            }
        }
        Ok(unsatisfied)
    }

    /// Applies `event` to `state`, or returns `None` if it is not applicable.
    ///
    /// Effects are resolved once and the resolved values are bound-checked
    /// before the transition, so every callback runs exactly once.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures and conflicting effects.
    pub fn apply(&self, event: &Event, state: &State) -> SimResult<Option<State>> {
        let evaluator = StateEvaluator::new(&self.problem);
        for condition in event.conditions() {
            if evaluator.evaluate(condition, state)?.as_bool() != Some(true) {
                trace!(event = event.name(), "condition does not hold");
                return Ok(None);
            }
        }
        let Some(updates) = self.resolve_effects(event, state, true)? else {
            trace!(event = event.name(), "effect leaves fluent bounds");
            return Ok(None);
        };
        trace!(event = event.name(), updates = updates.len(), "applied event");
        Ok(Some(state.make_child(updates)))
    }

    /// Applies `event` to `state` without checking its conditions.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Execution`] when two effects write incompatible
    /// values, when a callback returns values of the wrong shape, or when
    /// an expression cannot be evaluated.
    pub fn apply_unsafe(&self, event: &Event, state: &State) -> SimResult<State> {
        // Without bound checks the resolution always yields updates.
        let updates = self.resolve_effects(event, state, false)?.unwrap_or_default();
        trace!(event = event.name(), updates = updates.len(), "applied event");
        Ok(state.make_child(updates))
    }

    /// Resolves every effect of `event` once, in order.
    ///
    /// With `check_bounds`, returns `None` as soon as a resolved value falls
    /// outside its fluent's bounds.
    fn resolve_effects(
        &self,
        event: &Event,
        state: &State,
        check_bounds: bool,
    ) -> SimResult<Option<HashMap<GroundFluent, Value>>> {
        let mut resolver = EffectResolver::new(&self.problem);
        for effect in event.effects() {
            if let Some((fluent, value)) = resolver.apply_effect(effect, state)? {
                if check_bounds && !fluent.value_type().within_bounds(&value) {
                    return Ok(None);
                }
            }
        }
        for computed in event.computed_effects() {
            let values = resolver.compute(computed, state)?;
            if check_bounds && values.iter().any(|(f, v)| !f.value_type().within_bounds(v)) {
                return Ok(None);
            }
            resolver.merge_computed(values)?;
        }
        Ok(Some(resolver.into_updates()))
    }

    /// Goals of the problem that do not hold in `state`.
    ///
    /// Quality metrics are ignored.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures.
    pub fn get_unsatisfied_goals(&self, state: &State, early_termination: bool) -> SimResult<Vec<Expr>> {
        let evaluator = StateEvaluator::new(&self.problem);
        let mut unsatisfied = Vec::new();
        for goal in self.problem.goals() {
            if evaluator.evaluate(goal, state)?.as_bool() != Some(true) {
                unsatisfied.push(goal.clone());
                if early_termination {
                    break;
                }
            }
        }
        Ok(unsatisfied)
    }

    /// Returns true if every goal holds in `state`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures.
    pub fn is_goal(&self, state: &State) -> SimResult<bool> {
        Ok(self.get_unsatisfied_goals(state, true)?.is_empty())
    }
}

fn events_of(action: &Action) -> SimResult<Vec<Event>> {
    Ok(match action {
        Action::Instantaneous(a) => vec![Event::from_instantaneous(a)],
        Action::Sensing(a) => vec![Event::from_instantaneous(a.base())],
        Action::Probabilistic(a) => vec![Event::from_probabilistic(a)],
        Action::DurationCompiled(a) => vec![
            Event::from_instantaneous(a.start_action().action()),
            Event::from_probabilistic(a.end_action()),
        ],
        Action::Durative(_) => {
            return Err(SimError::usage(format!(
                "durative action '{}' cannot be simulated sequentially",
                action.name()
            )))
        }
    })
}

fn bound_violations(fluent: &GroundFluent, value: &Value) -> Vec<Expr> {
    let (lower, upper) = fluent.value_type().bounds();
    let mut violations = Vec::new();
    if let Some(lower) = lower {
        if lower.compare_numeric(value) == Some(Ordering::Greater) {
            violations.push(Expr::le(lower, fluent.to_exp()));
        }
    }
    if let Some(upper) = upper {
        if value.compare_numeric(&upper) == Some(Ordering::Greater) {
            violations.push(Expr::le(fluent.to_exp(), upper));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use super::*;
    use crate::action::{
        DurativeActionBuilder, InstantaneousActionBuilder, ProbabilisticActionBuilder, SensingActionBuilder,
    };
    use crate::effect::effect_fn;
    use crate::environment::Environment;
    use crate::error::ExecutionError;
    use crate::fluent::Fluent;
    use crate::object::Parameter;
    use crate::problem::ProblemBuilder;
    use crate::types::Type;

    fn counter_problem(lower: i64) -> (Arc<Problem>, Fluent) {
        let env = Environment::new();
        let counter = Fluent::new(&env, "counter", Type::bounded_int(Some(lower), Some(10)).unwrap(), vec![]).unwrap();
        let c = counter.call(vec![]).unwrap();
        let mut dec = InstantaneousActionBuilder::new(&env, "dec", vec![]).unwrap();
        dec.add_decrease_effect(c.clone(), 1).unwrap();
        let mut bump = InstantaneousActionBuilder::new(&env, "bump", vec![]).unwrap();
        bump.set_simulated_effect(vec![c], effect_fn(|_, _, _| vec![Value::Int(11)]))
            .unwrap();
        let problem = ProblemBuilder::new(&env, "counter")
            .add_fluent(&counter, Some(Value::Int(1)))
            .add_action(dec.build())
            .add_action(bump.build())
            .build()
            .unwrap();
        (Arc::new(problem), counter)
    }

    #[test]
    fn test_bounds_make_event_inapplicable() {
        let (problem, counter) = counter_problem(0);
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let dec = sim.get_events(problem.action("dec").unwrap(), &[]).unwrap().remove(0);
        let s0 = sim.initial_state();
        let s1 = sim.apply(&dec, &s0).unwrap().unwrap();
        let key = counter.ground(vec![]).unwrap();
        assert_eq!(s1.lookup(&key).unwrap(), &Value::Int(0));
        assert!(sim.apply(&dec, &s1).unwrap().is_none());

        let violated = sim.get_unsatisfied_conditions(&dec, &s1, false).unwrap();
        assert_eq!(violated.len(), 1);
        assert_eq!(violated[0], Expr::le(Value::Int(0), key.to_exp()));
    }

    #[test]
    fn test_simulated_values_are_bound_checked() {
        let (problem, _) = counter_problem(0);
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let bump = sim.get_events(problem.action("bump").unwrap(), &[]).unwrap().remove(0);
        let s0 = sim.initial_state();
        assert!(!sim.is_applicable(&bump, &s0).unwrap());
        // Unchecked application still writes the value.
        assert!(sim.apply_unsafe(&bump, &s0).is_ok());
    }

    #[test]
    fn test_usage_errors() {
        let (problem, _) = counter_problem(0);
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let dec = problem.action("dec").unwrap();
        assert!(sim.get_events(dec, &[Value::Int(1)]).unwrap_err().is_usage());

        let foreign = Action::from(
            InstantaneousActionBuilder::new(problem.environment(), "other", vec![])
                .unwrap()
                .build(),
        );
        assert!(sim.get_events(&foreign, &[]).unwrap_err().is_usage());

        let env = problem.environment();
        let p = Parameter::new(env, "p", Type::Bool).unwrap();
        let toggle = InstantaneousActionBuilder::new(env, "toggle", vec![p]).unwrap().build();
        let problem = Arc::new(ProblemBuilder::new(env, "flags").add_action(toggle).build().unwrap());
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let toggle = problem.action("toggle").unwrap();
        let err = sim.get_events(toggle, &[Value::Int(3)]).unwrap_err();
        assert!(err.is_usage());
        assert!(sim.get_events(toggle, &[Value::Bool(true)]).is_ok());
    }

    #[test]
    fn test_cache_key_uses_declared_parameter_types() {
        let env = Environment::new();
        let level = Fluent::new(&env, "level", Type::real(), vec![]).unwrap();
        let x = Parameter::new(&env, "x", Type::bounded_real(Some(0.0), Some(10.0)).unwrap()).unwrap();
        let mut set = InstantaneousActionBuilder::new(&env, "set", vec![x.clone()]).unwrap();
        set.add_effect(level.call(vec![]).unwrap(), &x).unwrap();
        let problem = Arc::new(
            ProblemBuilder::new(&env, "tank")
                .add_fluent(&level, Some(Value::from(0.0)))
                .add_action(set.build())
                .build()
                .unwrap(),
        );
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let set = problem.action("set").unwrap();
        let from_int = sim.get_events(set, &[Value::Int(1)]).unwrap();
        let from_real = sim.get_events(set, &[Value::from(1.0)]).unwrap();
        assert_eq!(from_int, from_real);
        assert_eq!(sim.events.len(), 1);
        assert!(sim.get_events(set, &[Value::Int(11)]).unwrap_err().is_usage());
    }

    #[test]
    fn test_apply_samples_callback_once() {
        let env = Environment::new();
        let level = Fluent::new(&env, "level", Type::bounded_int(Some(0), Some(10)).unwrap(), vec![]).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut fill = ProbabilisticActionBuilder::new(&env, "fill", vec![]).unwrap();
        fill.add_probabilistic_effect(
            vec![level.call(vec![]).unwrap()],
            effect_fn(move |_, _, _| {
                // Alternates between an in-bounds and an out-of-bounds sample.
                let n = counter.fetch_add(1, AtomicOrdering::SeqCst);
                vec![Value::Int(if n % 2 == 0 { 5 } else { 11 })]
            }),
        )
        .unwrap();
        let problem = Arc::new(
            ProblemBuilder::new(&env, "tank")
                .add_fluent(&level, Some(Value::Int(0)))
                .add_action(fill.build())
                .build()
                .unwrap(),
        );
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let fill = sim.get_events(problem.action("fill").unwrap(), &[]).unwrap().remove(0);
        let key = level.ground(vec![]).unwrap();
        let s0 = sim.initial_state();

        let s1 = sim.apply(&fill, &s0).unwrap().unwrap();
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(s1.lookup(&key).unwrap(), &Value::Int(5));

        assert!(sim.apply(&fill, &s1).unwrap().is_none());
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_unsupported_kind_errors_or_warns() {
        let env = Environment::new();
        let mut wait = DurativeActionBuilder::new(&env, "wait", vec![]).unwrap();
        wait.set_fixed_duration(2).unwrap();
        let problem = Arc::new(ProblemBuilder::new(&env, "timed").add_action(wait.build()).build().unwrap());
        assert!(!SequentialSimulator::supports(problem.kind()));

        let err = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::UnsupportedProblem { ref features, .. } if features == &[Feature::ContinuousTime]));

        let lenient = SimulatorConfig {
            error_on_failed_checks: false,
            ..SimulatorConfig::default()
        };
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), lenient).unwrap();
        let err = sim.get_events(problem.action("wait").unwrap(), &[]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_sensing_action_yields_one_event() {
        let env = Environment::new();
        let seen = Fluent::new(&env, "seen", Type::Bool, vec![]).unwrap();
        let mut look = SensingActionBuilder::new(&env, "look", vec![]).unwrap();
        look.add_observed_fluent(seen.call(vec![]).unwrap()).unwrap();
        let problem = Arc::new(
            ProblemBuilder::new(&env, "sense")
                .add_fluent(&seen, Some(Value::Bool(false)))
                .add_action(look.build())
                .build()
                .unwrap(),
        );
        let lenient = SimulatorConfig {
            error_on_failed_checks: false,
            ..SimulatorConfig::default()
        };
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), lenient).unwrap();
        let events = sim.get_applicable_events(&sim.initial_state()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "look");
    }

    #[test]
    fn test_early_termination_stops_at_first_condition() {
        let env = Environment::new();
        let a = Fluent::new(&env, "a", Type::Bool, vec![]).unwrap();
        let b = Fluent::new(&env, "b", Type::Bool, vec![]).unwrap();
        let mut both = InstantaneousActionBuilder::new(&env, "both", vec![]).unwrap();
        both.add_precondition(a.call(vec![]).unwrap())
            .unwrap()
            .add_precondition(b.call(vec![]).unwrap())
            .unwrap();
        let problem = Arc::new(
            ProblemBuilder::new(&env, "ab")
                .add_fluent(&a, Some(Value::Bool(false)))
                .add_fluent(&b, Some(Value::Bool(false)))
                .add_action(both.build())
                .add_goal(a.call(vec![]).unwrap())
                .add_goal(b.call(vec![]).unwrap())
                .build()
                .unwrap(),
        );
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let event = sim.get_events(problem.action("both").unwrap(), &[]).unwrap().remove(0);
        let s0 = sim.initial_state();
        assert_eq!(sim.get_unsatisfied_conditions(&event, &s0, true).unwrap().len(), 1);
        assert_eq!(sim.get_unsatisfied_conditions(&event, &s0, false).unwrap().len(), 2);
        assert_eq!(sim.get_unsatisfied_goals(&s0, true).unwrap().len(), 1);
        assert_eq!(sim.get_unsatisfied_goals(&s0, false).unwrap().len(), 2);
        assert!(!sim.is_goal(&s0).unwrap());
    }

    #[test]
    fn test_initial_state_uses_configured_ancestry() {
        let (problem, _) = counter_problem(-5);
        let config = SimulatorConfig {
            max_state_ancestors: 2,
            ..SimulatorConfig::default()
        };
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), config).unwrap();
        let dec = sim.get_events(problem.action("dec").unwrap(), &[]).unwrap().remove(0);
        let mut state = sim.initial_state();
        for _ in 0..4 {
            state = sim.apply(&dec, &state).unwrap().unwrap();
            assert!(state.ancestors() < 2);
        }
    }

    #[test]
    fn test_callback_with_wrong_arity_fails_at_apply() {
        let env = Environment::new();
        let x = Fluent::new(&env, "x", Type::int(), vec![]).unwrap();
        let mut broken = InstantaneousActionBuilder::new(&env, "broken", vec![]).unwrap();
        broken
            .set_simulated_effect(vec![x.call(vec![]).unwrap()], effect_fn(|_, _, _| vec![Value::Int(1), Value::Int(2)]))
            .unwrap();
        let problem = Arc::new(
            ProblemBuilder::new(&env, "broken")
                .add_fluent(&x, Some(Value::Int(0)))
                .add_action(broken.build())
                .build()
                .unwrap(),
        );
        let mut sim = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default()).unwrap();
        let event = sim.get_events(problem.action("broken").unwrap(), &[]).unwrap().remove(0);
        let err = sim.apply(&event, &sim.initial_state()).unwrap_err();
        assert!(matches!(err, SimError::Execution(ExecutionError::EffectValueCount { .. })));
    }
}
