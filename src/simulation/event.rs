//! Events: the grounded units a simulator checks and applies.

use std::fmt;

use crate::action::{InstantaneousAction, ProbabilisticAction};
use crate::effect::{Effect, ProbabilisticEffect, SimulatedEffect};
use crate::expression::Expr;
use crate::fluent::FluentExp;
use crate::problem::Problem;
use crate::state::State;
use crate::value::Value;

/// Conditions and effects of one grounded instantaneous action.
///
/// Events are produced by [`SequentialSimulator::get_events`] and
/// [`SequentialSimulator::get_applicable_events`]; they are immutable and
/// cheap to clone.
///
/// [`SequentialSimulator::get_events`]: super::SequentialSimulator::get_events
/// [`SequentialSimulator::get_applicable_events`]: super::SequentialSimulator::get_applicable_events
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    conditions: Vec<Expr>,
    effects: Vec<Effect>,
    simulated_effect: Option<SimulatedEffect>,
    probabilistic_effects: Vec<ProbabilisticEffect>,
}

impl Event {
    pub(crate) fn from_instantaneous(action: &InstantaneousAction) -> Self {
        Self {
            name: action.name().to_string(),
            conditions: action.preconditions().to_vec(),
            effects: action.effects().to_vec(),
            simulated_effect: action.simulated_effect().cloned(),
            probabilistic_effects: Vec::new(),
        }
    }

    pub(crate) fn from_probabilistic(action: &ProbabilisticAction) -> Self {
        Self {
            probabilistic_effects: action.probabilistic_effects().to_vec(),
            ..Self::from_instantaneous(action.base())
        }
    }

    /// Name of the grounded action the event was derived from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Conditions checked before applying.
    #[must_use]
    pub fn conditions(&self) -> &[Expr] {
        &self.conditions
    }

    /// Declarative effects, in resolution order.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Simulated effect, if any.
    #[must_use]
    pub const fn simulated_effect(&self) -> Option<&SimulatedEffect> {
        self.simulated_effect.as_ref()
    }

    /// Probabilistic effects, resolved after the simulated one.
    #[must_use]
    pub fn probabilistic_effects(&self) -> &[ProbabilisticEffect] {
        &self.probabilistic_effects
    }

    /// Simulated effect first, then probabilistic effects, in declaration order.
    pub(crate) fn computed_effects(&self) -> impl Iterator<Item = ComputedEffect<'_>> + '_ {
        self.simulated_effect
            .iter()
            .map(ComputedEffect::Simulated)
            .chain(self.probabilistic_effects.iter().map(ComputedEffect::Probabilistic))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {}", self.name)
    }
}

/// Borrowed view over the two kinds of callback-driven effects.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ComputedEffect<'a> {
    Simulated(&'a SimulatedEffect),
    Probabilistic(&'a ProbabilisticEffect),
}

impl<'a> ComputedEffect<'a> {
    pub(crate) fn fluents(self) -> &'a [FluentExp] {
        match self {
            Self::Simulated(e) => e.fluents(),
            Self::Probabilistic(e) => e.fluents(),
        }
    }

    pub(crate) fn compute(self, problem: &Problem, state: &State) -> Vec<Value> {
        match self {
            Self::Simulated(e) => e.compute(problem, state),
            Self::Probabilistic(e) => e.compute(problem, state),
        }
    }
}
