//! Instantaneous actions and the variants built on them.

use crate::effect::{Bindings, Effect, EffectFn, EffectKind, ProbabilisticEffect, SimulatedEffect};
use crate::environment::Environment;
use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::FluentExp;
use crate::object::Parameter;
use crate::value::Value;

use super::{ground_conditions, ground_effects, ActionDraft, ActionHeader};

/// An action whose preconditions and effects happen at a single point.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantaneousAction {
    header: ActionHeader,
    preconditions: Vec<Expr>,
    effects: Vec<Effect>,
    simulated_effect: Option<SimulatedEffect>,
}

impl InstantaneousAction {
    pub(crate) fn from_parts(
        header: ActionHeader,
        preconditions: Vec<Expr>,
        effects: Vec<Effect>,
        simulated_effect: Option<SimulatedEffect>,
    ) -> Self {
        Self {
            header,
            preconditions,
            effects,
            simulated_effect,
        }
    }

    /// Name, parameters and environment.
    #[must_use]
    pub const fn header(&self) -> &ActionHeader {
        &self.header
    }

    /// The action name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.header.name()
    }

    /// Conditions that must hold for the action to be applicable.
    #[must_use]
    pub fn preconditions(&self) -> &[Expr] {
        &self.preconditions
    }

    /// Declarative effects, in insertion order.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// The simulated effect, if any.
    #[must_use]
    pub const fn simulated_effect(&self) -> Option<&SimulatedEffect> {
        self.simulated_effect.as_ref()
    }

    /// Returns true if any effect is guarded by a condition.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.effects.iter().any(Effect::is_conditional)
    }

    pub(crate) fn ground(&self, values: &[Value], bindings: &Bindings) -> Option<Self> {
        Some(Self {
            header: self.header.ground(values),
            preconditions: ground_conditions(&self.preconditions, bindings)?,
            effects: ground_effects(&self.effects, bindings),
            simulated_effect: self.simulated_effect.as_ref().map(|s| s.ground(bindings)),
        })
    }
}

/// Builder methods shared by every instantaneous builder.
macro_rules! instantaneous_builder_methods {
    () => {
        /// Looks a parameter up by name.
        pub fn parameter(&self, name: &str) -> Result<&Parameter, ModelError> {
            self.draft.header().parameter(name)
        }

        /// Adds a precondition; the constant `true` is ignored.
        pub fn add_precondition(&mut self, condition: impl Into<Expr>) -> Result<&mut Self, ModelError> {
            self.draft.add_precondition(condition.into())?;
            Ok(self)
        }

        /// Adds `fluent := value`.
        pub fn add_effect(&mut self, fluent: FluentExp, value: impl Into<Expr>) -> Result<&mut Self, ModelError> {
            self.draft
                .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Assign)?;
            Ok(self)
        }

        /// Adds `fluent += value`; the fluent must be numeric.
        pub fn add_increase_effect(
            &mut self,
            fluent: FluentExp,
            value: impl Into<Expr>,
        ) -> Result<&mut Self, ModelError> {
            self.draft
                .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Increase)?;
            Ok(self)
        }

        /// Adds `fluent -= value`; the fluent must be numeric.
        pub fn add_decrease_effect(
            &mut self,
            fluent: FluentExp,
            value: impl Into<Expr>,
        ) -> Result<&mut Self, ModelError> {
            self.draft
                .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Decrease)?;
            Ok(self)
        }

        /// Adds an effect that only fires when `condition` holds in the source state.
        pub fn add_conditional_effect(
            &mut self,
            condition: impl Into<Expr>,
            fluent: FluentExp,
            value: impl Into<Expr>,
            kind: EffectKind,
        ) -> Result<&mut Self, ModelError> {
            self.draft
                .add_effect(fluent, value.into(), condition.into(), kind)?;
            Ok(self)
        }

        /// Sets the simulated effect, replacing any previous one.
        pub fn set_simulated_effect(
            &mut self,
            fluents: Vec<FluentExp>,
            function: EffectFn,
        ) -> Result<&mut Self, ModelError> {
            self.draft.set_simulated_effect(fluents, function)?;
            Ok(self)
        }
    };
}

/// Builds an [`InstantaneousAction`], validating each addition.
///
/// # Examples
///
/// ```
/// use plansim::{Environment, Expr, Fluent, InstantaneousActionBuilder, Type};
///
/// let env = Environment::new();
/// let fuel = Fluent::new(&env, "fuel", Type::bounded_int(Some(0), Some(10)).unwrap(), Vec::new()).unwrap();
/// let fuel_exp = fuel.call(Vec::new()).unwrap();
///
/// let mut drive = InstantaneousActionBuilder::new(&env, "drive", Vec::new()).unwrap();
/// drive
///     .add_precondition(Expr::ge(fuel_exp.clone(), 1)).unwrap()
///     .add_decrease_effect(fuel_exp, 1).unwrap();
/// let drive = drive.build();
/// assert_eq!(drive.effects().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InstantaneousActionBuilder {
    draft: ActionDraft,
}

impl InstantaneousActionBuilder {
    /// Starts an action named `name` over `parameters`.
    pub fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        Ok(Self {
            draft: ActionDraft::new(env, name, parameters)?,
        })
    }

    instantaneous_builder_methods!();

    /// Finalizes the action.
    #[must_use]
    pub fn build(self) -> InstantaneousAction {
        self.draft.finish().0
    }
}

/// An instantaneous action whose outcome is sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilisticAction {
    base: InstantaneousAction,
    probabilistic_effects: Vec<ProbabilisticEffect>,
}

impl ProbabilisticAction {
    pub(crate) fn from_parts(base: InstantaneousAction, probabilistic_effects: Vec<ProbabilisticEffect>) -> Self {
        Self {
            base,
            probabilistic_effects,
        }
    }

    /// Preconditions and declarative effects.
    #[must_use]
    pub const fn base(&self) -> &InstantaneousAction {
        &self.base
    }

    /// Probabilistic effects, in insertion order.
    #[must_use]
    pub fn probabilistic_effects(&self) -> &[ProbabilisticEffect] {
        &self.probabilistic_effects
    }

    pub(crate) fn ground(&self, values: &[Value], bindings: &Bindings) -> Option<Self> {
        Some(Self {
            base: self.base.ground(values, bindings)?,
            probabilistic_effects: self
                .probabilistic_effects
                .iter()
                .map(|p| p.ground(bindings))
                .collect(),
        })
    }
}

/// Builds a [`ProbabilisticAction`].
#[derive(Debug, Clone)]
pub struct ProbabilisticActionBuilder {
    draft: ActionDraft,
}

impl ProbabilisticActionBuilder {
    /// Starts an action named `name` over `parameters`.
    pub fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        Ok(Self {
            draft: ActionDraft::new(env, name, parameters)?,
        })
    }

    instantaneous_builder_methods!();

    /// Adds an effect whose values for `fluents` are sampled by `function`.
    pub fn add_probabilistic_effect(
        &mut self,
        fluents: Vec<FluentExp>,
        function: EffectFn,
    ) -> Result<&mut Self, ModelError> {
        self.draft.add_probabilistic_effect(fluents, function)?;
        Ok(self)
    }

    /// Finalizes the action.
    #[must_use]
    pub fn build(self) -> ProbabilisticAction {
        let (base, probabilistic) = self.draft.finish();
        ProbabilisticAction::from_parts(base, probabilistic)
    }
}

/// An instantaneous action that also observes fluents.
///
/// The simulator treats it like any instantaneous action; observations are
/// metadata for contingent planners.
#[derive(Debug, Clone, PartialEq)]
pub struct SensingAction {
    base: InstantaneousAction,
    observed_fluents: Vec<FluentExp>,
}

impl SensingAction {
    /// Preconditions and declarative effects.
    #[must_use]
    pub const fn base(&self) -> &InstantaneousAction {
        &self.base
    }

    /// Fluents whose values become known after execution.
    #[must_use]
    pub fn observed_fluents(&self) -> &[FluentExp] {
        &self.observed_fluents
    }

    pub(crate) fn ground(&self, values: &[Value], bindings: &Bindings) -> Option<Self> {
        Some(Self {
            base: self.base.ground(values, bindings)?,
            observed_fluents: self
                .observed_fluents
                .iter()
                .map(|f| f.map_args(|a| a.substitute_parameters(bindings)))
                .collect(),
        })
    }
}

/// Builds a [`SensingAction`].
#[derive(Debug, Clone)]
pub struct SensingActionBuilder {
    draft: ActionDraft,
    observed_fluents: Vec<FluentExp>,
}

impl SensingActionBuilder {
    /// Starts an action named `name` over `parameters`.
    pub fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        Ok(Self {
            draft: ActionDraft::new(env, name, parameters)?,
            observed_fluents: Vec::new(),
        })
    }

    instantaneous_builder_methods!();

    /// Marks `fluent` as observed; duplicates are ignored.
    pub fn add_observed_fluent(&mut self, fluent: FluentExp) -> Result<&mut Self, ModelError> {
        self.draft.check_expr(&Expr::Fluent(fluent.clone()))?;
        if !self.observed_fluents.contains(&fluent) {
            self.observed_fluents.push(fluent);
        }
        Ok(self)
    }

    /// Finalizes the action.
    #[must_use]
    pub fn build(self) -> SensingAction {
        SensingAction {
            base: self.draft.finish().0,
            observed_fluents: self.observed_fluents,
        }
    }
}
