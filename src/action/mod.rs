//! Actions and their builders.
//!
//! Actions are declared through mutable builders that validate every
//! addition immediately (types, parameters, effect conflicts) and produce
//! an immutable [`Action`]. The simulator only ever sees finalized actions.

mod compiled;
mod durative;
mod instantaneous;

pub use compiled::{
    start_end_actions, DurationProbabilisticAction, ACTION_OCCURS_NAME, ACTION_TYPE_NAME, DurationProbabilisticActionBuilder,
    FixDurationStartAction,
};
pub use durative::{
    ConditionTiming, DurationInterval, DurativeAction, DurativeActionBuilder, EffectTiming,
};
pub use instantaneous::{
    InstantaneousAction, InstantaneousActionBuilder, ProbabilisticAction,
    ProbabilisticActionBuilder, SensingAction, SensingActionBuilder,
};

use std::fmt;

use crate::conflict::EffectLedger;
use crate::effect::{Bindings, Effect, EffectFn, EffectKind, ProbabilisticEffect, SimulatedEffect};
use crate::environment::{Environment, EnvironmentId};
use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::FluentExp;
use crate::object::Parameter;
use crate::types::Type;
use crate::value::Value;

/// Name, parameters and environment shared by every action variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionHeader {
    name: String,
    parameters: Vec<Parameter>,
    env: EnvironmentId,
}

impl ActionHeader {
    fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        let name = env.validate_name(name)?;
        for (i, p) in parameters.iter().enumerate() {
            if parameters[..i].iter().any(|q| q.name() == p.name()) {
                return Err(ModelError::DuplicateName {
                    kind: "action parameter",
                    name: p.name().to_string(),
                });
            }
        }
        Ok(Self {
            name,
            parameters,
            env: env.id(),
        })
    }

    /// The action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters, in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Environment the action was declared in.
    #[must_use]
    pub const fn env_id(&self) -> EnvironmentId {
        self.env
    }

    /// Looks a parameter up by name.
    pub fn parameter(&self, name: &str) -> Result<&Parameter, ModelError> {
        self.parameters
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ModelError::UnknownParameter {
                action: self.name.clone(),
                parameter: name.to_string(),
            })
    }

    /// The header of the grounded copy: no parameters, values in the name.
    fn ground(&self, values: &[Value]) -> Self {
        let mut name = self.name.clone();
        for v in values {
            name.push('_');
            name.push_str(&v.to_string());
        }
        Self {
            name,
            parameters: Vec::new(),
            env: self.env,
        }
    }
}

/// Maps parameter names to values, checking count and types.
pub(crate) fn bind_parameters(header: &ActionHeader, values: &[Value]) -> Result<Bindings, ModelError> {
    if values.len() != header.parameters.len() {
        return Err(ModelError::ArityMismatch {
            context: format!("action {}", header.name),
            expected: header.parameters.len(),
            actual: values.len(),
        });
    }
    let mut bindings = Bindings::with_capacity(values.len());
    for (p, v) in header.parameters.iter().zip(values) {
        if !p.value_type().accepts(v) {
            return Err(ModelError::IncompatibleType {
                expected: p.value_type().to_string(),
                actual: Type::of_value(v).to_string(),
            });
        }
        bindings.insert(p.name().to_string(), p.value_type().coerce(v.clone()));
    }
    Ok(bindings)
}

/// Grounds preconditions; `None` when one of them folds to `false`.
pub(crate) fn ground_conditions(conditions: &[Expr], bindings: &Bindings) -> Option<Vec<Expr>> {
    let mut grounded = Vec::with_capacity(conditions.len());
    for c in conditions {
        let c = c.substitute_parameters(bindings).simplify();
        if c.is_false() {
            return None;
        }
        if !c.is_true() && !grounded.contains(&c) {
            grounded.push(c);
        }
    }
    Some(grounded)
}

/// Grounds effects, dropping those whose condition folds to `false`.
pub(crate) fn ground_effects(effects: &[Effect], bindings: &Bindings) -> Vec<Effect> {
    effects
        .iter()
        .map(|e| e.ground(bindings))
        .filter(|e| !e.condition().is_false())
        .collect()
}

/// Validation state shared by every action builder.
#[derive(Debug, Clone)]
pub(crate) struct ActionDraft {
    env: Environment,
    header: ActionHeader,
    preconditions: Vec<Expr>,
    effects: Vec<Effect>,
    simulated_effect: Option<SimulatedEffect>,
    probabilistic_effects: Vec<ProbabilisticEffect>,
    ledger: EffectLedger,
}

impl ActionDraft {
    pub(crate) fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        Ok(Self {
            env: env.clone(),
            header: ActionHeader::new(env, name, parameters)?,
            preconditions: Vec::new(),
            effects: Vec::new(),
            simulated_effect: None,
            probabilistic_effects: Vec::new(),
            ledger: EffectLedger::new(),
        })
    }

    pub(crate) const fn header(&self) -> &ActionHeader {
        &self.header
    }

    /// Rejects foreign symbols and parameters that belong to another action.
    pub(crate) fn check_expr(&self, expr: &Expr) -> Result<(), ModelError> {
        expr.check_environment(&self.env)?;
        for p in expr.parameters() {
            if !self.header.parameters.contains(&p) {
                return Err(ModelError::UnknownParameter {
                    action: self.header.name.clone(),
                    parameter: p.name().to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn check_condition(&self, expr: &Expr) -> Result<(), ModelError> {
        self.check_expr(expr)?;
        if !expr.type_of()?.is_bool() {
            return Err(ModelError::NonBooleanCondition {
                expr: expr.to_string(),
            });
        }
        let free = expr.free_variables();
        if !free.is_empty() {
            return Err(ModelError::UnboundVariables {
                expr: expr.to_string(),
                variables: free.iter().map(|v| v.name().to_string()).collect(),
            });
        }
        Ok(())
    }

    pub(crate) fn add_precondition(&mut self, expr: Expr) -> Result<(), ModelError> {
        self.check_condition(&expr)?;
        if !expr.is_true() && !self.preconditions.contains(&expr) {
            self.preconditions.push(expr);
        }
        Ok(())
    }

    /// Validates an effect without recording it.
    pub(crate) fn make_effect(
        &self,
        fluent: FluentExp,
        value: Expr,
        condition: Expr,
        kind: EffectKind,
    ) -> Result<Effect, ModelError> {
        self.check_expr(&Expr::Fluent(fluent.clone()))?;
        self.check_expr(&value)?;
        self.check_condition(&condition)?;
        let fluent_type = fluent.value_type();
        if kind != EffectKind::Assign && !fluent_type.is_numeric() {
            return Err(ModelError::NonNumericEffect {
                kind: if kind == EffectKind::Increase { "Increase" } else { "Decrease" },
                fluent: fluent.to_string(),
            });
        }
        let value_type = value.type_of()?;
        if !fluent_type.is_compatible(&value_type) {
            return Err(ModelError::IncompatibleType {
                expected: fluent_type.to_string(),
                actual: value_type.to_string(),
            });
        }
        Ok(Effect::new(fluent, value, condition, kind))
    }

    pub(crate) fn add_effect(
        &mut self,
        fluent: FluentExp,
        value: Expr,
        condition: Expr,
        kind: EffectKind,
    ) -> Result<(), ModelError> {
        let effect = self.make_effect(fluent, value, condition, kind)?;
        self.ledger
            .check_effect(&effect, &format!("effect {effect}"), "action")?;
        self.effects.push(effect);
        Ok(())
    }

    fn check_computed_fluents(&self, fluents: &[FluentExp]) -> Result<(), ModelError> {
        for f in fluents {
            self.check_expr(&Expr::Fluent(f.clone()))?;
        }
        Ok(())
    }

    pub(crate) fn set_simulated_effect(&mut self, fluents: Vec<FluentExp>, function: EffectFn) -> Result<(), ModelError> {
        self.check_computed_fluents(&fluents)?;
        let effect = SimulatedEffect::new(fluents, function)?;
        self.ledger
            .check_simulated(effect.fluents(), &format!("simulated effect {effect}"), "action")?;
        self.simulated_effect = Some(effect);
        Ok(())
    }

    pub(crate) fn add_probabilistic_effect(
        &mut self,
        fluents: Vec<FluentExp>,
        function: EffectFn,
    ) -> Result<(), ModelError> {
        self.check_computed_fluents(&fluents)?;
        let effect = ProbabilisticEffect::new(fluents, function)?;
        self.ledger.check_probabilistic(
            effect.fluents(),
            &format!("probabilistic effect {effect}"),
            "action",
        )?;
        self.probabilistic_effects.push(effect);
        Ok(())
    }

    pub(crate) fn finish(self) -> (InstantaneousAction, Vec<ProbabilisticEffect>) {
        (
            InstantaneousAction::from_parts(
                self.header,
                self.preconditions,
                self.effects,
                self.simulated_effect,
            ),
            self.probabilistic_effects,
        )
    }
}

/// A finalized action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Preconditions, effects and an optional simulated effect.
    Instantaneous(InstantaneousAction),
    /// Instantaneous action that also observes fluents.
    Sensing(SensingAction),
    /// Instantaneous action with probabilistic effects.
    Probabilistic(ProbabilisticAction),
    /// Action with a duration and timed conditions and effects.
    Durative(DurativeAction),
    /// Fixed-duration probabilistic action compiled into a start and an end half.
    DurationCompiled(DurationProbabilisticAction),
}

impl Action {
    /// Name, parameters and environment of the action.
    #[must_use]
    pub fn header(&self) -> &ActionHeader {
        match self {
            Self::Instantaneous(a) => a.header(),
            Self::Sensing(a) => a.base().header(),
            Self::Probabilistic(a) => a.base().header(),
            Self::Durative(a) => a.header(),
            Self::DurationCompiled(a) => a.header(),
        }
    }

    /// Action name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.header().name()
    }

    /// Declared parameters, in order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        self.header().parameters()
    }

    /// Looks a parameter up by name.
    pub fn parameter(&self, name: &str) -> Result<&Parameter, ModelError> {
        self.header().parameter(name)
    }

    /// Environment the action was declared in.
    #[must_use]
    pub fn env_id(&self) -> EnvironmentId {
        self.header().env_id()
    }

    /// The instantaneous halves, in execution order; empty for durative actions.
    #[must_use]
    pub fn instantaneous_parts(&self) -> Vec<&InstantaneousAction> {
        match self {
            Self::Instantaneous(a) => vec![a],
            Self::Sensing(a) => vec![a.base()],
            Self::Probabilistic(a) => vec![a.base()],
            Self::Durative(_) => Vec::new(),
            Self::DurationCompiled(a) => vec![a.start_action().action(), a.end_action().base()],
        }
    }

    /// Every condition, whatever its timing.
    #[must_use]
    pub fn conditions(&self) -> Vec<&Expr> {
        match self {
            Self::Durative(a) => a.conditions().iter().map(|(_, c)| c).collect(),
            _ => self
                .instantaneous_parts()
                .into_iter()
                .flat_map(|a| a.preconditions())
                .collect(),
        }
    }

    /// Every declarative effect, whatever its timing.
    #[must_use]
    pub fn effects(&self) -> Vec<&Effect> {
        match self {
            Self::Durative(a) => a.effects().iter().map(|(_, e)| e).collect(),
            _ => self
                .instantaneous_parts()
                .into_iter()
                .flat_map(|a| a.effects())
                .collect(),
        }
    }

    /// Returns true if any effect is guarded by a condition.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.effects().iter().any(|e| e.is_conditional())
    }

    /// Returns true if any instantaneous half has a simulated effect.
    #[must_use]
    pub fn has_simulated_effect(&self) -> bool {
        self.instantaneous_parts()
            .iter()
            .any(|a| a.simulated_effect().is_some())
    }

    /// Probabilistic effects; empty for variants without any.
    #[must_use]
    pub fn probabilistic_effects(&self) -> &[ProbabilisticEffect] {
        match self {
            Self::Probabilistic(a) => a.probabilistic_effects(),
            Self::DurationCompiled(a) => a.end_action().probabilistic_effects(),
            _ => &[],
        }
    }

    /// Substitutes `values` for the parameters.
    ///
    /// Returns `Ok(None)` when a precondition folds to `false`, since no
    /// state could ever enable the grounded action.
    pub fn ground(&self, values: &[Value]) -> Result<Option<Self>, ModelError> {
        let bindings = bind_parameters(self.header(), values)?;
        Ok(match self {
            Self::Instantaneous(a) => a.ground(values, &bindings).map(Self::Instantaneous),
            Self::Sensing(a) => a.ground(values, &bindings).map(Self::Sensing),
            Self::Probabilistic(a) => a.ground(values, &bindings).map(Self::Probabilistic),
            Self::Durative(a) => a.ground(values, &bindings).map(Self::Durative),
            Self::DurationCompiled(a) => a.ground(values, &bindings).map(Self::DurationCompiled),
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Instantaneous(_) => "action",
            Self::Sensing(_) => "sensing-action",
            Self::Probabilistic(_) => "probabilistic-action",
            Self::Durative(_) => "durative-action",
            Self::DurationCompiled(_) => "duration-probabilistic-action",
        };
        write!(f, "{kind} {}(", self.name())?;
        for (i, p) in self.parameters().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", p.value_type(), p.name())?;
        }
        write!(f, ")")
    }
}

impl From<InstantaneousAction> for Action {
    fn from(a: InstantaneousAction) -> Self {
        Self::Instantaneous(a)
    }
}

impl From<SensingAction> for Action {
    fn from(a: SensingAction) -> Self {
        Self::Sensing(a)
    }
}

impl From<ProbabilisticAction> for Action {
    fn from(a: ProbabilisticAction) -> Self {
        Self::Probabilistic(a)
    }
}

impl From<DurativeAction> for Action {
    fn from(a: DurativeAction) -> Self {
        Self::Durative(a)
    }
}

impl From<DurationProbabilisticAction> for Action {
    fn from(a: DurationProbabilisticAction) -> Self {
        Self::DurationCompiled(a)
    }
}
