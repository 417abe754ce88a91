//! Fixed-duration probabilistic actions, compiled into a start and an end half.
//!
//! The start half carries the declared preconditions and the effects that
//! hold while the action runs. The end half carries the final effects and
//! the sampled outcome. [`start_end_actions`] links the two halves through
//! the `action_occurs` fluent, so an outcome function can observe which
//! other actions are running at the same time.

use crate::effect::{Bindings, Effect, EffectFn, EffectKind};
use crate::environment::Environment;
use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::{Fluent, FluentExp};
use crate::object::{Object, Parameter};
use crate::problem::ProblemBuilder;
use crate::types::{Type, UserType};
use crate::value::Value;

use super::durative::DurationInterval;
use super::{ActionDraft, ActionHeader, InstantaneousAction, ProbabilisticAction};

/// Name of the user type holding one object per compiled action.
pub const ACTION_TYPE_NAME: &str = "action";
/// Name of the fluent marking a compiled action as running.
pub const ACTION_OCCURS_NAME: &str = "action_occurs";

/// The start half of a compiled action.
#[derive(Debug, Clone, PartialEq)]
pub struct FixDurationStartAction {
    action: InstantaneousAction,
    duration: DurationInterval,
    end_action: String,
}

impl FixDurationStartAction {
    /// The instantaneous action executed at start.
    #[must_use]
    pub const fn action(&self) -> &InstantaneousAction {
        &self.action
    }

    /// Duration of the compiled action.
    #[must_use]
    pub const fn duration(&self) -> &DurationInterval {
        &self.duration
    }

    /// Name of the matching end half.
    #[must_use]
    pub fn end_action(&self) -> &str {
        &self.end_action
    }
}

/// A probabilistic action with a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationProbabilisticAction {
    header: ActionHeader,
    start: FixDurationStartAction,
    end: ProbabilisticAction,
}

impl DurationProbabilisticAction {
    /// Name, parameters and environment.
    #[must_use]
    pub const fn header(&self) -> &ActionHeader {
        &self.header
    }

    /// The start half.
    #[must_use]
    pub const fn start_action(&self) -> &FixDurationStartAction {
        &self.start
    }

    /// The end half, carrying the probabilistic effects.
    #[must_use]
    pub const fn end_action(&self) -> &ProbabilisticAction {
        &self.end
    }

    /// Fixed duration between the two halves.
    #[must_use]
    pub const fn duration(&self) -> &DurationInterval {
        &self.start.duration
    }

    /// Preconditions of the start half.
    #[must_use]
    pub fn preconditions(&self) -> &[Expr] {
        self.start.action.preconditions()
    }

    /// Effects of the start half.
    #[must_use]
    pub fn during_activation_effects(&self) -> &[Effect] {
        self.start.action.effects()
    }

    /// Effects of the end half.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        self.end.base().effects()
    }

    pub(crate) fn ground(&self, values: &[Value], bindings: &Bindings) -> Option<Self> {
        let start = self.start.action.ground(values, bindings)?;
        let end = self.end.ground(values, bindings)?;
        Some(Self {
            header: self.header.ground(values),
            start: FixDurationStartAction {
                action: start,
                duration: self.start.duration.clone(),
                end_action: end.base().name().to_string(),
            },
            end,
        })
    }
}

/// Builds a [`DurationProbabilisticAction`].
///
/// Halves are named `start_<name>` and `end_<name>` and share the
/// parameters. Conditional and simulated effects are not supported.
#[derive(Debug, Clone)]
pub struct DurationProbabilisticActionBuilder {
    header: ActionHeader,
    start: ActionDraft,
    end: ActionDraft,
    duration: DurationInterval,
}

impl DurationProbabilisticActionBuilder {
    /// Starts an action named `name` over `parameters`, lasting zero time units.
    pub fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        let header = ActionHeader::new(env, name, parameters.clone())?;
        let start = ActionDraft::new(env, format!("start_{}", header.name()), parameters.clone())?;
        let end = ActionDraft::new(env, format!("end_{}", header.name()), parameters)?;
        Ok(Self {
            header,
            start,
            end,
            duration: DurationInterval::default(),
        })
    }

    /// The action name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.header.name()
    }

    /// Looks a parameter up by name.
    pub fn parameter(&self, name: &str) -> Result<&Parameter, ModelError> {
        self.header.parameter(name)
    }

    /// Adds a precondition of the start half.
    pub fn add_precondition(&mut self, condition: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        self.start.add_precondition(condition.into())?;
        Ok(self)
    }

    /// Adds `fluent := value` to the start half.
    pub fn add_during_activation_effect(
        &mut self,
        fluent: FluentExp,
        value: impl Into<Expr>,
    ) -> Result<&mut Self, ModelError> {
        self.start
            .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Assign)?;
        Ok(self)
    }

    /// Adds a precondition of the end half.
    pub fn add_end_precondition(&mut self, condition: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        self.end.add_precondition(condition.into())?;
        Ok(self)
    }

    /// Adds `fluent := value` to the end half.
    pub fn add_effect(&mut self, fluent: FluentExp, value: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        self.end
            .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Assign)?;
        Ok(self)
    }

    /// Adds `fluent += value` to the end half.
    pub fn add_increase_effect(&mut self, fluent: FluentExp, value: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        self.end
            .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Increase)?;
        Ok(self)
    }

    /// Adds `fluent -= value` to the end half.
    pub fn add_decrease_effect(&mut self, fluent: FluentExp, value: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        self.end
            .add_effect(fluent, value.into(), Expr::from(true), EffectKind::Decrease)?;
        Ok(self)
    }

    /// Adds a sampled effect to the end half.
    pub fn add_probabilistic_effect(
        &mut self,
        fluents: Vec<FluentExp>,
        function: EffectFn,
    ) -> Result<&mut Self, ModelError> {
        self.end.add_probabilistic_effect(fluents, function)?;
        Ok(self)
    }

    /// Sets the duration to `[value, value]`.
    pub fn set_fixed_duration(&mut self, value: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        let duration = DurationInterval::fixed(value)?;
        self.start.check_expr(duration.lower())?;
        self.duration = duration;
        Ok(self)
    }

    /// Finalizes the action.
    #[must_use]
    pub fn build(self) -> DurationProbabilisticAction {
        let (start, _) = self.start.finish();
        let (end, probabilistic) = self.end.finish();
        let end = ProbabilisticAction::from_parts(end, probabilistic);
        DurationProbabilisticAction {
            header: self.header,
            start: FixDurationStartAction {
                action: start,
                duration: self.duration,
                end_action: end.base().name().to_string(),
            },
            end,
        }
    }
}

/// Links compiled actions through `action_occurs` and adds them to `problem`.
///
/// Registers the `action` type and the `action_occurs(a: action)` fluent
/// (default `false`) unless the problem already has them, and one object
/// `start_<name>` per action. Each start half sets its flag, each end half
/// requires and clears it. Returns the builder, the fluent and the objects
/// in the order of `actions`.
pub fn start_end_actions(
    problem: ProblemBuilder,
    actions: Vec<DurationProbabilisticActionBuilder>,
) -> Result<(ProblemBuilder, Fluent, Vec<Object>), ModelError> {
    let env = problem.environment().clone();
    let mut problem = problem;

    let action_type = match problem.user_type(ACTION_TYPE_NAME).cloned() {
        Some(t) => t,
        None => {
            let t = UserType::new(&env, ACTION_TYPE_NAME, None)?;
            problem = problem.add_user_type(&t);
            t
        }
    };
    let action_occurs = match problem.fluent(ACTION_OCCURS_NAME).cloned() {
        Some(f) if is_occurs_fluent(&f, &action_type) => f,
        Some(_) => {
            return Err(ModelError::DuplicateName {
                kind: "fluent",
                name: ACTION_OCCURS_NAME.to_string(),
            })
        }
        None => {
            let a = Parameter::new(&env, "a", Type::User(action_type.clone()))?;
            let f = Fluent::new(&env, ACTION_OCCURS_NAME, Type::Bool, vec![a])?;
            problem = problem.add_fluent(&f, Some(Value::Bool(false)));
            f
        }
    };

    let mut objects = Vec::with_capacity(actions.len());
    for mut action in actions {
        let object = Object::new(&env, format!("start_{}", action.name()), &action_type)?;
        let occurs = action_occurs.call(vec![Expr::from(&object)])?;
        action
            .add_during_activation_effect(occurs.clone(), true)?
            .add_end_precondition(occurs.clone())?
            .add_effect(occurs, false)?;
        problem = problem.add_object(object.clone()).add_action(action.build());
        objects.push(object);
    }
    Ok((problem, action_occurs, objects))
}

fn is_occurs_fluent(fluent: &Fluent, action_type: &UserType) -> bool {
    fluent.value_type().is_bool()
        && fluent.arity() == 1
        && fluent.signature()[0].value_type() == &Type::User(action_type.clone())
}
