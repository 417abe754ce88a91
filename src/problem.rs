//! Planning problems and their builder.
//!
//! A [`ProblemBuilder`] collects declarations without failing; [`ProblemBuilder::build`]
//! validates everything at once and produces an immutable [`Problem`] with
//! its initial values resolved and its kind derived.

use std::collections::HashMap;

use crate::action::Action;
use crate::effect::Effect;
use crate::environment::Environment;
use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::{Fluent, GroundFluent};
use crate::object::{Object, Parameter};
use crate::problem_kind::{Feature, ProblemKind};
use crate::state::State;
use crate::types::{Type, UserType};
use crate::value::Value;

/// Largest integer range enumerated when grounding or quantifying.
pub const MAX_DOMAIN_SIZE: u64 = 1 << 16;

/// A plan quality metric.
///
/// Metrics are recorded for classification only; the simulator never
/// evaluates them.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityMetric {
    /// Sum of per-action costs, keyed by action name.
    MinimizeActionCosts {
        costs: Vec<(String, Expr)>,
        default: Option<Expr>,
    },
    /// Number of actions in the plan.
    MinimizeSequentialPlanLength,
    /// Duration of a temporal plan.
    MinimizeMakespan,
    /// Value of an expression in the final state.
    MinimizeExpressionOnFinalState(Expr),
    /// Value of an expression in the final state.
    MaximizeExpressionOnFinalState(Expr),
    /// Sum of the gains of the goals reached.
    Oversubscription {
        goals: Vec<(Expr, Value)>,
    },
    /// Sum of the gains of the timed goals reached.
    TemporalOversubscription {
        goals: Vec<(Expr, Value)>,
    },
}

impl QualityMetric {
    /// The problem feature the metric contributes.
    #[must_use]
    pub const fn feature(&self) -> Feature {
        match self {
            Self::MinimizeActionCosts { .. } => Feature::ActionsCost,
            Self::MinimizeSequentialPlanLength => Feature::PlanLength,
            Self::MinimizeMakespan => Feature::Makespan,
            Self::MinimizeExpressionOnFinalState(_) | Self::MaximizeExpressionOnFinalState(_) => {
                Feature::FinalValue
            }
            Self::Oversubscription { .. } => Feature::Oversubscription,
            Self::TemporalOversubscription { .. } => Feature::TemporalOversubscription,
        }
    }

    fn expressions(&self) -> Vec<&Expr> {
        match self {
            Self::MinimizeActionCosts { costs, default } => {
                costs.iter().map(|(_, e)| e).chain(default.iter()).collect()
            }
            Self::MinimizeSequentialPlanLength | Self::MinimizeMakespan => Vec::new(),
            Self::MinimizeExpressionOnFinalState(e) | Self::MaximizeExpressionOnFinalState(e) => {
                vec![e]
            }
            Self::Oversubscription { goals } | Self::TemporalOversubscription { goals } => {
                goals.iter().map(|(e, _)| e).collect()
            }
        }
    }
}

/// Collects the declarations of a problem.
///
/// Setters never fail; declaring the same symbol twice is a no-op. All
/// checks run in [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use plansim::{Environment, Expr, Fluent, ProblemBuilder, Type, Value};
///
/// let env = Environment::new();
/// let done = Fluent::new(&env, "done", Type::Bool, Vec::new()).unwrap();
/// let problem = ProblemBuilder::new(&env, "tiny")
///     .add_fluent(&done, Some(Value::Bool(false)))
///     .add_goal(done.call(Vec::new()).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(problem.goals().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    env: Environment,
    name: String,
    user_types: Vec<UserType>,
    fluents: Vec<(Fluent, Option<Value>)>,
    objects: Vec<Object>,
    actions: Vec<Action>,
    initial_values: Vec<(GroundFluent, Value)>,
    goals: Vec<Expr>,
    quality_metrics: Vec<QualityMetric>,
}

impl ProblemBuilder {
    /// Starts an empty problem.
    #[must_use]
    pub fn new(env: &Environment, name: impl Into<String>) -> Self {
        Self {
            env: env.clone(),
            name: name.into(),
            user_types: Vec::new(),
            fluents: Vec::new(),
            objects: Vec::new(),
            actions: Vec::new(),
            initial_values: Vec::new(),
            goals: Vec::new(),
            quality_metrics: Vec::new(),
        }
    }

    /// The environment symbols must belong to.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.env
    }

    /// Declares a user type and its ancestors.
    #[must_use]
    pub fn add_user_type(mut self, ty: &UserType) -> Self {
        self.register_user_type(ty);
        self
    }

    /// Declares a fluent; `default` initializes every grounding not set explicitly.
    #[must_use]
    pub fn add_fluent(mut self, fluent: &Fluent, default: Option<Value>) -> Self {
        self.register_type(fluent.value_type());
        for p in fluent.signature() {
            self.register_type(p.value_type());
        }
        match self.fluents.iter_mut().find(|(f, _)| f == fluent) {
            Some(entry) => entry.1 = default,
            None => self.fluents.push((fluent.clone(), default)),
        }
        self
    }

    /// Declares an object and its type.
    #[must_use]
    pub fn add_object(mut self, object: Object) -> Self {
        self.register_user_type(object.user_type());
        if !self.objects.contains(&object) {
            self.objects.push(object);
        }
        self
    }

    /// Declares several objects.
    #[must_use]
    pub fn add_objects(self, objects: impl IntoIterator<Item = Object>) -> Self {
        objects.into_iter().fold(self, Self::add_object)
    }

    /// Declares an action and the types of its parameters.
    #[must_use]
    pub fn add_action(mut self, action: impl Into<Action>) -> Self {
        let action = action.into();
        for p in action.parameters() {
            self.register_type(p.value_type());
        }
        if !self.actions.contains(&action) {
            self.actions.push(action);
        }
        self
    }

    /// Sets the initial value of one grounding, replacing any previous one.
    #[must_use]
    pub fn set_initial_value(mut self, fluent: GroundFluent, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.initial_values.iter_mut().find(|(f, _)| *f == fluent) {
            Some(entry) => entry.1 = value,
            None => self.initial_values.push((fluent, value)),
        }
        self
    }

    /// Adds a goal; the constant `true` is ignored.
    #[must_use]
    pub fn add_goal(mut self, goal: impl Into<Expr>) -> Self {
        let goal = goal.into();
        if !goal.is_true() && !self.goals.contains(&goal) {
            self.goals.push(goal);
        }
        self
    }

    /// Adds a quality metric.
    #[must_use]
    pub fn add_quality_metric(mut self, metric: QualityMetric) -> Self {
        self.quality_metrics.push(metric);
        self
    }

    /// Looks a declared user type up by name.
    #[must_use]
    pub fn user_type(&self, name: &str) -> Option<&UserType> {
        self.user_types.iter().find(|t| t.name() == name)
    }

    /// Looks a declared fluent up by name.
    #[must_use]
    pub fn fluent(&self, name: &str) -> Option<&Fluent> {
        self.fluents.iter().map(|(f, _)| f).find(|f| f.name() == name)
    }

    /// Looks a declared object up by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name() == name)
    }

    fn register_user_type(&mut self, ty: &UserType) {
        if self.user_types.contains(ty) {
            return;
        }
        if let Some(father) = ty.father() {
            self.register_user_type(father);
        }
        self.user_types.push(ty.clone());
    }

    fn register_type(&mut self, ty: &Type) {
        if let Type::User(t) = ty {
            self.register_user_type(t);
        }
    }

    /// Validates the declarations and resolves the initial state.
    pub fn build(self) -> Result<Problem, ModelError> {
        let Self {
            env,
            name,
            user_types,
            mut fluents,
            objects,
            actions,
            initial_values,
            goals,
            quality_metrics,
        } = self;
        let name = env.validate_name(name)?;

        let mut names: HashMap<&str, &'static str> = HashMap::new();
        let symbols = user_types
            .iter()
            .map(|t| ("type", t.name(), t.env_id()))
            .chain(fluents.iter().map(|(f, _)| ("fluent", f.name(), f.env_id())))
            .chain(objects.iter().map(|o| ("object", o.name(), o.env_id())))
            .chain(actions.iter().map(|a| ("action", a.name(), a.env_id())));
        for (kind, symbol, owner) in symbols {
            env.ensure_owns(owner, symbol)?;
            if names.insert(symbol, kind).is_some() {
                return Err(ModelError::DuplicateName {
                    kind,
                    name: symbol.to_string(),
                });
            }
        }

        for (fluent, default) in &mut fluents {
            if let Some(value) = default {
                if !fluent.value_type().accepts(value) {
                    return Err(incompatible(fluent.value_type(), value));
                }
                *value = fluent.value_type().coerce(value.clone());
            }
        }

        let mut explicit = HashMap::with_capacity(initial_values.len());
        for (key, value) in initial_values {
            if !fluents.iter().any(|(f, _)| f == key.fluent()) {
                return Err(ModelError::UnknownName {
                    kind: "fluent",
                    name: key.fluent().name().to_string(),
                });
            }
            for arg in key.args() {
                if let Value::Object(o) = arg {
                    if !objects.contains(o) {
                        return Err(ModelError::UnknownName {
                            kind: "object",
                            name: o.name().to_string(),
                        });
                    }
                }
            }
            if !key.value_type().accepts(&value) {
                return Err(incompatible(key.value_type(), &value));
            }
            let value = key.value_type().coerce(value);
            explicit.insert(key, value);
        }

        for goal in &goals {
            check_closed_condition(&env, goal)?;
        }
        for metric in &quality_metrics {
            for expr in metric.expressions() {
                expr.check_environment(&env)?;
            }
            if let QualityMetric::MinimizeActionCosts { costs, .. } = metric {
                for (action, _) in costs {
                    if !actions.iter().any(|a| a.name() == action) {
                        return Err(ModelError::UnknownName {
                            kind: "action",
                            name: action.clone(),
                        });
                    }
                }
            }
        }

        let mut problem = Problem {
            env,
            name,
            user_types,
            fluents,
            objects,
            actions,
            explicit_initial_values: HashMap::new(),
            initial_values: HashMap::new(),
            goals,
            quality_metrics,
            kind: ProblemKind::new(),
        };
        problem.initial_values = problem.resolve_initial_values(&explicit)?;
        problem.explicit_initial_values = explicit;
        problem.kind = KindDeriver::derive(&problem);
        Ok(problem)
    }
}

fn incompatible(expected: &Type, value: &Value) -> ModelError {
    ModelError::IncompatibleType {
        expected: expected.to_string(),
        actual: Type::of_value(value).to_string(),
    }
}

fn check_closed_condition(env: &Environment, expr: &Expr) -> Result<(), ModelError> {
    expr.check_environment(env)?;
    if !expr.type_of()?.is_bool() {
        return Err(ModelError::NonBooleanCondition {
            expr: expr.to_string(),
        });
    }
    let mut unbound: Vec<String> = expr
        .free_variables()
        .iter()
        .map(|v| v.name().to_string())
        .collect();
    unbound.extend(expr.parameters().iter().map(|p| p.name().to_string()));
    if unbound.is_empty() {
        Ok(())
    } else {
        Err(ModelError::UnboundVariables {
            expr: expr.to_string(),
            variables: unbound,
        })
    }
}

/// A validated planning problem.
#[derive(Debug, Clone)]
pub struct Problem {
    env: Environment,
    name: String,
    user_types: Vec<UserType>,
    fluents: Vec<(Fluent, Option<Value>)>,
    objects: Vec<Object>,
    actions: Vec<Action>,
    explicit_initial_values: HashMap<GroundFluent, Value>,
    initial_values: HashMap<GroundFluent, Value>,
    goals: Vec<Expr>,
    quality_metrics: Vec<QualityMetric>,
    kind: ProblemKind,
}

impl Problem {
    /// Problem name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Environment shared by every declaration of the problem.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.env
    }

    /// User types, ancestors before descendants.
    #[must_use]
    pub fn user_types(&self) -> &[UserType] {
        &self.user_types
    }

    /// Declared fluents, in declaration order.
    pub fn fluents(&self) -> impl Iterator<Item = &Fluent> + '_ {
        self.fluents.iter().map(|(f, _)| f)
    }

    /// Looks a fluent up by name.
    pub fn fluent(&self, name: &str) -> Result<&Fluent, ModelError> {
        self.fluents()
            .find(|f| f.name() == name)
            .ok_or_else(|| unknown("fluent", name))
    }

    /// Default initial value of `fluent`, if one was declared.
    #[must_use]
    pub fn fluent_default(&self, fluent: &Fluent) -> Option<&Value> {
        self.fluents
            .iter()
            .find(|(f, _)| f == fluent)
            .and_then(|(_, d)| d.as_ref())
    }

    /// Objects in declaration order.
    #[must_use]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Looks an object up by name.
    pub fn object(&self, name: &str) -> Result<&Object, ModelError> {
        self.objects
            .iter()
            .find(|o| o.name() == name)
            .ok_or_else(|| unknown("object", name))
    }

    /// Objects of `ty` or one of its subtypes, in declaration order.
    #[must_use]
    pub fn objects_of(&self, ty: &UserType) -> Vec<&Object> {
        self.objects
            .iter()
            .filter(|o| o.user_type().is_subtype_of(ty))
            .collect()
    }

    /// Actions in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Looks an action up by name.
    pub fn action(&self, name: &str) -> Result<&Action, ModelError> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| unknown("action", name))
    }

    /// Returns true if `action` was declared in this problem.
    #[must_use]
    pub fn has_action(&self, action: &Action) -> bool {
        self.actions.contains(action)
    }

    /// Values set explicitly with [`ProblemBuilder::set_initial_value`].
    #[must_use]
    pub const fn explicit_initial_values(&self) -> &HashMap<GroundFluent, Value> {
        &self.explicit_initial_values
    }

    /// Explicit values completed with fluent defaults over every grounding.
    #[must_use]
    pub const fn initial_values(&self) -> &HashMap<GroundFluent, Value> {
        &self.initial_values
    }

    /// The initial state with the default ancestry bound.
    #[must_use]
    pub fn initial_state(&self) -> State {
        State::new(self.initial_values.clone())
    }

    /// Goal conditions.
    #[must_use]
    pub fn goals(&self) -> &[Expr] {
        &self.goals
    }

    /// Declared quality metrics.
    #[must_use]
    pub fn quality_metrics(&self) -> &[QualityMetric] {
        &self.quality_metrics
    }

    /// Features the problem uses.
    #[must_use]
    pub const fn kind(&self) -> &ProblemKind {
        &self.kind
    }

    /// Finite set of values of `ty`.
    ///
    /// Returns `None` for unbounded numeric types and for integer ranges
    /// wider than [`MAX_DOMAIN_SIZE`].
    #[must_use]
    pub fn type_domain(&self, ty: &Type) -> Option<Vec<Value>> {
        match ty {
            Type::Bool => Some(vec![Value::Bool(false), Value::Bool(true)]),
            Type::User(t) => Some(self.objects_of(t).into_iter().map(Value::from).collect()),
            Type::Int {
                lower: Some(l),
                upper: Some(u),
            } => {
                let size = i128::from(*u) - i128::from(*l) + 1;
                (size <= i128::from(MAX_DOMAIN_SIZE)).then(|| (*l..=*u).map(Value::Int).collect())
            }
            Type::Int { .. } | Type::Real { .. } => None,
        }
    }

    /// Every combination of values of `params`, the first parameter varying slowest.
    ///
    /// Returns `None` when one of the types has no finite domain.
    #[must_use]
    pub fn parameter_combinations(&self, params: &[Parameter]) -> Option<Vec<Vec<Value>>> {
        let mut combinations = vec![Vec::new()];
        for p in params {
            let domain = self.type_domain(p.value_type())?;
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    domain.iter().map(move |v| {
                        let mut next = prefix.clone();
                        next.push(v.clone());
                        next
                    })
                })
                .collect();
        }
        Some(combinations)
    }

    fn resolve_initial_values(
        &self,
        explicit: &HashMap<GroundFluent, Value>,
    ) -> Result<HashMap<GroundFluent, Value>, ModelError> {
        let mut values = HashMap::new();
        for (fluent, default) in &self.fluents {
            let Some(combinations) = self.parameter_combinations(fluent.signature()) else {
                let parameter = fluent
                    .signature()
                    .iter()
                    .find(|p| self.type_domain(p.value_type()).is_none())
                    .map_or_else(String::new, |p| p.name().to_string());
                return Err(ModelError::InfiniteFluentDomain {
                    fluent: fluent.name().to_string(),
                    parameter,
                });
            };
            for args in combinations {
                let key = GroundFluent::from_parts(fluent.clone(), args);
                let value = match explicit.get(&key).or(default.as_ref()) {
                    Some(v) => v.clone(),
                    None => {
                        return Err(ModelError::MissingInitialValue {
                            fluent: key.to_string(),
                        })
                    }
                };
                values.insert(key, value);
            }
        }
        values.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(values)
    }
}

fn unknown(kind: &'static str, name: &str) -> ModelError {
    ModelError::UnknownName {
        kind,
        name: name.to_string(),
    }
}

/// Walks a problem and collects the features it uses.
struct KindDeriver {
    kind: ProblemKind,
    simple_numeric: bool,
}

impl KindDeriver {
    fn derive(problem: &Problem) -> ProblemKind {
        let mut d = Self {
            kind: ProblemKind::new(),
            simple_numeric: true,
        };
        d.kind.set(Feature::ActionBased);
        for metric in &problem.quality_metrics {
            d.kind.set(metric.feature());
        }
        for (fluent, _) in &problem.fluents {
            d.fluent(fluent);
        }
        for object in &problem.objects {
            d.user_type(object.user_type());
        }
        for action in &problem.actions {
            d.action(action);
        }
        for goal in &problem.goals {
            d.condition(goal);
        }
        if d.kind.has(Feature::DiscreteNumbers) || d.kind.has(Feature::ContinuousNumbers) {
            d.kind.set(if d.simple_numeric {
                Feature::SimpleNumericPlanning
            } else {
                Feature::GeneralNumericPlanning
            });
        }
        d.kind
    }

    fn user_type(&mut self, ty: &UserType) {
        self.kind.set(Feature::FlatTyping);
        if ty.father().is_some() {
            self.kind.set(Feature::HierarchicalTyping);
        }
    }

    fn value_type(&mut self, ty: &Type) {
        match ty {
            Type::User(t) => self.user_type(t),
            Type::Int { .. } => self.kind.set(Feature::DiscreteNumbers),
            Type::Real { .. } => self.kind.set(Feature::ContinuousNumbers),
            Type::Bool => {}
        }
    }

    fn fluent(&mut self, fluent: &Fluent) {
        let ty = fluent.value_type();
        self.value_type(ty);
        if ty.is_numeric() {
            if ty.has_bounds() {
                self.kind.set(Feature::BoundedTypes);
            }
            self.kind.set(Feature::NumericFluents);
        } else if ty.as_user().is_some() {
            self.kind.set(Feature::ObjectFluents);
        }
        for p in fluent.signature() {
            self.value_type(p.value_type());
        }
    }

    fn condition(&mut self, expr: &Expr) {
        let ops = expr.operators();
        if ops.equality {
            self.kind.set(Feature::Equalities);
        }
        if ops.negation {
            self.kind.set(Feature::NegativeConditions);
        }
        if ops.disjunction {
            self.kind.set(Feature::DisjunctiveConditions);
        }
        if ops.existential {
            self.kind.set(Feature::ExistentialConditions);
        }
        if ops.universal {
            self.kind.set(Feature::UniversalConditions);
        }
        if ops.nonlinear {
            self.simple_numeric = false;
        }
    }

    fn effect(&mut self, effect: &Effect) {
        if effect.is_conditional() {
            self.condition(effect.condition());
            self.kind.set(Feature::ConditionalEffects);
        }
        if effect.is_increase() {
            self.kind.set(Feature::IncreaseEffects);
        } else if effect.is_decrease() {
            self.kind.set(Feature::DecreaseEffects);
        }
        let value = effect.value().simplify();
        if effect.fluent().value_type().is_numeric() && value.as_constant().is_none() {
            self.simple_numeric = false;
        }
    }

    fn action(&mut self, action: &Action) {
        for p in action.parameters() {
            self.value_type(p.value_type());
        }
        match action {
            Action::Sensing(_) => self.kind.set(Feature::Contingent),
            Action::Durative(_) => self.kind.set(Feature::ContinuousTime),
            _ => {}
        }
        for c in action.conditions() {
            self.condition(c);
        }
        for e in action.effects() {
            self.effect(e);
        }
        if action.has_simulated_effect() {
            self.kind.set(Feature::SimulatedEffects);
        }
        if !action.probabilistic_effects().is_empty() {
            self.kind.set(Feature::ProbabilisticEffects);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{DurativeActionBuilder, InstantaneousActionBuilder, SensingActionBuilder};

    struct Fixture {
        env: Environment,
        vehicle: UserType,
        truck: UserType,
        at: Fluent,
    }

    fn fixture() -> Fixture {
        let env = Environment::new();
        let vehicle = UserType::new(&env, "vehicle", None).unwrap();
        let truck = UserType::new(&env, "truck", Some(&vehicle)).unwrap();
        let v = Parameter::new(&env, "v", Type::User(vehicle.clone())).unwrap();
        let at = Fluent::new(&env, "parked", Type::Bool, vec![v]).unwrap();
        Fixture {
            env,
            vehicle,
            truck,
            at,
        }
    }

    #[test]
    fn test_defaults_cover_every_grounding() {
        let fx = fixture();
        let car = Object::new(&fx.env, "car", &fx.vehicle).unwrap();
        let lorry = Object::new(&fx.env, "lorry", &fx.truck).unwrap();
        let problem = ProblemBuilder::new(&fx.env, "parking")
            .add_fluent(&fx.at, Some(Value::Bool(false)))
            .add_objects([car.clone(), lorry.clone()])
            .set_initial_value(fx.at.ground(vec![Value::from(&lorry)]).unwrap(), true)
            .build()
            .unwrap();

        assert_eq!(problem.user_types().len(), 2);
        assert_eq!(problem.objects_of(&fx.vehicle).len(), 2);
        assert_eq!(problem.objects_of(&fx.truck).len(), 1);
        assert_eq!(problem.initial_values().len(), 2);
        assert_eq!(problem.explicit_initial_values().len(), 1);
        let state = problem.initial_state();
        assert_eq!(
            state.lookup(&fx.at.ground(vec![Value::from(&car)]).unwrap()).unwrap(),
            &Value::Bool(false)
        );
        assert_eq!(
            state.lookup(&fx.at.ground(vec![Value::from(&lorry)]).unwrap()).unwrap(),
            &Value::Bool(true)
        );
    }

    #[test]
    fn test_missing_initial_value() {
        let fx = fixture();
        let car = Object::new(&fx.env, "car", &fx.vehicle).unwrap();
        let result = ProblemBuilder::new(&fx.env, "parking")
            .add_fluent(&fx.at, None)
            .add_object(car)
            .build();
        assert!(matches!(result, Err(ModelError::MissingInitialValue { .. })));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let fx = fixture();
        let clash = Object::new(&fx.env, "parked", &fx.vehicle).unwrap();
        let result = ProblemBuilder::new(&fx.env, "p")
            .add_fluent(&fx.at, Some(Value::Bool(false)))
            .add_object(clash)
            .build();
        assert!(matches!(result, Err(ModelError::DuplicateName { kind: "object", .. })));
    }

    #[test]
    fn test_foreign_symbols_rejected() {
        let fx = fixture();
        let other = Environment::new();
        let result = ProblemBuilder::new(&other, "p")
            .add_fluent(&fx.at, Some(Value::Bool(false)))
            .build();
        assert!(matches!(result, Err(ModelError::ForeignEnvironment { .. })));
    }

    #[test]
    fn test_goal_and_default_types_are_checked() {
        let env = Environment::new();
        let level = Fluent::new(&env, "level", Type::bounded_real(Some(0.0), Some(1.0)).unwrap(), Vec::new()).unwrap();
        let goal_not_bool = ProblemBuilder::new(&env, "p")
            .add_fluent(&level, Some(Value::Int(0)))
            .add_goal(level.call(Vec::new()).unwrap())
            .build();
        assert!(matches!(goal_not_bool, Err(ModelError::NonBooleanCondition { .. })));

        let out_of_bounds = ProblemBuilder::new(&env, "p")
            .add_fluent(&level, Some(Value::Int(2)))
            .build();
        assert!(matches!(out_of_bounds, Err(ModelError::IncompatibleType { .. })));

        let problem = ProblemBuilder::new(&env, "p")
            .add_fluent(&level, Some(Value::Int(1)))
            .build()
            .unwrap();
        let key = level.ground(Vec::new()).unwrap();
        assert_eq!(problem.initial_values()[&key], Value::from(1.0));
    }

    #[test]
    fn test_lookups() {
        let fx = fixture();
        let problem = ProblemBuilder::new(&fx.env, "p")
            .add_fluent(&fx.at, Some(Value::Bool(false)))
            .build()
            .unwrap();
        assert_eq!(problem.fluent("parked").unwrap(), &fx.at);
        assert!(matches!(
            problem.action("drive"),
            Err(ModelError::UnknownName { kind: "action", .. })
        ));
    }

    #[test]
    fn test_kind_derivation() {
        let fx = fixture();
        let fuel = Fluent::new(&fx.env, "fuel", Type::bounded_int(Some(0), None).unwrap(), Vec::new()).unwrap();
        let fuel_exp = fuel.call(Vec::new()).unwrap();
        let truck = Object::new(&fx.env, "t1", &fx.truck).unwrap();
        let v = Parameter::new(&fx.env, "v", Type::User(fx.vehicle.clone())).unwrap();

        let mut park = InstantaneousActionBuilder::new(&fx.env, "park", vec![v.clone()]).unwrap();
        park.add_precondition(Expr::not(fx.at.call(vec![Expr::from(&v)]).unwrap()))
            .unwrap()
            .add_effect(fx.at.call(vec![Expr::from(&v)]).unwrap(), true)
            .unwrap()
            .add_decrease_effect(fuel_exp.clone(), 1)
            .unwrap();
        let look = SensingActionBuilder::new(&fx.env, "look", Vec::new()).unwrap();

        let problem = ProblemBuilder::new(&fx.env, "p")
            .add_fluent(&fx.at, Some(Value::Bool(false)))
            .add_fluent(&fuel, Some(Value::Int(3)))
            .add_object(truck)
            .add_action(park.build())
            .add_action(look.build())
            .add_quality_metric(QualityMetric::MinimizeSequentialPlanLength)
            .build()
            .unwrap();
        let kind = problem.kind();
        for feature in [
            Feature::ActionBased,
            Feature::Contingent,
            Feature::FlatTyping,
            Feature::HierarchicalTyping,
            Feature::DiscreteNumbers,
            Feature::BoundedTypes,
            Feature::NumericFluents,
            Feature::NegativeConditions,
            Feature::DecreaseEffects,
            Feature::SimpleNumericPlanning,
            Feature::PlanLength,
        ] {
            assert!(kind.has(feature), "missing {feature}");
        }
        assert!(!kind.has(Feature::ContinuousTime));
        assert!(!kind.has(Feature::GeneralNumericPlanning));
    }

    #[test]
    fn test_durative_actions_need_continuous_time() {
        let env = Environment::new();
        let wait = DurativeActionBuilder::new(&env, "wait", Vec::new()).unwrap();
        let problem = ProblemBuilder::new(&env, "p").add_action(wait.build()).build().unwrap();
        assert!(problem.kind().has(Feature::ContinuousTime));
    }

    #[test]
    fn test_parameter_combinations_order() {
        let env = Environment::new();
        let flag = Parameter::new(&env, "flag", Type::Bool).unwrap();
        let n = Parameter::new(&env, "n", Type::bounded_int(Some(1), Some(2)).unwrap()).unwrap();
        let problem = ProblemBuilder::new(&env, "p").build().unwrap();
        let combos = problem.parameter_combinations(&[flag, n]).unwrap();
        assert_eq!(
            combos,
            vec![
                vec![Value::Bool(false), Value::Int(1)],
                vec![Value::Bool(false), Value::Int(2)],
                vec![Value::Bool(true), Value::Int(1)],
                vec![Value::Bool(true), Value::Int(2)],
            ]
        );
        let unbounded = Parameter::new(&env, "k", Type::int()).unwrap();
        assert!(problem.parameter_combinations(&[unbounded]).is_none());
        let wide = Parameter::new(&env, "w", Type::bounded_int(Some(0), Some(i64::MAX)).unwrap()).unwrap();
        assert!(problem.parameter_combinations(&[wide]).is_none());
    }

    #[test]
    fn test_wide_fluent_signature_is_rejected_at_build() {
        let env = Environment::new();
        let n = Parameter::new(&env, "n", Type::bounded_int(Some(0), Some(i64::MAX)).unwrap()).unwrap();
        let slot = Fluent::new(&env, "slot", Type::int(), vec![n]).unwrap();
        let err = ProblemBuilder::new(&env, "p")
            .add_fluent(&slot, Some(Value::Int(0)))
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::InfiniteFluentDomain { ref parameter, .. } if parameter == "n"));
    }

    #[test]
    fn test_bounded_signature_gets_defaults() {
        let env = Environment::new();
        let n = Parameter::new(&env, "n", Type::bounded_int(Some(0), Some(3)).unwrap()).unwrap();
        let slot = Fluent::new(&env, "slot", Type::int(), vec![n]).unwrap();
        let problem = ProblemBuilder::new(&env, "p")
            .add_fluent(&slot, Some(Value::Int(0)))
            .build()
            .unwrap();
        let key = slot.ground(vec![Value::Int(3)]).unwrap();
        assert_eq!(problem.initial_state().lookup(&key).unwrap(), &Value::Int(0));
    }
}
