//! Grounding: instantiating actions with concrete parameter values.

use std::sync::Arc;

use tracing::debug;

use crate::action::Action;
use crate::error::ModelError;
use crate::problem::Problem;
use crate::value::Value;

/// One grounding of a lifted action.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedAction {
    /// The lifted action, as declared in the problem.
    pub action: Action,
    /// Values bound to the action parameters, in declaration order.
    pub parameters: Vec<Value>,
    /// The instantiated action, without parameters.
    pub grounded: Action,
}

/// Produces grounded actions for a simulator.
///
/// Implementations must be deterministic: grounding the same action with
/// the same values twice must yield equal results.
pub trait Grounder: Send + Sync {
    /// Grounds `action` with `parameters`.
    ///
    /// Returns `Ok(None)` when the grounding can never be applicable.
    fn ground_action(&self, action: &Action, parameters: &[Value]) -> Result<Option<Action>, ModelError>;

    /// Every non-vacuous grounding of every action, actions in declaration order.
    fn grounded_actions(&self) -> Result<Vec<GroundedAction>, ModelError>;
}

/// Grounds the actions of one problem by enumerating parameter domains.
///
/// User-typed parameters range over the objects of that type and its
/// subtypes, booleans over both values, bounded integers over their range.
/// Any other parameter type makes full grounding fail.
#[derive(Debug, Clone)]
pub struct ProblemGrounder {
    problem: Arc<Problem>,
}

impl ProblemGrounder {
    /// Creates a grounder for `problem`.
    #[must_use]
    pub const fn new(problem: Arc<Problem>) -> Self {
        Self { problem }
    }

    /// The problem being grounded.
    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }
}

impl Grounder for ProblemGrounder {
    fn ground_action(&self, action: &Action, parameters: &[Value]) -> Result<Option<Action>, ModelError> {
        action.ground(parameters)
    }

    fn grounded_actions(&self) -> Result<Vec<GroundedAction>, ModelError> {
        let mut grounded = Vec::new();
        for action in self.problem.actions() {
            let Some(combinations) = self.problem.parameter_combinations(action.parameters()) else {
                let parameter = action
                    .parameters()
                    .iter()
                    .find(|p| self.problem.type_domain(p.value_type()).is_none())
                    .map_or_else(String::new, |p| p.name().to_string());
                return Err(ModelError::UngroundableParameter {
                    action: action.name().to_string(),
                    parameter,
                });
            };
            let total = combinations.len();
            let before = grounded.len();
            for parameters in combinations {
                if let Some(instance) = action.ground(&parameters)? {
                    grounded.push(GroundedAction {
                        action: action.clone(),
                        parameters,
                        grounded: instance,
                    });
                }
            }
            debug!(
                action = action.name(),
                candidates = total,
                kept = grounded.len() - before,
                "grounded action"
            );
        }
        Ok(grounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::InstantaneousActionBuilder;
    use crate::environment::Environment;
    use crate::expression::Expr;
    use crate::fluent::Fluent;
    use crate::object::{Object, Parameter};
    use crate::problem::ProblemBuilder;
    use crate::types::{Type, UserType};

    fn problem_with_moves(locations: usize) -> Arc<Problem> {
        let env = Environment::new();
        let location = UserType::new(&env, "location", None).unwrap();
        let l = Parameter::new(&env, "l", Type::User(location.clone())).unwrap();
        let at = Fluent::new(&env, "at", Type::Bool, vec![l]).unwrap();
        let from = Parameter::new(&env, "from", Type::User(location.clone())).unwrap();
        let to = Parameter::new(&env, "to", Type::User(location.clone())).unwrap();
        let mut mv = InstantaneousActionBuilder::new(&env, "move", vec![from.clone(), to.clone()]).unwrap();
        mv.add_precondition(Expr::not(Expr::equals(&from, &to)))
            .unwrap()
            .add_precondition(at.call(vec![Expr::from(&from)]).unwrap())
            .unwrap()
            .add_effect(at.call(vec![Expr::from(&from)]).unwrap(), false)
            .unwrap()
            .add_effect(at.call(vec![Expr::from(&to)]).unwrap(), true)
            .unwrap();
        let objects = (0..locations).map(|i| Object::new(&env, format!("l{i}"), &location).unwrap());
        Arc::new(
            ProblemBuilder::new(&env, "moves")
                .add_fluent(&at, Some(Value::Bool(false)))
                .add_objects(objects)
                .add_action(mv.build())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_vacuous_groundings_are_skipped() {
        let problem = problem_with_moves(3);
        let grounder = ProblemGrounder::new(Arc::clone(&problem));
        let all = grounder.grounded_actions().unwrap();
        // 3 * 3 pairs minus the 3 self-loops.
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].grounded.name(), "move_l0_l1");
        assert_eq!(all[0].parameters.len(), 2);
        assert!(all.iter().all(|g| g.grounded.parameters().is_empty()));
    }

    #[test]
    fn test_grounding_is_deterministic() {
        let problem = problem_with_moves(2);
        let grounder = ProblemGrounder::new(Arc::clone(&problem));
        let action = problem.action("move").unwrap();
        let l0 = Value::from(problem.object("l0").unwrap());
        let l1 = Value::from(problem.object("l1").unwrap());
        let first = grounder.ground_action(action, &[l0.clone(), l1.clone()]).unwrap();
        let second = grounder.ground_action(action, &[l0.clone(), l1]).unwrap();
        assert_eq!(first, second);
        assert!(grounder.ground_action(action, &[l0.clone(), l0]).unwrap().is_none());
    }

    #[test]
    fn test_unbounded_parameter_cannot_be_enumerated() {
        let env = Environment::new();
        let n = Parameter::new(&env, "n", Type::int()).unwrap();
        let wait = InstantaneousActionBuilder::new(&env, "wait", vec![n]).unwrap();
        let problem = Arc::new(ProblemBuilder::new(&env, "p").add_action(wait.build()).build().unwrap());
        let err = ProblemGrounder::new(problem).grounded_actions().unwrap_err();
        assert!(matches!(err, ModelError::UngroundableParameter { ref parameter, .. } if parameter == "n"));
    }

    #[test]
    fn test_wide_integer_parameter_cannot_be_enumerated() {
        let env = Environment::new();
        let n = Parameter::new(&env, "n", Type::bounded_int(Some(i64::MIN), Some(i64::MAX)).unwrap()).unwrap();
        let wait = InstantaneousActionBuilder::new(&env, "wait", vec![n]).unwrap();
        let problem = Arc::new(ProblemBuilder::new(&env, "p").add_action(wait.build()).build().unwrap());
        let err = ProblemGrounder::new(problem).grounded_actions().unwrap_err();
        assert!(matches!(err, ModelError::UngroundableParameter { ref parameter, .. } if parameter == "n"));
    }
}
