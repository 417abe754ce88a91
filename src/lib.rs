//! # plansim - sequential simulation of action-based planning problems
//!
//! plansim checks and applies grounded actions against symbolic states.
//! Given a state and an action grounded with concrete parameters, it
//! decides whether the action is applicable and, if so, produces the
//! successor state, rejecting effects that write conflicting values to the
//! same fluent within one transition.
//!
//! ## Core Concepts
//!
//! - **Environment**: the context every type, fluent, object and action is created in
//! - **Fluent**: a typed state variable, possibly parameterized over objects
//! - **State**: an immutable map from grounded fluents to values with copy-on-write children
//! - **Action**: built through validating builders, then frozen
//! - **Event**: the grounded, instantaneous unit the simulator checks and applies
//! - **SequentialSimulator**: grounding, event caching, applicability, application and goals
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use plansim::{
//!     Environment, Expr, Fluent, InstantaneousActionBuilder, Object, Parameter, ProblemBuilder,
//!     SequentialSimulator, SimulatorConfig, Type, UserType, Value,
//! };
//!
//! let env = Environment::new();
//! let location = UserType::new(&env, "location", None)?;
//! let l = Parameter::new(&env, "l", Type::User(location.clone()))?;
//! let robot_at = Fluent::new(&env, "robot_at", Type::Bool, vec![l])?;
//!
//! let from = Parameter::new(&env, "from", Type::User(location.clone()))?;
//! let to = Parameter::new(&env, "to", Type::User(location.clone()))?;
//! let mut step = InstantaneousActionBuilder::new(&env, "move", vec![from.clone(), to.clone()])?;
//! step.add_precondition(robot_at.call(vec![Expr::from(&from)])?)?
//!     .add_effect(robot_at.call(vec![Expr::from(&from)])?, false)?
//!     .add_effect(robot_at.call(vec![Expr::from(&to)])?, true)?;
//!
//! let l0 = Object::new(&env, "l0", &location)?;
//! let l1 = Object::new(&env, "l1", &location)?;
//! let problem = ProblemBuilder::new(&env, "robot")
//!     .add_fluent(&robot_at, Some(Value::Bool(false)))
//!     .add_objects([l0.clone(), l1.clone()])
//!     .add_action(step.build())
//!     .set_initial_value(robot_at.ground(vec![Value::from(&l0)])?, true)
//!     .add_goal(robot_at.call(vec![Expr::from(&l1)])?)
//!     .build()?;
//! let problem = Arc::new(problem);
//!
//! let mut simulator = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default())?;
//! let events = simulator.get_events(problem.action("move")?, &[Value::from(&l0), Value::from(&l1)])?;
//! let state = simulator.apply(&events[0], &simulator.initial_state())?.expect("applicable");
//! assert!(simulator.is_goal(&state)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Modelling
pub mod action;
pub mod conflict;
pub mod effect;
pub mod environment;
pub mod error;
pub mod expression;
pub mod fluent;
pub mod object;
pub mod problem;
pub mod problem_kind;
pub mod types;
pub mod value;

// Simulation
pub mod evaluator;
pub mod grounder;
pub mod simulation;
pub mod state;

// Re-export primary types at crate root for convenience
pub use action::{
    start_end_actions, Action, ActionHeader, ConditionTiming, DurationInterval,
    DurationProbabilisticAction, DurationProbabilisticActionBuilder, DurativeAction,
    DurativeActionBuilder, EffectTiming, FixDurationStartAction, InstantaneousAction,
    InstantaneousActionBuilder, ProbabilisticAction, ProbabilisticActionBuilder, SensingAction,
    SensingActionBuilder,
};
pub use conflict::{ConflictKind, ConflictTarget};
pub use effect::{effect_fn, Bindings, Effect, EffectFn, EffectKind, ProbabilisticEffect, SimulatedEffect};
pub use environment::{Environment, EnvironmentId};
pub use error::{ExecutionError, ModelError, SimError, SimResult};
pub use evaluator::StateEvaluator;
pub use expression::Expr;
pub use fluent::{Fluent, FluentExp, GroundFluent};
pub use grounder::{GroundedAction, Grounder, ProblemGrounder};
pub use object::{Object, Parameter, Variable};
pub use problem::{Problem, ProblemBuilder, QualityMetric};
pub use problem_kind::{Feature, ProblemKind};
pub use simulation::{Event, SequentialSimulator, SimulatorConfig};
pub use state::State;
pub use types::{Type, UserType};
pub use value::{Real, Value};
