//! Effects: declarative assignments and computed (simulated or probabilistic) updates.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::FluentExp;
use crate::problem::Problem;
use crate::state::State;
use crate::value::Value;

/// How an effect combines its value with the fluent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// `fluent := value`
    Assign,
    /// `fluent += value`
    Increase,
    /// `fluent -= value`
    Decrease,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign => write!(f, ":="),
            Self::Increase => write!(f, "+="),
            Self::Decrease => write!(f, "-="),
        }
    }
}

/// A declarative effect, optionally guarded by a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Effect {
    fluent: FluentExp,
    value: Expr,
    condition: Expr,
    kind: EffectKind,
}

impl Effect {
    /// Creates an effect. Type checks happen in the action builders.
    #[must_use]
    pub const fn new(fluent: FluentExp, value: Expr, condition: Expr, kind: EffectKind) -> Self {
        Self {
            fluent,
            value,
            condition,
            kind,
        }
    }

    /// Written fluent.
    #[must_use]
    pub const fn fluent(&self) -> &FluentExp {
        &self.fluent
    }

    /// Assigned value or increment.
    #[must_use]
    pub const fn value(&self) -> &Expr {
        &self.value
    }

    /// Guard; constant `true` for unconditional effects.
    #[must_use]
    pub const fn condition(&self) -> &Expr {
        &self.condition
    }

    /// How the value is applied.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Returns true unless the condition is the constant `true`.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        !self.condition.is_true()
    }

    /// Returns true for `:=` effects.
    #[must_use]
    pub const fn is_assignment(&self) -> bool {
        matches!(self.kind, EffectKind::Assign)
    }

    /// Returns true for `+=` effects.
    #[must_use]
    pub const fn is_increase(&self) -> bool {
        matches!(self.kind, EffectKind::Increase)
    }

    /// Returns true for `-=` effects.
    #[must_use]
    pub const fn is_decrease(&self) -> bool {
        matches!(self.kind, EffectKind::Decrease)
    }

    /// Substitutes parameters everywhere and folds constants.
    #[must_use]
    pub fn ground(&self, bindings: &HashMap<String, Value>) -> Self {
        Self {
            fluent: self
                .fluent
                .map_args(|a| a.substitute_parameters(bindings).simplify()),
            value: self.value.substitute_parameters(bindings).simplify(),
            condition: self.condition.substitute_parameters(bindings).simplify(),
            kind: self.kind,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_conditional() {
            write!(f, "if {} then ", self.condition)?;
        }
        write!(f, "{} {} {}", self.fluent, self.kind, self.value)
    }
}

/// Parameter values of the grounded action a computed effect belongs to.
pub type Bindings = HashMap<String, Value>;

/// Callback computing one value per target fluent.
///
/// The callback may be impure: it can consult a random source or any
/// other external state, and nothing orders it against other evaluation.
pub type EffectFn = Arc<dyn Fn(&Problem, &State, &Bindings) -> Vec<Value> + Send + Sync>;

fn check_fluent_args(fluents: &[FluentExp]) -> Result<(), ModelError> {
    for f in fluents {
        let plain = f
            .args()
            .iter()
            .all(|a| matches!(a, Expr::Constant(_) | Expr::Parameter(_)));
        if !plain {
            return Err(ModelError::InvalidSimulatedFluent {
                fluent: f.to_string(),
            });
        }
    }
    Ok(())
}

fn fmt_fluents(f: &mut fmt::Formatter<'_>, fluents: &[FluentExp]) -> fmt::Result {
    write!(f, "[")?;
    for (i, fl) in fluents.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{fl}")?;
    }
    write!(f, "]")
}

macro_rules! computed_effect {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name {
            fluents: Vec<FluentExp>,
            function: EffectFn,
            bindings: Bindings,
        }

        impl $name {
            /// Creates the effect; fluent arguments must be constants or parameters.
            pub fn new(fluents: Vec<FluentExp>, function: EffectFn) -> Result<Self, ModelError> {
                check_fluent_args(&fluents)?;
                Ok(Self {
                    fluents,
                    function,
                    bindings: Bindings::new(),
                })
            }

            /// Target fluents, in the order the callback returns values.
            #[must_use]
            pub fn fluents(&self) -> &[FluentExp] {
                &self.fluents
            }

            /// Parameter values captured when the owning action was grounded.
            #[must_use]
            pub const fn bindings(&self) -> &Bindings {
                &self.bindings
            }

            /// Runs the callback.
            #[must_use]
            pub fn compute(&self, problem: &Problem, state: &State) -> Vec<Value> {
                (self.function)(problem, state, &self.bindings)
            }

            /// Binds parameters in the target fluents and remembers their values.
            #[must_use]
            pub fn ground(&self, bindings: &Bindings) -> Self {
                Self {
                    fluents: self
                        .fluents
                        .iter()
                        .map(|f| f.map_args(|a| a.substitute_parameters(bindings)))
                        .collect(),
                    function: Arc::clone(&self.function),
                    bindings: bindings.clone(),
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.fluents == other.fluents
                    && self.bindings == other.bindings
                    && Arc::ptr_eq(&self.function, &other.function)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                fmt_fluents(f, &self.fluents)?;
                write!(f, ")")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_fluents(f, &self.fluents)?;
                write!(f, " := {}", $label)
            }
        }
    };
}

computed_effect!(
    /// Programmatic effect whose values are computed from the state.
    SimulatedEffect,
    "simulated"
);

computed_effect!(
    /// Stochastic effect: each call returns one sampled outcome.
    ///
    /// No distribution is tracked; two calls on the same state may return
    /// different values.
    ProbabilisticEffect,
    "probabilistic"
);

/// Wraps a closure as an [`EffectFn`].
pub fn effect_fn<F>(f: F) -> EffectFn
where
    F: Fn(&Problem, &State, &Bindings) -> Vec<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::fluent::Fluent;
    use crate::object::Parameter;
    use crate::types::{Type, UserType};

    #[test]
    fn test_effect_display_and_flags() {
        let env = Environment::new();
        let f = Fluent::new(&env, "f", Type::int(), Vec::new()).unwrap();
        let g = Fluent::new(&env, "g", Type::Bool, Vec::new()).unwrap();
        let fe = f.call(Vec::new()).unwrap();
        let plain = Effect::new(fe.clone(), Expr::from(5), Expr::from(true), EffectKind::Assign);
        assert!(!plain.is_conditional());
        assert_eq!(plain.to_string(), "f := 5");

        let guarded = Effect::new(
            fe,
            Expr::from(1),
            Expr::from(g.call(Vec::new()).unwrap()),
            EffectKind::Increase,
        );
        assert!(guarded.is_conditional());
        assert!(guarded.is_increase());
        assert_eq!(guarded.to_string(), "if g then f += 1");
    }

    #[test]
    fn test_effect_grounding_substitutes_parameters() {
        let env = Environment::new();
        let location = UserType::new(&env, "location", None).unwrap();
        let l = Parameter::new(&env, "l", Type::User(location.clone())).unwrap();
        let at = Fluent::new(&env, "at", Type::Bool, vec![l.clone()]).unwrap();
        let effect = Effect::new(
            at.call(vec![Expr::from(&l)]).unwrap(),
            Expr::from(true),
            Expr::from(true),
            EffectKind::Assign,
        );
        let l0 = crate::object::Object::new(&env, "l0", &location).unwrap();
        let bindings = HashMap::from([("l".to_string(), Value::from(&l0))]);
        let grounded = effect.ground(&bindings);
        assert_eq!(grounded.to_string(), "at(l0) := true");
        assert!(grounded.fluent().to_ground().is_some());
    }

    #[test]
    fn test_simulated_fluents_must_be_plain() {
        let env = Environment::new();
        let n = Parameter::new(&env, "n", Type::bounded_int(Some(0), Some(3)).unwrap()).unwrap();
        let slot = Fluent::new(&env, "slot", Type::int(), vec![n.clone()]).unwrap();
        let callback = effect_fn(|_, _, _| vec![Value::Int(0)]);

        let ok = slot.call(vec![Expr::from(&n)]).unwrap();
        assert!(SimulatedEffect::new(vec![ok], Arc::clone(&callback)).is_ok());

        let nested = slot.call(vec![Expr::plus(&n, 1)]).unwrap();
        assert!(matches!(
            ProbabilisticEffect::new(vec![nested], callback),
            Err(ModelError::InvalidSimulatedFluent { .. })
        ));
    }
}
