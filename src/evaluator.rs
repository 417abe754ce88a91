//! Evaluation of expressions in a state.

use crate::error::ExecutionError;
use crate::expression::{ArithOp, Expr};
use crate::fluent::{FluentExp, GroundFluent};
use crate::object::Variable;
use crate::problem::Problem;
use crate::state::State;
use crate::value::Value;

/// Evaluates expressions against states of one problem.
///
/// Quantified variables range over the problem's objects of the
/// variable's type (subtypes included), over both booleans, or over the
/// values of a bounded integer type.
#[derive(Debug, Clone, Copy)]
pub struct StateEvaluator<'p> {
    problem: &'p Problem,
}

type Scope = Vec<(Variable, Value)>;

fn failure(expr: &Expr, reason: impl Into<String>) -> ExecutionError {
    ExecutionError::Evaluation {
        expr: expr.to_string(),
        reason: reason.into(),
    }
}

impl<'p> StateEvaluator<'p> {
    /// Creates an evaluator for `problem`.
    #[must_use]
    pub const fn new(problem: &'p Problem) -> Self {
        Self { problem }
    }

    /// Evaluates `expr` to a constant.
    pub fn evaluate(&self, expr: &Expr, state: &State) -> Result<Value, ExecutionError> {
        let mut scope = Scope::new();
        self.eval(expr, state, &mut scope)
    }

    /// Evaluates a condition; a non-boolean result is an error.
    pub fn evaluate_bool(&self, expr: &Expr, state: &State) -> Result<bool, ExecutionError> {
        self.evaluate(expr, state)?
            .as_bool()
            .ok_or_else(|| failure(expr, "condition did not evaluate to a boolean"))
    }

    /// Resolves the arguments of a fluent application to its state key.
    pub fn ground(&self, fluent: &FluentExp, state: &State) -> Result<GroundFluent, ExecutionError> {
        let mut scope = Scope::new();
        self.ground_in(fluent, state, &mut scope)
    }

    fn ground_in(
        &self,
        fluent: &FluentExp,
        state: &State,
        scope: &mut Scope,
    ) -> Result<GroundFluent, ExecutionError> {
        let args = fluent
            .args()
            .iter()
            .map(|a| self.eval(a, state, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GroundFluent::from_parts(fluent.fluent().clone(), args))
    }

    fn eval(&self, expr: &Expr, state: &State, scope: &mut Scope) -> Result<Value, ExecutionError> {
        match expr {
            Expr::Constant(v) => Ok(v.clone()),
            Expr::Fluent(f) => {
                let key = self.ground_in(f, state, scope)?;
                state.lookup(&key).cloned()
            }
            Expr::Parameter(p) => Err(failure(expr, format!("parameter {p} is not bound"))),
            Expr::Variable(v) => scope
                .iter()
                .rev()
                .find(|(bound, _)| bound == v)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| failure(expr, format!("variable {v} is not bound"))),
            Expr::Not(e) => Ok(Value::Bool(!self.eval_bool(e, state, scope)?)),
            Expr::And(args) => {
                for a in args {
                    if !self.eval_bool(a, state, scope)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Expr::Or(args) => {
                for a in args {
                    if self.eval_bool(a, state, scope)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Expr::Implies(a, b) => {
                if self.eval_bool(a, state, scope)? {
                    self.eval_bool(b, state, scope).map(Value::Bool)
                } else {
                    Ok(Value::Bool(true))
                }
            }
            Expr::Iff(a, b) => {
                let x = self.eval_bool(a, state, scope)?;
                let y = self.eval_bool(b, state, scope)?;
                Ok(Value::Bool(x == y))
            }
            Expr::Equals(a, b) => {
                let x = self.eval(a, state, scope)?;
                let y = self.eval(b, state, scope)?;
                Ok(Value::Bool(x.same_constant(&y)))
            }
            Expr::Le(a, b) | Expr::Lt(a, b) => {
                let x = self.eval(a, state, scope)?;
                let y = self.eval(b, state, scope)?;
                let ord = x
                    .compare_numeric(&y)
                    .ok_or_else(|| failure(expr, format!("cannot compare {x} and {y}")))?;
                let strict = matches!(expr, Expr::Lt(..));
                Ok(Value::Bool(if strict { ord.is_lt() } else { ord.is_le() }))
            }
            Expr::Plus(args) => self.fold(expr, args, ArithOp::Plus, Value::Int(0), state, scope),
            Expr::Times(args) => self.fold(expr, args, ArithOp::Times, Value::Int(1), state, scope),
            Expr::Minus(a, b) | Expr::Div(a, b) => {
                let op = if matches!(expr, Expr::Minus(..)) {
                    ArithOp::Minus
                } else {
                    ArithOp::Div
                };
                let x = self.eval(a, state, scope)?;
                let y = self.eval(b, state, scope)?;
                op.apply(&x, &y)
                    .ok_or_else(|| failure(expr, format!("invalid arithmetic on {x} and {y}")))
            }
            Expr::Exists(vars, body) => self.quantify(vars, body, state, scope, false),
            Expr::Forall(vars, body) => self.quantify(vars, body, state, scope, true),
        }
    }

    fn eval_bool(&self, expr: &Expr, state: &State, scope: &mut Scope) -> Result<bool, ExecutionError> {
        self.eval(expr, state, scope)?
            .as_bool()
            .ok_or_else(|| failure(expr, "expected a boolean"))
    }

    fn fold(
        &self,
        expr: &Expr,
        args: &[Expr],
        op: ArithOp,
        identity: Value,
        state: &State,
        scope: &mut Scope,
    ) -> Result<Value, ExecutionError> {
        let mut acc = identity;
        for a in args {
            let v = self.eval(a, state, scope)?;
            acc = op
                .apply(&acc, &v)
                .ok_or_else(|| failure(expr, format!("invalid arithmetic on {acc} and {v}")))?;
        }
        Ok(acc)
    }

    /// `forall` looks for a counterexample, `exists` for a witness.
    fn quantify(
        &self,
        vars: &[Variable],
        body: &Expr,
        state: &State,
        scope: &mut Scope,
        universal: bool,
    ) -> Result<Value, ExecutionError> {
        let Some((first, rest)) = vars.split_first() else {
            return self.eval_bool(body, state, scope).map(Value::Bool);
        };
        for value in self.domain(first, body)? {
            scope.push((first.clone(), value));
            let outcome = self.quantify(rest, body, state, scope, universal);
            scope.pop();
            let holds = outcome?.is_true();
            if holds != universal {
                return Ok(Value::Bool(!universal));
            }
        }
        Ok(Value::Bool(universal))
    }

    fn domain(&self, var: &Variable, body: &Expr) -> Result<Vec<Value>, ExecutionError> {
        self.problem.type_domain(var.value_type()).ok_or_else(|| {
            failure(
                body,
                format!("cannot quantify {var} over the type {}", var.value_type()),
            )
        })
    }
}
