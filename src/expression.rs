//! Expression trees over constants, fluents, parameters and variables.
//!
//! Expressions are plain immutable values: building one never touches a
//! state. They are typed with [`Expr::type_of`], made ground by
//! [`Expr::substitute_parameters`], pre-evaluated where possible by
//! [`Expr::simplify`] and evaluated against a state by
//! [`StateEvaluator`](crate::StateEvaluator).

use std::collections::HashMap;
use std::fmt;

use crate::environment::Environment;
use crate::error::ModelError;
use crate::fluent::FluentExp;
use crate::object::{Object, Parameter, Variable};
use crate::types::Type;
use crate::value::Value;

/// An expression.
///
/// # Examples
///
/// ```
/// use plansim::Expr;
///
/// let e = Expr::le(Expr::from(1), Expr::plus(Expr::from(2), Expr::from(3)));
/// assert_eq!(e.simplify(), Expr::from(true));
/// assert_eq!(e.to_string(), "(1 <= (2 + 3))");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A constant value.
    Constant(Value),
    /// A fluent application.
    Fluent(FluentExp),
    /// An action parameter, replaced by a constant when grounding.
    Parameter(Parameter),
    /// A variable bound by an enclosing quantifier.
    Variable(Variable),
    /// Negation.
    Not(Box<Expr>),
    /// Conjunction; empty is true.
    And(Vec<Expr>),
    /// Disjunction; empty is false.
    Or(Vec<Expr>),
    /// Implication.
    Implies(Box<Expr>, Box<Expr>),
    /// Equivalence.
    Iff(Box<Expr>, Box<Expr>),
    /// Equality.
    Equals(Box<Expr>, Box<Expr>),
    /// Less than or equal.
    Le(Box<Expr>, Box<Expr>),
    /// Strictly less than.
    Lt(Box<Expr>, Box<Expr>),
    /// Sum.
    Plus(Vec<Expr>),
    /// Difference.
    Minus(Box<Expr>, Box<Expr>),
    /// Product.
    Times(Vec<Expr>),
    /// Quotient.
    Div(Box<Expr>, Box<Expr>),
    /// Existential quantification.
    Exists(Vec<Variable>, Box<Expr>),
    /// Universal quantification.
    Forall(Vec<Variable>, Box<Expr>),
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Plus,
    Minus,
    Times,
    Div,
}

impl ArithOp {
    pub(crate) fn apply(self, a: &Value, b: &Value) -> Option<Value> {
        match self {
            Self::Plus => a.checked_add(b),
            Self::Minus => a.checked_sub(b),
            Self::Times => a.checked_mul(b),
            Self::Div => a.checked_div(b),
        }
    }
}

/// Operators found in an expression, used to derive a problem's kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operators {
    pub negation: bool,
    pub disjunction: bool,
    pub equality: bool,
    pub existential: bool,
    pub universal: bool,
    /// A comparison or arithmetic operator over numeric terms.
    pub numeric: bool,
    /// A product or quotient of two non-constant terms.
    pub nonlinear: bool,
}

impl Operators {
    /// Merges another inventory into this one.
    pub fn merge(&mut self, other: Self) {
        self.negation |= other.negation;
        self.disjunction |= other.disjunction;
        self.equality |= other.equality;
        self.existential |= other.existential;
        self.universal |= other.universal;
        self.numeric |= other.numeric;
        self.nonlinear |= other.nonlinear;
    }
}

fn boxed(e: impl Into<Expr>) -> Box<Expr> {
    Box::new(e.into())
}

impl Expr {
    /// Logical negation.
    pub fn not(e: impl Into<Expr>) -> Self {
        Self::Not(boxed(e))
    }

    /// Conjunction of `args`.
    pub fn and(args: impl IntoIterator<Item = Expr>) -> Self {
        Self::And(args.into_iter().collect())
    }

    /// Disjunction of `args`.
    pub fn or(args: impl IntoIterator<Item = Expr>) -> Self {
        Self::Or(args.into_iter().collect())
    }

    /// `a` implies `b`.
    pub fn implies(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Implies(boxed(a), boxed(b))
    }

    /// `a` if and only if `b`.
    pub fn iff(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Iff(boxed(a), boxed(b))
    }

    /// `a == b`.
    pub fn equals(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Equals(boxed(a), boxed(b))
    }

    /// `a <= b`.
    pub fn le(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Le(boxed(a), boxed(b))
    }

    /// `a < b`.
    pub fn lt(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Lt(boxed(a), boxed(b))
    }

    /// `a >= b`, stored as `b <= a`.
    pub fn ge(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::le(b, a)
    }

    /// `a > b`, stored as `b < a`.
    pub fn gt(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::lt(b, a)
    }

    /// `a + b`.
    pub fn plus(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Plus(vec![a.into(), b.into()])
    }

    /// `a - b`.
    pub fn minus(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Minus(boxed(a), boxed(b))
    }

    /// `a * b`.
    pub fn times(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Times(vec![a.into(), b.into()])
    }

    /// `a / b`.
    pub fn div(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::Div(boxed(a), boxed(b))
    }

    /// True if `body` holds for some assignment of `vars`.
    pub fn exists(vars: Vec<Variable>, body: impl Into<Expr>) -> Self {
        Self::Exists(vars, boxed(body))
    }

    /// True if `body` holds for every assignment of `vars`.
    pub fn forall(vars: Vec<Variable>, body: impl Into<Expr>) -> Self {
        Self::Forall(vars, boxed(body))
    }

    /// The constant, if this is one.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Value> {
        match self {
            Self::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// The fluent application, if this is one.
    #[must_use]
    pub const fn as_fluent(&self) -> Option<&FluentExp> {
        match self {
            Self::Fluent(f) => Some(f),
            _ => None,
        }
    }

    /// Returns true for the constant `true`.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Constant(Value::Bool(true)))
    }

    /// Returns true for the constant `false`.
    #[must_use]
    pub const fn is_false(&self) -> bool {
        matches!(self, Self::Constant(Value::Bool(false)))
    }

    /// Direct sub-expressions, fluent arguments included.
    #[must_use]
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Self::Constant(_) | Self::Parameter(_) | Self::Variable(_) => Vec::new(),
            Self::Fluent(f) => f.args().iter().collect(),
            Self::Not(e) | Self::Exists(_, e) | Self::Forall(_, e) => vec![e.as_ref()],
            Self::And(args) | Self::Or(args) | Self::Plus(args) | Self::Times(args) => {
                args.iter().collect()
            }
            Self::Implies(a, b)
            | Self::Iff(a, b)
            | Self::Equals(a, b)
            | Self::Le(a, b)
            | Self::Lt(a, b)
            | Self::Minus(a, b)
            | Self::Div(a, b) => vec![a.as_ref(), b.as_ref()],
        }
    }

    /// Visits every node in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Infers the type of the expression.
    pub fn type_of(&self) -> Result<Type, ModelError> {
        match self {
            Self::Constant(v) => Ok(Type::of_value(v)),
            Self::Fluent(f) => Ok(f.value_type().clone()),
            Self::Parameter(p) => Ok(p.value_type().clone()),
            Self::Variable(v) => Ok(v.value_type().clone()),
            Self::Not(_)
            | Self::And(_)
            | Self::Or(_)
            | Self::Implies(..)
            | Self::Iff(..)
            | Self::Exists(..)
            | Self::Forall(..) => {
                for child in self.children() {
                    if !child.type_of()?.is_bool() {
                        return Err(ModelError::NonBooleanCondition {
                            expr: child.to_string(),
                        });
                    }
                }
                Ok(Type::Bool)
            }
            Self::Equals(a, b) => {
                let (ta, tb) = (a.type_of()?, b.type_of()?);
                let comparable = (ta.is_numeric() && tb.is_numeric())
                    || (ta.is_bool() && tb.is_bool())
                    || matches!((&ta, &tb), (Type::User(x), Type::User(y)) if x.is_subtype_of(y) || y.is_subtype_of(x));
                if comparable {
                    Ok(Type::Bool)
                } else {
                    Err(ModelError::IncompatibleType {
                        expected: ta.to_string(),
                        actual: tb.to_string(),
                    })
                }
            }
            Self::Le(a, b) | Self::Lt(a, b) => {
                numeric_operand(a)?;
                numeric_operand(b)?;
                Ok(Type::Bool)
            }
            Self::Plus(args) => {
                let mut acc = numeric_operand_range(args.first())?;
                for arg in args.iter().skip(1) {
                    let next = numeric_operand(arg)?;
                    let (lo, hi) = next.numeric_range();
                    acc = (acc.0 && next.is_int(), acc.1 + lo, acc.2 + hi);
                }
                Ok(numeric_type(acc.0, acc.1, acc.2))
            }
            Self::Minus(a, b) => {
                let ta = numeric_operand(a)?;
                let tb = numeric_operand(b)?;
                let (alo, ahi) = ta.numeric_range();
                let (blo, bhi) = tb.numeric_range();
                Ok(numeric_type(ta.is_int() && tb.is_int(), alo - bhi, ahi - blo))
            }
            Self::Times(args) => {
                let mut acc = numeric_operand_range(args.first())?;
                for arg in args.iter().skip(1) {
                    let next = numeric_operand(arg)?;
                    let (lo, hi) = next.numeric_range();
                    let corners = [acc.1 * lo, acc.1 * hi, acc.2 * lo, acc.2 * hi];
                    let min = corners.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    acc = (acc.0 && next.is_int(), min, max);
                }
                Ok(numeric_type(acc.0, acc.1, acc.2))
            }
            Self::Div(a, b) => {
                numeric_operand(a)?;
                numeric_operand(b)?;
                Ok(Type::real())
            }
        }
    }

    /// Variables not bound by an enclosing quantifier, in first-use order.
    #[must_use]
    pub fn free_variables(&self) -> Vec<Variable> {
        let mut free = Vec::new();
        let mut bound = Vec::new();
        self.collect_free(&mut bound, &mut free);
        free
    }

    fn collect_free<'a>(&'a self, bound: &mut Vec<&'a Variable>, free: &mut Vec<Variable>) {
        match self {
            Self::Variable(v) => {
                if !bound.contains(&v) && !free.contains(v) {
                    free.push(v.clone());
                }
            }
            Self::Exists(vars, body) | Self::Forall(vars, body) => {
                let depth = bound.len();
                bound.extend(vars.iter());
                body.collect_free(bound, free);
                bound.truncate(depth);
            }
            _ => {
                for child in self.children() {
                    child.collect_free(bound, free);
                }
            }
        }
    }

    /// Action parameters referenced by the expression, in first-use order.
    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut found: Vec<Parameter> = Vec::new();
        self.walk(&mut |e| {
            if let Self::Parameter(p) = e {
                if !found.contains(p) {
                    found.push(p.clone());
                }
            }
        });
        found
    }

    /// Replaces parameters by the constants bound to their names.
    #[must_use]
    pub fn substitute_parameters(&self, bindings: &HashMap<String, Value>) -> Self {
        self.map(&mut |e| match e {
            Self::Parameter(p) => bindings.get(p.name()).cloned().map(Self::Constant),
            _ => None,
        })
    }

    /// Rebuilds the tree, replacing nodes for which `f` returns a value.
    fn map(&self, f: &mut impl FnMut(&Expr) -> Option<Expr>) -> Self {
        if let Some(replacement) = f(self) {
            return replacement;
        }
        match self {
            Self::Constant(_) | Self::Parameter(_) | Self::Variable(_) => self.clone(),
            Self::Fluent(fe) => Self::Fluent(fe.map_args(|a| a.map(f))),
            Self::Not(e) => Self::Not(Box::new(e.map(f))),
            Self::And(args) => Self::And(map_all(args, f)),
            Self::Or(args) => Self::Or(map_all(args, f)),
            Self::Plus(args) => Self::Plus(map_all(args, f)),
            Self::Times(args) => Self::Times(map_all(args, f)),
            Self::Implies(a, b) => Self::Implies(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Iff(a, b) => Self::Iff(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Equals(a, b) => Self::Equals(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Le(a, b) => Self::Le(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Lt(a, b) => Self::Lt(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Minus(a, b) => Self::Minus(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Div(a, b) => Self::Div(Box::new(a.map(f)), Box::new(b.map(f))),
            Self::Exists(vars, body) => Self::Exists(vars.clone(), Box::new(body.map(f))),
            Self::Forall(vars, body) => Self::Forall(vars.clone(), Box::new(body.map(f))),
        }
    }

    /// Folds constant sub-expressions.
    ///
    /// Anything that cannot be decided without a state is kept as is, as is
    /// arithmetic that would overflow or divide by zero.
    #[must_use]
    pub fn simplify(&self) -> Self {
        match self {
            Self::Constant(_) | Self::Parameter(_) | Self::Variable(_) => self.clone(),
            Self::Fluent(fe) => Self::Fluent(fe.map_args(Self::simplify)),
            Self::Not(e) => match e.simplify() {
                Self::Constant(Value::Bool(b)) => Self::from(!b),
                Self::Not(inner) => *inner,
                other => Self::Not(Box::new(other)),
            },
            Self::And(args) => fold_junction(args, true),
            Self::Or(args) => fold_junction(args, false),
            Self::Implies(a, b) => match (a.simplify(), b.simplify()) {
                (Self::Constant(Value::Bool(false)), _) | (_, Self::Constant(Value::Bool(true))) => {
                    Self::from(true)
                }
                (Self::Constant(Value::Bool(true)), b) => b,
                (a, Self::Constant(Value::Bool(false))) => Self::not(a).simplify(),
                (a, b) => Self::Implies(Box::new(a), Box::new(b)),
            },
            Self::Iff(a, b) => match (a.simplify(), b.simplify()) {
                (Self::Constant(Value::Bool(x)), Self::Constant(Value::Bool(y))) => Self::from(x == y),
                (a, b) => Self::Iff(Box::new(a), Box::new(b)),
            },
            Self::Equals(a, b) => match (a.simplify(), b.simplify()) {
                (Self::Constant(x), Self::Constant(y)) => Self::from(x.same_constant(&y)),
                (a, b) => Self::Equals(Box::new(a), Box::new(b)),
            },
            Self::Le(a, b) => fold_comparison(a, b, false),
            Self::Lt(a, b) => fold_comparison(a, b, true),
            Self::Plus(args) => fold_arith(args, ArithOp::Plus, Self::Plus),
            Self::Times(args) => fold_arith(args, ArithOp::Times, Self::Times),
            Self::Minus(a, b) => fold_binary_arith(a, b, ArithOp::Minus, Self::Minus),
            Self::Div(a, b) => fold_binary_arith(a, b, ArithOp::Div, Self::Div),
            Self::Exists(vars, body) => match body.simplify() {
                Self::Constant(Value::Bool(false)) => Self::from(false),
                body => Self::Exists(vars.clone(), Box::new(body)),
            },
            Self::Forall(vars, body) => match body.simplify() {
                Self::Constant(Value::Bool(true)) => Self::from(true),
                body => Self::Forall(vars.clone(), Box::new(body)),
            },
        }
    }

    /// Collects the operators used by the expression.
    #[must_use]
    pub fn operators(&self) -> Operators {
        let mut ops = Operators::default();
        self.walk(&mut |e| match e {
            Self::Not(_) => ops.negation = true,
            Self::Or(_) | Self::Implies(..) | Self::Iff(..) => ops.disjunction = true,
            Self::Equals(a, b) => {
                ops.equality = true;
                if matches!(a.type_of(), Ok(t) if t.is_numeric())
                    || matches!(b.type_of(), Ok(t) if t.is_numeric())
                {
                    ops.numeric = true;
                }
            }
            Self::Exists(..) => ops.existential = true,
            Self::Forall(..) => ops.universal = true,
            Self::Le(..) | Self::Lt(..) | Self::Plus(_) | Self::Minus(..) => ops.numeric = true,
            Self::Times(_) | Self::Div(..) => {
                ops.numeric = true;
                let variable_terms = e
                    .children()
                    .into_iter()
                    .filter(|c| c.as_constant().is_none())
                    .count();
                if variable_terms > 1 || matches!(e, Self::Div(_, b) if b.as_constant().is_none()) {
                    ops.nonlinear = true;
                }
            }
            _ => {}
        });
        ops
    }

    /// Rejects objects or fluents that belong to another environment.
    pub fn check_environment(&self, env: &Environment) -> Result<(), ModelError> {
        let mut result = Ok(());
        self.walk(&mut |e| {
            if result.is_err() {
                return;
            }
            result = match e {
                Self::Constant(Value::Object(o)) => env.ensure_owns(o.env_id(), o.name()),
                Self::Fluent(f) => env.ensure_owns(f.fluent().env_id(), f.fluent().name()),
                _ => Ok(()),
            };
        });
        result
    }
}

fn map_all(args: &[Expr], f: &mut impl FnMut(&Expr) -> Option<Expr>) -> Vec<Expr> {
    args.iter().map(|a| a.map(f)).collect()
}

fn numeric_operand(e: &Expr) -> Result<Type, ModelError> {
    let ty = e.type_of()?;
    if ty.is_numeric() {
        Ok(ty)
    } else {
        Err(ModelError::IncompatibleType {
            expected: "numeric".to_string(),
            actual: ty.to_string(),
        })
    }
}

fn numeric_operand_range(first: Option<&Expr>) -> Result<(bool, f64, f64), ModelError> {
    match first {
        Some(e) => {
            let ty = numeric_operand(e)?;
            let (lo, hi) = ty.numeric_range();
            Ok((ty.is_int(), lo, hi))
        }
        None => Ok((true, 0.0, 0.0)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn numeric_type(is_int: bool, lo: f64, hi: f64) -> Type {
    let finite = |v: f64| v.is_finite().then_some(v);
    let (lo, hi) = (finite(lo), finite(hi));
    if is_int {
        Type::Int {
            lower: lo.map(|v| v as i64),
            upper: hi.map(|v| v as i64),
        }
    } else {
        Type::Real {
            lower: lo.map(Into::into),
            upper: hi.map(Into::into),
        }
    }
}

fn fold_junction(args: &[Expr], is_and: bool) -> Expr {
    let absorbing = !is_and;
    let mut kept = Vec::with_capacity(args.len());
    for arg in args {
        let arg = arg.simplify();
        let nested = match (&arg, is_and) {
            (Expr::And(inner), true) | (Expr::Or(inner), false) => Some(inner.clone()),
            _ => None,
        };
        match (arg, nested) {
            (_, Some(inner)) => kept.extend(inner),
            (Expr::Constant(Value::Bool(b)), None) if b == absorbing => return Expr::from(absorbing),
            (Expr::Constant(Value::Bool(_)), None) => {}
            (other, None) => {
                if !kept.contains(&other) {
                    kept.push(other);
                }
            }
        }
    }
    match kept.len() {
        0 => Expr::from(is_and),
        1 => kept.pop().unwrap_or(Expr::from(is_and)),
        _ if is_and => Expr::And(kept),
        _ => Expr::Or(kept),
    }
}

fn fold_comparison(a: &Expr, b: &Expr, strict: bool) -> Expr {
    let (a, b) = (a.simplify(), b.simplify());
    if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
        if let Some(ord) = x.compare_numeric(y) {
            return Expr::from(if strict { ord.is_lt() } else { ord.is_le() });
        }
    }
    if strict {
        Expr::Lt(Box::new(a), Box::new(b))
    } else {
        Expr::Le(Box::new(a), Box::new(b))
    }
}

fn fold_arith(args: &[Expr], op: ArithOp, rebuild: fn(Vec<Expr>) -> Expr) -> Expr {
    let args: Vec<Expr> = args.iter().map(Expr::simplify).collect();
    let constants: Option<Vec<&Value>> = args.iter().map(Expr::as_constant).collect();
    if let Some(values) = constants {
        let mut iter = values.into_iter();
        if let Some(first) = iter.next() {
            let folded = iter.try_fold(first.clone(), |acc, v| op.apply(&acc, v));
            if let Some(v) = folded {
                return Expr::Constant(v);
            }
        }
    }
    rebuild(args)
}

fn fold_binary_arith(
    a: &Expr,
    b: &Expr,
    op: ArithOp,
    rebuild: fn(Box<Expr>, Box<Expr>) -> Expr,
) -> Expr {
    let (a, b) = (a.simplify(), b.simplify());
    if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
        if let Some(v) = op.apply(x, y) {
            return Expr::Constant(v);
        }
    }
    rebuild(Box::new(a), Box::new(b))
}

fn fmt_joined(f: &mut fmt::Formatter<'_>, args: &[Expr], sep: &str, empty: &str) -> fmt::Result {
    if args.is_empty() {
        return write!(f, "{empty}");
    }
    write!(f, "(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{a}")?;
    }
    write!(f, ")")
}

fn fmt_quantifier(f: &mut fmt::Formatter<'_>, name: &str, vars: &[Variable], body: &Expr) -> fmt::Result {
    write!(f, "({name} ")?;
    for (i, v) in vars.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} {}", v.value_type(), v.name())?;
    }
    write!(f, " . {body})")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "{v}"),
            Self::Fluent(fe) => write!(f, "{fe}"),
            Self::Parameter(p) => write!(f, "{p}"),
            Self::Variable(v) => write!(f, "{v}"),
            Self::Not(e) => write!(f, "(not {e})"),
            Self::And(args) => fmt_joined(f, args, "and", "true"),
            Self::Or(args) => fmt_joined(f, args, "or", "false"),
            Self::Plus(args) => fmt_joined(f, args, "+", "0"),
            Self::Times(args) => fmt_joined(f, args, "*", "1"),
            Self::Implies(a, b) => write!(f, "({a} implies {b})"),
            Self::Iff(a, b) => write!(f, "({a} iff {b})"),
            Self::Equals(a, b) => write!(f, "({a} == {b})"),
            Self::Le(a, b) => write!(f, "({a} <= {b})"),
            Self::Lt(a, b) => write!(f, "({a} < {b})"),
            Self::Minus(a, b) => write!(f, "({a} - {b})"),
            Self::Div(a, b) => write!(f, "({a} / {b})"),
            Self::Exists(vars, body) => fmt_quantifier(f, "exists", vars, body),
            Self::Forall(vars, body) => fmt_quantifier(f, "forall", vars, body),
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Self::Constant(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Self::Constant(Value::Bool(v))
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Self::Constant(Value::from(v))
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Self::Constant(Value::Int(v))
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Self::Constant(Value::from(v))
    }
}

impl From<Object> for Expr {
    fn from(o: Object) -> Self {
        Self::Constant(Value::Object(o))
    }
}

impl From<&Object> for Expr {
    fn from(o: &Object) -> Self {
        Self::Constant(Value::Object(o.clone()))
    }
}

impl From<Parameter> for Expr {
    fn from(p: Parameter) -> Self {
        Self::Parameter(p)
    }
}

impl From<&Parameter> for Expr {
    fn from(p: &Parameter) -> Self {
        Self::Parameter(p.clone())
    }
}

impl From<Variable> for Expr {
    fn from(v: Variable) -> Self {
        Self::Variable(v)
    }
}

impl From<&Variable> for Expr {
    fn from(v: &Variable) -> Self {
        Self::Variable(v.clone())
    }
}

impl From<FluentExp> for Expr {
    fn from(f: FluentExp) -> Self {
        Self::Fluent(f)
    }
}

impl From<&FluentExp> for Expr {
    fn from(f: &FluentExp) -> Self {
        Self::Fluent(f.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluent::Fluent;
    use crate::types::UserType;

    fn counter(env: &Environment) -> FluentExp {
        let ty = Type::bounded_int(Some(0), Some(10)).unwrap();
        Fluent::new(env, "counter", ty, Vec::new())
            .unwrap()
            .call(Vec::new())
            .unwrap()
    }

    #[test]
    fn test_boolean_type_checking() {
        let env = Environment::new();
        let c = counter(&env);
        assert_eq!(Expr::not(true).type_of().unwrap(), Type::Bool);
        assert!(matches!(
            Expr::and([Expr::from(true), Expr::from(c.clone())]).type_of(),
            Err(ModelError::NonBooleanCondition { .. })
        ));
        assert_eq!(Expr::le(0, c).type_of().unwrap(), Type::Bool);
        assert!(Expr::lt(true, 1).type_of().is_err());
    }

    #[test]
    fn test_interval_arithmetic_types() {
        let env = Environment::new();
        let c = counter(&env);
        assert_eq!(
            Expr::plus(c.clone(), 1).type_of().unwrap(),
            Type::bounded_int(Some(1), Some(11)).unwrap()
        );
        assert_eq!(
            Expr::minus(c.clone(), 1).type_of().unwrap(),
            Type::bounded_int(Some(-1), Some(9)).unwrap()
        );
        assert!(Expr::div(c, 2).type_of().unwrap().is_real());
    }

    #[test]
    fn test_free_variables_respect_binding() {
        let env = Environment::new();
        let location = UserType::new(&env, "location", None).unwrap();
        let x = Variable::new(&env, "x", Type::User(location.clone())).unwrap();
        let y = Variable::new(&env, "y", Type::User(location)).unwrap();
        let body = Expr::equals(&x, &y);
        assert_eq!(body.free_variables(), vec![x.clone(), y.clone()]);
        let quantified = Expr::exists(vec![x], body);
        assert_eq!(quantified.free_variables(), vec![y]);
    }

    #[test]
    fn test_substitute_and_simplify() {
        let env = Environment::new();
        let n = Parameter::new(&env, "n", Type::int()).unwrap();
        let e = Expr::and([Expr::lt(&n, 5), Expr::from(true)]);
        let mut bindings = HashMap::new();
        bindings.insert("n".to_string(), Value::Int(3));
        assert_eq!(e.substitute_parameters(&bindings).simplify(), Expr::from(true));
        bindings.insert("n".to_string(), Value::Int(7));
        assert_eq!(e.substitute_parameters(&bindings).simplify(), Expr::from(false));
        assert_eq!(e.parameters(), vec![n]);
    }

    #[test]
    fn test_simplify_keeps_undecidable_parts() {
        let env = Environment::new();
        let c = counter(&env);
        let e = Expr::or([Expr::from(false), Expr::le(1, c.clone())]);
        assert_eq!(e.simplify(), Expr::le(1, c));
        assert_eq!(Expr::div(1, 0).simplify(), Expr::div(1, 0));
        assert_eq!(Expr::not(Expr::not(false)).simplify(), Expr::from(false));
    }

    #[test]
    fn test_operator_inventory() {
        let env = Environment::new();
        let c = counter(&env);
        let ops = Expr::or([Expr::not(Expr::le(c.clone(), 3)), Expr::equals(c.clone(), 1)]).operators();
        assert!(ops.negation && ops.disjunction && ops.equality && ops.numeric);
        assert!(!ops.nonlinear);
        assert!(Expr::times(c.clone(), c).operators().nonlinear);
    }

    #[test]
    fn test_foreign_objects_detected() {
        let env = Environment::new();
        let other = Environment::new();
        let t = UserType::new(&other, "t", None).unwrap();
        let o = Object::new(&other, "o", &t).unwrap();
        assert!(Expr::equals(&o, &o).check_environment(&env).is_err());
        assert!(Expr::equals(&o, &o).check_environment(&other).is_ok());
    }
}
