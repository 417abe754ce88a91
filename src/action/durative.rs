//! Durative actions: timed conditions and effects over a duration.
//!
//! The sequential simulator never executes these directly. They exist so a
//! problem can be modelled in full and classified by its kind.

use std::collections::HashMap;
use std::fmt;

use crate::conflict::EffectLedger;
use crate::effect::{Bindings, Effect, EffectKind};
use crate::environment::Environment;
use crate::error::ModelError;
use crate::expression::Expr;
use crate::fluent::FluentExp;
use crate::object::Parameter;
use crate::value::Value;

use super::{ActionDraft, ActionHeader};

/// When a condition of a durative action is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionTiming {
    /// When the action starts.
    AtStart,
    /// When the action ends.
    AtEnd,
    /// Throughout the execution interval.
    OverAll,
}

impl fmt::Display for ConditionTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtStart => write!(f, "start"),
            Self::AtEnd => write!(f, "end"),
            Self::OverAll => write!(f, "[start, end]"),
        }
    }
}

/// When an effect of a durative action happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTiming {
    /// When the action starts.
    AtStart,
    /// When the action ends.
    AtEnd,
}

impl fmt::Display for EffectTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtStart => write!(f, "start"),
            Self::AtEnd => write!(f, "end"),
        }
    }
}

/// Bounds on the duration of an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DurationInterval {
    lower: Expr,
    upper: Expr,
    lower_open: bool,
    upper_open: bool,
}

impl DurationInterval {
    /// `[value, value]`.
    pub fn fixed(value: impl Into<Expr>) -> Result<Self, ModelError> {
        let value = value.into();
        Self::new(value.clone(), value, false, false)
    }

    /// `[lower, upper]`.
    pub fn closed(lower: impl Into<Expr>, upper: impl Into<Expr>) -> Result<Self, ModelError> {
        Self::new(lower.into(), upper.into(), false, false)
    }

    /// `(lower, upper)`.
    pub fn open(lower: impl Into<Expr>, upper: impl Into<Expr>) -> Result<Self, ModelError> {
        Self::new(lower.into(), upper.into(), true, true)
    }

    /// Builds an interval after checking that both bounds are numeric and ordered.
    pub fn new(lower: Expr, upper: Expr, lower_open: bool, upper_open: bool) -> Result<Self, ModelError> {
        for bound in [&lower, &upper] {
            if !bound.type_of()?.is_numeric() {
                return Err(ModelError::InvalidDuration {
                    reason: format!("bound {bound} is not numeric"),
                });
            }
        }
        if let (Some(l), Some(u)) = (lower.as_constant(), upper.as_constant()) {
            let ordered = match l.compare_numeric(u) {
                Some(ord) if lower_open || upper_open => ord.is_lt(),
                Some(ord) => ord.is_le(),
                None => false,
            };
            if !ordered {
                return Err(ModelError::InvalidDuration {
                    reason: format!("lower bound {l} exceeds upper bound {u}"),
                });
            }
        }
        Ok(Self {
            lower,
            upper,
            lower_open,
            upper_open,
        })
    }

    /// Lower bound expression.
    #[must_use]
    pub const fn lower(&self) -> &Expr {
        &self.lower
    }

    /// Upper bound expression.
    #[must_use]
    pub const fn upper(&self) -> &Expr {
        &self.upper
    }

    /// Returns true if the lower bound is excluded.
    #[must_use]
    pub const fn is_lower_open(&self) -> bool {
        self.lower_open
    }

    /// Returns true if the upper bound is excluded.
    #[must_use]
    pub const fn is_upper_open(&self) -> bool {
        self.upper_open
    }

    fn ground(&self, bindings: &Bindings) -> Self {
        Self {
            lower: self.lower.substitute_parameters(bindings).simplify(),
            upper: self.upper.substitute_parameters(bindings).simplify(),
            lower_open: self.lower_open,
            upper_open: self.upper_open,
        }
    }
}

impl Default for DurationInterval {
    fn default() -> Self {
        Self {
            lower: Expr::from(0),
            upper: Expr::from(0),
            lower_open: false,
            upper_open: false,
        }
    }
}

impl fmt::Display for DurationInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_open { "(" } else { "[" };
        let close = if self.upper_open { ")" } else { "]" };
        write!(f, "{open}{}, {}{close}", self.lower, self.upper)
    }
}

/// An action with a duration and timed conditions and effects.
#[derive(Debug, Clone, PartialEq)]
pub struct DurativeAction {
    header: ActionHeader,
    duration: DurationInterval,
    conditions: Vec<(ConditionTiming, Expr)>,
    effects: Vec<(EffectTiming, Effect)>,
}

impl DurativeAction {
    /// Name, parameters and environment.
    #[must_use]
    pub const fn header(&self) -> &ActionHeader {
        &self.header
    }

    /// Allowed duration.
    #[must_use]
    pub const fn duration(&self) -> &DurationInterval {
        &self.duration
    }

    /// Conditions with the moment they are checked.
    #[must_use]
    pub fn conditions(&self) -> &[(ConditionTiming, Expr)] {
        &self.conditions
    }

    /// Effects with the moment they happen.
    #[must_use]
    pub fn effects(&self) -> &[(EffectTiming, Effect)] {
        &self.effects
    }

    pub(crate) fn ground(&self, values: &[Value], bindings: &Bindings) -> Option<Self> {
        let mut conditions = Vec::with_capacity(self.conditions.len());
        for (timing, c) in &self.conditions {
            let c = c.substitute_parameters(bindings).simplify();
            if c.is_false() {
                return None;
            }
            if !c.is_true() {
                conditions.push((*timing, c));
            }
        }
        let effects = self
            .effects
            .iter()
            .map(|(timing, e)| (*timing, e.ground(bindings)))
            .filter(|(_, e)| !e.condition().is_false())
            .collect();
        Some(Self {
            header: self.header.ground(values),
            duration: self.duration.ground(bindings),
            conditions,
            effects,
        })
    }
}

/// Builds a [`DurativeAction`].
#[derive(Debug, Clone)]
pub struct DurativeActionBuilder {
    draft: ActionDraft,
    duration: DurationInterval,
    conditions: Vec<(ConditionTiming, Expr)>,
    effects: Vec<(EffectTiming, Effect)>,
    ledgers: HashMap<EffectTiming, EffectLedger>,
}

impl DurativeActionBuilder {
    /// Starts an action named `name` over `parameters`, lasting zero time units.
    pub fn new(env: &Environment, name: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        Ok(Self {
            draft: ActionDraft::new(env, name, parameters)?,
            duration: DurationInterval::default(),
            conditions: Vec::new(),
            effects: Vec::new(),
            ledgers: HashMap::new(),
        })
    }

    /// Looks a parameter up by name.
    pub fn parameter(&self, name: &str) -> Result<&Parameter, ModelError> {
        self.draft.header().parameter(name)
    }

    /// Sets the duration to `[value, value]`.
    pub fn set_fixed_duration(&mut self, value: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        self.set_duration(DurationInterval::fixed(value)?)
    }

    /// Replaces the duration interval.
    pub fn set_duration(&mut self, duration: DurationInterval) -> Result<&mut Self, ModelError> {
        self.draft.check_expr(duration.lower())?;
        self.draft.check_expr(duration.upper())?;
        self.duration = duration;
        Ok(self)
    }

    /// Adds a condition checked at `timing`.
    pub fn add_condition(&mut self, timing: ConditionTiming, condition: impl Into<Expr>) -> Result<&mut Self, ModelError> {
        let condition = condition.into();
        self.draft.check_condition(&condition)?;
        let entry = (timing, condition);
        if !entry.1.is_true() && !self.conditions.contains(&entry) {
            self.conditions.push(entry);
        }
        Ok(self)
    }

    /// Adds `fluent := value` at `timing`.
    pub fn add_effect(
        &mut self,
        timing: EffectTiming,
        fluent: FluentExp,
        value: impl Into<Expr>,
    ) -> Result<&mut Self, ModelError> {
        self.push_effect(timing, fluent, value.into(), Expr::from(true), EffectKind::Assign)
    }

    /// Adds `fluent += value` at `timing`.
    pub fn add_increase_effect(
        &mut self,
        timing: EffectTiming,
        fluent: FluentExp,
        value: impl Into<Expr>,
    ) -> Result<&mut Self, ModelError> {
        self.push_effect(timing, fluent, value.into(), Expr::from(true), EffectKind::Increase)
    }

    /// Adds `fluent -= value` at `timing`.
    pub fn add_decrease_effect(
        &mut self,
        timing: EffectTiming,
        fluent: FluentExp,
        value: impl Into<Expr>,
    ) -> Result<&mut Self, ModelError> {
        self.push_effect(timing, fluent, value.into(), Expr::from(true), EffectKind::Decrease)
    }

    /// Adds an effect at `timing` guarded by `condition`.
    pub fn add_conditional_effect(
        &mut self,
        timing: EffectTiming,
        condition: impl Into<Expr>,
        fluent: FluentExp,
        value: impl Into<Expr>,
        kind: EffectKind,
    ) -> Result<&mut Self, ModelError> {
        self.push_effect(timing, fluent, value.into(), condition.into(), kind)
    }

    fn push_effect(
        &mut self,
        timing: EffectTiming,
        fluent: FluentExp,
        value: Expr,
        condition: Expr,
        kind: EffectKind,
    ) -> Result<&mut Self, ModelError> {
        let effect = self.draft.make_effect(fluent, value, condition, kind)?;
        self.ledgers.entry(timing).or_default().check_effect(
            &effect,
            &format!("effect {effect} at timing {timing}"),
            "action",
        )?;
        self.effects.push((timing, effect));
        Ok(self)
    }

    /// Finalizes the action.
    #[must_use]
    pub fn build(self) -> DurativeAction {
        DurativeAction {
            header: self.draft.header().clone(),
            duration: self.duration,
            conditions: self.conditions,
            effects: self.effects,
        }
    }
}
