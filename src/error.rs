//! Error types for plansim.
//!
//! All errors in plansim are strongly typed using thiserror.
//! Construction-time problems surface as [`ModelError`] before a model can
//! ever reach the simulator; problems found while checking or applying an
//! event surface as [`ExecutionError`]. An event that is simply not
//! applicable is not an error at all.

use thiserror::Error;

use crate::conflict::{ConflictKind, ConflictTarget};
use crate::problem_kind::Feature;

/// Errors raised while declaring types, fluents, actions or problems.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid identifier '{name}': must match {pattern}")]
    InvalidName {
        name: String,
        pattern: &'static str,
    },

    #[error("Duplicate {kind} '{name}'")]
    DuplicateName {
        kind: &'static str,
        name: String,
    },

    #[error("'{name}' was created in a different environment")]
    ForeignEnvironment {
        name: String,
    },

    #[error("Action '{action}' has no parameter '{parameter}'")]
    UnknownParameter {
        action: String,
        parameter: String,
    },

    #[error("Unknown {kind} '{name}'")]
    UnknownName {
        kind: &'static str,
        name: String,
    },

    #[error("Expression {expr} is not a Boolean condition")]
    NonBooleanCondition {
        expr: String,
    },

    #[error("The expression {expr} has unbounded variables: {variables:?}")]
    UnboundVariables {
        expr: String,
        variables: Vec<String>,
    },

    #[error("Incompatible value type. Expected: {expected} // Got: {actual}")]
    IncompatibleType {
        expected: String,
        actual: String,
    },

    #[error("{kind} effects can be created only on numeric types, got {fluent}")]
    NonNumericEffect {
        kind: &'static str,
        fluent: String,
    },

    #[error("{context} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Simulated effects can be defined on fluent expressions with constant parameters, got {fluent}")]
    InvalidSimulatedFluent {
        fluent: String,
    },

    #[error("The {subject} is in conflict with the {target} already in the {owner}.")]
    ConflictingEffects {
        subject: String,
        target: ConflictTarget,
        owner: String,
    },

    #[error("Invalid bounds for {ty}: lower bound exceeds upper bound")]
    InvalidBounds {
        ty: String,
    },

    #[error("Cannot enumerate the values of parameter '{parameter}' of action '{action}'")]
    UngroundableParameter {
        action: String,
        parameter: String,
    },

    #[error("Parameter '{parameter}' of fluent '{fluent}' has no finite domain")]
    InfiniteFluentDomain {
        fluent: String,
        parameter: String,
    },

    #[error("Initial value not set for fluent {fluent}")]
    MissingInitialValue {
        fluent: String,
    },

    #[error("Invalid duration: {reason}")]
    InvalidDuration {
        reason: String,
    },

    #[error("Invalid simulator configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Errors raised while evaluating conditions or applying events.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("The state does not have a value for {fluent}")]
    UndefinedFluent {
        fluent: String,
    },

    #[error("The fluent {fluent} is modified {kind} in the same event.")]
    ConflictingEffects {
        fluent: String,
        kind: ConflictKind,
    },

    #[error("Cannot evaluate {expr}: {reason}")]
    Evaluation {
        expr: String,
        reason: String,
    },

    #[error("Effect function for {fluents} returned {actual} values, expected {expected}")]
    EffectValueCount {
        fluents: String,
        expected: usize,
        actual: usize,
    },

    #[error("Effect function assigned {value} to {fluent}, which is not compatible with {expected}")]
    EffectValueType {
        fluent: String,
        value: String,
        expected: String,
    },
}

/// Top-level error type for plansim.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Usage error: {reason}")]
    Usage {
        reason: String,
    },

    #[error("We cannot establish whether {engine} is able to handle this problem! Unsupported features: {features:?}")]
    UnsupportedProblem {
        engine: &'static str,
        features: Vec<Feature>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl SimError {
    /// Creates a usage error.
    #[must_use]
    pub fn usage(reason: impl Into<String>) -> Self {
        Self::Usage {
            reason: reason.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a usage error.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    /// Returns true if this is a construction-time model error.
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Returns true if two effects wrote incompatible values, at build or apply time.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Model(ModelError::ConflictingEffects { .. })
                | Self::Execution(ExecutionError::ConflictingEffects { .. })
        )
    }

    /// Returns true if the problem was rejected by a capability check.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedProblem { .. })
    }
}

/// Result type alias for plansim operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_invalid_name() {
        let err = ModelError::InvalidName {
            name: "1abc".to_string(),
            pattern: "^[a-z]+$",
        };
        let msg = format!("{err}");
        assert!(msg.contains("1abc"));
        assert!(msg.contains("Invalid identifier"));
    }

    #[test]
    fn test_execution_error_conflict_message() {
        let err = ExecutionError::ConflictingEffects {
            fluent: "fluent".to_string(),
            kind: ConflictKind::DifferentAssignments,
        };
        assert_eq!(
            format!("{err}"),
            "The fluent fluent is modified by 2 different assignments in the same event."
        );
    }

    #[test]
    fn test_model_conflict_message() {
        let err = ModelError::ConflictingEffects {
            subject: "effect f := 6".to_string(),
            target: ConflictTarget::Effects,
            owner: "action".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "The effect f := 6 is in conflict with the effects already in the action."
        );
    }

    #[test]
    fn test_sim_error_from_model() {
        let err: SimError = ModelError::UnknownName {
            kind: "fluent",
            name: "x".to_string(),
        }
        .into();
        assert!(err.is_model());
        assert!(!err.is_usage());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_sim_error_conflict_predicate() {
        let err: SimError = ExecutionError::ConflictingEffects {
            fluent: "f".to_string(),
            kind: ConflictKind::AssignmentAndIncrease,
        }
        .into();
        assert!(err.is_conflict());
        assert!(format!("{err}").contains("an assignment and an increase/decrease"));
    }

    #[test]
    fn test_sim_error_usage() {
        let err = SimError::usage("unknown action");
        assert!(err.is_usage());
        assert!(format!("{err}").contains("unknown action"));
    }

    #[test]
    fn test_sim_error_unsupported() {
        let err = SimError::UnsupportedProblem {
            engine: "sequential_simulator",
            features: vec![Feature::ContinuousTime],
        };
        assert!(err.is_unsupported());
        assert!(format!("{err}").contains("cannot establish whether"));
    }
}
