//! Value types of fluents, parameters and expressions.

use std::fmt;
use std::sync::Arc;

use crate::environment::{Environment, EnvironmentId};
use crate::error::ModelError;
use crate::value::{Real, Value};

#[derive(Debug, PartialEq, Eq, Hash)]
struct UserTypeInner {
    name: String,
    father: Option<UserType>,
    env: EnvironmentId,
}

/// A named object type, optionally refining a parent type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserType(Arc<UserTypeInner>);

impl UserType {
    /// Declares a user type.
    pub fn new(
        env: &Environment,
        name: impl Into<String>,
        father: Option<&UserType>,
    ) -> Result<Self, ModelError> {
        let name = env.validate_name(name)?;
        if let Some(father) = father {
            env.ensure_owns(father.env_id(), father.name())?;
        }
        Ok(Self(Arc::new(UserTypeInner {
            name,
            father: father.cloned(),
            env: env.id(),
        })))
    }

    /// Type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Parent type, if any.
    #[must_use]
    pub fn father(&self) -> Option<&UserType> {
        self.0.father.as_ref()
    }

    /// Environment the type was declared in.
    #[must_use]
    pub fn env_id(&self) -> EnvironmentId {
        self.0.env
    }

    /// Returns true if `self` is `other` or one of its descendants.
    #[must_use]
    pub fn is_subtype_of(&self, other: &UserType) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if t == other {
                return true;
            }
            current = t.father();
        }
        false
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// The type of a fluent, parameter or expression.
///
/// Numeric types carry optional inclusive bounds. A bounded fluent can
/// only be written with values inside its range; effects that would leave
/// the range make their event inapplicable.
///
/// # Examples
///
/// ```
/// use plansim::{Type, Value};
///
/// let counter = Type::bounded_int(Some(0), None).unwrap();
/// assert!(counter.accepts(&Value::Int(3)));
/// assert!(!counter.accepts(&Value::Int(-1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Booleans.
    Bool,
    /// Integers in `[lower, upper]`.
    Int {
        /// Inclusive lower bound.
        lower: Option<i64>,
        /// Inclusive upper bound.
        upper: Option<i64>,
    },
    /// Reals in `[lower, upper]`.
    Real {
        /// Inclusive lower bound.
        lower: Option<Real>,
        /// Inclusive upper bound.
        upper: Option<Real>,
    },
    /// Objects of a user type.
    User(UserType),
}

impl Type {
    /// Unbounded integer type.
    #[must_use]
    pub const fn int() -> Self {
        Self::Int {
            lower: None,
            upper: None,
        }
    }

    /// Unbounded real type.
    #[must_use]
    pub const fn real() -> Self {
        Self::Real {
            lower: None,
            upper: None,
        }
    }

    /// Integer type with optional bounds.
    pub fn bounded_int(lower: Option<i64>, upper: Option<i64>) -> Result<Self, ModelError> {
        let ty = Self::Int { lower, upper };
        match (lower, upper) {
            (Some(l), Some(u)) if l > u => Err(ModelError::InvalidBounds { ty: ty.to_string() }),
            _ => Ok(ty),
        }
    }

    /// Real type with optional bounds.
    pub fn bounded_real(lower: Option<f64>, upper: Option<f64>) -> Result<Self, ModelError> {
        let ty = Self::Real {
            lower: lower.map(Real::new),
            upper: upper.map(Real::new),
        };
        match (lower, upper) {
            (Some(l), Some(u)) if l > u || l.is_nan() || u.is_nan() => {
                Err(ModelError::InvalidBounds { ty: ty.to_string() })
            }
            _ => Ok(ty),
        }
    }

    /// Returns true for `bool`.
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns true for integer types.
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int { .. })
    }

    /// Returns true for real types.
    pub const fn is_real(&self) -> bool {
        matches!(self, Self::Real { .. })
    }

    /// Returns true for integer or real types.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int { .. } | Self::Real { .. })
    }

    /// The user type, if this is one.
    pub const fn as_user(&self) -> Option<&UserType> {
        match self {
            Self::User(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the numeric bounds as values; `(None, None)` for unbounded or non-numeric types.
    #[must_use]
    pub fn bounds(&self) -> (Option<Value>, Option<Value>) {
        match self {
            Self::Int { lower, upper } => (lower.map(Value::Int), upper.map(Value::Int)),
            Self::Real { lower, upper } => (lower.map(Value::Real), upper.map(Value::Real)),
            _ => (None, None),
        }
    }

    /// Returns true for numeric types with at least one declared bound.
    #[must_use]
    pub fn has_bounds(&self) -> bool {
        let (lower, upper) = self.bounds();
        lower.is_some() || upper.is_some()
    }

    /// The most precise type of a constant.
    #[must_use]
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Bool,
            Value::Int(v) => Self::Int {
                lower: Some(*v),
                upper: Some(*v),
            },
            Value::Real(v) => Self::Real {
                lower: Some(*v),
                upper: Some(*v),
            },
            Value::Object(o) => Self::User(o.user_type().clone()),
        }
    }

    /// Returns true if an expression of type `other` may be stored where `self` is expected.
    ///
    /// User types follow the subtype relation and integers may flow into
    /// reals. Numeric ranges only have to overlap: whether a concrete value
    /// lands inside the bounds is decided when an event is applied.
    #[must_use]
    pub fn is_compatible(&self, other: &Type) -> bool {
        match (self, other) {
            (Self::Bool, Self::Bool) => true,
            (Self::User(expected), Self::User(actual)) => actual.is_subtype_of(expected),
            (Self::Int { .. }, Self::Int { .. })
            | (Self::Real { .. }, Self::Int { .. } | Self::Real { .. }) => {
                ranges_overlap(self.numeric_range(), other.numeric_range())
            }
            _ => false,
        }
    }

    /// Returns true if `value` is a legal value of this type, bounds included.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_)) => true,
            (Self::User(expected), Value::Object(o)) => o.user_type().is_subtype_of(expected),
            (Self::Int { .. }, Value::Int(_)) | (Self::Real { .. }, Value::Int(_) | Value::Real(_)) => {
                self.within_bounds(value)
            }
            _ => false,
        }
    }

    /// Returns false only if `value` is numeric and outside a declared bound.
    #[must_use]
    pub fn within_bounds(&self, value: &Value) -> bool {
        let (lower, upper) = self.bounds();
        let above = lower.map_or(true, |l| {
            l.compare_numeric(value).is_some_and(std::cmp::Ordering::is_le)
        });
        let below = upper.map_or(true, |u| {
            value.compare_numeric(&u).is_some_and(std::cmp::Ordering::is_le)
        });
        above && below
    }

    /// Converts integers stored in real-typed slots so equal states compare equal.
    #[must_use]
    pub fn coerce(&self, value: Value) -> Value {
        match (self, &value) {
            (Self::Real { .. }, Value::Int(_)) => value.as_f64().map_or(value, Value::from),
            _ => value,
        }
    }

    /// The numeric range as floats; infinite where unbounded.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn numeric_range(&self) -> (f64, f64) {
        match self {
            Self::Int { lower, upper } => (
                lower.map_or(f64::NEG_INFINITY, |v| v as f64),
                upper.map_or(f64::INFINITY, |v| v as f64),
            ),
            Self::Real { lower, upper } => (
                lower.map_or(f64::NEG_INFINITY, Real::get),
                upper.map_or(f64::INFINITY, Real::get),
            ),
            _ => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

fn ranges_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

fn fmt_bounds<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    lower: Option<T>,
    upper: Option<T>,
) -> fmt::Result {
    if lower.is_none() && upper.is_none() {
        return write!(f, "{name}");
    }
    let lower = lower.map_or_else(|| "-inf".to_string(), |v| v.to_string());
    let upper = upper.map_or_else(|| "inf".to_string(), |v| v.to_string());
    write!(f, "{name}[{lower}, {upper}]")
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int { lower, upper } => fmt_bounds(f, "integer", *lower, *upper),
            Self::Real { lower, upper } => fmt_bounds(f, "real", *lower, *upper),
            Self::User(t) => write!(f, "{t}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_hierarchy() {
        let env = Environment::new();
        let vehicle = UserType::new(&env, "vehicle", None).unwrap();
        let car = UserType::new(&env, "car", Some(&vehicle)).unwrap();
        assert!(car.is_subtype_of(&vehicle));
        assert!(!vehicle.is_subtype_of(&car));
        assert!(Type::User(vehicle.clone()).is_compatible(&Type::User(car.clone())));
        assert!(!Type::User(car).is_compatible(&Type::User(vehicle)));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(Type::bounded_int(Some(5), Some(1)).is_err());
        assert!(Type::bounded_real(Some(1.0), Some(0.5)).is_err());
        assert!(Type::bounded_int(Some(0), None).is_ok());
    }

    #[test]
    fn test_numeric_compatibility() {
        let counter = Type::bounded_int(Some(0), Some(10)).unwrap();
        assert!(counter.is_compatible(&Type::of_value(&Value::Int(3))));
        assert!(!counter.is_compatible(&Type::of_value(&Value::Int(11))));
        assert!(counter.is_compatible(&Type::int()));
        assert!(!counter.is_compatible(&Type::real()));
        assert!(Type::real().is_compatible(&Type::int()));
        assert!(!Type::Bool.is_compatible(&Type::int()));
    }

    #[test]
    fn test_accepts_checks_bounds() {
        let counter = Type::bounded_int(Some(0), None).unwrap();
        assert!(counter.accepts(&Value::Int(0)));
        assert!(!counter.accepts(&Value::Int(-1)));
        assert!(!counter.accepts(&Value::Bool(false)));
        assert!(Type::real().accepts(&Value::Int(1)));
        assert!(counter.has_bounds());
        assert!(!Type::int().has_bounds());
    }

    #[test]
    fn test_coerce_int_into_real() {
        assert_eq!(Type::real().coerce(Value::Int(2)), Value::from(2.0));
        assert_eq!(Type::int().coerce(Value::Int(2)), Value::Int(2));
    }

    #[test]
    fn test_type_display() {
        assert_eq!(Type::Bool.to_string(), "bool");
        assert_eq!(Type::int().to_string(), "integer");
        assert_eq!(
            Type::bounded_int(Some(0), None).unwrap().to_string(),
            "integer[0, inf]"
        );
    }
}
