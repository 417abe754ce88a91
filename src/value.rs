//! Constant values that fluents can hold.
//!
//! Values in plansim are booleans, integers, reals and objects. Reals wrap
//! `f64` in a totally ordered newtype so that every value is hashable and a
//! state can be keyed and compared by content.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::object::Object;

/// A totally ordered, hashable `f64`.
///
/// `-0.0` is normalized to `0.0` so that equal numbers hash equally.
#[derive(Debug, Clone, Copy)]
pub struct Real(f64);

impl Real {
    /// Wraps a float.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// Returns the wrapped float.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Real {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Possible values a fluent can hold.
///
/// # Examples
///
/// ```
/// use plansim::Value;
///
/// let flag = Value::Bool(true);
/// let count = Value::Int(3);
///
/// assert!(flag.is_bool());
/// assert_eq!(count.as_int(), Some(3));
/// assert_eq!(count.checked_add(&Value::Int(2)), Some(Value::Int(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Real value.
    Real(Real),
    /// A problem object.
    Object(Object),
}

impl Value {
    /// Returns true for booleans.
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Returns true for integers.
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Returns true for reals.
    pub const fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    /// Returns true for integers and reals.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Real(_))
    }

    /// Returns true for objects.
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as a float.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Real(v) => Some(v.get()),
            _ => None,
        }
    }

    /// The object, if this is one.
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns true if this is the boolean `true`.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Object(_) => "object",
        }
    }

    /// Numeric comparison; integers and reals compare by magnitude.
    #[must_use]
    pub fn compare_numeric(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b)
            }
        }
    }

    /// Equality that treats `Int(1)` and `Real(1.0)` as the same constant.
    #[must_use]
    pub fn same_constant(&self, other: &Self) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return self.compare_numeric(other) == Some(Ordering::Equal);
        }
        self == other
    }

    /// Sum, or `None` on overflow or a non-numeric operand.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.checked_add(*b).map(Self::Int),
            _ => Some(Self::Real(Real::new(self.as_f64()? + other.as_f64()?))),
        }
    }

    /// Difference, or `None` on overflow or a non-numeric operand.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.checked_sub(*b).map(Self::Int),
            _ => Some(Self::Real(Real::new(self.as_f64()? - other.as_f64()?))),
        }
    }

    /// Product, or `None` on overflow or a non-numeric operand.
    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.checked_mul(*b).map(Self::Int),
            _ => Some(Self::Real(Real::new(self.as_f64()? * other.as_f64()?))),
        }
    }

    /// Division. Exact integer quotients stay integers; a zero divisor yields `None`.
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (_, Self::Int(0)) => None,
            (Self::Int(a), Self::Int(b)) if a.checked_rem(*b) == Some(0) => {
                a.checked_div(*b).map(Self::Int)
            }
            _ => {
                let divisor = other.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(Self::Real(Real::new(self.as_f64()? / divisor)))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Object(o) => write!(f, "{}", o.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(Real::new(v))
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

impl From<&Object> for Value {
    fn from(v: &Object) -> Self {
        Self::Object(v.clone())
    }
}
