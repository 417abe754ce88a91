//! Fluents and their applications.
//!
//! A [`Fluent`] is a typed state variable declared over a signature of
//! parameters. Applying it to argument expressions gives a [`FluentExp`];
//! once every argument is a constant the application becomes a
//! [`GroundFluent`], the key under which a [`State`](crate::State) stores a
//! value.

use std::fmt;
use std::sync::Arc;

use crate::environment::{Environment, EnvironmentId};
use crate::error::ModelError;
use crate::expression::Expr;
use crate::object::Parameter;
use crate::types::Type;
use crate::value::Value;

#[derive(Debug, PartialEq, Eq, Hash)]
struct FluentInner {
    name: String,
    ty: Type,
    signature: Vec<Parameter>,
    env: EnvironmentId,
}

/// A typed state variable.
///
/// # Examples
///
/// ```
/// use plansim::{Environment, Fluent, Parameter, Type, UserType};
///
/// let env = Environment::new();
/// let location = UserType::new(&env, "location", None).unwrap();
/// let l = Parameter::new(&env, "l", Type::User(location)).unwrap();
/// let robot_at = Fluent::new(&env, "robot_at", Type::Bool, vec![l]).unwrap();
/// assert_eq!(robot_at.arity(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fluent(Arc<FluentInner>);

impl Fluent {
    /// Declares a fluent.
    ///
    /// Every signature parameter needs a finite domain: booleans, user
    /// types or integers bounded on both sides.
    pub fn new(
        env: &Environment,
        name: impl Into<String>,
        ty: Type,
        signature: Vec<Parameter>,
    ) -> Result<Self, ModelError> {
        let name = env.validate_name(name)?;
        for (i, p) in signature.iter().enumerate() {
            if matches!(
                p.value_type(),
                Type::Real { .. } | Type::Int { lower: None, .. } | Type::Int { upper: None, .. }
            ) {
                return Err(ModelError::InfiniteFluentDomain {
                    fluent: name,
                    parameter: p.name().to_string(),
                });
            }
            if signature[..i].iter().any(|q| q.name() == p.name()) {
                return Err(ModelError::DuplicateName {
                    kind: "fluent parameter",
                    name: p.name().to_string(),
                });
            }
        }
        Ok(Self(Arc::new(FluentInner {
            name,
            ty,
            signature,
            env: env.id(),
        })))
    }

    /// Fluent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type of the stored values.
    #[must_use]
    pub fn value_type(&self) -> &Type {
        &self.0.ty
    }

    /// Declared parameters.
    #[must_use]
    pub fn signature(&self) -> &[Parameter] {
        &self.0.signature
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.signature.len()
    }

    /// Environment the fluent was declared in.
    #[must_use]
    pub fn env_id(&self) -> EnvironmentId {
        self.0.env
    }

    /// Applies the fluent to argument expressions.
    pub fn call(&self, args: Vec<Expr>) -> Result<FluentExp, ModelError> {
        self.check_arity(args.len())?;
        for (param, arg) in self.signature().iter().zip(&args) {
            let actual = arg.type_of()?;
            if !param.value_type().is_compatible(&actual) {
                return Err(ModelError::IncompatibleType {
                    expected: param.value_type().to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(FluentExp {
            fluent: self.clone(),
            args,
        })
    }

    /// Applies the fluent to constant arguments.
    pub fn ground(&self, args: Vec<Value>) -> Result<GroundFluent, ModelError> {
        self.check_arity(args.len())?;
        for (param, arg) in self.signature().iter().zip(&args) {
            if !param.value_type().accepts(arg) {
                return Err(ModelError::IncompatibleType {
                    expected: param.value_type().to_string(),
                    actual: Type::of_value(arg).to_string(),
                });
            }
        }
        Ok(GroundFluent {
            fluent: self.clone(),
            args,
        })
    }

    fn check_arity(&self, actual: usize) -> Result<(), ModelError> {
        if actual == self.arity() {
            Ok(())
        } else {
            Err(ModelError::ArityMismatch {
                context: format!("fluent {}", self.name()),
                expected: self.arity(),
                actual,
            })
        }
    }
}

impl fmt::Display for Fluent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

fn fmt_application<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    fluent: &Fluent,
    args: &[T],
) -> fmt::Result {
    write!(f, "{}", fluent.name())?;
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{a}")?;
    }
    write!(f, ")")
}

/// A fluent applied to argument expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FluentExp {
    fluent: Fluent,
    args: Vec<Expr>,
}

impl FluentExp {
    /// The applied fluent.
    #[must_use]
    pub const fn fluent(&self) -> &Fluent {
        &self.fluent
    }

    /// Argument expressions.
    #[must_use]
    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// The fluent's value type.
    #[must_use]
    pub fn value_type(&self) -> &Type {
        self.fluent.value_type()
    }

    /// Returns the ground key if every argument is a constant.
    #[must_use]
    pub fn to_ground(&self) -> Option<GroundFluent> {
        let args = self
            .args
            .iter()
            .map(|a| a.as_constant().cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(GroundFluent {
            fluent: self.fluent.clone(),
            args,
        })
    }

    /// Rebuilds the application with each argument mapped by `f`.
    #[must_use]
    pub fn map_args(&self, f: impl FnMut(&Expr) -> Expr) -> Self {
        Self {
            fluent: self.fluent.clone(),
            args: self.args.iter().map(f).collect(),
        }
    }
}

impl fmt::Display for FluentExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_application(f, &self.fluent, &self.args)
    }
}

/// A fluent applied to constants; the key of a state entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundFluent {
    fluent: Fluent,
    args: Vec<Value>,
}

impl GroundFluent {
    /// Builds a key from arguments already known to match the signature.
    pub(crate) fn from_parts(fluent: Fluent, args: Vec<Value>) -> Self {
        Self { fluent, args }
    }

    /// The applied fluent.
    #[must_use]
    pub const fn fluent(&self) -> &Fluent {
        &self.fluent
    }

    /// Constant arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The fluent's value type.
    #[must_use]
    pub fn value_type(&self) -> &Type {
        self.fluent.value_type()
    }

    /// The same application as an expression.
    #[must_use]
    pub fn to_exp(&self) -> FluentExp {
        FluentExp {
            fluent: self.fluent.clone(),
            args: self.args.iter().cloned().map(Expr::Constant).collect(),
        }
    }
}

impl fmt::Display for GroundFluent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_application(f, &self.fluent, &self.args)
    }
}
