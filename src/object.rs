//! Objects, action parameters and quantified variables.

use std::fmt;
use std::sync::Arc;

use crate::environment::{Environment, EnvironmentId};
use crate::error::ModelError;
use crate::types::{Type, UserType};

#[derive(Debug, PartialEq, Eq, Hash)]
struct ObjectInner {
    name: String,
    ty: UserType,
    env: EnvironmentId,
}

/// A named constant of a user type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object(Arc<ObjectInner>);

impl Object {
    /// Declares an object.
    pub fn new(env: &Environment, name: impl Into<String>, ty: &UserType) -> Result<Self, ModelError> {
        let name = env.validate_name(name)?;
        env.ensure_owns(ty.env_id(), ty.name())?;
        Ok(Self(Arc::new(ObjectInner {
            name,
            ty: ty.clone(),
            env: env.id(),
        })))
    }

    /// Object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declared type.
    #[must_use]
    pub fn user_type(&self) -> &UserType {
        &self.0.ty
    }

    /// Environment the object was declared in.
    #[must_use]
    pub fn env_id(&self) -> EnvironmentId {
        self.0.env
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// A formal parameter of an action or fluent signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: String,
    ty: Type,
}

impl Parameter {
    /// Declares a parameter.
    pub fn new(env: &Environment, name: impl Into<String>, ty: Type) -> Result<Self, ModelError> {
        let name = env.validate_name(name)?;
        if let Type::User(t) = &ty {
            env.ensure_owns(t.env_id(), t.name())?;
        }
        Ok(Self { name, ty })
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub const fn value_type(&self) -> &Type {
        &self.ty
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A variable bound by `exists` or `forall`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    name: String,
    ty: Type,
}

impl Variable {
    /// Declares a variable.
    pub fn new(env: &Environment, name: impl Into<String>, ty: Type) -> Result<Self, ModelError> {
        let name = env.validate_name(name)?;
        Ok(Self { name, ty })
    }

    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type the variable ranges over.
    #[must_use]
    pub const fn value_type(&self) -> &Type {
        &self.ty
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
