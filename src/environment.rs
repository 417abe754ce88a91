//! The modelling context shared by a problem and everything declared for it.
//!
//! An [`Environment`] is created alongside a problem and handed to every
//! constructor that declares a named symbol. Symbols remember the
//! [`EnvironmentId`] they were created in, so mixing two problems' objects
//! or fluents is caught when the problem is built.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;

/// Pattern every declared name must match.
pub const NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_\-]*$";

static NAME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// Unique identifier of an environment.
///
/// # Examples
///
/// ```
/// use plansim::Environment;
///
/// let a = Environment::new();
/// let b = Environment::new();
/// assert_ne!(a.id(), b.id());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(Uuid);

impl EnvironmentId {
    /// Creates a new random environment ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EnvironmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit modelling context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Environment {
    id: EnvironmentId,
}

impl Environment {
    /// Creates a fresh environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: EnvironmentId::new(),
        }
    }

    /// Returns the identifier symbols created here are tagged with.
    #[must_use]
    pub const fn id(&self) -> EnvironmentId {
        self.id
    }

    /// Validates a user supplied identifier and returns it owned.
    pub fn validate_name(&self, name: impl Into<String>) -> Result<String, ModelError> {
        let name = name.into();
        if is_valid_name(&name) {
            Ok(name)
        } else {
            Err(ModelError::InvalidName {
                name,
                pattern: NAME_PATTERN,
            })
        }
    }

    /// Rejects symbols that were declared in a different environment.
    pub fn ensure_owns(&self, owner: EnvironmentId, name: &str) -> Result<(), ModelError> {
        if owner == self.id {
            Ok(())
        } else {
            Err(ModelError::ForeignEnvironment {
                name: name.to_string(),
            })
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    NAME_REGEX
        .get_or_init(|| Regex::new(NAME_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}
