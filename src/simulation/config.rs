//! Simulator configuration.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::state::MAX_ANCESTORS;

/// Options controlling a [`SequentialSimulator`](super::SequentialSimulator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Reject problems the simulator does not support instead of only warning.
    pub error_on_failed_checks: bool,
    /// Ancestors a state may link to before it is flattened.
    pub max_state_ancestors: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            error_on_failed_checks: true,
            max_state_ancestors: MAX_ANCESTORS,
        }
    }
}

impl SimulatorConfig {
    /// Validate the configuration.
    ///
    /// Called by the simulator constructors.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.max_state_ancestors == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "max_state_ancestors must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Parses and validates a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ModelError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
