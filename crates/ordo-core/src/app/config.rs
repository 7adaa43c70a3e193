//! Engine configuration with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::domain::ViewConfig;

use super::builder::BuildError;

/// Knobs of the engine. Every field has a default, so an empty TOML table
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Raise `Validation` for an unusable recurrence rule instead of
    /// treating the task as not recurring.
    pub strict_cycles: bool,
    /// Re-key the recurrence rule onto each spawned successor so the whole
    /// series keeps recurring. `false` gives one-shot recurrence.
    pub carry_rule_forward: bool,
    /// Listing order when the caller passes no view.
    pub default_view: ViewConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_cycles: false,
            carry_rule_forward: true,
            default_view: ViewConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Checks:
    /// - the default view must not pin a project (it applies to every owner)
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.default_view.project.is_some() {
            return Err(BuildError::InvalidConfig(
                "default_view must not be restricted to a project".into(),
            ));
        }
        Ok(())
    }
}
