use serde::{Deserialize, Serialize};

use crate::error::{Result, TrellisError};

/// Engine configuration.
///
/// `max_steps` bounds every run: the source topologies can cycle forever
/// (mesh routing in particular), so the bound is not optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum node executions per run before the run aborts.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Capacity of the run-event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_max_steps() -> usize {
    25
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| TrellisError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_steps, 25);
        assert_eq!(cfg.event_capacity, 256);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = EngineConfig::from_toml("max_steps = 7").unwrap();
        assert_eq!(cfg.max_steps, 7);
        assert_eq!(cfg.event_capacity, 256);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = EngineConfig::from_toml("max_steps = \"lots\"").unwrap_err();
        assert!(matches!(err, TrellisError::Config(_)));
    }
}
