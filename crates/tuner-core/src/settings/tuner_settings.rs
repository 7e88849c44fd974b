use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::services::generation::DEFAULT_MODEL;
use crate::services::training_timer::DEFAULT_TICK_INTERVAL;

/// Shortest tick period accepted from configuration.
pub const MIN_TICK_INTERVAL_MS: u64 = 50;

/// User-level configuration for the walkthrough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TunerSettings {
    /// Model identifier used for both base and tuned responses.
    #[serde(default = "default_model")]
    pub model: String,

    /// Pacing of the simulated training run.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Never written to disk; supplied by the environment or the CLI.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL.as_millis() as u64
}

impl Default for TunerSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            tick_interval_ms: default_tick_interval_ms(),
            api_key: None,
        }
    }
}

impl TunerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TunerSettings::default();
        assert_eq!(settings.model, "gemini-2.5-flash");
        assert_eq!(settings.tick_interval(), Duration::from_millis(800));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: TunerSettings = serde_json::from_str("{}").expect("valid json");
        assert_eq!(settings, TunerSettings::default());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let settings = TunerSettings {
            api_key: Some("secret".to_string()),
            ..TunerSettings::default()
        };
        let json = serde_json::to_string(&settings).expect("serializable");
        assert!(!json.contains("secret"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_tick_interval_has_floor() {
        let settings = TunerSettings {
            tick_interval_ms: 0,
            ..TunerSettings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(MIN_TICK_INTERVAL_MS));
    }
}
