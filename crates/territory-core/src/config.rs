//! Game configuration with YAML loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::clock::DEFAULT_DURATION_MINUTES;
use crate::engine::{ScoreEngine, DRAIN_RATE_PER_SEC};
use crate::ValidationError;

/// Ids of the bases created by a reset unless configured otherwise.
pub fn default_base_ids() -> Vec<String> {
    (1..=4).map(|i| format!("base_{i}")).collect()
}

/// Tunables for a match and its clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Points per second a holder drains.
    pub drain_rate_per_sec: f64,
    /// Match length used when none is given.
    pub default_duration_minutes: u32,
    /// Bases created on reset.
    pub base_ids: Vec<String>,
    /// Display frame period for the reconciliation loop.
    pub frame_interval_ms: u64,
    /// How often a durable store is polled for foreign writes.
    pub poll_interval_ms: u64,
    /// Issue CAPTURE automatically once a holder reaches 100.
    pub auto_capture: bool,
    /// Ignore new holds unless the match clock is running. Holds already in
    /// progress keep draining whatever the clock does.
    pub holds_require_playing: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            drain_rate_per_sec: DRAIN_RATE_PER_SEC,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            base_ids: default_base_ids(),
            frame_interval_ms: 16,
            poll_interval_ms: 250,
            auto_capture: false,
            holds_require_playing: false,
        }
    }
}

impl GameConfig {
    /// Parse and validate a YAML document; missing keys take defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let cfg: GameConfig =
            serde_yaml::from_str(text).map_err(|e| ValidationError::Config(e.to_string()))?;
        validate_config(&cfg)?;
        Ok(cfg)
    }

    /// Drain model for this configuration.
    pub fn engine(&self) -> ScoreEngine {
        ScoreEngine::with_rate(self.drain_rate_per_sec)
    }
}

/// Check configuration bounds.
pub fn validate_config(cfg: &GameConfig) -> Result<(), ValidationError> {
    if !cfg.drain_rate_per_sec.is_finite() || cfg.drain_rate_per_sec <= 0.0 {
        return Err(ValidationError::Config("drain_rate_per_sec must be > 0".into()));
    }
    if cfg.default_duration_minutes == 0 {
        return Err(ValidationError::Config("default_duration_minutes must be > 0".into()));
    }
    if cfg.frame_interval_ms == 0 || cfg.poll_interval_ms == 0 {
        return Err(ValidationError::Config("intervals must be > 0".into()));
    }
    if cfg.base_ids.is_empty() {
        return Err(ValidationError::Config("at least one base is required".into()));
    }
    let mut seen = BTreeSet::new();
    for id in &cfg.base_ids {
        if id.trim().is_empty() || !seen.insert(id.as_str()) {
            return Err(ValidationError::Config(format!("invalid or duplicate base id {id:?}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.base_ids, ["base_1", "base_2", "base_3", "base_4"]);
        assert_eq!(cfg.engine(), ScoreEngine::default());
        assert!(!cfg.holds_require_playing);
        assert!(!cfg.auto_capture);
    }

    #[test]
    fn yaml_overrides_and_defaults() {
        let cfg = GameConfig::from_yaml_str(
            "drain_rate_per_sec: 5.0\nbase_ids: [alpha, bravo]\nauto_capture: true\n",
        )
        .unwrap();
        assert_eq!(cfg.drain_rate_per_sec, 5.0);
        assert_eq!(cfg.base_ids, ["alpha", "bravo"]);
        assert!(cfg.auto_capture);
        assert_eq!(cfg.default_duration_minutes, 15);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(GameConfig::from_yaml_str("drain_rate_per_sec: 0").is_err());
        assert!(GameConfig::from_yaml_str("base_ids: []").is_err());
        assert!(GameConfig::from_yaml_str("base_ids: [a, a]").is_err());
        assert!(GameConfig::from_yaml_str("frame_interval_ms: 0").is_err());
        assert!(GameConfig::from_yaml_str("base_ids: 12").is_err());
    }
}
