use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::error::Result;

/// Tunables for the simulation, provided by the host page.
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Gravity for the rigid-body step, in units/s². Y points down.
    pub gravity: Vec2,
    /// Physics timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Ticks arriving sooner than this after the previous frame are skipped.
    pub frame_interval_ms: f64,
    /// Delay between construction and the first running frame.
    pub startup_delay_ms: f64,
    /// Delay after a rebuild before frames run again.
    pub settle_delay_ms: f64,
    /// Idle time after which the hammer freezes.
    pub freeze_delay_ms: f64,
    /// How long a status message stays before reverting to the idle label.
    pub status_revert_ms: f64,
    /// Distance outside the canvas at which bodies and sparks count as gone.
    pub bounds_margin: f32,
    /// Cap on in-canvas sparks.
    pub max_sparks: usize,
    /// Cap on page-global sparks.
    pub max_global_sparks: usize,
    /// Seed for the particle RNG.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 800.0),
            fixed_dt: 1.0 / 60.0,
            frame_interval_ms: 1000.0 / 60.0,
            startup_delay_ms: 500.0,
            settle_delay_ms: 100.0,
            freeze_delay_ms: 2000.0,
            status_revert_ms: 2000.0,
            bounds_margin: 50.0,
            max_sparks: 15,
            max_global_sparks: 25,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::SimError;

    #[test]
    fn empty_object_is_default() {
        let config = SimConfig::from_json("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = SimConfig::from_json(r#"{ "max_sparks": 4, "gravity": [0.0, 100.0] }"#).unwrap();
        assert_eq!(config.max_sparks, 4);
        assert_eq!(config.gravity, Vec2::new(0.0, 100.0));
        assert_eq!(config.max_global_sparks, 25);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = SimConfig::from_json(r#"{ "sparkz": 3 }"#).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn default_survives_json_roundtrip() {
        let json = serde_json::to_string(&SimConfig::default()).unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), SimConfig::default());
    }
}
