#![forbid(unsafe_code)]

//! Tunable thresholds for the classifier and the projector.
//!
//! Every default equals the constant the engine was tuned with, so
//! `SpatialConfig::default()` is the reference behavior. With the `config`
//! feature the whole tree can be loaded from TOML or JSON:
//!
//! ```toml
//! [gesture]
//! rotation_threshold_degrees = 0.3
//! translation_threshold = 0.075
//!
//! [scroll]
//! activation_distance = 0.0175
//! projected_update_interval_ms = 250
//! ```
//!
//! ```rust,ignore
//! let config = SpatialConfig::from_toml_file("spatial.toml")?;
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

use crate::host::HapticPulse;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Configuration for both subsystems.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SpatialConfig {
    /// Gesture classifier parameters.
    pub gesture: GestureConfig,
    /// Scroll projector parameters.
    pub scroll: ScrollConfig,
}

impl SpatialConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check all parameters are within acceptable ranges.
    ///
    /// Returns a list of problems; empty means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let gesture = &self.gesture;
        let scroll = &self.scroll;

        if !(gesture.rotation_threshold_degrees > 0.0) {
            errors.push(format!(
                "gesture.rotation_threshold_degrees must be > 0, got {}",
                gesture.rotation_threshold_degrees
            ));
        }
        if !(gesture.translation_threshold > 0.0) {
            errors.push(format!(
                "gesture.translation_threshold must be > 0, got {}",
                gesture.translation_threshold
            ));
        }
        if gesture.grace_ticks == 0 {
            errors.push("gesture.grace_ticks must be > 0".into());
        }
        if !(gesture.velocity.saturation_degrees_per_sec > 0.0) {
            errors.push(format!(
                "gesture.velocity.saturation_degrees_per_sec must be > 0, got {}",
                gesture.velocity.saturation_degrees_per_sec
            ));
        }
        for (name, pulse) in [
            ("translation_pulse", &gesture.translation_pulse),
            ("single_axis_rotation_pulse", &gesture.single_axis_rotation_pulse),
            ("free_rotation_pulse", &gesture.free_rotation_pulse),
        ] {
            if !(0.0..=1.0).contains(&pulse.intensity) {
                errors.push(format!(
                    "gesture.{name}.intensity must be in [0, 1], got {}",
                    pulse.intensity
                ));
            }
        }

        if !(scroll.activation_distance > 0.0) {
            errors.push(format!(
                "scroll.activation_distance must be > 0, got {}",
                scroll.activation_distance
            ));
        }
        if scroll.projected_update_epsilon < 0.0 || scroll.projected_update_epsilon.is_nan() {
            errors.push(format!(
                "scroll.projected_update_epsilon must be >= 0, got {}",
                scroll.projected_update_epsilon
            ));
        }
        if !(scroll.cardinal_step_scale > 0.0) {
            errors.push(format!(
                "scroll.cardinal_step_scale must be > 0, got {}",
                scroll.cardinal_step_scale
            ));
        }
        if scroll.grace_ticks == 0 {
            errors.push("scroll.grace_ticks must be > 0".into());
        }

        errors
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Gesture classifier
// ---------------------------------------------------------------------------

/// Thresholds for gesture classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GestureConfig {
    /// Shortest-arc delta (degrees) an Euler axis must exceed to count as rotating.
    pub rotation_threshold_degrees: f32,
    /// Distance from the baseline position beyond which a node is translating.
    pub translation_threshold: f32,
    /// Consecutive unpolled frames after which a record is dropped.
    pub grace_ticks: u64,
    /// Rotation-strength estimator parameters.
    pub velocity: VelocityConfig,
    /// Pulse played when a node starts translating.
    pub translation_pulse: HapticPulse,
    /// Pulse played when a node starts a single-axis rotation.
    pub single_axis_rotation_pulse: HapticPulse,
    /// Pulse played when a node starts a free rotation.
    pub free_rotation_pulse: HapticPulse,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            rotation_threshold_degrees: 0.3,
            translation_threshold: 0.075,
            grace_ticks: 2,
            velocity: VelocityConfig::default(),
            translation_pulse: HapticPulse::new(10, 0.35),
            single_axis_rotation_pulse: HapticPulse::new(20, 0.6),
            free_rotation_pulse: HapticPulse::new(40, 0.8),
        }
    }
}

/// Rotation-strength estimator parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct VelocityConfig {
    /// Angular speed (degrees/second) mapped to full rotation strength.
    pub saturation_degrees_per_sec: f32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            saturation_degrees_per_sec: 360.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scroll projector
// ---------------------------------------------------------------------------

/// Thresholds for scroll projection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ScrollConfig {
    /// Drag distance (before viewer scaling) that locks the scroll direction.
    pub activation_distance: f32,
    /// Minimum time between accepted projected-vector updates.
    pub projected_update_interval_ms: u32,
    /// Minimum scaled movement of the projected vector to accept an update.
    pub projected_update_epsilon: f32,
    /// Steps per scaled unit advanced since the last reversal.
    pub cardinal_step_scale: f32,
    /// Consecutive unpolled frames after which a record is dropped.
    pub grace_ticks: u64,
    /// Priority of the ray visibility hint registered per scroll.
    pub hint_priority: i32,
}

impl ScrollConfig {
    #[must_use]
    pub fn projected_update_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.projected_update_interval_ms))
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            activation_distance: 0.0175,
            projected_update_interval_ms: 250,
            projected_update_epsilon: 0.025,
            cardinal_step_scale: 0.5,
            grace_ticks: 2,
            hint_priority: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_constants() {
        let config = SpatialConfig::default();
        assert_eq!(config.gesture.rotation_threshold_degrees, 0.3);
        assert_eq!(config.gesture.translation_threshold, 0.075);
        assert_eq!(config.scroll.activation_distance, 0.0175);
        assert_eq!(
            config.scroll.projected_update_interval(),
            Duration::from_millis(250)
        );
        assert_eq!(config.gesture.grace_ticks, 2);
        assert_eq!(config.scroll.grace_ticks, 2);
    }

    #[test]
    fn default_validates_clean() {
        let errors = SpatialConfig::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn validate_catches_zero_thresholds() {
        let mut config = SpatialConfig::default();
        config.gesture.translation_threshold = 0.0;
        config.scroll.activation_distance = -1.0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("translation_threshold")));
        assert!(errors.iter().any(|e| e.contains("activation_distance")));
    }

    #[test]
    fn validate_catches_nan() {
        let mut config = SpatialConfig::default();
        config.gesture.rotation_threshold_degrees = f32::NAN;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("rotation_threshold_degrees")));
    }

    #[test]
    fn validate_catches_zero_grace() {
        let mut config = SpatialConfig::default();
        config.scroll.grace_ticks = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("scroll.grace_ticks")));
    }

    #[test]
    fn validate_catches_pulse_intensity_out_of_range() {
        let mut config = SpatialConfig::default();
        config.gesture.free_rotation_pulse.intensity = 1.5;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("free_rotation_pulse")));
    }

    #[test]
    fn validation_error_joins_messages() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }
}
