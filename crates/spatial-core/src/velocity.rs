#![forbid(unsafe_code)]

//! Angular-velocity estimation for haptic intensity selection.
//!
//! [`RotationVelocityTracker`] remembers the previous rotation sample and
//! turns the arc travelled since then into a normalized rotation strength.
//!
//! # Invariants
//!
//! 1. `rotation_strength()` is always in `[0.0, 1.0]`.
//! 2. A zero (or otherwise unusable) elapsed time never updates the
//!    estimate; the previous strength is returned unchanged.
//! 3. The first sample only primes the tracker.

use glam::Quat;
use web_time::Duration;

use crate::config::VelocityConfig;

/// Estimates how fast a node is rotating.
#[derive(Debug, Clone)]
pub struct RotationVelocityTracker {
    config: VelocityConfig,
    previous: Option<Quat>,
    angular_speed: f32,
    strength: f32,
}

impl RotationVelocityTracker {
    #[must_use]
    pub fn new(config: VelocityConfig) -> Self {
        Self {
            config,
            previous: None,
            angular_speed: 0.0,
            strength: 0.0,
        }
    }

    /// Tracker already holding `rotation` as its previous sample.
    #[must_use]
    pub fn primed(config: VelocityConfig, rotation: Quat) -> Self {
        Self {
            previous: Some(rotation),
            ..Self::new(config)
        }
    }

    /// Feed the current rotation and the time elapsed since the last sample.
    ///
    /// Returns the updated rotation strength.
    pub fn update(&mut self, rotation: Quat, elapsed: Duration) -> f32 {
        let Some(previous) = self.previous else {
            self.previous = Some(rotation);
            return self.strength;
        };

        let secs = elapsed.as_secs_f32();
        if !(secs > 0.0) {
            return self.strength;
        }

        let degrees = previous.angle_between(rotation).to_degrees();
        self.angular_speed = degrees / secs;
        let saturation = self.config.saturation_degrees_per_sec.max(f32::EPSILON);
        self.strength = (self.angular_speed / saturation).clamp(0.0, 1.0);
        self.previous = Some(rotation);
        self.strength
    }

    /// Normalized rotation strength from the latest accepted sample.
    #[inline]
    #[must_use]
    pub fn rotation_strength(&self) -> f32 {
        self.strength
    }

    /// Raw angular speed in degrees per second.
    #[inline]
    #[must_use]
    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.angular_speed = 0.0;
        self.strength = 0.0;
    }
}

impl Default for RotationVelocityTracker {
    fn default() -> Self {
        Self::new(VelocityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn first_sample_only_primes() {
        let mut tracker = RotationVelocityTracker::default();
        assert_eq!(tracker.update(Quat::from_rotation_z(1.0), MS_100), 0.0);
        assert_eq!(tracker.angular_speed(), 0.0);
    }

    #[test]
    fn speed_is_arc_over_time() {
        let mut tracker = RotationVelocityTracker::primed(VelocityConfig::default(), Quat::IDENTITY);
        let strength = tracker.update(Quat::from_rotation_z(18f32.to_radians()), MS_100);
        assert!((tracker.angular_speed() - 180.0).abs() < 0.1);
        assert!((strength - 0.5).abs() < 1e-3);
    }

    #[test]
    fn strength_saturates() {
        let mut tracker = RotationVelocityTracker::primed(VelocityConfig::default(), Quat::IDENTITY);
        let strength = tracker.update(Quat::from_rotation_x(2.0), Duration::from_millis(10));
        assert_eq!(strength, 1.0);
    }

    #[test]
    fn zero_elapsed_keeps_previous_estimate() {
        let mut tracker = RotationVelocityTracker::primed(VelocityConfig::default(), Quat::IDENTITY);
        let before = tracker.update(Quat::from_rotation_y(0.1), MS_100);
        let after = tracker.update(Quat::from_rotation_y(1.5), Duration::ZERO);
        assert_eq!(before, after);
        assert!(after.is_finite());
    }

    #[test]
    fn reset_clears_memory() {
        let mut tracker = RotationVelocityTracker::primed(VelocityConfig::default(), Quat::IDENTITY);
        tracker.update(Quat::from_rotation_y(0.5), MS_100);
        tracker.reset();
        assert_eq!(tracker.rotation_strength(), 0.0);
        assert_eq!(tracker.update(Quat::from_rotation_y(0.9), MS_100), 0.0);
    }
}
