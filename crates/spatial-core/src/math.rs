#![forbid(unsafe_code)]

//! Vector and angle helpers.
//!
//! Euler angles are expressed in degrees and decomposed in Y-X-Z order
//! (yaw applied last), so a rotation built with [`from_euler_degrees`]
//! decomposes back to the same angles with [`euler_degrees`].

use glam::{EulerRot, Quat, Vec3};

/// Squared length below which a vector is treated as zero.
const DEGENERATE_LENGTH_SQUARED: f32 = 1e-10;

/// Euler angles of `rotation` in degrees, as `(x, y, z)`.
#[must_use]
pub fn euler_degrees(rotation: Quat) -> Vec3 {
    let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Rotation from Euler angles in degrees, given as `(x, y, z)`.
#[must_use]
pub fn from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Shortest signed arc from `current` to `target`, in degrees, in `(-180, 180]`.
#[must_use]
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// Projection of `v` onto `onto`; zero when `onto` is degenerate.
#[must_use]
pub fn project(v: Vec3, onto: Vec3) -> Vec3 {
    let len_sq = onto.length_squared();
    if len_sq < DEGENERATE_LENGTH_SQUARED {
        return Vec3::ZERO;
    }
    onto * (v.dot(onto) / len_sq)
}

/// Component of `v` orthogonal to `normal`; `v` itself when `normal` is degenerate.
#[must_use]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - project(v, normal)
}

/// Wrap `amount` into `[0, 1)` over a repeating range of `length`.
///
/// The sign of `amount` is discarded. `length` must be positive and finite.
#[must_use]
pub fn wrap_progress(amount: f32, length: f32) -> f32 {
    debug_assert!(length > 0.0 && length.is_finite(), "degenerate length {length}");
    let wrapped = (amount.abs() % length) / length;
    // fmod is exact but the division can round up to 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn delta_angle_takes_shortest_arc() {
        assert!((delta_angle(10.0, 350.0) + 20.0).abs() < EPS);
        assert!((delta_angle(350.0, 10.0) - 20.0).abs() < EPS);
        assert!((delta_angle(0.0, 180.0) - 180.0).abs() < EPS);
        assert!((delta_angle(-179.5, 179.5) + 1.0).abs() < EPS);
    }

    #[test]
    fn euler_round_trip() {
        let degrees = Vec3::new(12.0, -30.0, 45.0);
        let back = euler_degrees(from_euler_degrees(degrees));
        assert!((back - degrees).abs().max_element() < 1e-3, "{back:?}");
    }

    #[test]
    fn single_axis_rotation_decomposes_cleanly() {
        let back = euler_degrees(from_euler_degrees(Vec3::new(0.0, 0.0, 0.5)));
        assert!((back.z - 0.5).abs() < 1e-3);
        assert!(back.x.abs() < 1e-3);
        assert!(back.y.abs() < 1e-3);
    }

    #[test]
    fn project_onto_zero_is_zero() {
        assert_eq!(project(Vec3::ONE, Vec3::ZERO), Vec3::ZERO);
        assert_eq!(project_on_plane(Vec3::ONE, Vec3::ZERO), Vec3::ONE);
    }

    #[test]
    fn project_ignores_axis_length() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let axis = Vec3::X;
        assert_eq!(project(v, axis), project(v, axis * 2.0));
        assert_eq!(project_on_plane(v, axis), Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn wrap_progress_stays_in_unit_range() {
        assert_eq!(wrap_progress(0.5, 1.0), 0.5);
        assert_eq!(wrap_progress(1.0, 1.0), 0.0);
        assert!((wrap_progress(-1.25, 1.0) - 0.25).abs() < EPS);
        assert!((wrap_progress(0.75, 0.5) - 0.5).abs() < EPS);
    }
}
