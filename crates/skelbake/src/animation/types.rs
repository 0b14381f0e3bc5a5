//! Common types for keyframe animation

use std::fmt;

use glam::{Quat, Vec3};

/// Trait for values a keyframe track can blend between
///
/// `t` is not clamped. Track lookups can hand out factors below zero or
/// above one, and implementations extrapolate in that case.
pub trait Interpolate: Copy {
    /// Blend from `self` (t = 0) towards `other` (t = 1)
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        // slerp drifts off the unit sphere once t leaves [0, 1]
        self.slerp(*other, t).normalize()
    }
}

/// Which component of a joint pose a track animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TrackKind {
    Translation,
    Rotation,
    Scale,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translation => write!(f, "translation"),
            Self::Rotation => write!(f, "rotation"),
            Self::Scale => write!(f, "scale"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_interpolate() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 20.0, 30.0);

        let mid = a.interpolate(&b, 0.5);
        assert!((mid.x - 5.0).abs() < 0.001);
        assert!((mid.y - 10.0).abs() < 0.001);
        assert!((mid.z - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_extrapolates_outside_unit_range() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);

        assert!((a.interpolate(&b, -1.0).x + 2.0).abs() < 0.001);
        assert!((a.interpolate(&b, 1.5).x - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_quat_interpolate_is_normalized() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

        for t in [-0.5, 0.0, 0.25, 0.5, 1.0, 1.75] {
            let q = a.interpolate(&b, t);
            assert!((q.length() - 1.0).abs() < 0.001, "t = {t}: {q:?}");
        }
    }

    #[test]
    fn test_quat_interpolate_midpoint() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);

        let mid = a.interpolate(&b, 0.5);
        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        assert!(mid.abs_diff_eq(expected, 0.001));
    }

    #[test]
    fn test_track_kind_display() {
        assert_eq!(TrackKind::Translation.to_string(), "translation");
        assert_eq!(TrackKind::Rotation.to_string(), "rotation");
        assert_eq!(TrackKind::Scale.to_string(), "scale");
    }
}
