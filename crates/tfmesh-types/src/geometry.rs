//! Rigid-body geometry primitives.
//!
//! Everything is `f64`.  Quaternions are stored and constructed in the
//! `(x, y, z, w)` order used on the wire by both transform feeds.
//!
//! # Example
//!
//! ```rust
//! use tfmesh_types::geometry::{Quaternion, Transform3D, Vec3};
//!
//! let base = Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity());
//! let camera = Transform3D::new(Vec3::new(0.0, 0.0, 1.0), Quaternion::identity());
//!
//! let t = base.compose(camera);
//! assert!((t.translation.x - 1.0).abs() < 1e-9);
//! assert!((t.translation.z - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

/// Quaternions with a norm below this are treated as degenerate.
pub const MIN_QUATERNION_NORM: f64 = 1e-9;

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D translation vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn neg(self) -> Self {
        self.scale(-1.0)
    }

    /// Linear interpolation: `ratio = 0` yields `self`, `ratio = 1` yields `other`.
    pub fn lerp(self, other: Self, ratio: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * ratio,
            self.y + (other.y - self.y) * ratio,
            self.z + (other.z - self.z) * ratio,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A quaternion representing a 3-D rotation.
///
/// Only unit quaternions describe rotations; use [`Quaternion::normalized`]
/// on untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion from its `(x, y, z, w)` components.
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle_rad` around the Z axis.
    pub fn from_yaw(angle_rad: f64) -> Self {
        let half = angle_rad * 0.5;
        Self::new(0.0, 0.0, half.sin(), half.cos())
    }

    /// Hamilton product: `self` rotation applied after `rhs`.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// Scale to unit length.
    ///
    /// Returns `None` for non-finite or degenerate (near-zero) quaternions,
    /// which do not describe any rotation.
    pub fn normalized(self) -> Option<Self> {
        if !self.is_finite() {
            return None;
        }
        let n = self.norm();
        if n < MIN_QUATERNION_NORM {
            return None;
        }
        Some(Self::new(self.x / n, self.y / n, self.z / n, self.w / n))
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(v.x, v.y, v.z, 0.0);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Spherical linear interpolation along the shortest arc.
    ///
    /// `ratio = 0` yields `self`, `ratio = 1` yields `other` (or its
    /// negation, which is the same rotation).
    pub fn slerp(self, other: Self, ratio: f64) -> Self {
        let mut cos_theta = self.dot(other);
        let mut end = other;
        if cos_theta < 0.0 {
            end = Self::new(-other.x, -other.y, -other.z, -other.w);
            cos_theta = -cos_theta;
        }

        // Nearly parallel: fall back to normalized lerp to avoid dividing by
        // a vanishing sine.
        if cos_theta > 0.9995 {
            let lerped = Self::new(
                self.x + (end.x - self.x) * ratio,
                self.y + (end.y - self.y) * ratio,
                self.z + (end.z - self.z) * ratio,
                self.w + (end.w - self.w) * ratio,
            );
            return lerped.normalized().unwrap_or(self);
        }

        let theta = cos_theta.acos();
        let sin_theta = theta.sin();
        let a = ((1.0 - ratio) * theta).sin() / sin_theta;
        let b = (ratio * theta).sin() / sin_theta;
        Self::new(
            a * self.x + b * end.x,
            a * self.y + b * end.y,
            a * self.z + b * end.z,
            a * self.w + b * end.w,
        )
    }

    /// Row-major 3×3 rotation matrix.
    pub fn to_rotation_matrix(self) -> [[f64; 3]; 3] {
        let Self { x, y, z, w } = self;
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
            ],
            [
                2.0 * (x * y + z * w),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform3D
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: rotation followed by translation.
///
/// Represents the pose of frame B relative to frame A: to convert a point
/// expressed in frame B into frame A, rotate it by `rotation` then add
/// `translation`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Compose two transforms.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation.add(self.rotation.rotate(other.translation));
        let rotated = self.rotation.mul(other.rotation);
        Self::new(translated, rotated)
    }

    /// The algebraic inverse: T_A_B becomes T_B_A.
    pub fn inverse(self) -> Self {
        let inv_rotation = self.rotation.conjugate();
        Self::new(inv_rotation.rotate(self.translation).neg(), inv_rotation)
    }

    /// Interpolate toward `other`: translation linearly, rotation by slerp.
    pub fn interpolate(self, other: Self, ratio: f64) -> Self {
        Self::new(
            self.translation.lerp(other.translation, ratio),
            self.rotation.slerp(other.rotation, ratio),
        )
    }

    /// Map a point expressed in the child frame into the parent frame.
    pub fn transform_point(self, point: Vec3) -> Vec3 {
        self.translation.add(self.rotation.rotate(point))
    }

    /// Row-major 4×4 homogeneous matrix.
    pub fn to_matrix(self) -> [[f64; 4]; 4] {
        let r = self.rotation.to_rotation_matrix();
        let t = self.translation;
        [
            [r[0][0], r[0][1], r[0][2], t.x],
            [r[1][0], r[1][1], r[1][2], t.y],
            [r[2][0], r[2][1], r[2][2], t.z],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    /// Component-wise comparison within `eps`.  `q` and `-q` count as equal.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        let dt = (self.translation.x - other.translation.x).abs()
            + (self.translation.y - other.translation.y).abs()
            + (self.translation.z - other.translation.z).abs();
        let same_rotation = (self.rotation.dot(other.rotation).abs() - 1.0).abs() < eps;
        dt < eps && same_rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    const EPS: f64 = 1e-9;

    // ── Quaternion ──────────────────────────────────────────────────────────

    #[test]
    fn quaternion_identity_rotate_is_noop() {
        let r = Quaternion::identity().rotate(Vec3::new(1.0, 2.0, 3.0));
        assert!((r.x - 1.0).abs() < EPS);
        assert!((r.y - 2.0).abs() < EPS);
        assert!((r.z - 3.0).abs() < EPS);
    }

    #[test]
    fn quaternion_90deg_yaw_rotates_x_to_y() {
        let q = Quaternion::new(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let r = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(r.x.abs() < EPS, "x should be ~0, got {}", r.x);
        assert!((r.y - 1.0).abs() < EPS, "y should be ~1, got {}", r.y);
        assert!(r.z.abs() < EPS);
    }

    #[test]
    fn from_yaw_matches_explicit_quaternion() {
        let q = Quaternion::from_yaw(FRAC_PI_2);
        assert!((q.z - FRAC_1_SQRT_2).abs() < EPS);
        assert!((q.w - FRAC_1_SQRT_2).abs() < EPS);
    }

    #[test]
    fn quaternion_conjugate_is_inverse() {
        let q = Quaternion::from_yaw(0.7);
        let prod = q.mul(q.conjugate());
        assert!((prod.w - 1.0).abs() < EPS);
        assert!(prod.x.abs() < EPS && prod.y.abs() < EPS && prod.z.abs() < EPS);
    }

    #[test]
    fn normalized_rescales_and_rejects_degenerate() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 2.0).normalized().unwrap();
        assert!((q.w - 1.0).abs() < EPS);
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized().is_none());
        assert!(Quaternion::new(f64::NAN, 0.0, 0.0, 1.0).normalized().is_none());
    }

    #[test]
    fn slerp_halfway_between_yaws() {
        let a = Quaternion::from_yaw(0.0);
        let b = Quaternion::from_yaw(FRAC_PI_2);
        let mid = a.slerp(b, 0.5);
        let expected = Quaternion::from_yaw(FRAC_PI_2 / 2.0);
        assert!((mid.dot(expected).abs() - 1.0).abs() < EPS);
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let a = Quaternion::from_yaw(0.1);
        let b = Quaternion::from_yaw(0.3);
        let flipped = Quaternion::new(-b.x, -b.y, -b.z, -b.w);
        let mid = a.slerp(flipped, 0.5);
        let expected = Quaternion::from_yaw(0.2);
        assert!((mid.dot(expected).abs() - 1.0).abs() < 1e-6);
    }

    // ── Transform3D ─────────────────────────────────────────────────────────

    #[test]
    fn transform_compose_translations_add() {
        let t1 = Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity());
        let t2 = Transform3D::new(Vec3::new(2.0, 0.0, 0.0), Quaternion::identity());
        assert!((t1.compose(t2).translation.x - 3.0).abs() < EPS);
    }

    #[test]
    fn transform_compose_respects_rotation() {
        // Parent yawed 90°, child 1 m along the parent's local +X.
        let t1 = Transform3D::new(Vec3::zero(), Quaternion::from_yaw(FRAC_PI_2));
        let t2 = Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity());
        let t = t1.compose(t2);
        assert!(t.translation.x.abs() < EPS, "x={}", t.translation.x);
        assert!((t.translation.y - 1.0).abs() < EPS, "y={}", t.translation.y);
    }

    #[test]
    fn transform_inverse_composes_to_identity() {
        let t = Transform3D::new(Vec3::new(1.0, -2.0, 0.5), Quaternion::from_yaw(1.2));
        assert!(t.compose(t.inverse()).approx_eq(&Transform3D::identity(), 1e-9));
        assert!(t.inverse().compose(t).approx_eq(&Transform3D::identity(), 1e-9));
    }

    #[test]
    fn transform_point_matches_matrix() {
        let t = Transform3D::new(Vec3::new(1.0, 2.0, 3.0), Quaternion::from_yaw(FRAC_PI_2));
        let p = t.transform_point(Vec3::new(1.0, 0.0, 0.0));
        let m = t.to_matrix();
        let mx = m[0][0] * 1.0 + m[0][3];
        let my = m[1][0] * 1.0 + m[1][3];
        let mz = m[2][0] * 1.0 + m[2][3];
        assert!((p.x - mx).abs() < EPS && (p.y - my).abs() < EPS && (p.z - mz).abs() < EPS);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn interpolate_midpoint() {
        let a = Transform3D::new(Vec3::new(0.0, 0.0, 0.0), Quaternion::from_yaw(0.0));
        let b = Transform3D::new(Vec3::new(2.0, 4.0, 0.0), Quaternion::from_yaw(1.0));
        let mid = a.interpolate(b, 0.5);
        assert!((mid.translation.x - 1.0).abs() < EPS);
        assert!((mid.translation.y - 2.0).abs() < EPS);
        assert!((mid.rotation.dot(Quaternion::from_yaw(0.5)).abs() - 1.0).abs() < 1e-9);
    }
}
