//! World-space transform: position, rotation (quaternion), scale.
//!
//! `Transform` is `Copy` and `Default`, making it easy to embed in any
//! placement record.  Call `.matrix()` for the full TRS matrix or
//! `.rigid_matrix()` when distances must stay in meters.

use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// World-space transform of a scene element.
///
/// # Example
/// ```rust,ignore
/// use sceneval_core::Transform;
/// use glam::DVec3;
///
/// let t = Transform::from_position(DVec3::new(1.0, 0.0, 0.0)).with_yaw(0.5);
/// let m = t.matrix();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position.
    pub position: DVec3,
    /// Orientation as a unit quaternion.
    pub rotation: DQuat,
    /// Non-uniform scale factor.
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity: no translation or rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Construct with a world-space position, identity rotation and scale.
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Replace the rotation with a pure rotation of `yaw` radians about +Z.
    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.rotation = DQuat::from_rotation_z(yaw);
        self
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    /// Build the TRS matrix (`T * R * S`).
    pub fn matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotation + translation only.  Points mapped through its inverse keep
    /// metric distances, which the opening-frame projection relies on.
    pub fn rigid_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Orthonormal local→world axes (columns are the local X, Y, Z axes).
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.rotation.normalize())
    }

    /// Map a world-space point into this transform's rigid local frame.
    pub fn to_local(&self, world: DVec3) -> DVec3 {
        self.rotation.normalize().inverse() * (world - self.position)
    }

    /// Rotation about the world Z axis, in radians, measured from +X.
    ///
    /// Only meaningful for upright elements; tilted ones report the heading
    /// of their projected local X axis.
    pub fn yaw(&self) -> f64 {
        let x = self.rotation * DVec3::X;
        x.y.atan2(x.x)
    }

    /// Local "front" direction in world space.  Openings face along local −Y.
    pub fn front(&self) -> DVec3 {
        self.rotation * DVec3::NEG_Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_matrix() {
        let t = Transform::default();
        assert!(t.matrix().abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn translation_only() {
        let t = Transform::from_position(DVec3::new(1.0, 2.0, 3.0));
        let (_, _, pos) = t.matrix().to_scale_rotation_translation();
        assert!((pos - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-12);
    }

    #[test]
    fn yaw_roundtrip() {
        let t = Transform::default().with_yaw(0.7);
        assert!((t.yaw() - 0.7).abs() < 1e-12);
        let t = Transform::default().with_yaw(-2.5);
        assert!((t.yaw() + 2.5).abs() < 1e-12);
    }

    #[test]
    fn front_turns_with_yaw() {
        let t = Transform::default().with_yaw(FRAC_PI_2);
        // −Y rotated a quarter turn counter-clockwise about Z is +X
        assert!((t.front() - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn matrix_carries_scale_but_rigid_matrix_does_not() {
        let t = Transform::from_position(DVec3::new(-1.0, 0.5, 2.0))
            .with_yaw(1.2)
            .with_scale(DVec3::new(2.0, 1.0, 0.5));
        let (scale, _, pos) = t.matrix().to_scale_rotation_translation();
        assert!((scale - t.scale).length() < 1e-9);
        assert!((pos - t.position).length() < 1e-9);
        let (rigid, _, _) = t.rigid_matrix().to_scale_rotation_translation();
        assert!((rigid - DVec3::ONE).length() < 1e-9);
    }

    #[test]
    fn to_local_ignores_scale() {
        let t = Transform::from_position(DVec3::new(1.0, 1.0, 0.0))
            .with_yaw(FRAC_PI_2)
            .with_scale(DVec3::splat(3.0));
        let local = t.to_local(DVec3::new(1.0, 2.0, 0.0));
        assert!((local - DVec3::X).length() < 1e-12);
    }
}
