//! Oriented bounding boxes.
//!
//! An [`OrientedBoundingBox`] is built per query from an element's placement
//! and thrown away afterwards. Containment is tested in the box's own frame,
//! so the rotation must stay orthonormal; constructors re-orthonormalize it.

use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use sceneval_core::Placement;

/// Containment tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObbConfig {
    /// Shrinks every half-size before testing (clamped at zero).
    pub no_contain_margin: f64,
    /// Slack added to the shrunk half-size for near-boundary points.
    pub area_margin: f64,
}

impl Default for ObbConfig {
    fn default() -> Self {
        Self {
            no_contain_margin: 0.0,
            area_margin: 1e-9,
        }
    }
}

/// Box with arbitrary orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBoundingBox {
    pub center: DVec3,
    /// Half side lengths along the local axes, all ≥ 0.
    pub half_size: DVec3,
    /// Local→world rotation; columns are the box axes.
    pub rotation: DMat3,
}

impl OrientedBoundingBox {
    pub fn new(center: DVec3, half_size: DVec3, rotation: DMat3) -> Self {
        Self {
            center,
            half_size: half_size.abs(),
            rotation: orthonormalize(rotation),
        }
    }

    /// Default-pose box of a placed element.
    pub fn from_placement(placement: &Placement) -> Self {
        Self::new(placement.center, placement.extents * 0.5, placement.axes())
    }

    #[inline]
    pub fn to_local(&self, p: DVec3) -> DVec3 {
        self.rotation.transpose() * (p - self.center)
    }

    #[inline]
    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.center + self.rotation * local
    }

    pub fn volume(&self) -> f64 {
        8.0 * self.half_size.x * self.half_size.y * self.half_size.z
    }

    /// The eight corners, bit `i` of the index picking the sign on axis `i`.
    pub fn corners(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| {
            let sign = |bit: usize| if i & bit != 0 { 1.0 } else { -1.0 };
            self.to_world(DVec3::new(sign(1), sign(2), sign(4)) * self.half_size)
        })
    }

    /// Regular `resolution³` lattice spanning the box, faces included.
    ///
    /// A resolution below 2 yields only the center.
    pub fn sample_points(&self, resolution: usize) -> Vec<DVec3> {
        if resolution < 2 {
            return vec![self.center];
        }
        let step = |i: usize| -1.0 + 2.0 * i as f64 / (resolution - 1) as f64;
        let mut points = Vec::with_capacity(resolution.pow(3));
        for i in 0..resolution {
            for j in 0..resolution {
                for k in 0..resolution {
                    let local = DVec3::new(step(i), step(j), step(k)) * self.half_size;
                    points.push(self.to_world(local));
                }
            }
        }
        points
    }

    /// `true` if `p` lies inside the box after applying the margins.
    pub fn contains_point(&self, p: DVec3, cfg: &ObbConfig) -> bool {
        let limit = (self.half_size - DVec3::splat(cfg.no_contain_margin)).max(DVec3::ZERO)
            + DVec3::splat(cfg.area_margin);
        self.to_local(p).abs().cmple(limit).all()
    }

    /// Per-point containment mask.
    pub fn contains(&self, points: &[DVec3], cfg: &ObbConfig) -> Vec<bool> {
        points.iter().map(|&p| self.contains_point(p, cfg)).collect()
    }
}

fn orthonormalize(m: DMat3) -> DMat3 {
    let q = DQuat::from_mat3(&m);
    if !q.is_finite() || q.length_squared() < 1e-24 {
        return DMat3::IDENTITY;
    }
    DMat3::from_quat(q.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn unit_box() -> OrientedBoundingBox {
        OrientedBoundingBox::new(DVec3::ZERO, DVec3::splat(0.5), DMat3::IDENTITY)
    }

    #[test]
    fn boundary_points_are_contained() {
        let b = unit_box();
        let cfg = ObbConfig::default();
        assert!(b.contains_point(DVec3::new(0.5, 0.5, -0.5), &cfg));
        assert!(!b.contains_point(DVec3::new(0.5 + 1e-6, 0.0, 0.0), &cfg));
    }

    #[test]
    fn no_contain_margin_shrinks_box() {
        let b = unit_box();
        let cfg = ObbConfig {
            no_contain_margin: 0.1,
            area_margin: 0.0,
        };
        assert!(!b.contains_point(DVec3::new(0.45, 0.0, 0.0), &cfg));
        assert!(b.contains_point(DVec3::new(0.4, 0.0, 0.0), &cfg));
        let cfg = ObbConfig {
            no_contain_margin: 10.0,
            area_margin: 0.0,
        };
        assert!(b.contains_point(DVec3::ZERO, &cfg));
    }

    #[test]
    fn rotated_containment_uses_local_frame() {
        let b = OrientedBoundingBox::new(
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 0.1, 0.1),
            DMat3::from_rotation_z(FRAC_PI_4),
        );
        let cfg = ObbConfig::default();
        let along = DVec3::new(1.0, 0.0, 0.0) + DVec3::new(0.6, 0.6, 0.0);
        assert!(b.contains_point(along, &cfg));
        assert!(!b.contains_point(DVec3::new(1.8, 0.0, 0.0), &cfg));
    }

    #[test]
    fn lattice_covers_faces() {
        let b = unit_box();
        let pts = b.sample_points(3);
        assert_eq!(pts.len(), 27);
        assert!(pts.contains(&DVec3::splat(-0.5)));
        assert!(pts.contains(&DVec3::ZERO));
        assert!(b.contains(&pts, &ObbConfig::default()).iter().all(|&c| c));
        assert_eq!(b.sample_points(1), vec![DVec3::ZERO]);
    }

    #[test]
    fn skewed_rotation_is_orthonormalized() {
        let skewed = DMat3::from_cols(DVec3::X * 2.0, DVec3::Y, DVec3::Z);
        let b = OrientedBoundingBox::new(DVec3::ZERO, DVec3::ONE, skewed);
        for c in [b.rotation.x_axis, b.rotation.y_axis, b.rotation.z_axis] {
            assert!((c.length() - 1.0).abs() < 1e-9);
        }
        assert!((b.volume() - 8.0).abs() < 1e-12);
        assert_eq!(b.corners()[7], DVec3::ONE);
    }
}
