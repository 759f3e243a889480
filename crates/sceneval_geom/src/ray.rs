//! Rays and ray/triangle intersection.

use glam::DVec3;

use sceneval_core::Aabb;

/// Threshold on the Möller–Trumbore determinant below which the ray is
/// treated as parallel to the triangle.
const MT_EPSILON: f64 = 1e-14;

/// Half-line `origin + t * dir`, `t ≥ 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit direction.
    pub dir: DVec3,
}

impl Ray {
    /// `dir` is normalized; a zero direction yields `None`.
    pub fn new(origin: DVec3, dir: DVec3) -> Option<Self> {
        let dir = dir.try_normalize()?;
        Some(Self { origin, dir })
    }

    /// Straight down from `origin`.
    pub fn down(origin: DVec3) -> Self {
        Self {
            origin,
            dir: sceneval_core::DOWN,
        }
    }

    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }

    /// Slab test; returns the entry distance if the ray meets `aabb` at
    /// `t ≥ -tolerance`.
    pub fn hits_aabb(&self, aabb: &Aabb, tolerance: f64) -> Option<f64> {
        let lo = aabb.min - DVec3::splat(tolerance);
        let hi = aabb.max + DVec3::splat(tolerance);
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            let (o, d) = (self.origin[axis], self.dir[axis]);
            if d.abs() < 1e-300 {
                // parallel to this slab pair: inside or never
                if o < lo[axis] || o > hi[axis] {
                    return None;
                }
                continue;
            }
            let t0 = (lo[axis] - o) / d;
            let t1 = (hi[axis] - o) / d;
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
        }
        if t_near <= t_far && t_far >= -tolerance {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}

/// One ray/triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f64,
    pub triangle: usize,
    pub point: DVec3,
}

/// Möller–Trumbore with every acceptance test widened by `tolerance`, so a
/// larger tolerance can only add hits.
pub fn intersect_triangle(ray: &Ray, tri: &[DVec3; 3], tolerance: f64) -> Option<f64> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let p = ray.dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < MT_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - tri[0];
    let u = s.dot(p) * inv_det;
    if u < -tolerance || u > 1.0 + tolerance {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.dir.dot(q) * inv_det;
    if v < -tolerance || u + v > 1.0 + tolerance {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t >= -tolerance).then_some(t)
}
