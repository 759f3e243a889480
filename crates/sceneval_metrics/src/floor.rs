//! The room floor as one ray-castable mesh.

use glam::DVec3;

use sceneval_core::{Aabb, EvalError, EvalResult, SceneView, TriMesh};
use sceneval_geom::{Ray, RayHit, TriangleBvh};

/// Union of every `floor*` element of a scene.
#[derive(Debug)]
pub struct Floor {
    mesh: TriMesh,
    bvh: TriangleBvh,
    bounds: Aabb,
}

impl Floor {
    /// Fails with [`EvalError::MissingFloor`] when the scene has no floor
    /// element or the floor meshes carry no triangles.
    pub fn from_scene(scene: &SceneView) -> EvalResult<Self> {
        let mesh = TriMesh::concatenate(scene.floor_meshes());
        let bounds = match mesh.bounds() {
            Some(b) if !mesh.is_empty() => b,
            _ => return Err(EvalError::MissingFloor),
        };
        Ok(Self {
            bvh: TriangleBvh::build(&mesh),
            mesh,
            bounds,
        })
    }

    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// First floor hit straight below `p`.
    pub fn hit_below(&self, p: DVec3, tolerance: f64) -> Option<RayHit> {
        self.bvh.first_hit(&Ray::down(p), tolerance)
    }

    /// `true` if a downward ray from `p` meets the floor.
    pub fn is_above_floor(&self, p: DVec3, tolerance: f64) -> bool {
        self.hit_below(p, tolerance).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn floor_requires_a_floor_element() {
        let scene = SceneView::new();
        assert_eq!(Floor::from_scene(&scene).unwrap_err(), EvalError::MissingFloor);
    }

    #[test]
    fn points_over_the_floor_hit_it() {
        let scene = fixtures::room(4.0);
        let floor = Floor::from_scene(&scene).unwrap();
        assert!(floor.is_above_floor(DVec3::new(1.9, -1.9, 0.5), 0.0));
        assert!(!floor.is_above_floor(DVec3::new(2.1, 0.0, 0.5), 0.0));
        // below the floor looks away from it
        assert!(!floor.is_above_floor(DVec3::new(0.0, 0.0, -0.5), 0.0));
        assert_eq!(floor.bounds().extents().x, 4.0);
    }
}
