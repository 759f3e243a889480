/// Closed box and flat floor meshes.
///
/// The cuboid uses 8 shared corners and 12 outward-wound triangles (2 per
/// face); corner `i` sits at `-h` or `+h` on each axis according to bits
/// 0 (X), 1 (Y) and 2 (Z) of `i`.
use glam::{DVec2, DVec3};

use crate::mesh::TriMesh;
use crate::transform::Transform;

#[rustfmt::skip]
const CUBOID_TRIANGLES: [[u32; 3]; 12] = [
    [0, 2, 3], [0, 3, 1], // -Z
    [4, 5, 7], [4, 7, 6], // +Z
    [0, 1, 5], [0, 5, 4], // -Y
    [2, 6, 7], [2, 7, 3], // +Y
    [0, 4, 6], [0, 6, 2], // -X
    [1, 3, 7], [1, 7, 5], // +X
];

/// Box with the given half extents, posed by `transform` (scale included).
pub fn cuboid(half_extents: DVec3, transform: &Transform) -> TriMesh {
    let m = transform.matrix();
    let vertices = (0..8u32)
        .map(|i| {
            let sign = |bit: u32| if i & bit != 0 { 1.0 } else { -1.0 };
            let local = DVec3::new(sign(1), sign(2), sign(4)) * half_extents;
            m.transform_point3(local)
        })
        .collect();
    TriMesh::new(vertices, CUBOID_TRIANGLES.to_vec()).unwrap_or_default()
}

/// Upward-facing rectangle at height `z`, two triangles.
pub fn floor_rect(min_xy: DVec2, max_xy: DVec2, z: f64) -> TriMesh {
    let (lo, hi) = (min_xy.min(max_xy), min_xy.max(max_xy));
    let vertices = vec![
        DVec3::new(lo.x, lo.y, z),
        DVec3::new(hi.x, lo.y, z),
        DVec3::new(hi.x, hi.y, z),
        DVec3::new(lo.x, hi.y, z),
    ];
    TriMesh::new(vertices, vec![[0, 1, 2], [0, 2, 3]]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_faces_point_outward() {
        let cube = cuboid(DVec3::splat(0.5), &Transform::default());
        for t in cube.iter_triangles() {
            let n = (t[1] - t[0]).cross(t[2] - t[0]);
            let c = (t[0] + t[1] + t[2]) / 3.0;
            assert!(n.dot(c) > 0.0, "inward triangle {t:?}");
        }
    }

    #[test]
    fn cuboid_applies_scale() {
        let t = Transform::default().with_scale(DVec3::new(2.0, 1.0, 1.0));
        let cube = cuboid(DVec3::splat(0.5), &t);
        let b = cube.bounds().unwrap();
        assert_eq!(b.extents(), DVec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn floor_rect_faces_up() {
        let f = floor_rect(DVec2::new(2.0, 2.0), DVec2::new(-2.0, -2.0), 0.0);
        assert!((f.area() - 16.0).abs() < 1e-12);
        for t in f.iter_triangles() {
            assert!((t[1] - t[0]).cross(t[2] - t[0]).z > 0.0);
        }
    }
}
