//! Random points on a mesh surface.

use glam::DVec3;
use rand::Rng;

use sceneval_core::mesh::triangle_area;
use sceneval_core::TriMesh;

/// Draws `count` points uniformly over the surface of `mesh`.
///
/// Triangles are picked proportionally to their area, then a uniform
/// barycentric point is taken inside the chosen triangle. A mesh without
/// area yields no points.
pub fn sample_surface<R: Rng + ?Sized>(mesh: &TriMesh, count: usize, rng: &mut R) -> Vec<DVec3> {
    let mut cumulative = Vec::with_capacity(mesh.triangle_count());
    let mut total = 0.0;
    for t in mesh.iter_triangles() {
        total += triangle_area(&t);
        cumulative.push(total);
    }
    if total <= 0.0 || !total.is_finite() {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let target = rng.gen::<f64>() * total;
            let i = cumulative
                .partition_point(|&c| c <= target)
                .min(cumulative.len() - 1);
            let [a, b, c] = mesh.triangle(i);
            let r1: f64 = rng.gen::<f64>().sqrt();
            let r2: f64 = rng.gen();
            a * (1.0 - r1) + b * (r1 * (1.0 - r2)) + c * (r1 * r2)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sceneval_core::primitives::cuboid;
    use sceneval_core::Transform;

    #[test]
    fn points_lie_on_the_surface() {
        let cube = cuboid(DVec3::splat(0.5), &Transform::default());
        let mut rng = StdRng::seed_from_u64(7);
        let pts = sample_surface(&cube, 500, &mut rng);
        assert_eq!(pts.len(), 500);
        for p in pts {
            let m = p.abs().max_element();
            assert!((m - 0.5).abs() < 1e-9, "{p:?} is off the surface");
        }
    }

    #[test]
    fn same_seed_same_points() {
        let cube = cuboid(DVec3::splat(0.5), &Transform::default());
        let a = sample_surface(&cube, 50, &mut StdRng::seed_from_u64(3));
        let b = sample_surface(&cube, 50, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn area_weighting_prefers_large_faces() {
        // a flat box: top and bottom dominate the area
        let slab = cuboid(DVec3::new(1.0, 1.0, 0.01), &Transform::default());
        let pts = sample_surface(&slab, 2000, &mut StdRng::seed_from_u64(11));
        let on_caps = pts.iter().filter(|p| (p.z.abs() - 0.01).abs() < 1e-9).count();
        assert!(on_caps > 1800);
    }

    #[test]
    fn zero_area_mesh_yields_nothing() {
        assert!(sample_surface(&TriMesh::empty(), 10, &mut StdRng::seed_from_u64(0)).is_empty());
    }
}
