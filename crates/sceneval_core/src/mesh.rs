//! Immutable triangle meshes.
//!
//! A [`TriMesh`] holds world-space vertex positions and `u32` index triples.
//! Indices are validated once at construction so every accessor afterwards
//! can index without bounds worries.

use glam::{DMat4, DVec3};

use crate::bounds::Aabb;
use crate::error::{EvalError, EvalResult};
use crate::transform::Transform;

/// Triangulated surface with world-space vertices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriMesh {
    vertices: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
    bounds: Option<Aabb>,
}

impl TriMesh {
    /// Build a mesh, rejecting out-of-range indices.
    ///
    /// The error carries the id `"<unnamed>"`; scene builders report the
    /// owning element id instead.
    pub fn new(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> EvalResult<Self> {
        let n = vertices.len();
        if let Some((i, tri)) = triangles
            .iter()
            .enumerate()
            .find(|(_, t)| t.iter().any(|&v| v as usize >= n))
        {
            return Err(EvalError::InvalidMesh {
                id: "<unnamed>".into(),
                reason: format!("triangle {i} references {tri:?} but there are {n} vertices"),
            });
        }
        let bounds = Aabb::from_points(vertices.iter().copied());
        Ok(Self {
            vertices,
            triangles,
            bounds,
        })
    }

    /// An empty mesh (no vertices, no triangles).
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of triangle `i`.
    #[inline]
    pub fn triangle(&self, i: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangles[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Iterates over the corner positions of every triangle.
    pub fn iter_triangles(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        (0..self.triangles.len()).map(move |i| self.triangle(i))
    }

    /// Axis-aligned bounds; `None` for a mesh without vertices.
    #[inline]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Total surface area.
    pub fn area(&self) -> f64 {
        self.iter_triangles().map(|t| triangle_area(&t)).sum()
    }

    /// Enclosed volume by the divergence theorem.
    ///
    /// Only meaningful for closed meshes; the absolute value is returned so
    /// inward-wound meshes still report a positive volume.
    pub fn volume(&self) -> f64 {
        let signed: f64 = self
            .iter_triangles()
            .map(|[a, b, c]| a.dot(b.cross(c)))
            .sum();
        (signed / 6.0).abs()
    }

    /// Area-weighted mean of triangle centers, or the vertex mean when the
    /// surface has no area.
    pub fn centroid(&self) -> DVec3 {
        let mut weighted = DVec3::ZERO;
        let mut total = 0.0;
        for t in self.iter_triangles() {
            let area = triangle_area(&t);
            weighted += (t[0] + t[1] + t[2]) / 3.0 * area;
            total += area;
        }
        if total > 0.0 && weighted.is_finite() {
            return weighted / total;
        }
        if self.vertices.is_empty() {
            return DVec3::ZERO;
        }
        self.vertices.iter().copied().sum::<DVec3>() / self.vertices.len() as f64
    }

    /// A copy moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        let vertices: Vec<DVec3> = self.vertices.iter().map(|&v| v + offset).collect();
        Self {
            bounds: self.bounds.map(|b| Aabb::new(b.min + offset, b.max + offset)),
            vertices,
            triangles: self.triangles.clone(),
        }
    }

    /// A copy with every vertex mapped through `matrix`.
    pub fn transformed(&self, matrix: &DMat4) -> Self {
        let vertices: Vec<DVec3> = self
            .vertices
            .iter()
            .map(|&v| matrix.transform_point3(v))
            .collect();
        Self {
            bounds: Aabb::from_points(vertices.iter().copied()),
            vertices,
            triangles: self.triangles.clone(),
        }
    }

    /// Merge several meshes into one, re-basing indices.
    pub fn concatenate<'a, I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a TriMesh>,
    {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for mesh in meshes {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&mesh.vertices);
            triangles.extend(
                mesh.triangles
                    .iter()
                    .map(|[a, b, c]| [a + base, b + base, c + base]),
            );
        }
        Self {
            bounds: Aabb::from_points(vertices.iter().copied()),
            vertices,
            triangles,
        }
    }

    /// `true` when the mesh cannot take part in a surface query: no
    /// triangles, a non-finite vertex, or zero total area.
    pub fn is_degenerate(&self) -> bool {
        self.triangles.is_empty()
            || self.vertices.iter().any(|v| !v.is_finite())
            || self.area() <= f64::EPSILON
    }

    /// Bounding box of the mesh in the rigid local frame of `transform`.
    ///
    /// Returns `(extents, world_center)`: the full side lengths along the
    /// local axes and the box center mapped back to world space.
    pub fn local_fit(&self, transform: &Transform) -> Option<(DVec3, DVec3)> {
        let local = Aabb::from_points(self.vertices.iter().map(|&v| transform.to_local(v)))?;
        let center = transform.rigid_matrix().transform_point3(local.center());
        Some((local.extents(), center))
    }
}

/// Area of one triangle.
#[inline]
pub fn triangle_area(t: &[DVec3; 3]) -> f64 {
    0.5 * (t[1] - t[0]).cross(t[2] - t[0]).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;

    #[test]
    fn rejects_out_of_range_index() {
        let err = TriMesh::new(vec![DVec3::ZERO, DVec3::X], vec![[0, 1, 2]]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidMesh { .. }));
    }

    #[test]
    fn cube_properties() {
        let cube = cuboid(DVec3::splat(0.5), &Transform::default());
        assert!((cube.area() - 6.0).abs() < 1e-12);
        assert!((cube.volume() - 1.0).abs() < 1e-12);
        assert!(cube.centroid().length() < 1e-12);
        assert!(!cube.is_degenerate());
    }

    #[test]
    fn translate_moves_bounds_and_centroid() {
        let cube = cuboid(DVec3::splat(0.5), &Transform::default());
        let moved = cube.translated(DVec3::new(2.0, 0.0, 0.0));
        assert!((moved.centroid() - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(moved.bounds().unwrap().min.x, 1.5);
        assert!((moved.volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn concatenate_rebases_indices() {
        let a = cuboid(DVec3::splat(0.5), &Transform::default());
        let b = a.translated(DVec3::new(3.0, 0.0, 0.0));
        let both = TriMesh::concatenate([&a, &b]);
        assert_eq!(both.triangle_count(), 24);
        assert_eq!(both.triangle(12), b.triangle(0));
        assert!((both.area() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn flat_or_empty_meshes_are_degenerate() {
        assert!(TriMesh::empty().is_degenerate());
        let sliver = TriMesh::new(vec![DVec3::ZERO, DVec3::X, DVec3::X * 2.0], vec![[0, 1, 2]])
            .unwrap();
        assert!(sliver.is_degenerate());
    }

    #[test]
    fn local_fit_undoes_yaw() {
        let t = Transform::from_position(DVec3::new(1.0, 2.0, 0.5))
            .with_yaw(std::f64::consts::FRAC_PI_4);
        let cube = cuboid(DVec3::new(1.0, 0.25, 0.5), &t);
        let (extents, center) = cube.local_fit(&t).unwrap();
        assert!((extents - DVec3::new(2.0, 0.5, 1.0)).length() < 1e-9);
        assert!((center - t.position).length() < 1e-9);
    }
}
