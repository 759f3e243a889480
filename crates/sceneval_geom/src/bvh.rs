//! Bounding volume hierarchy over the triangles of one mesh.
//!
//! Nodes live in a flat arena; leaves reference a contiguous run of the
//! `order` permutation, so triangle indices reported to callers are the
//! mesh's own indices.
//!
//! # Example
//! ```rust,ignore
//! let bvh = TriangleBvh::build(&floor_mesh);
//! let on_floor = bvh.first_hit(&Ray::down(p), 1e-6).is_some();
//! ```

use std::ops::ControlFlow;

use glam::DVec3;

use sceneval_core::{Aabb, TriMesh};

use crate::ray::{intersect_triangle, Ray, RayHit};

/// Triangles per leaf before a node is split.
const MAX_LEAF: usize = 4;

enum Kind {
    Leaf { start: usize, len: usize },
    Internal { left: usize, right: usize },
}

struct Node {
    bbox: Aabb,
    kind: Kind,
}

/// Median-split BVH; owns a copy of the triangle corners.
pub struct TriangleBvh {
    triangles: Vec<[DVec3; 3]>,
    tri_bounds: Vec<Aabb>,
    order: Vec<usize>,
    arena: Vec<Node>,
}

impl std::fmt::Debug for TriangleBvh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriangleBvh")
            .field("triangles", &self.triangles.len())
            .field("nodes", &self.arena.len())
            .finish()
    }
}

impl TriangleBvh {
    pub fn build(mesh: &TriMesh) -> Self {
        let triangles: Vec<[DVec3; 3]> = mesh.iter_triangles().collect();
        let tri_bounds: Vec<Aabb> = triangles
            .iter()
            .map(|t| Aabb::new(t[0].min(t[1]).min(t[2]), t[0].max(t[1]).max(t[2])))
            .collect();
        let mut bvh = Self {
            order: (0..triangles.len()).collect(),
            triangles,
            tri_bounds,
            arena: Vec::new(),
        };
        if !bvh.triangles.is_empty() {
            bvh.build_node(0, bvh.triangles.len());
        }
        bvh
    }

    /// Recursively builds the subtree over `order[start..start + len]` and
    /// returns its arena index.
    fn build_node(&mut self, start: usize, len: usize) -> usize {
        let items = &self.order[start..start + len];
        let bbox = items
            .iter()
            .map(|&i| self.tri_bounds[i])
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Aabb::new(DVec3::ZERO, DVec3::ZERO));

        let idx = self.arena.len();
        if len <= MAX_LEAF {
            self.arena.push(Node {
                bbox,
                kind: Kind::Leaf { start, len },
            });
            return idx;
        }

        // split at the median centroid along the longest centroid axis
        let centroid = |b: &Aabb| b.center();
        let axis = Aabb::from_points(items.iter().map(|&i| centroid(&self.tri_bounds[i])))
            .map(|c| c.longest_axis())
            .unwrap_or(0);
        let mid = len / 2;
        let bounds = &self.tri_bounds;
        self.order[start..start + len].select_nth_unstable_by(mid, |&a, &b| {
            centroid(&bounds[a])[axis].total_cmp(&centroid(&bounds[b])[axis])
        });

        // reserve the slot, then fill children
        self.arena.push(Node {
            bbox,
            kind: Kind::Leaf { start, len: 0 },
        });
        let left = self.build_node(start, mid);
        let right = self.build_node(start + mid, len - mid);
        self.arena[idx].kind = Kind::Internal { left, right };
        idx
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounds of the whole tree.
    pub fn bounds(&self) -> Option<Aabb> {
        self.arena.first().map(|n| n.bbox)
    }

    #[inline]
    pub fn triangle(&self, i: usize) -> &[DVec3; 3] {
        &self.triangles[i]
    }

    #[inline]
    pub fn triangle_bounds(&self, i: usize) -> &Aabb {
        &self.tri_bounds[i]
    }

    fn leaf_triangles(&self, start: usize, len: usize) -> &[usize] {
        &self.order[start..start + len]
    }

    // ── Ray queries ────────────────────────────────────────────────────────

    /// Closest hit along `ray`, or `None`.
    pub fn first_hit(&self, ray: &Ray, tolerance: f64) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut stack = Vec::with_capacity(32);
        if !self.arena.is_empty() {
            stack.push(0usize);
        }
        while let Some(n) = stack.pop() {
            let node = &self.arena[n];
            let Some(t_near) = ray.hits_aabb(&node.bbox, tolerance) else {
                continue;
            };
            if best.is_some_and(|b| t_near > b.t) {
                continue;
            }
            match node.kind {
                Kind::Leaf { start, len } => {
                    for &i in self.leaf_triangles(start, len) {
                        if let Some(t) = intersect_triangle(ray, &self.triangles[i], tolerance) {
                            if best.map_or(true, |b| t < b.t) {
                                best = Some(RayHit {
                                    t,
                                    triangle: i,
                                    point: ray.at(t),
                                });
                            }
                        }
                    }
                }
                Kind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        best
    }

    /// Every hit along `ray`, sorted by distance.
    pub fn all_hits(&self, ray: &Ray, tolerance: f64) -> Vec<RayHit> {
        let mut hits = Vec::new();
        let mut stack = Vec::with_capacity(32);
        if !self.arena.is_empty() {
            stack.push(0usize);
        }
        while let Some(n) = stack.pop() {
            let node = &self.arena[n];
            if ray.hits_aabb(&node.bbox, tolerance).is_none() {
                continue;
            }
            match node.kind {
                Kind::Leaf { start, len } => {
                    hits.extend(self.leaf_triangles(start, len).iter().filter_map(|&i| {
                        intersect_triangle(ray, &self.triangles[i], tolerance).map(|t| RayHit {
                            t,
                            triangle: i,
                            point: ray.at(t),
                        })
                    }));
                }
                Kind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        hits.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.triangle.cmp(&b.triangle)));
        hits
    }

    // ── Tree/tree queries ──────────────────────────────────────────────────

    /// Calls `f(self_triangle, other_triangle)` for every triangle pair whose
    /// bounds overlap, until `f` breaks.
    pub fn for_each_overlapping_pair<F>(&self, other: &TriangleBvh, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(usize, usize) -> ControlFlow<()>,
    {
        if self.arena.is_empty() || other.arena.is_empty() {
            return ControlFlow::Continue(());
        }
        let mut stack = vec![(0usize, 0usize)];
        while let Some((a, b)) = stack.pop() {
            let (na, nb) = (&self.arena[a], &other.arena[b]);
            if !na.bbox.overlaps(&nb.bbox) {
                continue;
            }
            match (&na.kind, &nb.kind) {
                (
                    Kind::Leaf { start: sa, len: la },
                    Kind::Leaf { start: sb, len: lb },
                ) => {
                    for &i in self.leaf_triangles(*sa, *la) {
                        for &j in other.leaf_triangles(*sb, *lb) {
                            if self.tri_bounds[i].overlaps(&other.tri_bounds[j]) {
                                f(i, j)?;
                            }
                        }
                    }
                }
                (Kind::Internal { left, right }, Kind::Leaf { .. }) => {
                    stack.push((*right, b));
                    stack.push((*left, b));
                }
                (Kind::Leaf { .. }, Kind::Internal { left, right }) => {
                    stack.push((a, *right));
                    stack.push((a, *left));
                }
                (Kind::Internal { left: al, right: ar }, Kind::Internal { left: bl, right: br }) => {
                    // descend the larger box first
                    let ea = na.bbox.extents();
                    let eb = nb.bbox.extents();
                    if ea.x * ea.y * ea.z >= eb.x * eb.y * eb.z {
                        stack.push((*ar, b));
                        stack.push((*al, b));
                    } else {
                        stack.push((a, *br));
                        stack.push((a, *bl));
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}
