//! Mesh-vs-mesh collision queries.
//!
//! A [`CollisionManager`] holds borrowed resident meshes (each with its own
//! BVH) and tests a query mesh against all of them. It is owned by a single
//! analyzer run and dropped with it.
//!
//! # Example
//! ```rust,ignore
//! let mut manager = CollisionManager::new();
//! manager.add_object("sofa_0", &sofa);
//! let result = manager.in_collision_single(&table, true);
//! if result.in_collision {
//!     println!("{} contacts", result.contacts.len());
//! }
//! manager.remove_object("sofa_0");
//! ```

use std::ops::ControlFlow;

use glam::DVec3;
use log::debug;

use sceneval_core::TriMesh;

use crate::bvh::TriangleBvh;
use crate::ray::Ray;
use crate::tri_tri::triangle_contact;

/// Direction of the inside/outside parity ray; skewed so it rarely grazes
/// an edge of axis-aligned geometry.
const PARITY_DIR: DVec3 = DVec3::new(0.5773, 0.5781, 0.5766);

/// One contact between the query mesh and a resident object.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// Name of the resident object touched.
    pub object: String,
    /// World-space contact point.
    pub point: DVec3,
}

/// Outcome of [`CollisionManager::in_collision_single`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionQuery {
    pub in_collision: bool,
    /// Contact evidence; empty unless requested.
    pub contacts: Vec<Contact>,
}

struct Resident<'a> {
    name: String,
    mesh: &'a TriMesh,
    bvh: TriangleBvh,
}

/// Set of resident meshes that query meshes are tested against.
pub struct CollisionManager<'a> {
    residents: Vec<Resident<'a>>,
    max_contacts: usize,
}

impl Default for CollisionManager<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CollisionManager<'a> {
    pub fn new() -> Self {
        Self {
            residents: Vec::new(),
            max_contacts: 100_000,
        }
    }

    /// Caps the contact evidence gathered per resident.
    pub fn with_max_contacts(mut self, max_contacts: usize) -> Self {
        self.max_contacts = max_contacts.max(1);
        self
    }

    /// Adds (or replaces) a resident mesh.
    pub fn add_object(&mut self, name: impl Into<String>, mesh: &'a TriMesh) {
        let name = name.into();
        self.remove_object(&name);
        self.residents.push(Resident {
            bvh: TriangleBvh::build(mesh),
            name,
            mesh,
        });
    }

    /// Returns `true` if a resident named `name` existed.
    pub fn remove_object(&mut self, name: &str) -> bool {
        let before = self.residents.len();
        self.residents.retain(|r| r.name != name);
        self.residents.len() != before
    }

    pub fn len(&self) -> usize {
        self.residents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    /// Tests `mesh` against every resident.
    ///
    /// Surface contacts come from triangle pairs. When surfaces never meet
    /// but one mesh sits entirely inside the other, the enclosed mesh's
    /// vertices are returned as contact evidence.
    pub fn in_collision_single(&self, mesh: &TriMesh, return_contacts: bool) -> CollisionQuery {
        let mut result = CollisionQuery::default();
        if mesh.is_empty() {
            return result;
        }
        let query = TriangleBvh::build(mesh);

        for resident in &self.residents {
            let (Some(rb), Some(qb)) = (resident.bvh.bounds(), query.bounds()) else {
                continue;
            };
            if !rb.overlaps(&qb) {
                continue;
            }

            let mut points: Vec<DVec3> = Vec::new();
            let limit = if return_contacts { self.max_contacts } else { 1 };
            let _ = resident.bvh.for_each_overlapping_pair(&query, |i, j| {
                match triangle_contact(resident.bvh.triangle(i), query.triangle(j)) {
                    Some(p) => {
                        points.push(p);
                        if points.len() >= limit {
                            ControlFlow::Break(())
                        } else {
                            ControlFlow::Continue(())
                        }
                    }
                    None => ControlFlow::Continue(()),
                }
            });

            if return_contacts && points.len() >= limit {
                debug!(
                    "contact cap of {limit} reached against `{}`",
                    resident.name
                );
            }
            if points.is_empty() {
                if let Some(enclosed) = enclosure_evidence(resident, mesh, &query) {
                    debug!(
                        "no surface contact with `{}`, {} enclosed vertices used",
                        resident.name,
                        enclosed.len()
                    );
                    points = enclosed;
                }
            }
            if points.is_empty() {
                continue;
            }

            result.in_collision = true;
            if !return_contacts {
                return result;
            }
            result
                .contacts
                .extend(points.into_iter().map(|point| Contact {
                    object: resident.name.clone(),
                    point,
                }));
        }
        result
    }
}

/// Vertices of whichever mesh lies inside the other, if either does.
fn enclosure_evidence(resident: &Resident<'_>, mesh: &TriMesh, query: &TriangleBvh) -> Option<Vec<DVec3>> {
    let rb = resident.bvh.bounds()?;
    let qb = query.bounds()?;
    if rb.contains_aabb(&qb) && point_inside(&resident.bvh, *mesh.vertices().first()?) {
        return Some(mesh.vertices().to_vec());
    }
    if qb.contains_aabb(&rb) && point_inside(query, *resident.mesh.vertices().first()?) {
        return Some(resident.mesh.vertices().to_vec());
    }
    None
}

/// Ray-parity inside test against a closed mesh.
pub fn point_inside(bvh: &TriangleBvh, p: DVec3) -> bool {
    let Some(ray) = Ray::new(p, PARITY_DIR) else {
        return false;
    };
    let hits = bvh.all_hits(&ray, 0.0);
    let mut crossings = 0usize;
    let mut last_t = f64::NEG_INFINITY;
    for hit in hits.iter().filter(|h| h.t > 1e-12) {
        // a crossing through a shared edge shows up once per triangle
        if hit.t - last_t > 1e-9 {
            crossings += 1;
            last_t = hit.t;
        }
    }
    crossings % 2 == 1
}
