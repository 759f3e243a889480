//! Pairwise object collision.
//!
//! Each object is added to a run-local [`CollisionManager`], every later
//! object is tested against it, then it is removed again. A positive test is
//! confirmed by nudging the later object away from the mean contact point
//! and testing again; only pairs that still collide are reported. This
//! separates touching surfaces from real interpenetration.

use std::collections::BTreeMap;

use glam::DVec3;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use sceneval_core::{Element, EvalError, EvalResult, SceneView};
use sceneval_geom::collision::CollisionQuery;
use sceneval_geom::CollisionManager;

use crate::diagnostics::DiagnosticSink;
use crate::metric::{Metric, MetricData, MetricKind, MetricResult};

/// Separation directions shorter than this cannot be normalized.
const MIN_DIRECTION_LENGTH: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Distance the second object is moved for the confirmation test.
    pub move_direction_amount: f64,
    /// Cap on contact points gathered per pair.
    pub max_contacts: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            move_direction_amount: 0.005,
            max_contacts: 100_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectCollision {
    pub in_collision: bool,
    pub colliding_with: Vec<String>,
    /// Degeneracies hit while testing this object.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionData {
    pub scene_in_collision: bool,
    pub num_obj_in_collision: usize,
    pub collision_results: BTreeMap<String, ObjectCollision>,
}

#[derive(Debug, Clone, Default)]
pub struct CollisionMetric {
    cfg: CollisionConfig,
}

impl CollisionMetric {
    pub fn new(cfg: CollisionConfig) -> Self {
        Self { cfg }
    }

    /// Runs the confirmation test for a positive first test of `other`.
    ///
    /// Returns the verdict and, when the direction was degenerate, a note.
    fn confirm(
        &self,
        manager: &CollisionManager<'_>,
        other: &Element,
        first: &CollisionQuery,
    ) -> (bool, Option<String>) {
        let points: Vec<DVec3> = first.contacts.iter().map(|c| c.point).collect();
        if points.is_empty() {
            return (true, None);
        }
        let mean = points.iter().copied().sum::<DVec3>() / points.len() as f64;
        let dir = other.mesh.centroid() - mean;
        let len = dir.length();
        if len <= MIN_DIRECTION_LENGTH || !len.is_finite() {
            let note = format!(
                "separation direction for `{}` is degenerate; first positive kept",
                other.id
            );
            warn!("collision: {note}");
            return (true, Some(note));
        }
        let moved = other
            .mesh
            .translated(dir / len * self.cfg.move_direction_amount);
        (manager.in_collision_single(&moved, false).in_collision, None)
    }
}

impl Metric for CollisionMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Collision
    }

    fn run(&self, scene: &SceneView, _sink: &dyn DiagnosticSink) -> EvalResult<MetricResult> {
        if scene.is_empty() {
            return Err(EvalError::EmptyScene { metric: "collision" });
        }
        let objects: Vec<&Element> = scene.objects().collect();

        let mut results: BTreeMap<String, ObjectCollision> = objects
            .iter()
            .map(|o| (o.id.clone(), ObjectCollision::default()))
            .collect();

        let degenerate: Vec<bool> = objects.iter().map(|o| o.mesh.is_degenerate()).collect();
        for (o, _) in objects.iter().zip(&degenerate).filter(|&(_, &d)| d) {
            warn!("collision: mesh of `{}` is degenerate; treated as collision-free", o.id);
            if let Some(r) = results.get_mut(&o.id) {
                r.notes
                    .push("mesh is degenerate; treated as collision-free".to_string());
            }
        }

        let mut manager = CollisionManager::new().with_max_contacts(self.cfg.max_contacts);
        for (i, obj) in objects.iter().enumerate() {
            if degenerate[i] {
                continue;
            }
            manager.add_object(obj.id.clone(), &obj.mesh);

            for (j, other) in objects.iter().enumerate().skip(i + 1) {
                if degenerate[j] {
                    continue;
                }
                let first = manager.in_collision_single(&other.mesh, true);
                let (confirmed, note) = if first.in_collision {
                    self.confirm(&manager, other, &first)
                } else {
                    (false, None)
                };
                debug!(
                    "collision: {} vs {}: first {}, confirmed {}",
                    obj.id, other.id, first.in_collision, confirmed
                );

                if let Some(note) = note {
                    for id in [&obj.id, &other.id] {
                        if let Some(r) = results.get_mut(id) {
                            r.notes.push(note.clone());
                        }
                    }
                }
                if confirmed {
                    for (a, b) in [(&obj.id, &other.id), (&other.id, &obj.id)] {
                        if let Some(r) = results.get_mut(a) {
                            r.in_collision = true;
                            r.colliding_with.push(b.clone());
                        }
                    }
                }
            }

            manager.remove_object(&obj.id);
        }

        let num_obj_in_collision = results.values().filter(|r| r.in_collision).count();
        let scene_in_collision = num_obj_in_collision > 0;
        let message = format!(
            "Scene is in collision: {scene_in_collision}, with {num_obj_in_collision}/{} objects in collision.",
            objects.len()
        );
        info!("{message}");

        Ok(MetricResult {
            message,
            data: MetricData::Collision(CollisionData {
                scene_in_collision,
                num_obj_in_collision,
                collision_results: results,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::fixtures;
    use sceneval_core::primitives::cuboid;
    use sceneval_core::{TriMesh, Transform};

    fn run(scene: &SceneView) -> CollisionData {
        let result = CollisionMetric::default().run(scene, &NullSink).unwrap();
        result.data.as_collision().cloned().unwrap()
    }

    fn cubes(spacing: f64) -> SceneView {
        let mut scene = fixtures::room(4.0);
        let size = DVec3::splat(0.5);
        fixtures::add_box(&mut scene, "cube_a", DVec3::new(0.0, 0.0, 0.25), size, 0.0);
        fixtures::add_box(&mut scene, "cube_b", DVec3::new(spacing, 0.0, 0.25), size, 0.0);
        scene
    }

    #[test]
    fn touching_cubes_do_not_collide() {
        let data = run(&cubes(0.5));
        assert!(!data.scene_in_collision);
        assert_eq!(data.num_obj_in_collision, 0);
        assert!(data.collision_results["cube_a"].colliding_with.is_empty());
    }

    #[test]
    fn overlapping_cubes_collide_both_ways() {
        let data = run(&cubes(0.3));
        assert!(data.scene_in_collision);
        assert_eq!(data.num_obj_in_collision, 2);
        assert_eq!(data.collision_results["cube_a"].colliding_with, ["cube_b"]);
        assert_eq!(data.collision_results["cube_b"].colliding_with, ["cube_a"]);
    }

    #[test]
    fn collision_is_symmetric_and_never_self() {
        let mut scene = fixtures::room(6.0);
        let size = DVec3::new(0.6, 0.4, 0.5);
        let centers = [
            (0.0, 0.0, 0.3),
            (0.4, 0.1, 0.9),
            (2.0, 2.0, 0.0),
            (0.2, -0.3, -0.4),
            (-2.0, 1.0, 0.2),
        ];
        for (k, (x, y, yaw)) in centers.iter().enumerate() {
            fixtures::add_box(&mut scene, &format!("obj_{k}"), DVec3::new(*x, *y, 0.25), size, *yaw);
        }
        let data = run(&scene);
        for (id, r) in &data.collision_results {
            assert!(!r.colliding_with.contains(id));
            assert_eq!(r.in_collision, !r.colliding_with.is_empty());
            for other in &r.colliding_with {
                assert!(data.collision_results[other].colliding_with.contains(id));
            }
        }
        assert!(data.collision_results["obj_0"].in_collision);
        assert!(!data.collision_results["obj_2"].in_collision);
    }

    #[test]
    fn enclosed_object_collides() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "cabinet", DVec3::new(0.0, 0.0, 0.5), DVec3::ONE, 0.0);
        fixtures::add_box(&mut scene, "vase", DVec3::new(0.2, 0.1, 0.4), DVec3::splat(0.2), 0.0);
        let data = run(&scene);
        assert_eq!(data.collision_results["cabinet"].colliding_with, ["vase"]);
        assert_eq!(data.collision_results["vase"].colliding_with, ["cabinet"]);
    }

    #[test]
    fn concentric_enclosure_keeps_first_positive() {
        // inner cube's contact mean is its own centroid, so the separation
        // direction is zero
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "outer", DVec3::new(0.0, 0.0, 0.5), DVec3::ONE, 0.0);
        fixtures::add_box(&mut scene, "inner", DVec3::new(0.0, 0.0, 0.5), DVec3::splat(0.3), 0.0);
        let data = run(&scene);
        let outer = &data.collision_results["outer"];
        assert!(outer.in_collision);
        assert_eq!(outer.notes.len(), 1);
    }

    #[test]
    fn degenerate_mesh_is_noted_not_fatal() {
        let mut scene = cubes(0.3);
        scene
            .add_object("decal", TriMesh::empty())
            .with_transform(Transform::default())
            .build()
            .unwrap();
        let data = run(&scene);
        assert_eq!(data.num_obj_in_collision, 2);
        assert!(!data.collision_results["decal"].in_collision);
        assert_eq!(data.collision_results["decal"].notes.len(), 1);
    }

    #[test]
    fn empty_scene_is_rejected() {
        let scene = fixtures::room(4.0);
        let err = CollisionMetric::default().run(&scene, &NullSink).unwrap_err();
        assert_eq!(err, EvalError::EmptyScene { metric: "collision" });
    }

    #[test]
    fn runs_are_idempotent() {
        let scene = cubes(0.3);
        let m = CollisionMetric::default();
        let a = m.run(&scene, &NullSink).unwrap();
        let b = m.run(&scene, &NullSink).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.message,
            "Scene is in collision: true, with 2/2 objects in collision."
        );
    }

    #[test]
    fn confirmation_rejects_grazing_contact() {
        // a thin plate lying on top of a box touches it without overlap
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "table", DVec3::new(0.0, 0.0, 0.4), DVec3::new(1.0, 0.6, 0.8), 0.0);
        let t = Transform::from_position(DVec3::new(0.1, 0.0, 0.81));
        scene
            .add_object("tray", cuboid(DVec3::new(0.2, 0.15, 0.01), &t))
            .with_transform(t)
            .build()
            .unwrap();
        let data = run(&scene);
        assert!(!data.scene_in_collision);
    }
}
