//! Floor containment.
//!
//! Points are sampled on each object's surface and cast straight down onto
//! the unioned floor mesh. An object whose in-bound fraction falls below the
//! threshold is hanging past the floor boundary (through a wall, off the
//! edge of an L-shaped room, and so on).

use std::collections::BTreeMap;

use glam::DVec3;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use sceneval_core::{Element, EvalError, EvalResult, SceneView};
use sceneval_geom::sampling::sample_surface;

use crate::diagnostics::DiagnosticSink;
use crate::floor::Floor;
use crate::metric::{Metric, MetricData, MetricKind, MetricResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutOfBoundConfig {
    /// Minimum in-bound fraction for an object to count as in bound.
    pub threshold: f64,
    /// Sample points per cubic meter of bounding-box volume.
    pub volume_sample_multiplier: f64,
    pub min_sample_points: usize,
    /// Slack of the downward ray/floor test.
    pub ray_tolerance: f64,
    /// Base seed for the per-object samplers; `None` draws one per run.
    pub seed: Option<u64>,
}

impl Default for OutOfBoundConfig {
    fn default() -> Self {
        Self {
            threshold: 0.99,
            volume_sample_multiplier: 5000.0,
            min_sample_points: 1000,
            ray_tolerance: 1e-6,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectBound {
    pub num_sampled_points: usize,
    pub num_out_of_bound: usize,
    pub ratio_in_bound: f64,
    pub out_of_bound: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-object containment, keyed by object id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutOfBoundData {
    pub objects: BTreeMap<String, ObjectBound>,
}

impl OutOfBoundData {
    pub fn num_out_of_bound(&self) -> usize {
        self.objects.values().filter(|o| o.out_of_bound).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutOfBoundMetric {
    cfg: OutOfBoundConfig,
}

impl OutOfBoundMetric {
    pub fn new(cfg: OutOfBoundConfig) -> Self {
        Self { cfg }
    }

    /// Number of surface samples for an object of the given bbox volume.
    pub fn sample_count(&self, volume: f64) -> usize {
        let scaled = volume * self.cfg.volume_sample_multiplier;
        if scaled.is_finite() && scaled > self.cfg.min_sample_points as f64 {
            scaled as usize
        } else {
            self.cfg.min_sample_points
        }
    }

    /// Samples whose downward ray meets the floor.
    fn floor_hits(&self, floor: &Floor, points: &[DVec3]) -> usize {
        points
            .iter()
            .filter(|&&p| floor.is_above_floor(p, self.cfg.ray_tolerance))
            .count()
    }

    fn check_object(&self, floor: &Floor, obj: &Element, seed: u64) -> EvalResult<ObjectBound> {
        if obj.mesh.is_degenerate() {
            let err = EvalError::DegenerateMesh { id: obj.id.clone() };
            warn!("out_of_bound: {err}");
            return Ok(ObjectBound {
                error: Some(err.to_string()),
                ..ObjectBound::default()
            });
        }

        let wanted = self.sample_count(bbox_volume(obj));
        let mut rng = StdRng::seed_from_u64(seed);
        let points = sample_surface(&obj.mesh, wanted, &mut rng);
        let hits = self.floor_hits(floor, &points);
        let n = points.len();
        if n != wanted {
            warn!("out_of_bound: {} got {n} of {wanted} samples", obj.id);
        }
        if hits > n || n == 0 {
            let err = EvalError::invariant(format!(
                "`{}` has {hits} floor hits for {n} samples",
                obj.id
            ));
            error!("out_of_bound: {err}");
            return Err(err);
        }

        let num_out = n - hits;
        let ratio = 1.0 - num_out as f64 / n as f64;
        debug!("out_of_bound: {} {hits}/{n} samples over the floor", obj.id);
        Ok(ObjectBound {
            num_sampled_points: n,
            num_out_of_bound: num_out,
            ratio_in_bound: ratio,
            out_of_bound: ratio < self.cfg.threshold,
            error: None,
        })
    }
}

/// Default-pose bounding-box volume, falling back to the world AABB.
fn bbox_volume(obj: &Element) -> f64 {
    let e = obj.placement.extents;
    let v = e.x * e.y * e.z;
    if v.is_finite() && v > 0.0 {
        return v;
    }
    obj.mesh
        .bounds()
        .map(|b| {
            let e: DVec3 = b.extents();
            e.x * e.y * e.z
        })
        .unwrap_or(0.0)
}

impl Metric for OutOfBoundMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::OutOfBound
    }

    fn run(&self, scene: &SceneView, _sink: &dyn DiagnosticSink) -> EvalResult<MetricResult> {
        if scene.is_empty() {
            return Err(EvalError::EmptyScene { metric: "out_of_bound" });
        }
        let floor = Floor::from_scene(scene)?;
        let base_seed = self.cfg.seed.unwrap_or_else(rand::random);
        debug!("out_of_bound: base seed {base_seed}");

        let objects: Vec<&Element> = scene.objects().collect();
        let checked: Vec<(String, ObjectBound)> = objects
            .par_iter()
            .enumerate()
            .map(|(i, obj)| {
                let seed = base_seed.wrapping_add(i as u64);
                self.check_object(&floor, obj, seed)
                    .map(|r| (obj.id.clone(), r))
            })
            .collect::<EvalResult<_>>()?;

        let data = OutOfBoundData {
            objects: checked.into_iter().collect(),
        };
        let message = format!(
            "{}/{} objects are out of bound",
            data.num_out_of_bound(),
            objects.len()
        );
        info!("{message}");

        Ok(MetricResult {
            message,
            data: MetricData::OutOfBound(data),
        })
    }
}
