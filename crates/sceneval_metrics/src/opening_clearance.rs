//! Door and window clearance.
//!
//! For every opening and every side it can be approached from, a clearance
//! box is extruded from the opening into the room. Objects whose bounding
//! box reaches into it are interfering; their triangles on that side are
//! projected onto the opening plane to measure how much of the opening they
//! hide.

use std::collections::BTreeMap;

use glam::{DVec2, DVec3};
use image::GrayImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use sceneval_core::{ArchKind, Element, ElementKind, EvalError, EvalResult, SceneView};
use sceneval_geom::{raster, ObbConfig, OrientedBoundingBox};

use crate::diagnostics::DiagnosticSink;
use crate::floor::Floor;
use crate::metric::{Metric, MetricData, MetricKind, MetricResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningClearanceConfig {
    pub bounding_box: ObbConfig,
    /// Lattice resolution used to sample object bounding boxes.
    pub sample_resolution: usize,
    /// Distance from the opening center of the room-side probe point.
    pub within_room_point_offset: f64,
    pub map_pixel_per_meter: f64,
    pub door_check: bool,
    pub door_room_side_only: bool,
    /// Extrude doors by their own width instead of `door_extrude_distance`.
    pub door_use_width_as_extrude: bool,
    pub door_extrude_distance: f64,
    pub window_check: bool,
    pub window_room_side_only: bool,
    pub window_front_extrude_distance: f64,
    /// Start the extrusion at the opening face rather than its center.
    pub include_half_thickness: bool,
}

impl Default for OpeningClearanceConfig {
    fn default() -> Self {
        Self {
            bounding_box: ObbConfig::default(),
            sample_resolution: 10,
            within_room_point_offset: 0.1,
            map_pixel_per_meter: 100.0,
            door_check: true,
            door_room_side_only: true,
            door_use_width_as_extrude: true,
            door_extrude_distance: 1.0,
            window_check: true,
            window_room_side_only: true,
            window_front_extrude_distance: 0.5,
            include_half_thickness: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcclusionInfo {
    pub opening_occluded: bool,
    /// Fraction of the opening hidden by all interfering objects together.
    pub total_occlusion: f64,
    pub object_occlusions: BTreeMap<String, f64>,
}

/// Result for one approach side of an opening.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideClearance {
    pub direction: [f64; 3],
    pub interfering_obj_ids: Vec<String>,
    pub occlusion_info: OcclusionInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningClearanceData {
    pub check_doors: bool,
    pub door_room_side_only: bool,
    pub check_windows: bool,
    pub window_room_side_only: bool,
    pub door_clearance: BTreeMap<String, Vec<SideClearance>>,
    pub window_clearance: BTreeMap<String, Vec<SideClearance>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

/// Sides of one opening plus any non-fatal problem met while measuring it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpeningReport {
    pub sides: Vec<SideClearance>,
    pub error: Option<String>,
}

/// Per-kind settings resolved from the config.
#[derive(Debug, Clone, Copy)]
struct OpeningRules {
    room_side_only: bool,
    extrude: Extrude,
}

#[derive(Debug, Clone, Copy)]
enum Extrude {
    Width,
    Fixed(f64),
}

/// Opening-local extent of the projection image.
#[derive(Debug, Clone, Copy)]
struct OpeningWindow {
    u_min: f64,
    w_max: f64,
    width: u32,
    height: u32,
    ppm: f64,
}

impl OpeningWindow {
    fn pixel(&self, local: DVec3) -> DVec2 {
        DVec2::new(
            ((local.x - self.u_min) * self.ppm).trunc(),
            ((self.w_max - local.z) * self.ppm).trunc(),
        )
    }

    fn size(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpeningClearanceMetric {
    cfg: OpeningClearanceConfig,
}

impl OpeningClearanceMetric {
    pub fn new(cfg: OpeningClearanceConfig) -> Self {
        Self { cfg }
    }

    fn rules(&self, opening: &Element) -> EvalResult<OpeningRules> {
        let kind = match opening.kind {
            ElementKind::Arch(kind) => kind,
            ElementKind::Object => ArchKind::Other,
        };
        match kind {
            ArchKind::Door => Ok(OpeningRules {
                room_side_only: self.cfg.door_room_side_only,
                extrude: if self.cfg.door_use_width_as_extrude {
                    Extrude::Width
                } else {
                    Extrude::Fixed(self.cfg.door_extrude_distance)
                },
            }),
            ArchKind::Window => Ok(OpeningRules {
                room_side_only: self.cfg.window_room_side_only,
                extrude: Extrude::Fixed(self.cfg.window_front_extrude_distance),
            }),
            _ => Err(EvalError::UnknownOpening {
                id: opening.id.clone(),
            }),
        }
    }

    /// Measures one door or window of `scene`.
    ///
    /// The kind stored on the element decides door or window rules. Fails
    /// with [`EvalError::UnknownOpening`] for an element that is neither, and
    /// with [`EvalError::MissingFloor`] when only the
    /// room side is wanted but the scene has no floor to decide it.
    pub fn check_opening(
        &self,
        scene: &SceneView,
        id: &str,
        sink: &dyn DiagnosticSink,
    ) -> EvalResult<OpeningReport> {
        let floor = Floor::from_scene(scene).ok();
        self.check_opening_with(scene, floor.as_ref(), id, sink)
    }

    fn check_opening_with(
        &self,
        scene: &SceneView,
        floor: Option<&Floor>,
        id: &str,
        sink: &dyn DiagnosticSink,
    ) -> EvalResult<OpeningReport> {
        let opening = scene.element(id)?;
        let rules = self.rules(opening)?;
        let placement = &opening.placement;

        let front = placement.transform.front();
        let mut directions = vec![front, -front];
        if rules.room_side_only {
            let floor = floor.ok_or(EvalError::MissingFloor)?;
            let offset = self.cfg.within_room_point_offset;
            directions.retain(|&d| floor.is_above_floor(placement.center + d * offset, 0.0));
        }
        if directions.is_empty() {
            warn!("opening_clearance: {id} has no room-facing side");
        }

        let mut extrude = match rules.extrude {
            Extrude::Width => placement.extents.x,
            Extrude::Fixed(d) => d,
        };
        if self.cfg.include_half_thickness {
            extrude += placement.extents.y * 0.5;
        }

        let window = self.opening_window(opening);
        let mut report = OpeningReport::default();
        if window.size() == 0 {
            report.error = Some(format!("opening map of `{id}` has no pixels"));
        }

        for (k, dir) in directions.into_iter().enumerate() {
            let clearance = OrientedBoundingBox::new(
                placement.center + dir * (extrude * 0.5),
                DVec3::new(
                    placement.extents.x * 0.5,
                    extrude * 0.5,
                    placement.extents.z * 0.5,
                ),
                placement.axes(),
            );
            let interfering = self.interfering(scene, &clearance);
            debug!(
                "opening_clearance: {id} side {k}: {} interfering objects",
                interfering.len()
            );

            let local_dir = placement.transform.to_local(placement.transform.position + dir);
            let front_side = local_dir.y < 0.0;
            let scope = format!("opening_clearance/{id}/side_{k}");
            let occlusion_info =
                self.occlusion(opening, &interfering, &window, extrude, front_side, &scope, sink);

            report.sides.push(SideClearance {
                direction: dir.to_array(),
                interfering_obj_ids: interfering.iter().map(|o| o.id.clone()).collect(),
                occlusion_info,
            });
        }
        Ok(report)
    }

    /// Objects with at least one bbox sample inside the clearance box, in
    /// scene order.
    fn interfering<'s>(
        &self,
        scene: &'s SceneView,
        clearance: &OrientedBoundingBox,
    ) -> Vec<&'s Element> {
        let objects: Vec<&Element> = scene.objects().collect();
        objects
            .par_iter()
            .map(|obj| {
                let obb = OrientedBoundingBox::from_placement(&obj.placement);
                let hit = obb
                    .sample_points(self.cfg.sample_resolution)
                    .into_iter()
                    .any(|p| clearance.contains_point(p, &self.cfg.bounding_box));
                hit.then_some(*obj)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    fn opening_window(&self, opening: &Element) -> OpeningWindow {
        let t = &opening.placement.transform;
        let half = opening.placement.extents * 0.5;
        let (min, max) = opening
            .mesh
            .vertices()
            .iter()
            .map(|&v| t.to_local(v))
            .fold(None, |acc: Option<(DVec3, DVec3)>, p| match acc {
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
                None => Some((p, p)),
            })
            .unwrap_or((-half, half));
        let ppm = self.cfg.map_pixel_per_meter;
        let dim = |d: f64| {
            let px = (d * ppm).ceil();
            if px.is_finite() && px > 0.0 {
                px as u32
            } else {
                0
            }
        };
        OpeningWindow {
            u_min: min.x,
            w_max: max.z,
            width: dim(max.x - min.x),
            height: dim(max.z - min.z),
            ppm,
        }
    }

    /// Projects the triangles of `obj` that lie on the tested side of the
    /// opening. `None` when no triangle qualifies.
    fn occupancy_map(
        &self,
        opening: &Element,
        obj: &Element,
        window: &OpeningWindow,
        extrude: f64,
        front_side: bool,
    ) -> Option<GrayImage> {
        let t = &opening.placement.transform;
        let mut map: Option<GrayImage> = None;
        for tri in obj.mesh.iter_triangles() {
            let local = tri.map(|v| t.to_local(v));
            let min_v = local.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
            let max_v = local.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
            let selected = if front_side {
                min_v <= 0.0 && max_v >= -extrude
            } else {
                min_v <= extrude && max_v >= 0.0
            };
            if !selected {
                continue;
            }
            let img = map.get_or_insert_with(|| raster::blank(window.width, window.height));
            let pts = local.map(|p| window.pixel(p));
            raster::fill_convex_polygon(img, &pts, 255);
        }
        map
    }

    #[allow(clippy::too_many_arguments)]
    fn occlusion(
        &self,
        opening: &Element,
        interfering: &[&Element],
        window: &OpeningWindow,
        extrude: f64,
        front_side: bool,
        scope: &str,
        sink: &dyn DiagnosticSink,
    ) -> OcclusionInfo {
        let maps: Vec<(&str, GrayImage)> = interfering
            .iter()
            .filter_map(|obj| {
                self.occupancy_map(opening, obj, window, extrude, front_side)
                    .map(|m| (obj.id.as_str(), m))
            })
            .collect();

        let size = window.size();
        let fraction = |img: &GrayImage| {
            if size == 0 {
                0.0
            } else {
                raster::count_nonzero(img) as f64 / size as f64
            }
        };

        let mut combined = raster::blank(window.width, window.height);
        let mut object_occlusions = BTreeMap::new();
        for (id, map) in &maps {
            raster::union_into(&mut combined, map);
            object_occlusions.insert(id.to_string(), fraction(map));
        }

        if sink.enabled() {
            let mut own = raster::blank(window.width, window.height);
            let t = &opening.placement.transform;
            for tri in opening.mesh.iter_triangles() {
                let pts = tri.map(|v| window.pixel(t.to_local(v)));
                raster::fill_convex_polygon(&mut own, &pts, 255);
            }
            sink.gray(scope, "m1_opening_map", &own);
            for (id, map) in &maps {
                sink.gray(scope, &format!("m2_obj_{id}_occupancy_map"), map);
            }
            sink.gray(scope, "m3_combined_occupancy_map", &combined);
        }

        OcclusionInfo {
            opening_occluded: !maps.is_empty(),
            total_occlusion: fraction(&combined),
            object_occlusions,
        }
    }
}

/// `"Num doors: 2, only room side: true, 2 sides checked, 1 sides occluded"`
fn summary_line(kind: &str, room_side_only: bool, results: &BTreeMap<String, Vec<SideClearance>>) -> String {
    let sides = results.values().flatten();
    let checked = sides.clone().count();
    let occluded = sides.filter(|s| s.occlusion_info.opening_occluded).count();
    format!(
        "Num {kind}s: {}, only room side: {room_side_only}, {checked} sides checked, {occluded} sides occluded",
        results.len()
    )
}

impl Metric for OpeningClearanceMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::OpeningClearance
    }

    fn run(&self, scene: &SceneView, sink: &dyn DiagnosticSink) -> EvalResult<MetricResult> {
        let floor = Floor::from_scene(scene).ok();
        let mut data = OpeningClearanceData {
            check_doors: self.cfg.door_check,
            door_room_side_only: self.cfg.door_room_side_only,
            check_windows: self.cfg.window_check,
            window_room_side_only: self.cfg.window_room_side_only,
            ..OpeningClearanceData::default()
        };
        let mut lines = Vec::new();

        for (kind, enabled) in [
            (ArchKind::Door, self.cfg.door_check),
            (ArchKind::Window, self.cfg.window_check),
        ] {
            if !enabled {
                continue;
            }
            let mut results = BTreeMap::new();
            for id in scene.arch_ids(kind) {
                let report = match self.check_opening_with(scene, floor.as_ref(), id, sink) {
                    Ok(report) => report,
                    Err(EvalError::MissingFloor) => return Err(EvalError::MissingFloor),
                    Err(e) => {
                        warn!("opening_clearance: {e}");
                        data.errors.insert(id.to_string(), e.to_string());
                        continue;
                    }
                };
                if let Some(err) = report.error {
                    warn!("opening_clearance: {err}");
                    data.errors.insert(id.to_string(), err);
                }
                results.insert(id.to_string(), report.sides);
            }
            let room_side_only = match kind {
                ArchKind::Door => self.cfg.door_room_side_only,
                _ => self.cfg.window_room_side_only,
            };
            lines.push(summary_line(kind.as_str(), room_side_only, &results));
            match kind {
                ArchKind::Door => data.door_clearance = results,
                _ => data.window_clearance = results,
            }
        }

        let message = lines.join("\n");
        for line in &lines {
            info!("{line}");
        }
        Ok(MetricResult {
            message,
            data: MetricData::OpeningClearance(data),
        })
    }
}
