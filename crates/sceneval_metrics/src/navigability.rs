//! Walkable floor fraction.
//!
//! The floor is rasterized into a square top-down map, eroded by the robot
//! width so its center keeps clear of the walls, and every object footprint
//! below the height threshold is stamped in as an obstacle (inflated by the
//! same width). The score is the largest 8-connected walkable region over
//! the eroded floor area measured before obstacles are removed, so it drops
//! with the floor the footprints cover and not only when the walkable space
//! splits into pieces. An empty room scores exactly 1.

use glam::DVec2;
use image::{GrayImage, Rgb, RgbImage};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use sceneval_core::{EvalError, EvalResult, Placement, SceneView};
use sceneval_geom::raster;

use crate::diagnostics::DiagnosticSink;
use crate::floor::Floor;
use crate::metric::{Metric, MetricData, MetricKind, MetricResult};

const SCOPE: &str = "navigability";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigabilityConfig {
    /// Also report obstacle pixels over obstacle plus walkable pixels.
    pub calculate_object_area: bool,
    /// Side of the square floor map, in pixels.
    pub image_resolution: u32,
    /// Robot footprint width in meters.
    pub robot_width: f64,
    /// Border added around the floor extent, in meters.
    pub scale_margin: f64,
    /// Objects whose bbox center is higher than this above the floor are
    /// ignored.
    pub obj_height_threshold: f64,
    pub floor_color: [u8; 3],
    pub obj_color: [u8; 3],
}

impl Default for NavigabilityConfig {
    fn default() -> Self {
        Self {
            calculate_object_area: false,
            image_resolution: 256,
            robot_width: 0.2,
            scale_margin: 0.2,
            obj_height_threshold: 2.0,
            floor_color: [255, 0, 0],
            obj_color: [0, 255, 0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigabilityData {
    pub navigability: f64,
    pub connected_components: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_area_ratio: Option<f64>,
}

// ─── World → image mapping ─────────────────────────────────────────────────

/// Square top-down frame centered on the floor: `±scale` meters map to
/// `±half` pixels around the image center, with image y pointing to -Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorFrame {
    pub center: DVec2,
    pub scale: f64,
    pub half: f64,
}

impl FloorFrame {
    pub fn new(floor: &Floor, resolution: u32, margin: f64) -> Self {
        let center = floor.bounds().center().truncate();
        let reach = floor
            .mesh()
            .vertices()
            .iter()
            .map(|v| (v.truncate() - center).abs().max_element())
            .fold(0.0, f64::max);
        Self {
            center,
            scale: reach + margin,
            half: (resolution / 2) as f64,
        }
    }

    /// Pixel coordinates of a world XY point, truncated to whole pixels.
    pub fn to_image(&self, p: DVec2) -> DVec2 {
        let rel = p - self.center;
        DVec2::new(
            (rel.x / self.scale * self.half).trunc() + self.half,
            (-rel.y / self.scale * self.half).trunc() + self.half,
        )
    }

    /// Length in whole pixels.
    pub fn pixels(&self, meters: f64) -> u32 {
        (meters / self.scale * self.half) as u32
    }
}

/// Corners of a rotated rectangle in image space.
///
/// Matches the usual `boxPoints` layout: starting at the corner that is
/// left and below the center for an unrotated box, then clockwise on
/// screen. Corners are truncated to whole pixels.
pub fn footprint_corners(center: DVec2, size: DVec2, yaw: f64) -> [DVec2; 4] {
    let theta = -yaw;
    let b = theta.cos() * 0.5;
    let a = theta.sin() * 0.5;
    let (w, h) = (size.x, size.y);
    let p0 = DVec2::new(center.x - a * h - b * w, center.y + b * h - a * w);
    let p1 = DVec2::new(center.x + a * h - b * w, center.y - b * h - a * w);
    let p2 = 2.0 * center - p0;
    let p3 = 2.0 * center - p1;
    [p0, p1, p2, p3].map(|p| p.trunc())
}

// ─── Metric ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct NavigabilityMetric {
    cfg: NavigabilityConfig,
}

impl NavigabilityMetric {
    pub fn new(cfg: NavigabilityConfig) -> Self {
        Self { cfg }
    }

    fn floor_plan(&self, floor: &Floor, frame: &FloorFrame, res: u32) -> GrayImage {
        let mut img = raster::blank(res, res);
        for tri in floor.mesh().iter_triangles() {
            let pts = tri.map(|v| frame.to_image(v.truncate()));
            raster::fill_convex_polygon(&mut img, &pts, 255);
        }
        img
    }

    fn obstacle_map(
        &self,
        scene: &SceneView,
        frame: &FloorFrame,
        floor_z: f64,
        res: u32,
        thickness: u32,
    ) -> GrayImage {
        let mut img = raster::blank(res, res);
        for obj in scene.objects() {
            let p: &Placement = &obj.placement;
            if p.center.z - floor_z > self.cfg.obj_height_threshold {
                debug!("navigability: {} is above the height threshold", obj.id);
                continue;
            }
            let size = DVec2::new(
                frame.pixels(p.extents.x) as f64,
                frame.pixels(p.extents.y) as f64,
            );
            let corners = footprint_corners(
                frame.to_image(p.center.truncate()),
                size,
                p.transform.yaw(),
            );
            raster::draw_closed_polyline(&mut img, &corners, thickness, 255);
            raster::fill_convex_polygon(&mut img, &corners, 255);
        }
        img
    }

    fn paint(&self, floor: &GrayImage, obstacles: Option<&GrayImage>) -> RgbImage {
        RgbImage::from_fn(floor.width(), floor.height(), |x, y| {
            if obstacles.is_some_and(|o| o.get_pixel(x, y)[0] != 0) {
                Rgb(self.cfg.obj_color)
            } else if floor.get_pixel(x, y)[0] != 0 {
                Rgb(self.cfg.floor_color)
            } else {
                Rgb([0, 0, 0])
            }
        })
    }
}

impl Metric for NavigabilityMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Navigability
    }

    fn run(&self, scene: &SceneView, sink: &dyn DiagnosticSink) -> EvalResult<MetricResult> {
        let floor = Floor::from_scene(scene)?;
        let res = self.cfg.image_resolution;
        let frame = FloorFrame::new(&floor, res, self.cfg.scale_margin);
        if frame.scale <= 0.0 || !frame.scale.is_finite() {
            return Err(EvalError::DegenerateMesh { id: "floor".into() });
        }
        let kernel = frame.pixels(self.cfg.robot_width);
        debug!(
            "navigability: scale {:.3} m, {res}px map, {kernel}px robot",
            frame.scale
        );

        let plan = self.floor_plan(&floor, &frame, res);
        let eroded = raster::erode(&plan, kernel);
        let obstacles = self.obstacle_map(scene, &frame, floor.bounds().center().z, res, kernel);
        let mut walkable = eroded.clone();
        raster::subtract(&mut walkable, &obstacles);

        let floor_px = raster::count_nonzero(&eroded);
        let components = raster::label_components(&walkable);
        let largest = components.largest();
        let navigability = match largest {
            Some((_, size)) if floor_px > 0 => size as f64 / floor_px as f64,
            _ => 0.0,
        };

        let object_area_ratio = self.cfg.calculate_object_area.then(|| {
            let obj_px = raster::count_nonzero(&obstacles);
            let total = obj_px + raster::count_nonzero(&walkable);
            if total == 0 {
                0.0
            } else {
                obj_px as f64 / total as f64
            }
        });

        if sink.enabled() {
            sink.rgb(SCOPE, "n0_floor_plan", &self.paint(&plan, None));
            sink.rgb(SCOPE, "n1_eroded_floor_plan", &self.paint(&eroded, None));
            sink.rgb(
                SCOPE,
                "n2_eroded_floor_plan_with_bboxes",
                &self.paint(&eroded, Some(&obstacles)),
            );
            sink.gray(SCOPE, "n3_walkable_map", &walkable);
            for k in 0..components.count() {
                let mask = components.mask(k as u32 + 1);
                sink.gray(SCOPE, &format!("n4_connected_component_{k}"), &mask);
            }
            if let Some((label, _)) = largest {
                sink.gray(SCOPE, "n5_largest_connected_component", &components.mask(label));
            }
        }

        let message = format!(
            "Navigability is {navigability:.2} with {} connected components.",
            components.count()
        );
        info!("{message}");

        Ok(MetricResult {
            message,
            data: MetricData::Navigability(NavigabilityData {
                navigability,
                connected_components: components.count(),
                object_area_ratio,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{NullSink, RecordingSink};
    use crate::fixtures;
    use glam::DVec3;

    fn run_with(cfg: NavigabilityConfig, scene: &SceneView) -> MetricResult {
        NavigabilityMetric::new(cfg).run(scene, &NullSink).unwrap()
    }

    fn data(result: &MetricResult) -> NavigabilityData {
        result.data.as_navigability().cloned().unwrap()
    }

    #[test]
    fn frame_maps_floor_corners() {
        let scene = fixtures::room(4.0);
        let floor = Floor::from_scene(&scene).unwrap();
        let frame = FloorFrame::new(&floor, 256, 0.2);
        assert!((frame.scale - 2.2).abs() < 1e-12);
        assert_eq!(frame.to_image(DVec2::new(2.0, 2.0)), DVec2::new(244.0, 12.0));
        assert_eq!(frame.to_image(DVec2::ZERO), DVec2::new(128.0, 128.0));
        assert_eq!(frame.pixels(0.2), 11);
    }

    #[test]
    fn unrotated_footprint() {
        let c = footprint_corners(DVec2::new(100.0, 100.0), DVec2::new(20.0, 10.0), 0.0);
        assert_eq!(
            c,
            [
                DVec2::new(90.0, 105.0),
                DVec2::new(90.0, 95.0),
                DVec2::new(110.0, 95.0),
                DVec2::new(110.0, 105.0),
            ]
        );
    }

    #[test]
    fn empty_room_is_fully_navigable() {
        let result = run_with(NavigabilityConfig::default(), &fixtures::room(4.0));
        let d = data(&result);
        assert_eq!(d.navigability, 1.0);
        assert_eq!(d.connected_components, 1);
        assert_eq!(d.object_area_ratio, None);
        assert_eq!(result.message, "Navigability is 1.00 with 1 connected components.");
    }

    #[test]
    fn central_obstacle_lowers_navigability() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "table", DVec3::new(0.0, 0.0, 0.5), DVec3::ONE, 0.0);
        let d = data(&run_with(NavigabilityConfig::default(), &scene));
        assert!(d.navigability > 0.0 && d.navigability < 1.0);
        assert_eq!(d.connected_components, 1);
    }

    #[test]
    fn high_objects_are_ignored() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "pendant", DVec3::new(0.0, 0.0, 2.5), DVec3::splat(0.8), 0.3);
        let d = data(&run_with(NavigabilityConfig::default(), &scene));
        assert_eq!(d.navigability, 1.0);
    }

    #[test]
    fn dividing_wall_splits_the_floor() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(
            &mut scene,
            "bookcase",
            DVec3::new(0.0, 0.0, 0.9),
            DVec3::new(4.0, 0.3, 1.8),
            0.0,
        );
        let d = data(&run_with(NavigabilityConfig::default(), &scene));
        assert_eq!(d.connected_components, 2);
        assert!(d.navigability < 0.6);
    }

    #[test]
    fn rotated_obstacle_blocks_more_than_nothing() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "bed", DVec3::new(0.5, 0.5, 0.3), DVec3::new(1.0, 2.0, 0.6), 0.7);
        let d = data(&run_with(NavigabilityConfig::default(), &scene));
        assert!(d.navigability < 1.0);
    }

    #[test]
    fn object_area_ratio_on_request() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "table", DVec3::new(0.0, 0.0, 0.5), DVec3::ONE, 0.0);
        let cfg = NavigabilityConfig {
            calculate_object_area: true,
            ..NavigabilityConfig::default()
        };
        let ratio = data(&run_with(cfg, &scene)).object_area_ratio.unwrap();
        assert!(ratio > 0.0 && ratio < 0.5);
    }

    #[test]
    fn missing_floor_is_an_error() {
        let mut scene = SceneView::new();
        fixtures::add_box(&mut scene, "table", DVec3::new(0.0, 0.0, 0.5), DVec3::ONE, 0.0);
        let err = NavigabilityMetric::default().run(&scene, &NullSink).unwrap_err();
        assert_eq!(err, EvalError::MissingFloor);
    }

    #[test]
    fn diagnostics_only_change_the_sink() {
        let mut scene = fixtures::room(4.0);
        fixtures::add_box(&mut scene, "table", DVec3::new(0.0, 0.0, 0.5), DVec3::ONE, 0.0);
        let sink = RecordingSink::default();
        let m = NavigabilityMetric::default();
        let recorded = m.run(&scene, &sink).unwrap();
        assert_eq!(recorded, m.run(&scene, &NullSink).unwrap());
        assert_eq!(
            sink.names(),
            [
                "navigability/n0_floor_plan",
                "navigability/n1_eroded_floor_plan",
                "navigability/n2_eroded_floor_plan_with_bboxes",
                "navigability/n3_walkable_map",
                "navigability/n4_connected_component_0",
                "navigability/n5_largest_connected_component",
            ]
        );
    }
}
