//! Small scenes shared by the analyzer tests.

use glam::{DVec2, DVec3};

use sceneval_core::primitives::{cuboid, floor_rect};
use sceneval_core::{SceneView, Transform};

/// Empty square room: `floor_0` spans `±size/2` on the plane `z = 0`.
pub fn room(size: f64) -> SceneView {
    let mut scene = SceneView::new();
    let h = size * 0.5;
    scene
        .add_arch("floor_0", floor_rect(DVec2::splat(-h), DVec2::splat(h), 0.0))
        .build()
        .unwrap();
    scene
}

/// Adds a box object with bbox center `center`, full side lengths `size`
/// and rotation `yaw` about +Z.
pub fn add_box(scene: &mut SceneView, id: &str, center: DVec3, size: DVec3, yaw: f64) {
    let t = Transform::from_position(center).with_yaw(yaw);
    scene
        .add_object(id, cuboid(size * 0.5, &t))
        .with_transform(t)
        .with_extents(size)
        .with_bbox_center(center)
        .build()
        .unwrap();
}

/// Adds a door or window (by id prefix) as a thin box: `size` is
/// `(width, thickness, height)`.
pub fn add_opening(scene: &mut SceneView, id: &str, center: DVec3, size: DVec3, yaw: f64) {
    let t = Transform::from_position(center).with_yaw(yaw);
    scene
        .add_arch(id, cuboid(size * 0.5, &t))
        .with_transform(t)
        .with_extents(size)
        .with_bbox_center(center)
        .build()
        .unwrap();
}
