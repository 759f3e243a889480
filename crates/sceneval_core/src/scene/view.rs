//! Scene view: the read-only geometry every analyzer consumes.
//!
//! Objects keep their insertion order, which is also the evaluation order of
//! every analyzer. Architecture elements are tagged by kind from their id
//! prefix (`floor_0`, `door_1`, ...).
//!
//! # Quick start
//! ```rust,ignore
//! use sceneval_core::{primitives, SceneView, Transform};
//! use glam::{DVec2, DVec3};
//!
//! let mut scene = SceneView::new();
//! scene
//!     .add_arch("floor_0", primitives::floor_rect(DVec2::splat(-2.0), DVec2::splat(2.0), 0.0))
//!     .build()?;
//!
//! let t = Transform::from_position(DVec3::new(0.0, 0.0, 0.5));
//! scene
//!     .add_object("table_0", primitives::cuboid(DVec3::splat(0.5), &t))
//!     .with_transform(t)
//!     .build()?;
//! ```

use std::collections::HashMap;

use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::mesh::TriMesh;
use crate::transform::Transform;

// ─── Element kinds ─────────────────────────────────────────────────────────

/// Architecture element kind, resolved from the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchKind {
    Floor,
    Wall,
    Door,
    Window,
    Ceiling,
    Other,
}

impl ArchKind {
    /// Classify an element id by its prefix.
    ///
    /// ```rust,ignore
    /// assert_eq!(ArchKind::from_id("door_2"), ArchKind::Door);
    /// ```
    pub fn from_id(id: &str) -> Self {
        const PREFIXES: [(&str, ArchKind); 5] = [
            ("floor", ArchKind::Floor),
            ("wall", ArchKind::Wall),
            ("door", ArchKind::Door),
            ("window", ArchKind::Window),
            ("ceiling", ArchKind::Ceiling),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| id.starts_with(prefix))
            .map(|&(_, kind)| kind)
            .unwrap_or(ArchKind::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArchKind::Floor => "floor",
            ArchKind::Wall => "wall",
            ArchKind::Door => "door",
            ArchKind::Window => "window",
            ArchKind::Ceiling => "ceiling",
            ArchKind::Other => "other",
        }
    }

    /// Doors and windows.
    pub fn is_opening(self) -> bool {
        matches!(self, ArchKind::Door | ArchKind::Window)
    }
}

/// Whether an element is a placed object or part of the room shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Object,
    Arch(ArchKind),
}

// ─── Entity entry ──────────────────────────────────────────────────────────

/// Pose and default-pose bounding box of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// World transform of the element.
    pub transform: Transform,
    /// Bounding-box side lengths `(w, d, h)` along the element's local axes.
    pub extents: DVec3,
    /// World-space center of that bounding box.
    pub center: DVec3,
}

impl Placement {
    /// Local→world bounding-box axes (columns are orthonormal).
    pub fn axes(&self) -> DMat3 {
        self.transform.rotation_matrix()
    }
}

/// One scene element: a posed mesh plus its placement.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
    /// World-space mesh, already posed.
    pub mesh: TriMesh,
    pub placement: Placement,
}

// ─── Element builder ───────────────────────────────────────────────────────

/// Fluent builder returned by [`SceneView::add_object`] and
/// [`SceneView::add_arch`].
///
/// Call `.build()` to insert the element. Extents and center that are not
/// given are fitted from the mesh in the element's local frame.
#[must_use = "the element is only inserted by `.build()`"]
pub struct ElementBuilder<'a> {
    scene: &'a mut SceneView,
    id: String,
    kind: ElementKind,
    mesh: TriMesh,
    transform: Transform,
    extents: Option<DVec3>,
    center: Option<DVec3>,
}

impl<'a> ElementBuilder<'a> {
    pub fn with_transform(mut self, t: Transform) -> Self {
        self.transform = t;
        self
    }

    /// Default-pose bounding-box side lengths `(w, d, h)`.
    pub fn with_extents(mut self, extents: DVec3) -> Self {
        self.extents = Some(extents);
        self
    }

    /// World-space bounding-box center.
    pub fn with_bbox_center(mut self, center: DVec3) -> Self {
        self.center = Some(center);
        self
    }

    /// Override the prefix-derived architecture kind.
    pub fn with_arch_kind(mut self, kind: ArchKind) -> Self {
        if let ElementKind::Arch(_) = self.kind {
            self.kind = ElementKind::Arch(kind);
        }
        self
    }

    /// Finalise the builder and insert the element.
    pub fn build(self) -> EvalResult<()> {
        if self.scene.elements.contains_key(&self.id) {
            return Err(EvalError::DuplicateId { id: self.id });
        }
        if self.mesh.vertices().iter().any(|v| !v.is_finite()) {
            return Err(EvalError::InvalidMesh {
                id: self.id,
                reason: "non-finite vertex".into(),
            });
        }

        let fitted = self.mesh.local_fit(&self.transform);
        let extents = self
            .extents
            .or(fitted.map(|(e, _)| e))
            .unwrap_or(DVec3::ZERO);
        let center = self
            .center
            .or(fitted.map(|(_, c)| c))
            .unwrap_or(self.transform.position);

        let element = Element {
            id: self.id.clone(),
            kind: self.kind,
            mesh: self.mesh,
            placement: Placement {
                transform: self.transform,
                extents,
                center,
            },
        };
        match self.kind {
            ElementKind::Object => self.scene.objects.push(self.id.clone()),
            ElementKind::Arch(_) => self.scene.arch.push(self.id.clone()),
        }
        self.scene.elements.insert(self.id, element);
        Ok(())
    }
}

// ─── SceneView ─────────────────────────────────────────────────────────────

/// Objects and architecture of one scene.
#[derive(Debug, Default, Clone)]
pub struct SceneView {
    objects: Vec<String>,
    arch: Vec<String>,
    elements: HashMap<String, Element>,
}

impl SceneView {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Insertion ──────────────────────────────────────────────────────────

    /// Begin adding a placed object.
    pub fn add_object(&mut self, id: impl Into<String>, mesh: TriMesh) -> ElementBuilder<'_> {
        self.builder(id.into(), mesh, ElementKind::Object)
    }

    /// Begin adding an architecture element; its kind comes from the id
    /// prefix unless overridden.
    pub fn add_arch(&mut self, id: impl Into<String>, mesh: TriMesh) -> ElementBuilder<'_> {
        let id = id.into();
        let kind = ElementKind::Arch(ArchKind::from_id(&id));
        self.builder(id, mesh, kind)
    }

    fn builder(&mut self, id: String, mesh: TriMesh, kind: ElementKind) -> ElementBuilder<'_> {
        ElementBuilder {
            scene: self,
            id,
            kind,
            mesh,
            transform: Transform::default(),
            extents: None,
            center: None,
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────────────

    /// Object ids in insertion order.
    pub fn object_ids(&self) -> &[String] {
        &self.objects
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &Element> {
        self.objects.iter().filter_map(|id| self.elements.get(id))
    }

    /// Architecture elements of `kind`, in insertion order.
    pub fn arch(&self, kind: ArchKind) -> impl Iterator<Item = &Element> {
        self.arch
            .iter()
            .filter_map(|id| self.elements.get(id))
            .filter(move |e| e.kind == ElementKind::Arch(kind))
    }

    /// Ids of architecture elements of `kind`, in insertion order.
    pub fn arch_ids(&self, kind: ArchKind) -> impl Iterator<Item = &str> {
        self.arch(kind).map(|e| e.id.as_str())
    }

    /// Meshes of every floor element.
    pub fn floor_meshes(&self) -> impl Iterator<Item = &TriMesh> {
        self.arch(ArchKind::Floor).map(|e| &e.mesh)
    }

    pub fn element(&self, id: &str) -> EvalResult<&Element> {
        self.elements
            .get(id)
            .ok_or_else(|| EvalError::unknown_element(id))
    }

    pub fn mesh_of(&self, id: &str) -> EvalResult<&TriMesh> {
        self.element(id).map(|e| &e.mesh)
    }

    pub fn placement(&self, id: &str) -> EvalResult<&Placement> {
        self.element(id).map(|e| &e.placement)
    }

    /// Default-pose bounding-box extents `(w, d, h)`.
    pub fn default_pose_bbox_extents(&self, id: &str) -> EvalResult<DVec3> {
        self.placement(id).map(|p| p.extents)
    }

    pub fn world_transform(&self, id: &str) -> EvalResult<DMat4> {
        self.placement(id).map(|p| p.transform.matrix())
    }

    pub fn oriented_bbox_axes(&self, id: &str) -> EvalResult<DMat3> {
        self.placement(id).map(Placement::axes)
    }

    pub fn bbox_center(&self, id: &str) -> EvalResult<DVec3> {
        self.placement(id).map(|p| p.center)
    }

    /// Number of objects (architecture not counted).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{cuboid, floor_rect};
    use glam::DVec2;

    fn cube_at(x: f64) -> (TriMesh, Transform) {
        let t = Transform::from_position(DVec3::new(x, 0.0, 0.5));
        (cuboid(DVec3::splat(0.5), &t), t)
    }

    #[test]
    fn arch_kind_from_prefix() {
        assert_eq!(ArchKind::from_id("floor_0"), ArchKind::Floor);
        assert_eq!(ArchKind::from_id("window_12"), ArchKind::Window);
        assert_eq!(ArchKind::from_id("doorway"), ArchKind::Door);
        assert_eq!(ArchKind::from_id("skylight_0"), ArchKind::Other);
        assert!(ArchKind::Door.is_opening());
        assert!(!ArchKind::Wall.is_opening());
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut s = SceneView::new();
        for (i, id) in ["c", "a", "b"].iter().enumerate() {
            let (mesh, t) = cube_at(i as f64 * 2.0);
            s.add_object(*id, mesh).with_transform(t).build().unwrap();
        }
        assert_eq!(s.object_ids(), ["c", "a", "b"]);
        let ids: Vec<_> = s.objects().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut s = SceneView::new();
        let (mesh, _) = cube_at(0.0);
        s.add_object("x", mesh.clone()).build().unwrap();
        let err = s.add_object("x", mesh).build().unwrap_err();
        assert_eq!(err, EvalError::DuplicateId { id: "x".into() });
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn extents_are_fitted_when_missing() {
        let mut s = SceneView::new();
        let t = Transform::from_position(DVec3::new(1.0, 0.0, 0.25)).with_yaw(0.6);
        let mesh = cuboid(DVec3::new(0.4, 0.3, 0.25), &t);
        s.add_object("sofa", mesh).with_transform(t).build().unwrap();
        let e = s.default_pose_bbox_extents("sofa").unwrap();
        assert!((e - DVec3::new(0.8, 0.6, 0.5)).length() < 1e-9);
        assert!((s.bbox_center("sofa").unwrap() - t.position).length() < 1e-9);
        assert!((s.oriented_bbox_axes("sofa").unwrap() - t.rotation_matrix())
            .abs_diff_eq(DMat3::ZERO, 1e-12));
    }

    #[test]
    fn explicit_extents_win() {
        let mut s = SceneView::new();
        let (mesh, t) = cube_at(0.0);
        s.add_object("box", mesh)
            .with_transform(t)
            .with_extents(DVec3::new(2.0, 2.0, 2.0))
            .with_bbox_center(DVec3::ZERO)
            .build()
            .unwrap();
        let p = s.placement("box").unwrap();
        assert_eq!(p.extents, DVec3::splat(2.0));
        assert_eq!(p.center, DVec3::ZERO);
    }

    #[test]
    fn arch_is_filtered_by_kind() {
        let mut s = SceneView::new();
        let floor = floor_rect(DVec2::splat(-2.0), DVec2::splat(2.0), 0.0);
        s.add_arch("floor_0", floor.clone()).build().unwrap();
        s.add_arch("wall_0", floor.clone()).build().unwrap();
        s.add_arch("hatch", floor)
            .with_arch_kind(ArchKind::Door)
            .build()
            .unwrap();
        assert_eq!(s.floor_meshes().count(), 1);
        assert_eq!(s.arch_ids(ArchKind::Door).collect::<Vec<_>>(), ["hatch"]);
        assert!(s.is_empty());
    }

    #[test]
    fn unknown_ids_are_errors() {
        let s = SceneView::new();
        assert!(matches!(
            s.mesh_of("ghost"),
            Err(EvalError::UnknownElement { .. })
        ));
    }
}
