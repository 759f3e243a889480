//! sceneval_core: the read-only scene contract the analyzers consume.
//!
//! | Module       | Responsibility                                          |
//! |--------------|---------------------------------------------------------|
//! | `transform`  | World transforms (position, rotation, scale)            |
//! | `mesh`       | Immutable triangle meshes and their derived properties  |
//! | `bounds`     | Axis-aligned bounding boxes                             |
//! | `primitives` | Closed cuboids and floor slabs for fixtures and tests   |
//! | `scene`      | `SceneView`: ordered objects + tagged architecture      |
//! | `error`      | `EvalError`, shared by every analyzer                   |
//!
//! World space is Z-up and measured in meters.

pub mod bounds;
pub mod error;
pub mod mesh;
pub mod primitives;
pub mod scene;
pub mod transform;

pub use bounds::Aabb;
pub use error::{EvalError, EvalResult};
pub use mesh::TriMesh;
pub use scene::{ArchKind, Element, ElementBuilder, ElementKind, Placement, SceneView};
pub use transform::Transform;

// glam is part of the public API (every position is a `DVec3`), so re-export
// it to keep downstream crates on the same version.
pub use glam;

/// World "down", the direction gravity and floor probes point along.
pub const DOWN: glam::DVec3 = glam::DVec3::NEG_Z;
