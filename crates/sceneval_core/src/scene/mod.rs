//! Scene contract: objects, architecture and their placements.

pub mod view;

pub use view::{ArchKind, Element, ElementBuilder, ElementKind, Placement, SceneView};
