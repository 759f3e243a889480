//! sceneval_geom: the geometry kernel behind the analyzers.
//!
//! | Module      | Responsibility                                               |
//! |-------------|--------------------------------------------------------------|
//! | `obb`       | Oriented boxes: lattice sampling and tolerant containment     |
//! | `ray`       | Rays and the Möller–Trumbore ray/triangle test                |
//! | `bvh`       | Median-split triangle BVH (ray casts, overlapping pairs)      |
//! | `tri_tri`   | Triangle/triangle intersection with a contact point           |
//! | `collision` | `CollisionManager`: mesh-vs-resident-meshes queries           |
//! | `sampling`  | Area-weighted random points on a mesh surface                 |
//! | `raster`    | Fills, thick lines, erosion and labeling on `GrayImage`s      |

pub mod bvh;
pub mod collision;
pub mod obb;
pub mod raster;
pub mod ray;
pub mod sampling;
pub mod tri_tri;

pub use bvh::TriangleBvh;
pub use collision::{CollisionManager, Contact};
pub use obb::{ObbConfig, OrientedBoundingBox};
pub use ray::{Ray, RayHit};
