//! sceneval_metrics: physical-plausibility analyzers for a furnished room.
//!
//! | Module              | Responsibility                                          |
//! |---------------------|---------------------------------------------------------|
//! | `metric`            | `Metric` trait, `MetricKind` registry, result records   |
//! | `config`            | `MetricsConfig`, one section per analyzer               |
//! | `diagnostics`       | `DiagnosticSink`: optional PNG side channel             |
//! | `floor`             | Unioned floor mesh with a ray-cast BVH                  |
//! | `collision`         | Pairwise mesh interpenetration with a separation check  |
//! | `out_of_bound`      | Floor containment by downward ray casts                 |
//! | `navigability`      | Walkable floor fraction via erosion + components        |
//! | `opening_clearance` | Door/window blocking and occlusion maps                 |
//!
//! Every analyzer only reads the [`SceneView`](sceneval_core::SceneView), so
//! they can run in any order or in parallel.

pub mod collision;
pub mod config;
pub mod diagnostics;
pub mod floor;
pub mod metric;
pub mod navigability;
pub mod opening_clearance;
pub mod out_of_bound;

#[cfg(test)]
pub(crate) mod fixtures;

pub use collision::{CollisionConfig, CollisionData, CollisionMetric};
pub use config::MetricsConfig;
pub use diagnostics::{DiagnosticSink, NullSink, PngDirSink};
pub use metric::{Metric, MetricData, MetricKind, MetricResult};
pub use navigability::{NavigabilityConfig, NavigabilityData, NavigabilityMetric};
pub use opening_clearance::{OpeningClearanceConfig, OpeningClearanceData, OpeningClearanceMetric};
pub use out_of_bound::{OutOfBoundConfig, OutOfBoundData, OutOfBoundMetric};
