//! Evaluator front end: configuration, logging and the run loop.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sceneval_app::{logging, EvalConfig, Evaluator};
//!
//! let config = EvalConfig::load("sceneval.toml")?;
//! logging::init(config.level_filter()?)?;
//!
//! let scene = build_scene(); // any `SceneView`
//! let report = Evaluator::from_config(config).with_seed(7).run(&scene);
//! println!("{}", report.summary());
//! ```

pub mod builder;
pub mod config;
pub mod logging;
mod runner;

pub use builder::Evaluator;
pub use config::EvalConfig;
pub use runner::EvalReport;

// ── Re-export the types needed to build and read a run ────────────────────
// Users can do `use sceneval_app::{SceneView, MetricKind};` without adding
// the lower crates as direct dependencies.
pub use sceneval_core::{EvalError, SceneView, Transform, TriMesh};
pub use sceneval_metrics::{MetricData, MetricKind, MetricResult, MetricsConfig};
