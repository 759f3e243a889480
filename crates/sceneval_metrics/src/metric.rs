//! The `Metric` trait: every analyzer implements this.
//!
//! ## Closed registry
//! The set of analyzers is fixed, so [`MetricKind`] enumerates them and
//! [`MetricKind::build`] constructs one from its config section. Names are
//! the snake_case forms used in config files.
//!
//! ## Diagnostics
//! `run` receives a [`DiagnosticSink`]; analyzers only build diagnostic
//! images when the sink reports itself enabled, and never let the sink
//! influence the numbers they return.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use sceneval_core::{EvalError, EvalResult, SceneView};

use crate::collision::{CollisionData, CollisionMetric};
use crate::config::MetricsConfig;
use crate::diagnostics::DiagnosticSink;
use crate::navigability::{NavigabilityData, NavigabilityMetric};
use crate::opening_clearance::{OpeningClearanceData, OpeningClearanceMetric};
use crate::out_of_bound::{OutOfBoundData, OutOfBoundMetric};

pub trait Metric: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Short name used in logs and output keys.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Evaluate one scene.
    ///
    /// Whole-scene input errors (no floor, nothing to evaluate) are returned
    /// as `Err`; per-entity problems are recorded inside the result.
    fn run(&self, scene: &SceneView, sink: &dyn DiagnosticSink) -> EvalResult<MetricResult>;
}

// ─── Registry ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Collision,
    OutOfBound,
    Navigability,
    OpeningClearance,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Collision,
        MetricKind::OutOfBound,
        MetricKind::Navigability,
        MetricKind::OpeningClearance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Collision => "collision",
            MetricKind::OutOfBound => "out_of_bound",
            MetricKind::Navigability => "navigability",
            MetricKind::OpeningClearance => "opening_clearance",
        }
    }

    /// Construct the analyzer with its section of `cfg`.
    pub fn build(self, cfg: &MetricsConfig) -> Box<dyn Metric> {
        match self {
            MetricKind::Collision => Box::new(CollisionMetric::new(cfg.collision.clone())),
            MetricKind::OutOfBound => Box::new(OutOfBoundMetric::new(cfg.out_of_bound.clone())),
            MetricKind::Navigability => Box::new(NavigabilityMetric::new(cfg.navigability.clone())),
            MetricKind::OpeningClearance => {
                Box::new(OpeningClearanceMetric::new(cfg.opening_clearance.clone()))
            }
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| EvalError::UnknownMetric { name: s.to_string() })
    }
}

// ─── Results ───────────────────────────────────────────────────────────────

/// Summary line plus the analyzer's structured data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub message: String,
    pub data: MetricData,
}

/// Typed data of each analyzer; serializes as the bare record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricData {
    Collision(CollisionData),
    OutOfBound(OutOfBoundData),
    Navigability(NavigabilityData),
    OpeningClearance(OpeningClearanceData),
}

impl MetricData {
    pub fn as_collision(&self) -> Option<&CollisionData> {
        match self {
            MetricData::Collision(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_out_of_bound(&self) -> Option<&OutOfBoundData> {
        match self {
            MetricData::OutOfBound(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_navigability(&self) -> Option<&NavigabilityData> {
        match self {
            MetricData::Navigability(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_opening_clearance(&self) -> Option<&OpeningClearanceData> {
        match self {
            MetricData::OpeningClearance(d) => Some(d),
            _ => None,
        }
    }
}
