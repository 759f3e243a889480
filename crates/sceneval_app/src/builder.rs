use std::path::PathBuf;

use anyhow::Result;

use sceneval_core::SceneView;
use sceneval_metrics::{MetricKind, MetricsConfig};

use crate::config::EvalConfig;
use crate::runner::{self, EvalReport};

/// Entry point for evaluating scenes. Configure with the `with_*` methods,
/// then call [`run`](Evaluator::run) once per scene.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Reads a TOML config file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::from_config(EvalConfig::load(path.into())?))
    }

    /// Runs only these analyzers, in this order.
    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = MetricKind>) -> Self {
        self.config.metrics = metrics.into_iter().collect();
        self
    }

    /// Writes diagnostic images below `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    /// Fixes the out-of-bound sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.sections.out_of_bound.seed = Some(seed);
        self
    }

    pub fn with_metrics_config(mut self, sections: MetricsConfig) -> Self {
        self.config.sections = sections;
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Runs every configured analyzer on `scene`.
    pub fn run(&self, scene: &SceneView) -> EvalReport {
        runner::run_metrics(&self.config, scene)
    }
}
