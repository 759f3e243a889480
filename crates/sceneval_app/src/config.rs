//! Evaluator configuration, loaded from TOML.
//!
//! ```toml
//! metrics = ["collision", "navigability"]
//! output_dir = "diagnostics"
//! log_level = "debug"
//!
//! [navigability]
//! robot_width = 0.3
//!
//! [out_of_bound]
//! seed = 7
//! ```
//!
//! Every key is optional; missing ones take their defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context as _, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use sceneval_metrics::{MetricKind, MetricsConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Analyzers to run, in order.
    pub metrics: Vec<MetricKind>,
    /// Diagnostic images are written below this directory when set.
    pub output_dir: Option<PathBuf>,
    pub log_level: String,
    #[serde(flatten)]
    pub sections: MetricsConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            metrics: MetricKind::ALL.to_vec(),
            output_dir: None,
            log_level: "info".to_string(),
            sections: MetricsConfig::default(),
        }
    }
}

impl EvalConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid evaluator config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// `log_level` as a filter (`off`, `error` ... `trace`, any case).
    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow!("unknown log level `{}`", self.log_level))
    }
}
