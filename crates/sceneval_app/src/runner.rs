use std::collections::BTreeMap;

use log::{debug, error, info};
use serde::{Serialize, Serializer};

use sceneval_core::{EvalError, SceneView};
use sceneval_metrics::{DiagnosticSink, MetricKind, MetricResult, NullSink, PngDirSink};

use crate::config::EvalConfig;

/// Results of one scene evaluation.
///
/// An analyzer that fails lands in `failures`; the others still run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvalReport {
    pub results: BTreeMap<MetricKind, MetricResult>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", serialize_with = "errors_as_text")]
    pub failures: BTreeMap<MetricKind, EvalError>,
}

impl EvalReport {
    pub fn get(&self, kind: MetricKind) -> Option<&MetricResult> {
        self.results.get(&kind)
    }

    /// `true` when no analyzer failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// One line per analyzer, in registry order.
    pub fn summary(&self) -> String {
        MetricKind::ALL
            .iter()
            .filter_map(|kind| {
                if let Some(r) = self.results.get(kind) {
                    Some(format!("{kind}: {}", r.message))
                } else {
                    self.failures.get(kind).map(|e| format!("{kind}: failed: {e}"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn errors_as_text<S: Serializer>(
    errors: &BTreeMap<MetricKind, EvalError>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_map(errors.iter().map(|(k, e)| (k, e.to_string())))
}

pub(crate) fn run_metrics(config: &EvalConfig, scene: &SceneView) -> EvalReport {
    let png;
    let sink: &dyn DiagnosticSink = match &config.output_dir {
        Some(dir) => {
            png = PngDirSink::new(dir);
            &png
        }
        None => &NullSink,
    };
    debug!(
        "evaluating {} objects with {} analyzers",
        scene.len(),
        config.metrics.len()
    );

    let mut report = EvalReport::default();
    for &kind in &config.metrics {
        let metric = kind.build(&config.sections);
        match metric.run(scene, sink) {
            Ok(result) => {
                info!("{kind}: done");
                report.results.insert(kind, result);
            }
            Err(e) => {
                error!("{kind}: {e}");
                report.failures.insert(kind, e);
            }
        }
    }
    report
}
