//! Diagnostic image side channel.
//!
//! Analyzers hand intermediate rasters (floor plans, occupancy maps) to a
//! [`DiagnosticSink`]. Production runs pass [`NullSink`]; [`PngDirSink`]
//! writes `root/<scope>/<name>.png`. A failed write is logged and dropped.

use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};
use log::{debug, warn};

pub trait DiagnosticSink: Send + Sync {
    /// `false` lets analyzers skip building images nobody will look at.
    fn enabled(&self) -> bool;

    fn gray(&self, scope: &str, name: &str, image: &GrayImage);

    fn rgb(&self, scope: &str, name: &str, image: &RgbImage);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    fn gray(&self, _scope: &str, _name: &str, _image: &GrayImage) {}

    fn rgb(&self, _scope: &str, _name: &str, _image: &RgbImage) {}
}

/// Writes PNG files below a root directory.
#[derive(Debug, Clone)]
pub struct PngDirSink {
    root: PathBuf,
}

impl PngDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, scope: &str, name: &str) -> Option<PathBuf> {
        let dir = self.root.join(scope);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("diagnostics: cannot create {}: {e}", dir.display());
            return None;
        }
        Some(dir.join(format!("{name}.png")))
    }
}

impl DiagnosticSink for PngDirSink {
    fn enabled(&self) -> bool {
        true
    }

    fn gray(&self, scope: &str, name: &str, image: &GrayImage) {
        let Some(path) = self.path_for(scope, name) else {
            return;
        };
        // zero-sized images cannot be encoded
        if image.width() == 0 || image.height() == 0 {
            debug!("diagnostics: skipping empty image {}", path.display());
            return;
        }
        match image.save(&path) {
            Ok(()) => debug!("diagnostics: wrote {}", path.display()),
            Err(e) => warn!("diagnostics: failed to write {}: {e}", path.display()),
        }
    }

    fn rgb(&self, scope: &str, name: &str, image: &RgbImage) {
        let Some(path) = self.path_for(scope, name) else {
            return;
        };
        if image.width() == 0 || image.height() == 0 {
            debug!("diagnostics: skipping empty image {}", path.display());
            return;
        }
        match image.save(&path) {
            Ok(()) => debug!("diagnostics: wrote {}", path.display()),
            Err(e) => warn!("diagnostics: failed to write {}: {e}", path.display()),
        }
    }
}

/// Sink that records what it was given, for assertions in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub entries: std::sync::Mutex<Vec<(String, String, u32, u32)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|e| e.iter().map(|(s, n, _, _)| format!("{s}/{n}")).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl DiagnosticSink for RecordingSink {
    fn enabled(&self) -> bool {
        true
    }

    fn gray(&self, scope: &str, name: &str, image: &GrayImage) {
        if let Ok(mut e) = self.entries.lock() {
            e.push((scope.into(), name.into(), image.width(), image.height()));
        }
    }

    fn rgb(&self, scope: &str, name: &str, image: &RgbImage) {
        if let Ok(mut e) = self.entries.lock() {
            e.push((scope.into(), name.into(), image.width(), image.height()));
        }
    }
}
