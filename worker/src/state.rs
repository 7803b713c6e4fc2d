//! Data and render targets held by the worker.
//!
//! Columns arrive through `data` messages and are kept as shared slices.
//! A render job takes a [`Snapshot`] when it starts, so a `data` message
//! handled between two of its slices never mixes old and new columns.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::BTreeMap;
use std::sync::Arc;

use canvas::camera::{AxisBounds, ViewState, Viewport};
use canvas::config::RenderConfig;
use canvas::render::{Layers, Scene};
use canvas::series::{MaskView, SeriesView};
use canvas::surface::Picture;
use frames::{Completion, DataUpdate};
use tracing::{debug, info, warn};

/// Immutable view of everything a render reads.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub config: Arc<RenderConfig>,
    pub x: Arc<[f64]>,
    pub y: Arc<[f64]>,
    pub size: Arc<[f64]>,
    pub color: Arc<[String]>,
    pub masked: Arc<[bool]>,
    pub picked: Arc<[bool]>,
    pub highlighted: Arc<[u8]>,
    pub bounds: AxisBounds,
}

impl Snapshot {
    /// The scene for one render request.
    #[must_use]
    pub fn scene(&self, view: ViewState, viewport: Viewport) -> Scene<'_> {
        Scene {
            view,
            viewport,
            points: SeriesView { x: &self.x, y: &self.y, size: &self.size, color: &self.color },
            masks: MaskView { masked: &self.masked, picked: &self.picked, highlighted: &self.highlighted },
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.x.len()
    }
}

/// Worker-side state: the latest data and the layers of every target.
#[derive(Debug, Default)]
pub struct WorkerState {
    data: Snapshot,
    targets: BTreeMap<usize, Layers<Picture>>,
}

impl WorkerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the static render config.
    pub fn init(&mut self, config: RenderConfig) {
        self.data.config = Arc::new(config.sanitized());
        info!("worker configured");
    }

    /// Drop all data and targets. The config from `init` is kept.
    pub fn reset(&mut self) {
        let config = Arc::clone(&self.data.config);
        self.data = Snapshot { config, ..Snapshot::default() };
        self.targets.clear();
        info!("worker state reset");
    }

    /// Replace every column present in `update`.
    pub fn apply(&mut self, update: DataUpdate) {
        let data = &mut self.data;
        if let Some(x) = update.x {
            data.x = x;
        }
        if let Some(y) = update.y {
            data.y = y;
        }
        if let Some(size) = update.size {
            data.size = size;
        }
        if let Some(color) = update.color {
            data.color = color;
        }
        if let Some(masked) = update.masked {
            data.masked = masked;
        }
        if let Some(picked) = update.picked {
            data.picked = picked;
        }
        if let Some(highlighted) = update.highlighted {
            data.highlighted = highlighted;
        }
        if let Some(bounds) = update.bounds {
            data.bounds = bounds;
        }

        let n = data.x.len();
        let lengths = [data.y.len(), data.size.len(), data.masked.len(), data.picked.len(), data.highlighted.len()];
        if lengths.iter().any(|len| *len != n) {
            warn!(points = n, ?lengths, "worker columns disagree on point count");
        } else {
            debug!(points = n, "worker data updated");
        }
    }

    /// Register a target with blank layers, replacing any earlier one.
    /// Returns whether a target was replaced.
    pub fn add_target(&mut self, index: usize) -> bool {
        let replaced = self.targets.insert(index, Layers::default()).is_some();
        debug!(index, replaced, "render target registered");
        replaced
    }

    #[must_use]
    pub fn has_target(&self, index: usize) -> bool {
        self.targets.contains_key(&index)
    }

    #[must_use]
    pub fn target(&self, index: usize) -> Option<&Layers<Picture>> {
        self.targets.get(&index)
    }

    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.data.config
    }

    /// Cheap copy of the current data for a new render job.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.data.clone()
    }

    /// Keep the layers of a finished render on its target.
    ///
    /// Layers the completion does not carry stay as they were. Returns
    /// `false` when the target is no longer registered.
    pub fn store(&mut self, done: &Completion) -> bool {
        let Some(layers) = self.targets.get_mut(&done.target) else {
            return false;
        };
        if let Some(main) = &done.main {
            layers.main.clone_from(main);
        }
        if let Some(highlight) = &done.highlight {
            layers.highlight.clone_from(highlight);
        }
        if let Some(selection) = &done.selection {
            layers.selection.clone_from(selection);
        }
        true
    }
}
