//! Message model for the render-worker protocol.
//!
//! The main thread and the render worker talk only through [`Message`]s.
//! Nothing is shared mutably: bulk columns travel as reference-counted
//! slices, and finished layers come back as [`Picture`] recordings. The
//! binary codec in [`codec`] carries the same messages across a
//! `postMessage`-style byte boundary.

pub mod codec;

pub use codec::{CodecError, decode_message, encode_message};

use std::sync::Arc;

use canvas::camera::{AxisBounds, ViewState, Viewport};
use canvas::config::RenderConfig;
use canvas::engine::Layer;
use canvas::series::{MaskSet, PointSeries};
use canvas::surface::Picture;
use serde::{Deserialize, Serialize};

/// Render task identifier. `0` is reserved for "no task".
pub type Uid = u64;

/// Static configuration delivered once after the worker starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerInit {
    pub config: RenderConfig,
}

/// New or updated columns. `None` leaves the worker's copy unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataUpdate {
    pub x: Option<Arc<[f64]>>,
    pub y: Option<Arc<[f64]>>,
    pub size: Option<Arc<[f64]>>,
    pub color: Option<Arc<[String]>>,
    pub masked: Option<Arc<[bool]>>,
    pub picked: Option<Arc<[bool]>>,
    pub highlighted: Option<Arc<[u8]>>,
    pub bounds: Option<AxisBounds>,
}

impl DataUpdate {
    /// Every column of a dataset and its masks.
    #[must_use]
    pub fn full(series: &PointSeries, masks: &MaskSet, bounds: AxisBounds) -> Self {
        Self {
            x: Some(Arc::clone(series.x())),
            y: Some(Arc::clone(series.y())),
            size: Some(Arc::clone(series.size())),
            color: Some(Arc::clone(series.color())),
            bounds: Some(bounds),
            ..Self::masks(masks)
        }
    }

    /// Only the masks, e.g. after a selection change.
    #[must_use]
    pub fn masks(masks: &MaskSet) -> Self {
        Self {
            masked: Some(Arc::from(masks.masked())),
            picked: Some(Arc::from(masks.picked())),
            highlighted: Some(Arc::from(masks.highlighted())),
            ..Self::default()
        }
    }

    /// Only the picked flags.
    #[must_use]
    pub fn picked(masks: &MaskSet) -> Self {
        Self { picked: Some(Arc::from(masks.picked())), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Plot size and view transform of one render request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Geometry {
    #[must_use]
    pub fn new(view: &ViewState, viewport: Viewport) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            pan_x: view.pan_x(),
            pan_y: view.pan_y(),
            scale: view.scale(),
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Whether a worker can render this geometry: finite, non-negative
    /// dimensions and a usable view. A zero-sized plot is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let dimension = |v: f64| v.is_finite() && v >= 0.0;
        dimension(self.width)
            && dimension(self.height)
            && ViewState::from_parts(self.pan_x, self.pan_y, self.scale).is_some()
    }

    /// The view transform, with the given axis bounds. `None` when the
    /// geometry is not [valid](Self::is_valid).
    #[must_use]
    pub fn view(&self, bounds: AxisBounds) -> Option<ViewState> {
        if !self.is_valid() {
            return None;
        }
        let mut view = ViewState::from_parts(self.pan_x, self.pan_y, self.scale)?;
        view.set_bounds(bounds);
        Some(view)
    }
}

/// What a render request redraws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    /// Main, highlight and selection layers.
    Plot,
    /// Selection layer only.
    Selection,
}

impl From<Layer> for RenderKind {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Plot => Self::Plot,
            Layer::Selection => Self::Selection,
        }
    }
}

/// A render request for one registered target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderTask {
    pub uid: Uid,
    pub target: usize,
    pub geometry: Geometry,
}

/// A finished render. Layers the task did not redraw are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub uid: Uid,
    pub target: usize,
    pub kind: RenderKind,
    pub main: Option<Picture>,
    pub highlight: Option<Picture>,
    pub selection: Option<Picture>,
}

/// Everything that crosses the main/worker boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Init(WorkerInit),
    Reset,
    Data(DataUpdate),
    /// Register (or replace) the layer set for a render target.
    AddTarget { index: usize },
    RenderPlot(RenderTask),
    RenderSelection(RenderTask),
    Completion(Completion),
}

impl Message {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Reset => "reset",
            Self::Data(_) => "data",
            Self::AddTarget { .. } => "add",
            Self::RenderPlot(_) => "plot",
            Self::RenderSelection(_) => "sele",
            Self::Completion(_) => "done",
        }
    }

    /// The task uid carried by render requests and completions.
    #[must_use]
    pub fn uid(&self) -> Option<Uid> {
        match self {
            Self::RenderPlot(t) | Self::RenderSelection(t) => Some(t.uid),
            Self::Completion(c) => Some(c.uid),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
