//! Polygon lasso selection.
//!
//! `Idle -> Drawing -> Idle`. Vertices are captured in data space so the
//! polygon stays attached to the points while the user pans and zooms
//! between clicks.

#[cfg(test)]
#[path = "lasso_test.rs"]
mod lasso_test;

use tracing::{debug, info};

use crate::camera::{Point, ViewState, Viewport};
use crate::polygon;
use crate::series::{MaskSet, MaskView, SeriesView};

/// The lasso gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LassoState {
    #[default]
    Idle,
    Drawing {
        /// Polygon vertices in data space, in click order.
        vertices: Vec<Point>,
    },
}

/// Result of closing a lasso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LassoOutcome {
    /// Unmasked points inside the polygon, ascending.
    pub contained: Vec<usize>,
    /// Whether the selection changed.
    pub changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Lasso {
    state: LassoState,
}

impl Lasso {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &LassoState {
        &self.state
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, LassoState::Drawing { .. })
    }

    /// Vertices of the polygon being drawn; empty when idle.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        match &self.state {
            LassoState::Idle => &[],
            LassoState::Drawing { vertices } => vertices,
        }
    }

    /// Begin a new polygon. Only valid from `Idle`.
    pub fn start(&mut self) -> bool {
        if self.is_drawing() {
            debug!("lasso already drawing; start ignored");
            return false;
        }
        self.state = LassoState::Drawing { vertices: Vec::new() };
        true
    }

    /// Append the data-space point under `device`. Only valid while drawing.
    pub fn add_vertex(&mut self, device: Point, view: &ViewState, viewport: Viewport) -> bool {
        let LassoState::Drawing { vertices } = &mut self.state else {
            return false;
        };
        if !device.is_finite() {
            return false;
        }
        vertices.push(view.to_data(device, viewport));
        true
    }

    /// Close the polygon and select the unmasked points inside it.
    ///
    /// Without `combine` the contained set replaces the selection; with it
    /// the set is added. A polygon of fewer than three vertices contains
    /// nothing. Returns `None` when not drawing.
    pub fn finish(&mut self, points: SeriesView<'_>, masks: &mut MaskSet, combine: bool) -> Option<LassoOutcome> {
        let LassoState::Drawing { vertices } = std::mem::take(&mut self.state) else {
            return None;
        };
        let contained = contained_points(points, masks.view(), &vertices);
        let changed = masks.select(contained.iter().copied(), combine);
        info!(vertices = vertices.len(), contained = contained.len(), combine, changed, "lasso finished");
        Some(LassoOutcome { contained, changed })
    }

    /// Drop the polygon without touching the selection.
    pub fn cancel(&mut self) -> bool {
        let was_drawing = self.is_drawing();
        self.state = LassoState::Idle;
        was_drawing
    }
}

/// Indices of unmasked points inside `polygon`.
#[must_use]
pub fn contained_points(points: SeriesView<'_>, masks: MaskView<'_>, polygon: &[Point]) -> Vec<usize> {
    let Some(bbox) = polygon::bounding_box(polygon) else {
        return Vec::new();
    };
    (0..points.len())
        .filter(|i| !masks.is_masked(*i))
        .filter(|i| {
            points
                .position(*i)
                .is_some_and(|p| bbox.contains(p) && polygon::contains(p, polygon))
        })
        .collect()
}
