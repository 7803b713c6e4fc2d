//! Hit-testing: which marker, if any, lies under a device-space point.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, ViewState, Viewport};
use crate::series::{MaskSet, MaskView, SeriesView};

/// A marker hit by a pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Stable point index.
    pub index: usize,
    /// Squared device distance from the pick position to the marker center.
    pub dist_sq: f64,
}

/// Find the unmasked marker whose rendered circle covers `click`.
///
/// When several markers overlap the click, the one with the closest center
/// wins. Draw order plays no part. A marker covers the click when the squared
/// distance is strictly less than its squared rendered radius. Markers the
/// renderer skips as too small (radius below `min_radius_px`) are never hit.
#[must_use]
pub fn pick(
    click: Point,
    view: &ViewState,
    viewport: Viewport,
    points: SeriesView<'_>,
    masks: MaskView<'_>,
    min_radius_px: f64,
) -> Option<Hit> {
    if !click.is_finite() {
        return None;
    }

    let mut best: Option<Hit> = None;
    for i in 0..points.len() {
        if masks.is_masked(i) {
            continue;
        }
        let (Some(pos), Some(size)) = (points.position(i), points.size_of(i)) else {
            continue;
        };
        let center = view.to_device(pos, viewport);
        let radius = view.radius_px(size);
        if radius < min_radius_px {
            continue;
        }
        let (dx, dy) = (center.x - click.x, center.y - click.y);
        let dist_sq = dx * dx + dy * dy;
        let covers = dist_sq < radius * radius;
        if covers && best.is_none_or(|b| dist_sq < b.dist_sq) {
            best = Some(Hit { index: i, dist_sq });
        }
    }
    best
}

/// Apply the selection effect of a click.
///
/// - hit, no `combine`: the hit point becomes the only selection, or the
///   selection is cleared when it was already selected;
/// - hit, `combine`: the hit point is toggled, others are kept;
/// - miss, no `combine`: the selection is cleared;
/// - miss, `combine`: nothing changes.
///
/// Returns whether the selection changed.
pub fn apply_pick(masks: &mut MaskSet, hit: Option<usize>, combine: bool) -> bool {
    match (hit, combine) {
        (Some(i), true) => masks.toggle_pick(i),
        (Some(i), false) => {
            if masks.is_picked(i) {
                masks.clear_picked()
            } else {
                masks.select([i], false)
            }
        }
        (None, false) => masks.clear_picked(),
        (None, true) => false,
    }
}
