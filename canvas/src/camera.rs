//! Viewport transform between normalized data space and device pixels.
//!
//! Data space is the unit square produced by [`AxisBounds::normalize`]. Both
//! axes grow the same way device pixels do: x to the right, y downward.
//! `AxisBounds` flips raw y values so that larger values sit near the top of
//! the plot; everything downstream (renderer, hit-test, lasso, grid) works in
//! this one convention and never flips again.
//!
//! A data point maps to the device as
//!
//! ```text
//! dev_x = nx * width  * scale + pan_x
//! dev_y = ny * height * scale + pan_y
//! ```

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A point in either device or data space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// Size of the drawing surface in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    /// Whether either dimension is zero, negative or non-finite.
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Raw data range of the two plotted axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for AxisBounds {
    fn default() -> Self {
        Self { x_min: 0.0, x_max: 1.0, y_min: 0.0, y_max: 1.0 }
    }
}

impl AxisBounds {
    #[must_use]
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// Bounds spanning the finite values of `xs` and `ys`.
    ///
    /// An axis with no finite values keeps the default `0..1` range.
    #[must_use]
    pub fn from_values(xs: &[f64], ys: &[f64]) -> Self {
        let defaults = Self::default();
        let (x_min, x_max) = finite_extent(xs).unwrap_or((defaults.x_min, defaults.x_max));
        let (y_min, y_max) = finite_extent(ys).unwrap_or((defaults.y_min, defaults.y_max));
        Self { x_min, x_max, y_min, y_max }
    }

    /// Map raw values into data space, flipping y so larger values are on top.
    ///
    /// An axis whose range is zero, negative or non-finite maps its value
    /// through unchanged instead of dividing by the range.
    #[must_use]
    pub fn normalize(&self, x: f64, y: f64) -> Point {
        let nx = axis_range(self.x_min, self.x_max).map_or(x, |r| (x - self.x_min) / r);
        let ny = axis_range(self.y_min, self.y_max).map_or(y, |r| 1.0 - (y - self.y_min) / r);
        Point::new(nx, ny)
    }

    /// Inverse of [`normalize`](Self::normalize).
    #[must_use]
    pub fn denormalize(&self, data: Point) -> (f64, f64) {
        let x = axis_range(self.x_min, self.x_max).map_or(data.x, |r| data.x * r + self.x_min);
        let y = axis_range(self.y_min, self.y_max).map_or(data.y, |r| (1.0 - data.y) * r + self.y_min);
        (x, y)
    }
}

fn axis_range(min: f64, max: f64) -> Option<f64> {
    let range = max - min;
    (range.is_finite() && range > 0.0).then_some(range)
}

fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Axis-aligned rectangle in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRect {
    pub min: Point,
    pub max: Point,
}

impl DataRect {
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Pan offset, scale and axis bounds of the plot.
///
/// `pan_x` / `pan_y` are in device pixels. `scale` is a strictly positive
/// zoom factor (1.0 = the data square fills the viewport). Fields are only
/// changed through [`pan`](Self::pan), [`zoom`](Self::zoom),
/// [`reset`](Self::reset) and [`set_bounds`](Self::set_bounds), all of which
/// reject non-finite input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pan_x: f64,
    pan_y: f64,
    scale: f64,
    bounds: AxisBounds,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0, bounds: AxisBounds::default() }
    }
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from explicit pan and scale, e.g. from render geometry.
    ///
    /// Returns `None` when any value is non-finite or `scale <= 0`.
    #[must_use]
    pub fn from_parts(pan_x: f64, pan_y: f64, scale: f64) -> Option<Self> {
        if !(pan_x.is_finite() && pan_y.is_finite() && scale.is_finite() && scale > 0.0) {
            return None;
        }
        Some(Self { pan_x, pan_y, scale, bounds: AxisBounds::default() })
    }

    #[must_use]
    pub fn pan_x(&self) -> f64 {
        self.pan_x
    }

    #[must_use]
    pub fn pan_y(&self) -> f64 {
        self.pan_y
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn bounds(&self) -> AxisBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: AxisBounds) {
        self.bounds = bounds;
    }

    /// Convert a data-space point to device pixels.
    #[must_use]
    pub fn to_device(&self, data: Point, viewport: Viewport) -> Point {
        Point {
            x: data.x * viewport.width * self.scale + self.pan_x,
            y: data.y * viewport.height * self.scale + self.pan_y,
        }
    }

    /// Convert a device-space point to data space.
    ///
    /// A zero-sized viewport axis maps through unchanged.
    #[must_use]
    pub fn to_data(&self, device: Point, viewport: Viewport) -> Point {
        let sx = viewport.width * self.scale;
        let sy = viewport.height * self.scale;
        Point {
            x: if sx > 0.0 { (device.x - self.pan_x) / sx } else { device.x },
            y: if sy > 0.0 { (device.y - self.pan_y) / sy } else { device.y },
        }
    }

    /// Rendered radius in pixels for a marker of the given size.
    #[must_use]
    pub fn radius_px(&self, size: f64) -> f64 {
        size * self.scale
    }

    /// The data-space rectangle currently covered by the viewport.
    #[must_use]
    pub fn visible_rect(&self, viewport: Viewport) -> DataRect {
        DataRect {
            min: self.to_data(Point::new(0.0, 0.0), viewport),
            max: self.to_data(Point::new(viewport.width, viewport.height), viewport),
        }
    }

    /// Shift the view by a device-space delta.
    ///
    /// Returns `false` (and leaves the view untouched) for non-finite deltas.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        let (pan_x, pan_y) = (self.pan_x + dx, self.pan_y + dy);
        if !(pan_x.is_finite() && pan_y.is_finite()) {
            warn!(dx, dy, "rejected non-finite pan");
            return false;
        }
        self.pan_x = pan_x;
        self.pan_y = pan_y;
        true
    }

    /// Zoom by `ratio` around a device-space pivot.
    ///
    /// The data point under `pivot` stays under `pivot`. The resulting scale
    /// is clamped to `[min_scale, max_scale]`; when clamped, the effective
    /// ratio shrinks accordingly so the pivot still holds. Returns `false`
    /// when the input is invalid or the scale would not change.
    pub fn zoom(&mut self, pivot: Point, ratio: f64, min_scale: f64, max_scale: f64) -> bool {
        if !(ratio.is_finite() && ratio > 0.0 && pivot.is_finite()) {
            warn!(ratio, px = pivot.x, py = pivot.y, "rejected invalid zoom");
            return false;
        }
        let lo = min_scale.max(f64::MIN_POSITIVE);
        let hi = max_scale.max(lo);
        let target = (self.scale * ratio).clamp(lo, hi);
        let effective = target / self.scale;
        if !effective.is_finite() || (effective - 1.0).abs() <= f64::EPSILON {
            return false;
        }

        let pan_x = pivot.x - (pivot.x - self.pan_x) * effective;
        let pan_y = pivot.y - (pivot.y - self.pan_y) * effective;
        if !(pan_x.is_finite() && pan_y.is_finite()) {
            warn!(ratio, "zoom produced non-finite pan; ignored");
            return false;
        }
        self.pan_x = pan_x;
        self.pan_y = pan_y;
        self.scale = target;
        true
    }

    /// Restore the default pan and scale, keeping axis bounds.
    pub fn reset(&mut self) {
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.scale = 1.0;
    }
}
