//! Runtime-tunable rendering and interaction settings.
//!
//! The defaults come from [`crate::consts`]. Hosts may ship a partial JSON
//! object; missing keys keep their defaults.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CHUNK_GROUPS, CHUNK_POINTS, DEFAULT_POINT_COLOR, DRAG_THRESHOLD_PX, GRID_COLOR, GRID_TICKS, HALO_PAD_PX,
    HIGHLIGHT_PALETTE, KEY_PAN_PX, KEY_ZOOM_RATIO, LASSO_COLOR, MAX_SCALE, MIN_RADIUS_PX, MIN_SCALE,
    SELECTION_COLOR, SHADOW_BLUR_PX, SQUARE_RADIUS_PX, WHEEL_ZOOM_RATIO,
};

/// Visual thresholds, interaction steps, worker chunk sizes and theme colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Markers with a rendered radius below this are skipped.
    pub min_radius_px: f64,
    /// Markers with a rendered radius below this are drawn as squares.
    pub square_radius_px: f64,
    /// Per-axis motion that must be exceeded before a press becomes a drag.
    pub drag_threshold_px: f64,
    /// Blur of the selection shadow.
    pub shadow_blur_px: f64,
    /// Radius added around highlighted markers.
    pub halo_pad_px: f64,
    /// Arrow-key pan step.
    pub key_pan_px: f64,
    /// Zoom ratio for keyboard and button zoom.
    pub key_zoom_ratio: f64,
    /// Zoom ratio per wheel notch.
    pub wheel_zoom_ratio: f64,
    /// Lower bound on the view scale.
    pub min_scale: f64,
    /// Upper bound on the view scale.
    pub max_scale: f64,
    /// Points projected per planning slice in the worker.
    pub chunk_points: usize,
    /// Style groups painted per slice in the worker.
    pub chunk_groups: usize,
    /// Draw the axis grid under the markers.
    pub show_grid: bool,
    /// Target tick count per axis.
    pub grid_ticks: usize,
    pub grid_color: String,
    pub selection_color: String,
    pub lasso_color: String,
    /// Fallback fill for points without a resolved color.
    pub point_color: String,
    /// Halo colors, indexed by highlight group id minus one.
    pub highlight_palette: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_radius_px: MIN_RADIUS_PX,
            square_radius_px: SQUARE_RADIUS_PX,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            shadow_blur_px: SHADOW_BLUR_PX,
            halo_pad_px: HALO_PAD_PX,
            key_pan_px: KEY_PAN_PX,
            key_zoom_ratio: KEY_ZOOM_RATIO,
            wheel_zoom_ratio: WHEEL_ZOOM_RATIO,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            chunk_points: CHUNK_POINTS,
            chunk_groups: CHUNK_GROUPS,
            show_grid: false,
            grid_ticks: GRID_TICKS,
            grid_color: GRID_COLOR.to_owned(),
            selection_color: SELECTION_COLOR.to_owned(),
            lasso_color: LASSO_COLOR.to_owned(),
            point_color: DEFAULT_POINT_COLOR.to_owned(),
            highlight_palette: HIGHLIGHT_PALETTE.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

impl RenderConfig {
    /// Parse a (possibly partial) JSON config and sanitize it.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `raw` is not a valid config object.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// Replace out-of-range values with their defaults.
    ///
    /// Ratios must be finite and greater than one, radii and steps finite and
    /// non-negative, chunk sizes non-zero, and `min_scale <= max_scale`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let non_negative = |v: f64, d: f64| if v.is_finite() && v >= 0.0 { v } else { d };
        let above_one = |v: f64, d: f64| if v.is_finite() && v > 1.0 { v } else { d };

        self.min_radius_px = non_negative(self.min_radius_px, defaults.min_radius_px);
        self.square_radius_px = non_negative(self.square_radius_px, defaults.square_radius_px);
        self.drag_threshold_px = non_negative(self.drag_threshold_px, defaults.drag_threshold_px);
        self.shadow_blur_px = non_negative(self.shadow_blur_px, defaults.shadow_blur_px);
        self.halo_pad_px = non_negative(self.halo_pad_px, defaults.halo_pad_px);
        self.key_pan_px = non_negative(self.key_pan_px, defaults.key_pan_px);
        self.key_zoom_ratio = above_one(self.key_zoom_ratio, defaults.key_zoom_ratio);
        self.wheel_zoom_ratio = above_one(self.wheel_zoom_ratio, defaults.wheel_zoom_ratio);

        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            self.min_scale = defaults.min_scale;
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            self.max_scale = defaults.max_scale.max(self.min_scale);
        }
        if self.chunk_points == 0 {
            self.chunk_points = defaults.chunk_points;
        }
        if self.chunk_groups == 0 {
            self.chunk_groups = defaults.chunk_groups;
        }
        if self.grid_ticks < 2 {
            self.grid_ticks = defaults.grid_ticks;
        }
        if self.highlight_palette.is_empty() {
            self.highlight_palette = defaults.highlight_palette;
        }
        self
    }

    /// Halo color for a highlight group id (`0` means "no highlight").
    #[must_use]
    pub fn highlight_color(&self, group: u8) -> Option<&str> {
        if group == 0 || self.highlight_palette.is_empty() {
            return None;
        }
        let idx = usize::from(group - 1) % self.highlight_palette.len();
        self.highlight_palette.get(idx).map(String::as_str)
    }
}
