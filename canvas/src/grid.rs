//! Axis grid overlay with "nice number" tick placement.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use crate::camera::{Point, ViewState, Viewport};
use crate::config::RenderConfig;
use crate::consts::GRID_FONT;
use crate::surface::Surface;

/// Round step multipliers tried within each power of ten.
const MULTIPLIERS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Label inset from the tick line and the viewport edge, in pixels.
const LABEL_INSET_PX: f64 = 3.0;

/// Smallest round step whose ticks over `[min, max]` number at most `target`.
///
/// Returns `None` for an empty, inverted or non-finite range, or a zero target.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn nice_step(min: f64, max: f64, target: usize) -> Option<f64> {
    let range = max - min;
    if target == 0 || !(range.is_finite() && range > 0.0) {
        return None;
    }

    let raw = range / target as f64;
    let base = 10f64.powf(raw.log10().floor());
    for decade in [base, base * 10.0] {
        for m in MULTIPLIERS {
            let step = m * decade;
            if tick_count(min, max, step) <= target {
                return Some(step);
            }
        }
    }
    Some(base * 100.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tick_count(min: f64, max: f64, step: f64) -> usize {
    let first = (min / step).ceil();
    let last = (max / step).floor();
    if last < first {
        return 0;
    }
    (last - first) as usize + 1
}

/// Tick positions: every multiple of the nice step inside `[min, max]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let Some(step) = nice_step(min, max, target) else {
        return Vec::new();
    };
    let (first, last) = ((min / step).ceil() as i64, (max / step).floor() as i64);
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Decimal places needed to print multiples of `step` exactly.
#[must_use]
pub fn label_decimals(step: f64) -> usize {
    let mut scaled = step.abs();
    for decimals in 0..10 {
        if (scaled - scaled.round()).abs() <= scaled * 1e-9 {
            return decimals;
        }
        scaled *= 10.0;
    }
    10
}

/// Format a tick value, printing zero without a sign.
#[must_use]
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = label_decimals(step);
    let value = if value.abs() < step.abs() * 1e-9 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

/// Draw vertical and horizontal tick lines with labels in raw data units.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn draw_grid<S: Surface>(
    surface: &mut S,
    view: &ViewState,
    viewport: Viewport,
    cfg: &RenderConfig,
) -> Result<(), S::Error> {
    if viewport.is_empty() {
        return Ok(());
    }
    let bounds = view.bounds();
    let visible = view.visible_rect(viewport);
    let (x0, y0) = bounds.denormalize(visible.min);
    let (x1, y1) = bounds.denormalize(visible.max);
    let (x_lo, x_hi) = (x0.min(x1), x0.max(x1));
    let (y_lo, y_hi) = (y0.min(y1), y0.max(y1));

    let xs = ticks(x_lo, x_hi, cfg.grid_ticks);
    let ys = ticks(y_lo, y_hi, cfg.grid_ticks);
    let x_step = nice_step(x_lo, x_hi, cfg.grid_ticks).unwrap_or(1.0);
    let y_step = nice_step(y_lo, y_hi, cfg.grid_ticks).unwrap_or(1.0);

    let device_x = |x: f64| view.to_device(bounds.normalize(x, bounds.y_min), viewport).x;
    let device_y = |y: f64| view.to_device(bounds.normalize(bounds.x_min, y), viewport).y;

    surface.begin_path();
    for x in &xs {
        let dx = device_x(*x).round();
        surface.move_to(dx, 0.0);
        surface.line_to(dx, viewport.height);
    }
    for y in &ys {
        let dy = device_y(*y).round();
        surface.move_to(0.0, dy);
        surface.line_to(viewport.width, dy);
    }
    surface.stroke(&cfg.grid_color, 1.0);

    for x in &xs {
        let at = Point::new(device_x(*x) + LABEL_INSET_PX, viewport.height - LABEL_INSET_PX);
        surface.fill_text(&format_tick(*x, x_step), at.x, at.y, &cfg.grid_color, GRID_FONT)?;
    }
    for y in &ys {
        let at = Point::new(LABEL_INSET_PX, device_y(*y) - LABEL_INSET_PX);
        surface.fill_text(&format_tick(*y, y_step), at.x, at.y, &cfg.grid_color, GRID_FONT)?;
    }
    Ok(())
}
