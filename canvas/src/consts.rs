//! Shared numeric constants for the canvas crate.
//!
//! These are visual tuning defaults. Every one of them can be overridden at
//! runtime through [`crate::config::RenderConfig`].

// ── Markers ─────────────────────────────────────────────────────

/// Markers whose rendered radius is below this are not drawn at all.
pub const MIN_RADIUS_PX: f64 = 0.5;

/// Markers whose rendered radius is below this are drawn as filled squares.
pub const SQUARE_RADIUS_PX: f64 = 1.5;

/// Fill style used when a point has no resolved color.
pub const DEFAULT_POINT_COLOR: &str = "rgba(80, 80, 80, 0.6)";

// ── Selection and highlight ─────────────────────────────────────

/// Blur radius of the selection shadow, in pixels.
pub const SHADOW_BLUR_PX: f64 = 10.0;

/// Extra radius added around a marker for its highlight halo, in pixels.
pub const HALO_PAD_PX: f64 = 6.0;

/// Shadow color painted behind selected markers.
pub const SELECTION_COLOR: &str = "#f2c200";

/// Outline color of the in-progress lasso polygon.
pub const LASSO_COLOR: &str = "#1E90FF";

/// Lasso outline dash segment length in pixels.
pub const LASSO_DASH_PX: f64 = 4.0;

/// Half the side length of a lasso vertex marker, in pixels.
pub const LASSO_VERTEX_PX: f64 = 3.0;

/// Default highlight halo palette. Entries are semi-transparent.
pub const HIGHLIGHT_PALETTE: [&str; 6] = [
    "rgba(255, 221, 0, 0.45)",
    "rgba(0, 200, 255, 0.45)",
    "rgba(255, 64, 129, 0.45)",
    "rgba(118, 255, 3, 0.45)",
    "rgba(170, 0, 255, 0.45)",
    "rgba(255, 145, 0, 0.45)",
];

// ── Interaction ─────────────────────────────────────────────────

/// Pointer motion at or below this many pixels per axis is not a drag.
pub const DRAG_THRESHOLD_PX: f64 = 1.0;

/// Arrow-key pan step in pixels.
pub const KEY_PAN_PX: f64 = 15.0;

/// Zoom ratio applied by `+` / `-` and the zoom buttons.
pub const KEY_ZOOM_RATIO: f64 = 1.5;

/// Zoom ratio applied per wheel notch.
pub const WHEEL_ZOOM_RATIO: f64 = 1.1;

/// Smallest allowed view scale.
pub const MIN_SCALE: f64 = 0.01;

/// Largest allowed view scale.
pub const MAX_SCALE: f64 = 10_000.0;

// ── Grid ────────────────────────────────────────────────────────

/// Target number of ticks per axis.
pub const GRID_TICKS: usize = 10;

/// Grid line and label color.
pub const GRID_COLOR: &str = "rgba(128, 128, 128, 0.35)";

/// Grid label font.
pub const GRID_FONT: &str = "10px sans-serif";

// ── Worker chunking ─────────────────────────────────────────────

/// Points projected per planning slice of an offloaded render.
pub const CHUNK_POINTS: usize = 20_000;

/// Style groups painted per slice of an offloaded render.
pub const CHUNK_GROUPS: usize = 16;
