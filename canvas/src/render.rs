//! Batched point renderer.
//!
//! Rendering happens in two phases. A [`PointPlanner`] projects every point
//! into device space, drops the ones that are masked, sub-pixel or off
//! screen, and buckets the rest by fill style. The `paint_*` functions then
//! turn each bucket into a single path and a single fill call on a
//! [`Surface`].
//!
//! The phases are public so the render worker can run them in bounded
//! slices. [`render`], [`draw_points`] and [`draw_selection`] run them in one
//! go for the main thread.
//!
//! Layers:
//!
//! | Layer | Contents |
//! |-------|----------|
//! | main | optional grid, then markers grouped by fill style |
//! | highlight | halos grouped by highlight id |
//! | selection | blurred shadows of picked points, then the lasso outline |

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::BTreeMap;

use crate::camera::{Point, ViewState, Viewport};
use crate::config::RenderConfig;
use crate::consts::{LASSO_DASH_PX, LASSO_VERTEX_PX};
use crate::grid;
use crate::series::{MaskView, SeriesView};
use crate::surface::Surface;

/// Everything one frame reads.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub view: ViewState,
    pub viewport: Viewport,
    pub points: SeriesView<'a>,
    pub masks: MaskView<'a>,
}

/// The three drawing surfaces of one plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layers<S> {
    pub main: S,
    pub highlight: S,
    pub selection: S,
}

/// Which outputs a planner collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passes {
    pub markers: bool,
    pub halos: bool,
    pub shadows: bool,
}

impl Passes {
    /// Markers, halos and shadows.
    pub const ALL: Self = Self { markers: true, halos: true, shadows: true };
    /// Main and highlight layers only.
    pub const POINTS: Self = Self { markers: true, halos: true, shadows: false };
    /// Selection shadows only.
    pub const SELECTION: Self = Self { markers: false, halos: false, shadows: true };
}

/// A marker in device pixels, already rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Marker {
    /// Round center and radius half away from zero. The radius never drops
    /// below one pixel.
    #[must_use]
    pub fn rounded(center: Point, r: f64) -> Self {
        Self { x: center.x.round(), y: center.y.round(), r: r.round().max(1.0) }
    }
}

/// Markers sharing one fill style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerGroup {
    pub squares: Vec<Marker>,
    pub circles: Vec<Marker>,
}

impl MarkerGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.squares.len() + self.circles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.squares.is_empty() && self.circles.is_empty()
    }
}

/// Counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Points that survived every filter.
    pub drawn: usize,
    pub masked: usize,
    /// Points below the minimum visible radius.
    pub tiny: usize,
    /// Points entirely outside the viewport, or with non-finite geometry.
    pub culled: usize,
    /// Fill calls issued.
    pub fills: usize,
}

/// Planned geometry of one frame, ready to paint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePlan {
    /// Marker groups keyed by fill style, in style order.
    pub markers: Vec<(String, MarkerGroup)>,
    /// Halo circles keyed by resolved highlight color, in id order.
    pub halos: Vec<(String, Vec<Marker>)>,
    pub shadows: Vec<Marker>,
    pub stats: RenderStats,
}

/// Incremental projection of a point series into a [`FramePlan`].
#[derive(Debug, Clone)]
pub struct PointPlanner {
    passes: Passes,
    next: usize,
    groups: BTreeMap<String, MarkerGroup>,
    halos: BTreeMap<u8, Vec<Marker>>,
    shadows: Vec<Marker>,
    stats: RenderStats,
}

impl PointPlanner {
    #[must_use]
    pub fn new(passes: Passes) -> Self {
        Self {
            passes,
            next: 0,
            groups: BTreeMap::new(),
            halos: BTreeMap::new(),
            shadows: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    /// Index of the next point to project.
    #[must_use]
    pub fn position(&self) -> usize {
        self.next
    }

    /// Project up to `budget` more points (at least one). Returns `true`
    /// once every point of the scene has been visited.
    pub fn feed(&mut self, scene: &Scene<'_>, cfg: &RenderConfig, budget: usize) -> bool {
        let len = scene.points.len();
        let end = self.next.saturating_add(budget.max(1)).min(len);
        for i in self.next..end {
            self.plan_point(scene, cfg, i);
        }
        self.next = end.max(self.next);
        self.next >= len
    }

    fn plan_point(&mut self, scene: &Scene<'_>, cfg: &RenderConfig, i: usize) {
        if scene.masks.is_masked(i) {
            self.stats.masked += 1;
            return;
        }
        let (Some(pos), Some(size)) = (scene.points.position(i), scene.points.size_of(i)) else {
            return;
        };
        let center = scene.view.to_device(pos, scene.viewport);
        let r = scene.view.radius_px(size);
        if !(center.is_finite() && r.is_finite()) {
            self.stats.culled += 1;
            return;
        }
        if r < cfg.min_radius_px {
            self.stats.tiny += 1;
            return;
        }

        let group = scene.masks.highlight(i);
        let halo = self.passes.halos && group != 0;
        let reach = if halo { r + cfg.halo_pad_px } else { r };
        if outside(center, reach, scene.viewport) {
            self.stats.culled += 1;
            return;
        }

        self.stats.drawn += 1;
        let marker = Marker::rounded(center, r);

        if self.passes.markers {
            let style = scene
                .points
                .color_of(i)
                .filter(|s| !s.is_empty())
                .unwrap_or(cfg.point_color.as_str());
            let square = r < cfg.square_radius_px;
            match self.groups.get_mut(style) {
                Some(g) => push_marker(g, marker, square),
                None => {
                    let mut g = MarkerGroup::default();
                    push_marker(&mut g, marker, square);
                    self.groups.insert(style.to_owned(), g);
                }
            }
        }
        if halo {
            self.halos
                .entry(group)
                .or_default()
                .push(Marker::rounded(center, r + cfg.halo_pad_px));
        }
        if self.passes.shadows && scene.masks.is_picked(i) {
            self.shadows.push(marker);
        }
    }

    /// Stop planning and hand over the collected geometry.
    ///
    /// Halo ids without a palette color are dropped.
    #[must_use]
    pub fn finish(self, cfg: &RenderConfig) -> FramePlan {
        let halos = self
            .halos
            .into_iter()
            .filter_map(|(id, markers)| cfg.highlight_color(id).map(|c| (c.to_owned(), markers)))
            .collect();
        FramePlan { markers: self.groups.into_iter().collect(), halos, shadows: self.shadows, stats: self.stats }
    }
}

fn push_marker(group: &mut MarkerGroup, marker: Marker, square: bool) {
    if square {
        group.squares.push(marker);
    } else {
        group.circles.push(marker);
    }
}

fn outside(c: Point, r: f64, viewport: Viewport) -> bool {
    c.x + r < 0.0 || c.x - r > viewport.width || c.y + r < 0.0 || c.y - r > viewport.height
}

// =============================================================
// Painting
// =============================================================

/// One path and one fill per style group. Returns the number of fills.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn paint_markers<S: Surface>(surface: &mut S, groups: &[(String, MarkerGroup)]) -> Result<usize, S::Error> {
    let mut fills = 0;
    for (style, group) in groups {
        if group.is_empty() {
            continue;
        }
        surface.begin_path();
        for m in &group.squares {
            surface.rect(m.x - m.r, m.y - m.r, 2.0 * m.r, 2.0 * m.r);
        }
        for m in &group.circles {
            surface.circle(m.x, m.y, m.r)?;
        }
        surface.fill(style);
        fills += 1;
    }
    Ok(fills)
}

/// One path and one fill per highlight color. Returns the number of fills.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn paint_halos<S: Surface>(surface: &mut S, halos: &[(String, Vec<Marker>)]) -> Result<usize, S::Error> {
    let mut fills = 0;
    for (color, markers) in halos {
        if markers.is_empty() {
            continue;
        }
        surface.begin_path();
        for m in markers {
            surface.circle(m.x, m.y, m.r)?;
        }
        surface.fill(color);
        fills += 1;
    }
    Ok(fills)
}

/// All selection shadows as one path with a single blurred fill.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn paint_shadows<S: Surface>(surface: &mut S, shadows: &[Marker], cfg: &RenderConfig) -> Result<usize, S::Error> {
    if shadows.is_empty() {
        return Ok(0);
    }
    surface.begin_path();
    for m in shadows {
        surface.circle(m.x, m.y, m.r)?;
    }
    surface.fill_with_shadow(&cfg.selection_color, &cfg.selection_color, cfg.shadow_blur_px);
    Ok(1)
}

/// Dashed outline of an in-progress lasso plus a square on every vertex.
///
/// `vertices` are in data space. The outline closes back to the first vertex.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn draw_lasso<S: Surface>(
    surface: &mut S,
    vertices: &[Point],
    view: &ViewState,
    viewport: Viewport,
    cfg: &RenderConfig,
) -> Result<(), S::Error> {
    let device: Vec<Point> = vertices.iter().map(|v| view.to_device(*v, viewport)).collect();
    let Some((first, rest)) = device.split_first() else {
        return Ok(());
    };

    surface.set_line_dash(&[LASSO_DASH_PX, LASSO_DASH_PX])?;
    surface.begin_path();
    surface.move_to(first.x, first.y);
    for p in rest {
        surface.line_to(p.x, p.y);
    }
    if !rest.is_empty() {
        surface.close_path();
    }
    surface.stroke(&cfg.lasso_color, 1.0);
    surface.set_line_dash(&[])?;

    surface.begin_path();
    for p in &device {
        surface.rect(p.x - LASSO_VERTEX_PX, p.y - LASSO_VERTEX_PX, 2.0 * LASSO_VERTEX_PX, 2.0 * LASSO_VERTEX_PX);
    }
    surface.fill(&cfg.lasso_color);
    Ok(())
}

// =============================================================
// Whole-frame drawing
// =============================================================

/// Redraw the main and highlight layers.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn draw_points<S: Surface>(
    main: &mut S,
    highlight: &mut S,
    scene: &Scene<'_>,
    cfg: &RenderConfig,
) -> Result<RenderStats, S::Error> {
    main.clear(scene.viewport.width, scene.viewport.height);
    highlight.clear(scene.viewport.width, scene.viewport.height);
    if scene.viewport.is_empty() {
        return Ok(RenderStats::default());
    }
    if cfg.show_grid {
        grid::draw_grid(main, &scene.view, scene.viewport, cfg)?;
    }

    let mut planner = PointPlanner::new(Passes::POINTS);
    planner.feed(scene, cfg, usize::MAX);
    let plan = planner.finish(cfg);

    let mut stats = plan.stats;
    stats.fills += paint_markers(main, &plan.markers)?;
    stats.fills += paint_halos(highlight, &plan.halos)?;
    Ok(stats)
}

/// Redraw the selection overlay: shadows of picked points, then the lasso.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn draw_selection<S: Surface>(
    selection: &mut S,
    scene: &Scene<'_>,
    cfg: &RenderConfig,
    lasso: &[Point],
) -> Result<RenderStats, S::Error> {
    selection.clear(scene.viewport.width, scene.viewport.height);
    if scene.viewport.is_empty() {
        return Ok(RenderStats::default());
    }

    let mut planner = PointPlanner::new(Passes::SELECTION);
    planner.feed(scene, cfg, usize::MAX);
    let plan = planner.finish(cfg);

    let mut stats = plan.stats;
    stats.fills += paint_shadows(selection, &plan.shadows, cfg)?;
    draw_lasso(selection, lasso, &scene.view, scene.viewport, cfg)?;
    Ok(stats)
}

/// Redraw all three layers.
///
/// # Errors
///
/// Propagates the first surface error.
pub fn render<S: Surface>(
    layers: &mut Layers<S>,
    scene: &Scene<'_>,
    cfg: &RenderConfig,
    lasso: &[Point],
) -> Result<RenderStats, S::Error> {
    let mut stats = draw_points(&mut layers.main, &mut layers.highlight, scene, cfg)?;
    stats.fills += draw_selection(&mut layers.selection, scene, cfg, lasso)?.fills;
    Ok(stats)
}
