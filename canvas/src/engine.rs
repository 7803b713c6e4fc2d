use tracing::{debug, info};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{AxisBounds, Point, ViewState, Viewport};
use crate::config::RenderConfig;
use crate::hit;
use crate::input::{Button, InputState, Key, KeyCommand, Modifiers, WheelDelta, exceeds_threshold, pinch_spread};
use crate::lasso::Lasso;
use crate::render::{self, Layers, RenderStats, Scene};
use crate::series::{MaskSet, PointSeries, SeriesError};
use crate::surface::{Picture, Surface};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "default";
const CURSOR_POINTER: &str = "pointer";
const CURSOR_GRABBING: &str = "grabbing";
const CURSOR_CROSSHAIR: &str = "crosshair";

/// Which layers a redraw must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Main, highlight and selection layers (the view or the points changed).
    Plot,
    /// Selection overlay only (picks or the lasso changed).
    Selection,
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded(Layer),
    /// The picked set changed; carries the new picked count.
    SelectionChanged { picked: usize },
    /// The mask changed; carries the new masked count.
    MaskChanged { masked: usize },
    SetCursor(String),
    LassoStarted,
    LassoFinished { contained: usize },
    LassoCancelled,
    /// The host should show its own context menu instead of the browser's.
    ShowContextMenu { pos: Point },
}

/// Core engine state — all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub series: PointSeries,
    pub masks: MaskSet,
    pub view: ViewState,
    pub lasso: Lasso,
    pub input: InputState,
    pub config: RenderConfig,
    pub viewport: Viewport,
    pub dpr: f64,
    /// Set when the current gesture panned; consumed by the next click.
    dragged: bool,
    cursor: String,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            series: PointSeries::default(),
            masks: MaskSet::default(),
            view: ViewState::default(),
            lasso: Lasso::new(),
            input: InputState::default(),
            config: RenderConfig::default(),
            viewport: Viewport::default(),
            dpr: 1.0,
            dragged: false,
            cursor: CURSOR_DEFAULT.to_owned(),
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Replace the dataset. Masks are recreated and any lasso is dropped.
    pub fn load_series(&mut self, series: PointSeries) -> Vec<Action> {
        info!(points = series.len(), "dataset loaded");
        self.masks = MaskSet::new(series.len());
        self.series = series;
        self.lasso.cancel();
        vec![
            Action::SelectionChanged { picked: 0 },
            Action::MaskChanged { masked: 0 },
            Action::RenderNeeded(Layer::Plot),
        ]
    }

    /// Axis bounds used to label the grid.
    pub fn set_bounds(&mut self, bounds: AxisBounds) -> Vec<Action> {
        self.view.set_bounds(bounds);
        vec![Action::RenderNeeded(Layer::Plot)]
    }

    pub fn set_config(&mut self, config: RenderConfig) -> Vec<Action> {
        self.config = config.sanitized();
        vec![Action::RenderNeeded(Layer::Plot)]
    }

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    pub fn set_viewport(&mut self, width: f64, height: f64, dpr: f64) -> Vec<Action> {
        self.viewport = Viewport::new(width, height);
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        vec![Action::RenderNeeded(Layer::Plot)]
    }

    // --- Selection and masking ---

    /// Select `indices` from an external source (e.g. a table search).
    pub fn select_indices<I>(&mut self, indices: I, combine: bool) -> Vec<Action>
    where
        I: IntoIterator<Item = usize>,
    {
        let changed = self.masks.select(indices, combine);
        self.selection_actions(changed)
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        let changed = self.masks.clear_picked();
        self.selection_actions(changed)
    }

    /// Mask the current selection.
    pub fn mask_selection(&mut self) -> Vec<Action> {
        let had_picks = self.masks.picked_count() > 0;
        let newly = self.masks.mask_picked();
        self.mask_actions(newly > 0, had_picks)
    }

    pub fn mask_indices<I>(&mut self, indices: I) -> Vec<Action>
    where
        I: IntoIterator<Item = usize>,
    {
        let picked_before = self.masks.picked_count();
        let newly = self.masks.mask(indices);
        let deselected = self.masks.picked_count() != picked_before;
        self.mask_actions(newly > 0, deselected)
    }

    /// Replace the mask from an external masking feature.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] when `masked` does not have
    /// one flag per point.
    pub fn replace_masked(&mut self, masked: Vec<bool>) -> Result<Vec<Action>, SeriesError> {
        let picked_before = self.masks.picked_count();
        self.masks.replace_masked(masked)?;
        let deselected = self.masks.picked_count() != picked_before;
        Ok(self.mask_actions(true, deselected))
    }

    pub fn unmask_all(&mut self) -> Vec<Action> {
        let changed = self.masks.unmask_all();
        self.mask_actions(changed, false)
    }

    /// Put `indices` into highlight group `group` (`0` removes their highlight).
    pub fn set_highlight<I>(&mut self, indices: I, group: u8) -> Vec<Action>
    where
        I: IntoIterator<Item = usize>,
    {
        self.masks.set_highlight(indices, group);
        vec![Action::RenderNeeded(Layer::Plot)]
    }

    pub fn clear_highlight(&mut self, group: u8) -> Vec<Action> {
        self.masks.clear_highlight(group);
        vec![Action::RenderNeeded(Layer::Plot)]
    }

    fn selection_actions(&self, changed: bool) -> Vec<Action> {
        if !changed {
            return Vec::new();
        }
        vec![
            Action::SelectionChanged { picked: self.masks.picked_count() },
            Action::RenderNeeded(Layer::Selection),
        ]
    }

    fn mask_actions(&self, mask_changed: bool, selection_changed: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        if mask_changed {
            actions.push(Action::MaskChanged { masked: self.masks.masked_count() });
        }
        if selection_changed {
            actions.push(Action::SelectionChanged { picked: self.masks.picked_count() });
        }
        if mask_changed || selection_changed {
            actions.push(Action::RenderNeeded(Layer::Plot));
        }
        actions
    }

    // --- View ---

    /// Zoom around the viewport center by the keyboard ratio.
    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_at(self.viewport.center(), self.config.key_zoom_ratio)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_at(self.viewport.center(), 1.0 / self.config.key_zoom_ratio)
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.view.reset();
        vec![Action::RenderNeeded(Layer::Plot)]
    }

    fn zoom_at(&mut self, pivot: Point, ratio: f64) -> Vec<Action> {
        if self.view.zoom(pivot, ratio, self.config.min_scale, self.config.max_scale) {
            vec![Action::RenderNeeded(Layer::Plot)]
        } else {
            Vec::new()
        }
    }

    fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        if self.view.pan(dx, dy) {
            vec![Action::RenderNeeded(Layer::Plot)]
        } else {
            Vec::new()
        }
    }

    // --- Lasso ---

    /// The control that both starts and finishes a lasso.
    pub fn toggle_lasso(&mut self, modifiers: Modifiers) -> Vec<Action> {
        if self.lasso.is_drawing() {
            self.finish_lasso(modifiers.combine())
        } else {
            self.start_lasso()
        }
    }

    pub fn start_lasso(&mut self) -> Vec<Action> {
        if !self.lasso.start() {
            return Vec::new();
        }
        info!("lasso started");
        let mut actions = vec![Action::LassoStarted];
        actions.extend(self.set_cursor(CURSOR_CROSSHAIR));
        actions.push(Action::RenderNeeded(Layer::Selection));
        actions
    }

    pub fn finish_lasso(&mut self, combine: bool) -> Vec<Action> {
        let Some(outcome) = self.lasso.finish(self.series.view(), &mut self.masks, combine) else {
            return Vec::new();
        };
        let mut actions = vec![Action::LassoFinished { contained: outcome.contained.len() }];
        if outcome.changed {
            actions.push(Action::SelectionChanged { picked: self.masks.picked_count() });
        }
        actions.extend(self.set_cursor(CURSOR_DEFAULT));
        actions.push(Action::RenderNeeded(Layer::Selection));
        actions
    }

    pub fn cancel_lasso(&mut self) -> Vec<Action> {
        if !self.lasso.cancel() {
            return Vec::new();
        }
        let mut actions = vec![Action::LassoCancelled];
        actions.extend(self.set_cursor(CURSOR_DEFAULT));
        actions.push(Action::RenderNeeded(Layer::Selection));
        actions
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button == Button::Secondary {
            return Vec::new();
        }
        self.dragged = false;
        self.input = InputState::Pressed { last: screen_pt };
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        match self.input {
            InputState::Pressed { last } => self.drag_to(last, screen_pt),
            InputState::Idle => {
                let cursor = if self.lasso.is_drawing() {
                    CURSOR_CROSSHAIR
                } else if self.pick(screen_pt).is_some() {
                    CURSOR_POINTER
                } else {
                    CURSOR_DEFAULT
                };
                self.set_cursor(cursor).into_iter().collect()
            }
            InputState::Pinching { .. } => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        self.input = InputState::Idle;
        if self.dragged {
            let resting = if self.lasso.is_drawing() { CURSOR_CROSSHAIR } else { CURSOR_DEFAULT };
            return self.set_cursor(resting).into_iter().collect();
        }
        Vec::new()
    }

    /// The pointer left the canvas: drop any press in progress.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.input = InputState::Idle;
        Vec::new()
    }

    /// A click: picks a point, or adds a lasso vertex while drawing.
    ///
    /// A click that ends a drag has no selection effect.
    pub fn on_click(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        if std::mem::take(&mut self.dragged) {
            debug!("click after drag ignored");
            return Vec::new();
        }
        if self.lasso.is_drawing() {
            if self.lasso.add_vertex(screen_pt, &self.view, self.viewport) {
                return vec![Action::RenderNeeded(Layer::Selection)];
            }
            return Vec::new();
        }
        let hit = self.pick(screen_pt);
        let changed = hit::apply_pick(&mut self.masks, hit, modifiers.combine());
        self.selection_actions(changed)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        let ratio = if delta.dy < 0.0 {
            self.config.wheel_zoom_ratio
        } else if delta.dy > 0.0 {
            1.0 / self.config.wheel_zoom_ratio
        } else {
            return Vec::new();
        };
        self.zoom_at(screen_pt, ratio)
    }

    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        match touches {
            [a, b, ..] => {
                self.dragged = true;
                self.input = InputState::Pinching { mid: a.midpoint(*b), spread: pinch_spread(*a, *b, self.viewport) };
            }
            [a] => {
                self.dragged = false;
                self.input = InputState::Pressed { last: *a };
            }
            [] => self.input = InputState::Idle,
        }
        Vec::new()
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        match (self.input, touches) {
            (InputState::Pinching { spread, .. }, [a, b, ..]) => {
                let mid = a.midpoint(*b);
                let next = pinch_spread(*a, *b, self.viewport);
                self.input = InputState::Pinching { mid, spread: next };
                if spread > 0.0 && next > 0.0 {
                    self.zoom_at(mid, next / spread)
                } else {
                    Vec::new()
                }
            }
            (InputState::Pressed { last }, [a]) => self.drag_to(last, *a),
            _ => Vec::new(),
        }
    }

    /// `remaining` are the touches still down after the change.
    pub fn on_touch_end(&mut self, remaining: &[Point]) -> Vec<Action> {
        self.input = match remaining {
            [a] => InputState::Pressed { last: *a },
            _ => InputState::Idle,
        };
        Vec::new()
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        let Some(command) = key.command() else {
            return Vec::new();
        };
        match command {
            KeyCommand::Pan { dx, dy } => {
                let step = self.config.key_pan_px;
                self.pan_by(f64::from(dx) * step, f64::from(dy) * step)
            }
            KeyCommand::ZoomIn => self.zoom_in(),
            KeyCommand::ZoomOut => self.zoom_out(),
            KeyCommand::ResetView => self.reset_view(),
            KeyCommand::FinishLasso => self.finish_lasso(modifiers.combine()),
            KeyCommand::CancelLasso => self.cancel_lasso(),
            KeyCommand::ToggleLasso => self.toggle_lasso(modifiers),
        }
    }

    pub fn on_context_menu(&mut self, screen_pt: Point) -> Vec<Action> {
        vec![Action::ShowContextMenu { pos: screen_pt }]
    }

    fn drag_to(&mut self, last: Point, screen_pt: Point) -> Vec<Action> {
        if !exceeds_threshold(last, screen_pt, self.config.drag_threshold_px) {
            return Vec::new();
        }
        self.input = InputState::Pressed { last: screen_pt };
        self.dragged = true;
        let mut actions = self.pan_by(screen_pt.x - last.x, screen_pt.y - last.y);
        actions.extend(self.set_cursor(CURSOR_GRABBING));
        actions
    }

    fn set_cursor(&mut self, cursor: &str) -> Option<Action> {
        if self.cursor == cursor {
            return None;
        }
        cursor.clone_into(&mut self.cursor);
        Some(Action::SetCursor(cursor.to_owned()))
    }

    // --- Rendering ---

    /// Read-only bundle of what a frame draws.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene { view: self.view, viewport: self.viewport, points: self.series.view(), masks: self.masks.view() }
    }

    /// Redraw all three layers.
    ///
    /// # Errors
    ///
    /// Propagates the first surface error.
    pub fn render<S: Surface>(&self, layers: &mut Layers<S>) -> Result<RenderStats, S::Error> {
        render::render(layers, &self.scene(), &self.config, self.lasso.vertices())
    }

    /// Redraw the selection overlay only.
    ///
    /// # Errors
    ///
    /// Propagates the first surface error.
    pub fn render_selection<S: Surface>(&self, selection: &mut S) -> Result<RenderStats, S::Error> {
        render::draw_selection(selection, &self.scene(), &self.config, self.lasso.vertices())
    }

    /// Draw the in-progress lasso on top of whatever `surface` already holds.
    ///
    /// # Errors
    ///
    /// Propagates the first surface error.
    pub fn render_lasso<S: Surface>(&self, surface: &mut S) -> Result<(), S::Error> {
        render::draw_lasso(surface, self.lasso.vertices(), &self.view, self.viewport, &self.config)
    }

    // --- Queries ---

    /// The point under a device position, if any.
    #[must_use]
    pub fn pick(&self, screen_pt: Point) -> Option<usize> {
        hit::pick(screen_pt, &self.view, self.viewport, self.series.view(), self.masks.view(), self.config.min_radius_px)
            .map(|h| h.index)
    }

    #[must_use]
    pub fn picked_count(&self) -> usize {
        self.masks.picked_count()
    }

    #[must_use]
    pub fn masked_count(&self) -> usize {
        self.masks.masked_count()
    }

    #[must_use]
    pub fn picked_indices(&self) -> Vec<usize> {
        self.masks.picked_indices()
    }

    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

/// The full canvas engine. Wraps `EngineCore` and owns the three browser canvases.
pub struct Engine {
    canvases: Layers<HtmlCanvasElement>,
    contexts: Layers<CanvasRenderingContext2d>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the main, highlight and selection canvases.
    ///
    /// # Errors
    ///
    /// Fails when any canvas cannot provide a 2D context.
    pub fn new(canvases: Layers<HtmlCanvasElement>) -> Result<Self, JsValue> {
        let contexts = Layers {
            main: context_2d(&canvases.main)?,
            highlight: context_2d(&canvases.highlight)?,
            selection: context_2d(&canvases.selection)?,
        };
        Ok(Self { canvases, contexts, core: EngineCore::new() })
    }

    /// Resize the backing stores to CSS size times `dpr` and scale the contexts.
    ///
    /// # Errors
    ///
    /// Fails when a context rejects the transform.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.set_viewport(width_css, height_css, dpr);
        let dpr = self.core.dpr;
        let (w, h) = ((width_css * dpr).round().max(0.0) as u32, (height_css * dpr).round().max(0.0) as u32);
        for (canvas, ctx) in [
            (&self.canvases.main, &self.contexts.main),
            (&self.canvases.highlight, &self.contexts.highlight),
            (&self.canvases.selection, &self.contexts.selection),
        ] {
            canvas.set_width(w);
            canvas.set_height(h);
            ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        }
        Ok(actions)
    }

    // --- Render ---

    /// Draw all three layers on the UI thread.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&mut self) -> Result<RenderStats, JsValue> {
        self.core.render(&mut self.contexts)
    }

    /// Redraw only the selection overlay on the UI thread.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render_selection(&mut self) -> Result<RenderStats, JsValue> {
        self.core.render_selection(&mut self.contexts.selection)
    }

    /// Show layers rendered elsewhere, then the live lasso on top.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn present(
        &mut self,
        main: Option<&Picture>,
        highlight: Option<&Picture>,
        selection: Option<&Picture>,
    ) -> Result<(), JsValue> {
        if let Some(p) = main {
            p.replay(&mut self.contexts.main)?;
        }
        if let Some(p) = highlight {
            p.replay(&mut self.contexts.highlight)?;
        }
        if let Some(p) = selection {
            p.replay(&mut self.contexts.selection)?;
            self.core.render_lasso(&mut self.contexts.selection)?;
        }
        Ok(())
    }

    // --- Delegated input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.core.on_pointer_leave()
    }

    pub fn on_click(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_click(screen_pt, modifiers)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        self.core.on_touch_start(touches)
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        self.core.on_touch_move(touches)
    }

    pub fn on_touch_end(&mut self, remaining: &[Point]) -> Vec<Action> {
        self.core.on_touch_end(remaining)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    pub fn on_context_menu(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_context_menu(screen_pt)
    }
}
