//! One headless plotting session.
//!
//! The session plays the host page: it owns an [`EngineCore`], forwards data
//! and mask changes to a render worker, turns `RenderNeeded` actions into
//! render requests and presents whatever completion the tracker accepts.
//!
//! ```text
//! gesture -> EngineCore -> [Action] -> dispatch -> DataUpdate / render request
//!                                                        |
//!                            present <- poll_frame <- worker thread
//! ```
//!
//! A run replays a seeded burst of drags, wheel zooms, arrow keys and clicks,
//! then lassoes the first cluster, masks the selection and waits for the
//! last frame.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use canvas::camera::{Point, Viewport};
use canvas::engine::{Action, EngineCore, Layer};
use canvas::input::{Button, Key, Modifiers, WheelDelta};
use canvas::render::Layers;
use canvas::surface::Picture;
use frames::{Completion, DataUpdate, Geometry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use render_worker::RenderClient;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::synth::{self, Dataset};

const TARGET: usize = 0;
const KEYS: [&str; 6] = ["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown", "+", "-"];
const WHEEL_NOTCH: f64 = 100.0;
const LASSO_RADIUS: f64 = 0.05;
const LASSO_VERTICES: usize = 16;
// Keeps the gesture stream independent of the dataset stream.
const GESTURE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// What a run did, printed as JSON by the binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub points: usize,
    pub gestures: usize,
    /// Render requests issued.
    pub requested: u64,
    /// Completions accepted and presented.
    pub accepted: u64,
    /// Completions dropped as stale.
    pub stale: u64,
    /// Points inside the lasso.
    pub lasso_contained: usize,
    /// Of those, how many belong to the lassoed cluster.
    pub lasso_cluster_hits: usize,
    pub picked: usize,
    pub masked: usize,
    /// Paint ops on the main layer of the last presented frame.
    pub main_ops: usize,
}

/// Engine plus worker for a single target.
struct Session {
    engine: EngineCore,
    client: RenderClient,
    layers: Layers<Picture>,
    lasso_contained: usize,
}

impl Session {
    fn start(config: &DriverConfig, data: &Dataset) -> Result<(Self, Vec<Action>), DriverError> {
        let mut engine = EngineCore::new();
        let mut actions = engine.set_config(config.render.clone());
        actions.extend(engine.set_viewport(config.width, config.height, 1.0));
        actions.extend(engine.set_bounds(data.bounds));
        actions.extend(engine.load_series(data.series.clone()));

        let mut client = RenderClient::spawn(engine.config.clone(), config.transport)?;
        client.add_target(TARGET)?;
        client.send_data(DataUpdate::full(&engine.series, &engine.masks, data.bounds))?;
        info!(points = engine.series.len(), transport = ?config.transport, "session started");

        let session = Self { engine, client, layers: Layers::default(), lasso_contained: 0 };
        Ok((session, actions))
    }

    fn apply<F>(&mut self, f: F) -> Result<(), DriverError>
    where
        F: FnOnce(&mut EngineCore) -> Vec<Action>,
    {
        let actions = f(&mut self.engine);
        self.dispatch(actions)
    }

    /// Forward one batch of engine actions, then present any finished frame.
    fn dispatch(&mut self, actions: Vec<Action>) -> Result<(), DriverError> {
        let mut redraw: Option<Layer> = None;
        let mut masks_changed = false;
        let mut picks_changed = false;
        for action in actions {
            match action {
                Action::RenderNeeded(layer) => {
                    redraw = match (redraw, layer) {
                        (Some(Layer::Plot), _) | (_, Layer::Plot) => Some(Layer::Plot),
                        _ => Some(Layer::Selection),
                    };
                }
                Action::SelectionChanged { picked } => {
                    debug!(picked, "selection changed");
                    picks_changed = true;
                }
                Action::MaskChanged { masked } => {
                    debug!(masked, "mask changed");
                    masks_changed = true;
                }
                Action::LassoFinished { contained } => self.lasso_contained = contained,
                Action::SetCursor(cursor) => debug!(%cursor, "cursor"),
                Action::LassoStarted | Action::LassoCancelled | Action::ShowContextMenu { .. } => {
                    debug!(?action, "host action");
                }
            }
        }

        if masks_changed {
            self.client.send_data(DataUpdate::masks(&self.engine.masks))?;
        } else if picks_changed {
            self.client.send_data(DataUpdate::picked(&self.engine.masks))?;
        }
        if let Some(layer) = redraw {
            let geometry = Geometry::new(&self.engine.view, self.engine.viewport);
            self.client.request_layer(TARGET, layer, geometry)?;
        }
        while let Some(done) = self.client.poll_frame()? {
            self.present(done);
        }
        Ok(())
    }

    /// Swap in the redrawn layers and draw the live lasso over the selection.
    fn present(&mut self, done: Completion) {
        let (uid, kind) = (done.uid, done.kind);
        if let Some(main) = done.main {
            self.layers.main = main;
        }
        if let Some(highlight) = done.highlight {
            self.layers.highlight = highlight;
        }
        if let Some(selection) = done.selection {
            self.layers.selection = selection;
        }
        let mut overlay = self.layers.selection.clone();
        let Ok(()) = self.engine.render_lasso(&mut overlay);
        debug!(uid, ?kind, main = self.layers.main.len(), overlay = overlay.len(), "frame presented");
    }

    fn gesture(&mut self, rng: &mut StdRng) -> Result<(), DriverError> {
        let viewport = self.engine.viewport;
        let none = Modifiers::default();
        match rng.random_range(0..4) {
            0 => {
                let from = anywhere(rng, viewport);
                let to = anywhere(rng, viewport);
                self.apply(|e| e.on_pointer_down(from, Button::Primary, none))?;
                self.apply(|e| e.on_pointer_move(from.midpoint(to), none))?;
                self.apply(|e| e.on_pointer_move(to, none))?;
                self.apply(|e| e.on_pointer_up(to, Button::Primary, none))?;
                self.apply(|e| e.on_click(to, none))
            }
            1 => {
                let at = anywhere(rng, viewport);
                let dy = if rng.random() { WHEEL_NOTCH } else { -WHEEL_NOTCH };
                self.apply(|e| e.on_wheel(at, WheelDelta { dx: 0.0, dy }, none))
            }
            2 => {
                let key = KEYS[rng.random_range(0..KEYS.len())];
                self.apply(|e| e.on_key_down(Key::new(key), none))
            }
            _ => {
                let at = match self.engine.series.len() {
                    0 => anywhere(rng, viewport),
                    n => {
                        let i = rng.random_range(0..n);
                        let p = self.engine.series.position(i).unwrap_or(Point::new(0.5, 0.5));
                        self.engine.view.to_device(p, self.engine.viewport)
                    }
                };
                let modifiers = Modifiers { shift: rng.random_bool(0.3), ..none };
                self.apply(|e| e.on_pointer_down(at, Button::Primary, modifiers))?;
                self.apply(|e| e.on_pointer_up(at, Button::Primary, modifiers))?;
                self.apply(|e| e.on_click(at, modifiers))
            }
        }
    }

    /// Draw a polygon around `center` (data space) with clicks, then close it.
    fn lasso_around(&mut self, center: Point) -> Result<(), DriverError> {
        self.apply(|e| e.on_key_down(Key::new("l"), Modifiers::default()))?;
        for k in 0..LASSO_VERTICES {
            #[allow(clippy::cast_precision_loss)]
            let angle = std::f64::consts::TAU * k as f64 / LASSO_VERTICES as f64;
            let vertex = Point::new(center.x + LASSO_RADIUS * angle.cos(), center.y + LASSO_RADIUS * angle.sin());
            let at = self.engine.view.to_device(vertex, self.engine.viewport);
            self.apply(|e| e.on_click(at, Modifiers::default()))?;
        }
        self.apply(|e| e.on_key_down(Key::new("Enter"), Modifiers::default()))
    }

    /// Wait until no request is outstanding.
    async fn settle(&mut self) -> Result<(), DriverError> {
        while let Some(done) = self.client.next_frame().await? {
            self.present(done);
        }
        Ok(())
    }
}

fn anywhere(rng: &mut StdRng, viewport: Viewport) -> Point {
    Point::new(rng.random_range(0.0..viewport.width.max(1.0)), rng.random_range(0.0..viewport.height.max(1.0)))
}

/// Generate a dataset, replay the interaction script and report.
///
/// # Errors
///
/// Returns the first worker, dataset or shutdown error.
pub async fn run(config: &DriverConfig) -> Result<Summary, DriverError> {
    let data = synth::clustered(config.points, config.clusters, config.seed)?;
    let (mut session, actions) = Session::start(config, &data)?;
    session.dispatch(actions)?;
    session.settle().await?;

    let mut rng = StdRng::seed_from_u64(config.seed ^ GESTURE_SEED_SALT);
    for _ in 0..config.burst {
        session.gesture(&mut rng)?;
        tokio::task::yield_now().await;
    }

    session.apply(EngineCore::reset_view)?;
    let center = data.centers.first().map_or(Point::new(0.5, 0.5), |(x, y)| Point::new(*x, *y));
    session.lasso_around(center)?;
    let lasso_cluster_hits = session
        .engine
        .picked_indices()
        .into_iter()
        .filter(|i| data.cluster.get(*i) == Some(&0))
        .count();
    session.apply(EngineCore::mask_selection)?;
    session.settle().await?;

    let tracker = session.client.tracker();
    let summary = Summary {
        points: session.engine.series.len(),
        gestures: config.burst,
        requested: tracker.latest_uid(),
        accepted: tracker.accepted(),
        stale: tracker.stale(),
        lasso_contained: session.lasso_contained,
        lasso_cluster_hits,
        picked: session.engine.picked_count(),
        masked: session.engine.masked_count(),
        main_ops: session.layers.main.len(),
    };
    let client = session.client;
    tokio::task::spawn_blocking(move || client.shutdown()).await??;
    info!(accepted = summary.accepted, stale = summary.stale, "session finished");
    Ok(summary)
}
