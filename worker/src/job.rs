//! Chunked, cancellable render jobs.
//!
//! A job plans at most `chunk_points` points, or paints at most
//! `chunk_groups` style groups, and then yields to the worker's event loop.
//! After every slice it compares its uid with the worker's painting uid.
//! A mismatch means a newer request (or a reset) arrived, and the job is
//! abandoned without producing a completion.
//!
//! The output is identical to a one-shot [`canvas::render::render`] of the
//! same scene without a lasso: the slices only split the work.

#[cfg(test)]
#[path = "job_test.rs"]
mod job_test;

use std::cell::Cell;
use std::rc::Rc;

use canvas::config::RenderConfig;
use canvas::grid;
use canvas::render::{FramePlan, Passes, PointPlanner, Scene, paint_halos, paint_markers, paint_shadows};
use canvas::surface::{Picture, Surface};
use frames::{Completion, RenderKind, RenderTask, Uid};
use tokio::task::yield_now;
use tracing::{debug, warn};

use crate::state::Snapshot;

/// The uid of the render the worker is currently painting; `0` when none.
///
/// Written by the message loop and read by jobs between slices, all on
/// the worker thread.
#[derive(Debug, Clone, Default)]
pub struct Painting(Rc<Cell<Uid>>);

impl Painting {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `uid` the current render, superseding any other.
    pub fn start(&self, uid: Uid) {
        self.0.set(uid);
    }

    /// Supersede every running render without starting a new one.
    pub fn abandon(&self) {
        self.0.set(0);
    }

    #[must_use]
    pub fn current(&self) -> Uid {
        self.0.get()
    }

    #[must_use]
    pub fn is_current(&self, uid: Uid) -> bool {
        uid != 0 && self.0.get() == uid
    }
}

/// Render `task` from `snapshot`. Returns `None` when the task was
/// superseded or its geometry is unusable.
pub async fn render(task: RenderTask, kind: RenderKind, snapshot: Snapshot, painting: Painting) -> Option<Completion> {
    let Some(view) = task.geometry.view(snapshot.bounds) else {
        warn!(uid = task.uid, "render geometry is not a valid view; task dropped");
        return None;
    };
    let scene = snapshot.scene(view, task.geometry.viewport());
    let cfg = &*snapshot.config;
    let slice = Slice { uid: task.uid, painting: &painting };

    let mut done = Completion {
        uid: task.uid,
        target: task.target,
        kind,
        main: None,
        highlight: None,
        selection: None,
    };
    if kind == RenderKind::Plot {
        let (main, highlight) = points(&scene, cfg, &slice).await?;
        done.main = Some(main);
        done.highlight = Some(highlight);
    }
    done.selection = Some(selection(&scene, cfg, &slice).await?);

    if !slice.current() {
        return None;
    }
    debug!(uid = task.uid, ?kind, points = snapshot.point_count(), "render complete");
    Some(done)
}

struct Slice<'a> {
    uid: Uid,
    painting: &'a Painting,
}

impl Slice<'_> {
    fn current(&self) -> bool {
        let current = self.painting.is_current(self.uid);
        if !current {
            debug!(uid = self.uid, painting = self.painting.current(), "render superseded");
        }
        current
    }

    /// Check for supersession, then give the event loop a turn.
    async fn end(&self) -> Option<()> {
        if !self.current() {
            return None;
        }
        yield_now().await;
        Some(())
    }
}

async fn plan(scene: &Scene<'_>, cfg: &RenderConfig, passes: Passes, slice: &Slice<'_>) -> Option<FramePlan> {
    let mut planner = PointPlanner::new(passes);
    loop {
        if !slice.current() {
            return None;
        }
        if planner.feed(scene, cfg, cfg.chunk_points) {
            break;
        }
        slice.end().await?;
    }
    let plan = planner.finish(cfg);
    debug!(
        uid = slice.uid,
        drawn = plan.stats.drawn,
        masked = plan.stats.masked,
        culled = plan.stats.culled,
        tiny = plan.stats.tiny,
        "render planned"
    );
    Some(plan)
}

/// Main and highlight layers.
async fn points(scene: &Scene<'_>, cfg: &RenderConfig, slice: &Slice<'_>) -> Option<(Picture, Picture)> {
    let (width, height) = (scene.viewport.width, scene.viewport.height);
    let mut main = Picture::new();
    let mut highlight = Picture::new();
    main.clear(width, height);
    highlight.clear(width, height);
    if scene.viewport.is_empty() {
        return Some((main, highlight));
    }
    if cfg.show_grid {
        let Ok(()) = grid::draw_grid(&mut main, &scene.view, scene.viewport, cfg);
    }

    let plan = plan(scene, cfg, Passes::POINTS, slice).await?;
    for groups in plan.markers.chunks(cfg.chunk_groups.max(1)) {
        let Ok(_) = paint_markers(&mut main, groups);
        slice.end().await?;
    }
    let Ok(_) = paint_halos(&mut highlight, &plan.halos);
    Some((main, highlight))
}

/// Selection layer: shadows of picked points.
async fn selection(scene: &Scene<'_>, cfg: &RenderConfig, slice: &Slice<'_>) -> Option<Picture> {
    let mut layer = Picture::new();
    layer.clear(scene.viewport.width, scene.viewport.height);
    if scene.viewport.is_empty() {
        return Some(layer);
    }
    let plan = plan(scene, cfg, Passes::SELECTION, slice).await?;
    let Ok(_) = paint_shadows(&mut layer, &plan.shadows, cfg);
    Some(layer)
}
