//! End-to-end interaction through the public engine API.

use canvas::camera::Point;
use canvas::engine::{Action, EngineCore, Layer};
use canvas::input::{Button, Key, Modifiers, WheelDelta};
use canvas::render::Layers;
use canvas::series::PointSeries;
use canvas::surface::{PaintOp, Picture};

const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };

/// 3x3 lattice at device (100|200|300, 100|200|300) on a 400x400 plot.
fn engine() -> EngineCore {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            xs.push(0.25 * f64::from(col + 1));
            ys.push(0.25 * f64::from(row + 1));
        }
    }
    let colors: Vec<String> = (0..9).map(|i| if i % 2 == 0 { "red" } else { "blue" }.to_owned()).collect();
    let series = PointSeries::new(xs, ys, vec![6.0; 9], colors).expect("series");

    let mut core = EngineCore::new();
    core.set_viewport(400.0, 400.0, 1.0);
    core.load_series(series);
    core
}

fn click(core: &mut EngineCore, x: f64, y: f64, modifiers: Modifiers) -> Vec<Action> {
    let p = Point::new(x, y);
    core.on_pointer_down(p, Button::Primary, modifiers);
    core.on_pointer_up(p, Button::Primary, modifiers);
    core.on_click(p, modifiers)
}

fn key(core: &mut EngineCore, name: &str, modifiers: Modifiers) -> Vec<Action> {
    core.on_key_down(Key::new(name), modifiers)
}

fn render(core: &EngineCore) -> Layers<Picture> {
    let mut layers = Layers::<Picture>::default();
    core.render(&mut layers).expect("infallible");
    layers
}

#[test]
fn click_then_shift_click_builds_a_selection() {
    let mut core = engine();
    let actions = click(&mut core, 101.0, 99.0, Modifiers::default());
    assert!(actions.contains(&Action::SelectionChanged { picked: 1 }));
    assert!(actions.contains(&Action::RenderNeeded(Layer::Selection)));

    click(&mut core, 300.0, 300.0, SHIFT);
    assert_eq!(core.picked_indices(), vec![0, 8]);

    click(&mut core, 200.0, 200.0, Modifiers::default());
    assert_eq!(core.picked_indices(), vec![4]);
}

#[test]
fn click_on_empty_space_clears_selection() {
    let mut core = engine();
    click(&mut core, 100.0, 100.0, Modifiers::default());
    let actions = click(&mut core, 150.0, 150.0, Modifiers::default());
    assert!(actions.contains(&Action::SelectionChanged { picked: 0 }));
    assert_eq!(core.picked_count(), 0);
}

#[test]
fn drag_pans_without_selecting() {
    let mut core = engine();
    core.on_pointer_down(Point::new(100.0, 100.0), Button::Primary, Modifiers::default());
    let actions = core.on_pointer_move(Point::new(140.0, 120.0), Modifiers::default());
    assert!(actions.contains(&Action::RenderNeeded(Layer::Plot)));
    core.on_pointer_up(Point::new(140.0, 120.0), Button::Primary, Modifiers::default());
    assert!(core.on_click(Point::new(140.0, 120.0), Modifiers::default()).is_empty());
    assert_eq!(core.picked_count(), 0);

    // The point that was under (100, 100) moved with the drag.
    assert_eq!(core.pick(Point::new(140.0, 120.0)), Some(0));
}

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let mut core = engine();
    let pivot = Point::new(200.0, 200.0);
    core.on_wheel(pivot, WheelDelta { dx: 0.0, dy: -120.0 }, Modifiers::default());
    assert!(core.view.scale() > 1.0);
    assert_eq!(core.pick(pivot), Some(4));
    key(&mut core, "0", Modifiers::default());
    assert!((core.view.scale() - 1.0).abs() < 1e-12);
}

#[test]
fn lasso_round_trip_selects_enclosed_points() {
    let mut core = engine();
    let started = key(&mut core, "l", Modifiers::default());
    assert!(started.contains(&Action::LassoStarted));

    // Left column.
    for (x, y) in [(50.0, 50.0), (150.0, 50.0), (150.0, 350.0), (50.0, 350.0)] {
        click(&mut core, x, y, Modifiers::default());
    }
    let finished = key(&mut core, "Enter", Modifiers::default());
    assert!(finished.contains(&Action::LassoFinished { contained: 3 }));
    assert_eq!(core.picked_indices(), vec![0, 3, 6]);

    // Right column, combined: the left column stays selected.
    key(&mut core, "l", Modifiers::default());
    for (x, y) in [(250.0, 50.0), (350.0, 50.0), (350.0, 350.0), (250.0, 350.0)] {
        click(&mut core, x, y, Modifiers::default());
    }
    key(&mut core, "l", SHIFT);
    assert_eq!(core.picked_indices(), vec![0, 2, 3, 5, 6, 8]);
}

#[test]
fn escape_cancels_lasso_without_selecting() {
    let mut core = engine();
    key(&mut core, "l", Modifiers::default());
    for (x, y) in [(0.0, 0.0), (400.0, 0.0), (400.0, 400.0)] {
        click(&mut core, x, y, Modifiers::default());
    }
    assert!(key(&mut core, "Escape", Modifiers::default()).contains(&Action::LassoCancelled));
    assert_eq!(core.picked_count(), 0);
    assert!(!core.lasso.is_drawing());
}

#[test]
fn masked_points_cannot_be_picked_or_lassoed() {
    let mut core = engine();
    click(&mut core, 200.0, 200.0, Modifiers::default());
    let actions = core.mask_selection();
    assert!(actions.contains(&Action::MaskChanged { masked: 1 }));
    assert_eq!(core.pick(Point::new(200.0, 200.0)), None);

    key(&mut core, "l", Modifiers::default());
    for (x, y) in [(0.0, 0.0), (400.0, 0.0), (400.0, 400.0), (0.0, 400.0)] {
        click(&mut core, x, y, Modifiers::default());
    }
    key(&mut core, "Enter", Modifiers::default());
    assert_eq!(core.picked_count(), 8);
    assert!(!core.picked_indices().contains(&4));

    core.unmask_all();
    assert_eq!(core.masked_count(), 0);
}

#[test]
fn rendered_layers_batch_by_style_and_replay() {
    let mut core = engine();
    click(&mut core, 100.0, 100.0, Modifiers::default());
    core.set_highlight([1, 2], 1);
    let layers = render(&core);

    assert_eq!(layers.main.fill_count(), 2);
    assert_eq!(layers.highlight.fill_count(), 1);
    assert_eq!(layers.selection.fill_count(), 1);
    assert!(layers.selection.ops().iter().any(|op| matches!(op, PaintOp::FillWithShadow { .. })));

    let mut replayed = Picture::new();
    layers.main.replay(&mut replayed).expect("infallible");
    assert_eq!(replayed, layers.main);
}

#[test]
fn lasso_overlay_follows_vertices() {
    let mut core = engine();
    key(&mut core, "l", Modifiers::default());
    click(&mut core, 10.0, 10.0, Modifiers::default());
    click(&mut core, 90.0, 10.0, Modifiers::default());

    let mut overlay = Picture::new();
    core.render_selection(&mut overlay).expect("infallible");
    let vertex_squares = overlay.ops().iter().filter(|op| matches!(op, PaintOp::Rect { .. })).count();
    assert_eq!(vertex_squares, 2);
    assert!(overlay.ops().iter().any(|op| matches!(op, PaintOp::Stroke { .. })));
}
