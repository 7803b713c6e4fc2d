use super::*;
use crate::series::PointSeries;

/// Viewport of 100x100 at identity view: data x of 0.03 lands on device x 3.
fn vp() -> Viewport {
    Viewport::new(100.0, 100.0)
}

fn series(points: &[(f64, f64, f64)]) -> PointSeries {
    let x: Vec<f64> = points.iter().map(|p| p.0 / 100.0).collect();
    let y: Vec<f64> = points.iter().map(|p| p.1 / 100.0).collect();
    let size: Vec<f64> = points.iter().map(|p| p.2).collect();
    let color = vec!["c".to_owned(); points.len()];
    PointSeries::new(x, y, size, color).expect("series")
}

const MIN_RADIUS: f64 = 0.5;

fn pick_at(s: &PointSeries, masks: &MaskSet, x: f64, y: f64) -> Option<usize> {
    pick(Point::new(x, y), &ViewState::default(), vp(), s.view(), masks.view(), MIN_RADIUS).map(|h| h.index)
}

// =============================================================
// pick
// =============================================================

#[test]
fn nearest_center_wins_among_overlapping_markers() {
    let s = series(&[(0.0, 0.0, 5.0), (3.0, 0.0, 5.0)]);
    let masks = MaskSet::new(2);
    assert_eq!(pick_at(&s, &masks, 2.0, 0.0), Some(1));
}

#[test]
fn nearest_wins_regardless_of_index_order() {
    let s = series(&[(3.0, 0.0, 5.0), (0.0, 0.0, 5.0)]);
    let masks = MaskSet::new(2);
    assert_eq!(pick_at(&s, &masks, 2.0, 0.0), Some(0));
    assert_eq!(pick_at(&s, &masks, 1.0, 0.0), Some(1));
}

#[test]
fn miss_outside_every_radius() {
    let s = series(&[(50.0, 50.0, 5.0)]);
    let masks = MaskSet::new(1);
    assert_eq!(pick_at(&s, &masks, 60.0, 50.0), None);
}

#[test]
fn boundary_distance_equal_to_radius_is_a_miss() {
    let s = series(&[(50.0, 50.0, 5.0)]);
    let masks = MaskSet::new(1);
    assert_eq!(pick_at(&s, &masks, 55.0, 50.0), None);
    assert_eq!(pick_at(&s, &masks, 54.9, 50.0), Some(0));
}

#[test]
fn masked_points_are_not_pickable() {
    let s = series(&[(0.0, 0.0, 5.0), (3.0, 0.0, 5.0)]);
    let mut masks = MaskSet::new(2);
    masks.mask([1]);
    assert_eq!(pick_at(&s, &masks, 2.0, 0.0), Some(0));
}

#[test]
fn radius_scales_with_zoom() {
    let s = series(&[(10.0, 10.0, 2.0)]);
    let masks = MaskSet::new(1);
    let view = ViewState::from_parts(0.0, 0.0, 4.0).expect("view");
    // Center lands on (40, 40) with radius 8.
    let hit = pick(Point::new(46.0, 40.0), &view, vp(), s.view(), masks.view(), MIN_RADIUS);
    assert_eq!(hit.map(|h| h.index), Some(0));
    let miss = pick(Point::new(49.0, 40.0), &view, vp(), s.view(), masks.view(), MIN_RADIUS);
    assert!(miss.is_none());
}

#[test]
fn empty_dataset_has_no_hit() {
    let s = PointSeries::default();
    let masks = MaskSet::new(0);
    assert_eq!(pick_at(&s, &masks, 0.0, 0.0), None);
}

#[test]
fn fully_masked_dataset_has_no_hit() {
    let s = series(&[(0.0, 0.0, 5.0), (1.0, 0.0, 5.0)]);
    let mut masks = MaskSet::new(2);
    masks.mask([0, 1]);
    assert_eq!(pick_at(&s, &masks, 0.0, 0.0), None);
}

#[test]
fn non_finite_click_has_no_hit() {
    let s = series(&[(0.0, 0.0, 5.0)]);
    let masks = MaskSet::new(1);
    assert_eq!(pick_at(&s, &masks, f64::NAN, 0.0), None);
}

#[test]
fn markers_below_visible_radius_are_not_pickable() {
    let s = series(&[(20.0, 20.0, 0.4), (22.0, 20.0, 3.0)]);
    let masks = MaskSet::new(2);
    // Dead center of the tiny marker, but only the visible one counts.
    assert_eq!(pick_at(&s, &masks, 20.0, 20.0), Some(1));
    let alone = series(&[(20.0, 20.0, 0.4)]);
    assert_eq!(pick_at(&alone, &MaskSet::new(1), 20.0, 20.0), None);
    let hit = pick(Point::new(20.0, 20.0), &ViewState::default(), vp(), alone.view(), MaskSet::new(1).view(), 0.1);
    assert_eq!(hit.map(|h| h.index), Some(0));
}

#[test]
fn hit_reports_squared_distance() {
    let s = series(&[(10.0, 10.0, 6.0)]);
    let masks = MaskSet::new(1);
    let hit = pick(Point::new(13.0, 14.0), &ViewState::default(), vp(), s.view(), masks.view(), MIN_RADIUS).expect("hit");
    assert!((hit.dist_sq - 25.0).abs() < 1e-9);
}

// =============================================================
// apply_pick
// =============================================================

#[test]
fn plain_hit_replaces_selection() {
    let mut masks = MaskSet::new(4);
    masks.select([0, 2], false);
    assert!(apply_pick(&mut masks, Some(3), false));
    assert_eq!(masks.picked_indices(), vec![3]);
}

#[test]
fn plain_hit_on_selected_point_deselects() {
    let mut masks = MaskSet::new(4);
    masks.select([1], false);
    assert!(apply_pick(&mut masks, Some(1), false));
    assert_eq!(masks.picked_count(), 0);
}

#[test]
fn combine_hit_toggles_and_keeps_others() {
    let mut masks = MaskSet::new(4);
    masks.select([0], false);
    assert!(apply_pick(&mut masks, Some(2), true));
    assert_eq!(masks.picked_indices(), vec![0, 2]);
    assert!(apply_pick(&mut masks, Some(0), true));
    assert_eq!(masks.picked_indices(), vec![2]);
}

#[test]
fn plain_miss_clears_selection() {
    let mut masks = MaskSet::new(3);
    masks.select([0, 1], false);
    assert!(apply_pick(&mut masks, None, false));
    assert_eq!(masks.picked_count(), 0);
}

#[test]
fn combine_miss_keeps_selection() {
    let mut masks = MaskSet::new(3);
    masks.select([0, 1], false);
    assert!(!apply_pick(&mut masks, None, true));
    assert_eq!(masks.picked_indices(), vec![0, 1]);
}

#[test]
fn miss_on_empty_selection_is_no_change() {
    let mut masks = MaskSet::new(3);
    assert!(!apply_pick(&mut masks, None, false));
}
