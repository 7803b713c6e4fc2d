use super::*;

fn colors(n: usize) -> Vec<String> {
    vec!["red".to_owned(); n]
}

fn mask_set_invariant_holds(masks: &MaskSet) -> bool {
    masks
        .masked()
        .iter()
        .zip(masks.picked())
        .all(|(m, p)| !(*m && *p))
}

// =============================================================
// PointSeries
// =============================================================

#[test]
fn series_new_accepts_equal_columns() {
    let s = PointSeries::new(vec![0.1, 0.2], vec![0.3, 0.4], vec![1.0, 2.0], colors(2)).expect("series");
    assert_eq!(s.len(), 2);
    assert!(!s.is_empty());
    assert_eq!(s.position(1), Some(Point::new(0.2, 0.4)));
    assert_eq!(s.position(2), None);
}

#[test]
fn series_new_rejects_mismatched_column() {
    let err = PointSeries::new(vec![0.1, 0.2], vec![0.3], vec![1.0, 2.0], colors(2)).expect_err("mismatch");
    assert_eq!(err, SeriesError::LengthMismatch { column: "y", expected: 2, actual: 1 });
}

#[test]
fn series_new_rejects_mismatched_color() {
    let err = PointSeries::new(vec![0.1], vec![0.3], vec![1.0], colors(3)).expect_err("mismatch");
    assert!(matches!(err, SeriesError::LengthMismatch { column: "color", .. }));
    assert!(err.to_string().contains("color"));
}

#[test]
fn series_default_is_empty() {
    assert!(PointSeries::default().is_empty());
}

#[test]
fn series_view_reports_shortest_length() {
    let view = SeriesView { x: &[0.0, 1.0, 2.0], y: &[0.0, 1.0], size: &[1.0, 1.0, 1.0], color: &[] };
    assert_eq!(view.len(), 2);
    assert_eq!(view.color_of(0), None);
    assert_eq!(view.size_of(2), Some(1.0));
}

#[test]
fn series_columns_share_storage() {
    let s = PointSeries::new(vec![0.5], vec![0.5], vec![1.0], colors(1)).expect("series");
    let shared = Arc::clone(s.x());
    assert!(Arc::ptr_eq(&shared, s.x()));
}

// =============================================================
// MaskSet: construction
// =============================================================

#[test]
fn mask_set_new_is_all_clear() {
    let m = MaskSet::new(4);
    assert_eq!(m.len(), 4);
    assert_eq!(m.picked_count(), 0);
    assert_eq!(m.masked_count(), 0);
    assert!(m.highlighted().iter().all(|h| *h == 0));
}

// =============================================================
// MaskSet: selection
// =============================================================

#[test]
fn toggle_pick_flips_flag() {
    let mut m = MaskSet::new(2);
    assert!(m.toggle_pick(0));
    assert!(m.is_picked(0));
    assert!(m.toggle_pick(0));
    assert!(!m.is_picked(0));
}

#[test]
fn toggle_pick_ignores_masked_and_out_of_range() {
    let mut m = MaskSet::new(2);
    m.mask([1]);
    assert!(!m.toggle_pick(1));
    assert!(!m.toggle_pick(9));
    assert_eq!(m.picked_count(), 0);
}

#[test]
fn select_replaces_without_combine() {
    let mut m = MaskSet::new(5);
    m.select([0, 1], false);
    assert!(m.select([3], false));
    assert_eq!(m.picked_indices(), vec![3]);
}

#[test]
fn select_with_combine_adds() {
    let mut m = MaskSet::new(5);
    m.select([0, 1], false);
    assert!(m.select([3], true));
    assert_eq!(m.picked_indices(), vec![0, 1, 3]);
}

#[test]
fn select_reports_no_change_when_identical() {
    let mut m = MaskSet::new(3);
    m.select([2], false);
    assert!(!m.select([2], false));
    assert!(!m.select([2], true));
}

#[test]
fn select_skips_masked_points() {
    let mut m = MaskSet::new(3);
    m.mask([1]);
    m.select([0, 1, 2], false);
    assert_eq!(m.picked_indices(), vec![0, 2]);
    assert!(mask_set_invariant_holds(&m));
}

#[test]
fn clear_picked_reports_change() {
    let mut m = MaskSet::new(3);
    assert!(!m.clear_picked());
    m.select([1], false);
    assert!(m.clear_picked());
    assert_eq!(m.picked_count(), 0);
}

// =============================================================
// MaskSet: masking
// =============================================================

#[test]
fn mask_deselects_masked_points() {
    let mut m = MaskSet::new(4);
    m.select([0, 1, 2], false);
    assert_eq!(m.mask([1, 3]), 2);
    assert_eq!(m.picked_indices(), vec![0, 2]);
    assert_eq!(m.masked_count(), 2);
    assert!(mask_set_invariant_holds(&m));
}

#[test]
fn mask_counts_only_newly_masked() {
    let mut m = MaskSet::new(3);
    assert_eq!(m.mask([0]), 1);
    assert_eq!(m.mask([0, 1, 7]), 1);
}

#[test]
fn mask_picked_masks_the_selection() {
    let mut m = MaskSet::new(4);
    m.select([1, 2], false);
    assert_eq!(m.mask_picked(), 2);
    assert_eq!(m.picked_count(), 0);
    assert!(m.is_masked(1) && m.is_masked(2));
    assert!(mask_set_invariant_holds(&m));
}

#[test]
fn unmask_all_clears_mask() {
    let mut m = MaskSet::new(3);
    assert!(!m.unmask_all());
    m.mask([0, 2]);
    assert!(m.unmask_all());
    assert_eq!(m.masked_count(), 0);
}

#[test]
fn replace_masked_clears_picks_under_mask() {
    let mut m = MaskSet::new(3);
    m.select([0, 1, 2], false);
    m.replace_masked(vec![true, false, true]).expect("replace");
    assert_eq!(m.picked_indices(), vec![1]);
    assert!(mask_set_invariant_holds(&m));
}

#[test]
fn replace_masked_rejects_wrong_length() {
    let mut m = MaskSet::new(3);
    let err = m.replace_masked(vec![true]).expect_err("length");
    assert_eq!(err, SeriesError::LengthMismatch { column: "masked", expected: 3, actual: 1 });
    assert_eq!(m.masked_count(), 0);
}

#[test]
fn invariant_holds_after_mixed_operations() {
    let mut m = MaskSet::new(10);
    m.select(0..10, false);
    m.mask([2, 4, 6]);
    m.select([2, 3], true);
    m.toggle_pick(4);
    m.replace_masked((0..10).map(|i| i % 3 == 0).collect()).expect("replace");
    m.select(0..10, true);
    assert!(mask_set_invariant_holds(&m));
}

// =============================================================
// MaskSet: highlight
// =============================================================

#[test]
fn set_and_clear_highlight_groups() {
    let mut m = MaskSet::new(4);
    m.set_highlight([0, 1], 2);
    m.set_highlight([3], 1);
    assert_eq!(m.highlighted(), &[2, 2, 0, 1]);
    m.clear_highlight(2);
    assert_eq!(m.highlighted(), &[0, 0, 0, 1]);
}

#[test]
fn mask_view_defaults_for_missing_entries() {
    let m = MaskSet::new(1);
    let v = m.view();
    assert!(!v.is_masked(5));
    assert!(!v.is_picked(5));
    assert_eq!(v.highlight(5), 0);
}
