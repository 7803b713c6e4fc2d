use super::*;

#[test]
fn generates_requested_point_count() {
    let data = clustered(500, 4, 1).expect("dataset");
    assert_eq!(data.series.len(), 500);
    assert_eq!(data.cluster.len(), 500);
    assert_eq!(data.centers.len(), 4);
}

#[test]
fn same_seed_is_reproducible() {
    let a = clustered(200, 3, 42).expect("dataset");
    let b = clustered(200, 3, 42).expect("dataset");
    assert_eq!(a.series.x(), b.series.x());
    assert_eq!(a.cluster, b.cluster);

    let c = clustered(200, 3, 43).expect("dataset");
    assert_ne!(a.series.x(), c.series.x());
}

#[test]
fn positions_are_normalized_to_unit_square() {
    let data = clustered(1_000, 6, 5).expect("dataset");
    let inside = |v: &f64| (-1e-9..=1.0 + 1e-9).contains(v);
    assert!(data.series.x().iter().all(inside));
    assert!(data.series.y().iter().all(inside));
    assert!(data.bounds.x_max > data.bounds.x_min);
}

#[test]
fn sizes_are_positive_and_colors_follow_cluster() {
    let data = clustered(300, 2, 9).expect("dataset");
    assert!(data.series.size().iter().all(|s| *s > 0.0));
    for (i, id) in data.cluster.iter().enumerate() {
        assert_eq!(data.series.color()[i], CLUSTER_COLORS[*id]);
    }
}

#[test]
fn zero_points_gives_empty_series() {
    let data = clustered(0, 3, 1).expect("dataset");
    assert!(data.series.is_empty());
    assert_eq!(data.bounds, AxisBounds::default());
}

#[test]
fn gaussian_samples_center_on_zero() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 4_000;
    let sum: f64 = (0..n)
        .map(|_| {
            let (a, b) = gaussian_pair(&mut rng);
            a + b
        })
        .sum();
    let samples = f64::from(2 * n);
    assert!((sum / samples).abs() < 0.1);
}
