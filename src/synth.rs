//! Synthetic contig clouds.
//!
//! Contigs are drawn from Gaussian clusters in raw (GC fraction, log
//! coverage) units, then normalized into the unit data square with
//! [`AxisBounds`]. Marker size grows with the square root of contig length.

#[cfg(test)]
#[path = "synth_test.rs"]
mod synth_test;

use canvas::camera::AxisBounds;
use canvas::series::{PointSeries, SeriesError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CLUSTER_COLORS: [&str; 8] =
    ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf"];
const GC_RANGE: (f64, f64) = (0.25, 0.70);
const LOG_COVERAGE_RANGE: (f64, f64) = (0.5, 3.5);
const LENGTH_RANGE: (f64, f64) = (1_000.0, 250_000.0);
const SIZE_PER_SQRT_KBP: f64 = 0.35;

/// A generated dataset and the raw ranges it was normalized from.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub series: PointSeries,
    pub bounds: AxisBounds,
    /// Which cluster each point came from.
    pub cluster: Vec<usize>,
    /// Data-space center of each cluster.
    pub centers: Vec<(f64, f64)>,
}

/// Generate `points` contigs in `clusters` clusters, reproducibly for `seed`.
///
/// # Errors
///
/// Never fails for generated columns; the error is the series constructor's.
pub fn clustered(points: usize, clusters: usize, seed: u64) -> Result<Dataset, SeriesError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let clusters = clusters.max(1);
    let shapes: Vec<Cluster> = (0..clusters).map(|_| Cluster::random(&mut rng)).collect();

    let mut raw_x = Vec::with_capacity(points);
    let mut raw_y = Vec::with_capacity(points);
    let mut size = Vec::with_capacity(points);
    let mut color = Vec::with_capacity(points);
    let mut cluster = Vec::with_capacity(points);
    for _ in 0..points {
        let id = rng.random_range(0..clusters);
        let shape = &shapes[id];
        let (dx, dy) = gaussian_pair(&mut rng);
        raw_x.push(shape.gc + dx * shape.spread_gc);
        raw_y.push(shape.log_cov + dy * shape.spread_cov);
        let length = rng.random_range(LENGTH_RANGE.0..LENGTH_RANGE.1);
        size.push(SIZE_PER_SQRT_KBP * (length / 1_000.0).sqrt());
        color.push(CLUSTER_COLORS[id % CLUSTER_COLORS.len()].to_owned());
        cluster.push(id);
    }

    let bounds = AxisBounds::from_values(&raw_x, &raw_y);
    let (x, y): (Vec<f64>, Vec<f64>) = raw_x
        .iter()
        .zip(&raw_y)
        .map(|(rx, ry)| {
            let p = bounds.normalize(*rx, *ry);
            (p.x, p.y)
        })
        .unzip();
    let centers = shapes
        .iter()
        .map(|s| {
            let p = bounds.normalize(s.gc, s.log_cov);
            (p.x, p.y)
        })
        .collect();

    Ok(Dataset { series: PointSeries::new(x, y, size, color)?, bounds, cluster, centers })
}

struct Cluster {
    gc: f64,
    log_cov: f64,
    spread_gc: f64,
    spread_cov: f64,
}

impl Cluster {
    fn random(rng: &mut StdRng) -> Self {
        Self {
            gc: rng.random_range(GC_RANGE.0..GC_RANGE.1),
            log_cov: rng.random_range(LOG_COVERAGE_RANGE.0..LOG_COVERAGE_RANGE.1),
            spread_gc: rng.random_range(0.005..0.02),
            spread_cov: rng.random_range(0.05..0.2),
        }
    }
}

/// Two independent standard normal samples (Box-Muller).
fn gaussian_pair(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = std::f64::consts::TAU * u2;
    (r * theta.cos(), r * theta.sin())
}
