//! Driver configuration from `ARENA_*` environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use canvas::config::RenderConfig;
use render_worker::Transport;

use crate::error::DriverError;

const DEFAULT_POINTS: usize = 40_000;
const DEFAULT_CLUSTERS: usize = 12;
const DEFAULT_SEED: u64 = 7;
const DEFAULT_WIDTH: f64 = 1280.0;
const DEFAULT_HEIGHT: f64 = 800.0;
const DEFAULT_BURST: usize = 60;

/// What the driver generates and how it talks to the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Synthetic contigs to generate.
    pub points: usize,
    /// Gaussian clusters the contigs are drawn from.
    pub clusters: usize,
    pub seed: u64,
    /// Plot size in CSS pixels.
    pub width: f64,
    pub height: f64,
    /// Pan/zoom events replayed before the lasso.
    pub burst: usize,
    pub transport: Transport,
    pub render: RenderConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            points: DEFAULT_POINTS,
            clusters: DEFAULT_CLUSTERS,
            seed: DEFAULT_SEED,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            burst: DEFAULT_BURST,
            transport: Transport::Direct,
            render: RenderConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Config`] when `ARENA_CONFIG` is not a valid
    /// render config object.
    pub fn from_env() -> Result<Self, DriverError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or unparsable values keep
    /// their defaults; `ARENA_CONFIG` holds a (partial) JSON render config
    /// that the individual `ARENA_*` tuning keys override.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Config`] when `ARENA_CONFIG` does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DriverError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut render = match lookup("ARENA_CONFIG") {
            Some(raw) => RenderConfig::from_json(&raw).map_err(|source| DriverError::Config { key: "ARENA_CONFIG", source })?,
            None => RenderConfig::default(),
        };
        render.chunk_points = env_parse(&lookup, "ARENA_CHUNK_POINTS", render.chunk_points);
        render.chunk_groups = env_parse(&lookup, "ARENA_CHUNK_GROUPS", render.chunk_groups);
        render.min_radius_px = env_parse(&lookup, "ARENA_MIN_RADIUS_PX", render.min_radius_px);
        render.square_radius_px = env_parse(&lookup, "ARENA_SQUARE_RADIUS_PX", render.square_radius_px);
        render.drag_threshold_px = env_parse(&lookup, "ARENA_DRAG_THRESHOLD_PX", render.drag_threshold_px);
        render.shadow_blur_px = env_parse(&lookup, "ARENA_SHADOW_BLUR_PX", render.shadow_blur_px);

        let transport = if env_parse(&lookup, "ARENA_WIRE", false) { Transport::Encoded } else { Transport::Direct };

        Ok(Self {
            points: env_parse(&lookup, "ARENA_POINTS", DEFAULT_POINTS),
            clusters: env_parse(&lookup, "ARENA_CLUSTERS", DEFAULT_CLUSTERS).max(1),
            seed: env_parse(&lookup, "ARENA_SEED", DEFAULT_SEED),
            width: plot_size(env_parse(&lookup, "ARENA_WIDTH", DEFAULT_WIDTH), DEFAULT_WIDTH),
            height: plot_size(env_parse(&lookup, "ARENA_HEIGHT", DEFAULT_HEIGHT), DEFAULT_HEIGHT),
            burst: env_parse(&lookup, "ARENA_BURST", DEFAULT_BURST),
            transport,
            render: render.sanitized(),
        })
    }
}

/// `NaN` and `inf` parse as floats; a plot size must be finite and positive.
fn plot_size(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { default }
}

fn env_parse<T, F>(env: F, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    env(key).and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}
