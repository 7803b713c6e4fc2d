//! Headless driver for the contig plot engine.
//!
//! Generates a clustered contig cloud, runs one interactive session against a
//! render worker thread and prints a JSON summary. Configured through
//! `ARENA_*` environment variables (see [`config::DriverConfig`]).

mod config;
mod error;
mod session;
mod synth;

use config::DriverConfig;
use error::DriverError;

#[tokio::main]
async fn main() -> Result<(), DriverError> {
    tracing_subscriber::fmt::init();

    let config = DriverConfig::from_env()?;
    tracing::info!(points = config.points, clusters = config.clusters, burst = config.burst, "arena starting");

    let summary = session::run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
