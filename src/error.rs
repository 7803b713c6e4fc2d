use canvas::series::SeriesError;
use render_worker::WorkerError;

/// Everything that can stop a driver run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("render worker: {0}")]
    Worker(#[from] WorkerError),
    #[error("dataset: {0}")]
    Series(#[from] SeriesError),
    #[error("invalid {key}: {source}")]
    Config { key: &'static str, source: serde_json::Error },
    #[error("summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("worker shutdown task: {0}")]
    Join(#[from] tokio::task::JoinError),
}
