use std::path::PathBuf;
use thiserror::Error;
use trajstream::engine::config::ConfigError;
use trajstream::engine::error::TrajectoryError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Trajectory '{path}' is truncated at byte {offset}", path = path.display())]
    Truncated { path: PathBuf, offset: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
