use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the benchmark harness. The fixture programs themselves
/// signal nothing.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid ground truth config {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("failed to parse ground truth config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cargo build failed")]
    BuildFailed,

    #[error("required tool `{0}` is not installed")]
    ToolMissing(String),

    #[error("tool timed out after {0:?}")]
    ToolTimeout(Duration),

    #[error("destination buffer has no capacity")]
    ZeroCapacity,
}
