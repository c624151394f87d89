//src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Precondition violations of the peak picker. These are caller bugs and are
/// never silently corrected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PeakError {
    #[error("cannot pick peaks from an empty score sequence")]
    EmptyScores,

    #[error("window size must be at least 1, got {0}")]
    InvalidWindow(usize),

    #[error("score at index {index} is not finite ({value})")]
    NonFiniteScore { index: usize, value: f64 },

    #[error("percentile must lie in [0, 100], got {0}")]
    InvalidPercentile(f64),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PickError {
    #[error("pick index {index} is out of range for a trajectory of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Data-integrity problems found while loading a trajectory log.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("failed to read trajectory '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trajectory '{path}' has no header row", path = path.display())]
    MissingHeader { path: PathBuf },

    #[error("trajectory '{path}' has no 'current_score' column", path = path.display())]
    MissingScoreColumn { path: PathBuf },

    #[error("trajectory '{path}', line {line}: cannot parse score '{value}'", path = path.display())]
    InvalidScore {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error(
        "trajectory '{path}', line {line}: {found} fields but the header has {expected}",
        path = path.display()
    )]
    RaggedRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum FoldError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stream sequence to '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Peak(#[from] PeakError),

    #[error(transparent)]
    Pick(#[from] PickError),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error(transparent)]
    Fold(#[from] FoldError),
}
