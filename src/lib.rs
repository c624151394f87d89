// src/lib.rs
pub mod batch;
pub mod error;
pub mod extract;
pub mod fold;
pub mod peaks;
pub mod trajectory;
pub mod types;

use std::fmt::Write as FmtWrite;
use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::{fold_picks, pick_batch};
use crate::error::Result;
use crate::fold::FoldOptions;
use crate::peaks::PeakPolicy;
use crate::trajectory::{read_trajectory, Trajectory};
use crate::types::{FoldedPick, Pick};

pub use crate::error::Error;
pub use crate::extract::extract_pick;
pub use crate::peaks::{pick_peaks, pick_peaks_with};

/// Trajectory read when no path is given.
pub const DEFAULT_TRAJECTORY: &str = "logs/mh.tsv";

/// Everything one run needs besides the input paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PickConfig {
    /// Half-width of the suppression window around each pick.
    pub window_size: usize,
    pub policy: PeakPolicy,
    /// Fold every pick when set.
    pub fold: Option<FoldOptions>,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            policy: PeakPolicy::default(),
            fold: None,
        }
    }
}

/// Picks from one run, with text generated on demand.
pub struct PickResults {
    /// The loaded trajectories, in input order.
    pub trajectories: Vec<Arc<Trajectory>>,
    /// Flat pick list: trajectory order, then ascending index.
    pub picks: Vec<Pick>,
    /// Fold output per pick (same order), if folding was requested.
    pub folds: Option<Vec<FoldedPick>>,
}

impl PickResults {
    /// One tab-separated row per pick.
    pub fn get_picks_tsv(&self) -> String {
        let mut output = String::new();
        output.push_str("trajectory\tindex\tscore\tsequence\n");
        for pick in &self.picks {
            let _ = writeln!(
                output,
                "{}\t{}\t{}\t{}",
                pick.source(),
                pick.index,
                pick.score,
                pick.sequence
            );
        }
        output
    }

    /// Picks as FASTA records, labelled `<trajectory>_<index>` with the score.
    pub fn get_fasta(&self) -> String {
        let mut output = String::new();
        for pick in &self.picks {
            let _ = writeln!(output, ">{} score={}\n{}", pick.label(), pick.score, pick.sequence);
        }
        output
    }

    /// Folding tool output, one block per pick.
    pub fn get_folds_text(&self) -> Option<String> {
        let folds = self.folds.as_ref()?;
        let mut output = String::new();
        for folded in folds {
            let _ = writeln!(
                output,
                ">{} score={}\n{}\n",
                folded.pick.label(),
                folded.pick.score,
                folded.fold
            );
        }
        Some(output)
    }
}

/// Loads each trajectory, falling back to [`DEFAULT_TRAJECTORY`] for an empty list.
pub fn load_trajectories(paths: &[PathBuf]) -> Result<Vec<Arc<Trajectory>>> {
    let default = [PathBuf::from(DEFAULT_TRAJECTORY)];
    let paths = if paths.is_empty() { &default[..] } else { paths };

    let mut trajectories = Vec::with_capacity(paths.len());
    for path in paths {
        trajectories.push(Arc::new(read_trajectory(path)?));
    }
    Ok(trajectories)
}

/// Unified entry point: load, pick, and optionally fold.
pub fn pick_best_seqs(paths: &[PathBuf], config: &PickConfig) -> Result<PickResults> {
    // 1. Load trajectories
    let trajectories = load_trajectories(paths)?;

    // 2. Pick peaks and reconstruct sequences
    let picks = pick_batch(&trajectories, config.window_size, &config.policy)?;
    log::info!(
        "Picked {} sequence(s) from {} trajectory file(s)",
        picks.len(),
        trajectories.len()
    );

    // 3. Fold if requested
    let folds = match &config.fold {
        Some(options) => Some(fold_picks(&picks, options)?),
        None => None,
    };

    Ok(PickResults {
        trajectories,
        picks,
        folds,
    })
}
