//src/batch.rs

use rayon::prelude::*;
use std::sync::Arc;

use crate::error::{FoldError, Result};
use crate::extract::extract_pick;
use crate::fold::{run_rnafold, FoldOptions};
use crate::peaks::{pick_peaks_with, PeakPolicy};
use crate::trajectory::Trajectory;
use crate::types::{FoldedPick, Pick};

/// Peaks of one trajectory, materialized as picks in ascending index order.
pub fn pick_trajectory(
    trajectory: &Arc<Trajectory>,
    window_size: usize,
    policy: &PeakPolicy,
) -> Result<Vec<Pick>> {
    let peaks = pick_peaks_with(trajectory.scores(), window_size, policy)?;
    log::info!(
        "Trajectory '{}': {} pick(s) at {:?}",
        trajectory.name,
        peaks.len(),
        peaks
    );

    let picks = peaks
        .into_iter()
        .map(|i| extract_pick(trajectory, i))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(picks)
}

/// Runs [`pick_trajectory`] over every trajectory in parallel.
///
/// Each trajectory gets its own working copy of the scores, so the flat
/// result is identical to a sequential run: trajectory order first, then
/// ascending index within a trajectory. No cross-trajectory dedup.
pub fn pick_batch(
    trajectories: &[Arc<Trajectory>],
    window_size: usize,
    policy: &PeakPolicy,
) -> Result<Vec<Pick>> {
    let per_trajectory = trajectories
        .par_iter()
        .map(|traj| pick_trajectory(traj, window_size, policy))
        .collect::<Result<Vec<Vec<Pick>>>>()?;

    Ok(per_trajectory.into_iter().flatten().collect())
}

/// Folds every pick's sequence, keeping the pick order.
pub fn fold_picks(picks: &[Pick], options: &FoldOptions) -> std::result::Result<Vec<FoldedPick>, FoldError> {
    picks
        .par_iter()
        .map(|pick| {
            run_rnafold(&pick.sequence, options.theo, options).map(|fold| FoldedPick {
                pick: pick.clone(),
                fold,
            })
        })
        .collect()
}
