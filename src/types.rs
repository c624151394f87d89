//src/types.rs

use std::sync::Arc;

use crate::trajectory::Trajectory;

/// One selected checkpoint of a trajectory.
///
/// Picks share their source trajectory instead of copying it, so any number
/// of picks from one run point at the same table.
#[derive(Debug, Clone)]
pub struct Pick {
    pub trajectory: Arc<Trajectory>,
    pub index: usize,
    pub score: f64,
    /// Concatenation of every populated domain at `index`, in column order.
    pub sequence: String,
}

impl Pick {
    /// Name of the trajectory this pick was taken from.
    pub fn source(&self) -> &str {
        &self.trajectory.name
    }

    /// `<trajectory>_<index>`, unique within one batch of distinct trajectories.
    pub fn label(&self) -> String {
        format!("{}_{}", self.trajectory.name, self.index)
    }
}

/// A pick paired with the folding tool's output for its sequence.
#[derive(Debug, Clone)]
pub struct FoldedPick {
    pub pick: Pick,
    pub fold: String,
}
