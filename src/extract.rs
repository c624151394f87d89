//src/extract.rs

use std::sync::Arc;

use crate::error::PickError;
use crate::trajectory::Trajectory;
use crate::types::Pick;

/// Materializes the pick at `index`: its score and the concatenated domain
/// sequence at that iteration. Unpopulated domains are skipped.
pub fn extract_pick(trajectory: &Arc<Trajectory>, index: usize) -> Result<Pick, PickError> {
    let len = trajectory.len();
    if index >= len {
        return Err(PickError::IndexOutOfRange { index, len });
    }

    let sequence: String = trajectory
        .domains()
        .iter()
        .filter_map(|domain| domain.values[index].as_deref())
        .collect();

    Ok(Pick {
        trajectory: Arc::clone(trajectory),
        index,
        score: trajectory.scores()[index],
        sequence,
    })
}
