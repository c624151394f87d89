//src/peaks.rs

use crate::error::PeakError;

/// Percentile used by the default threshold policy.
pub const DEFAULT_PERCENTILE: f64 = 75.0;

/// Value used to block positions under the legacy suppression policy.
pub const LEGACY_SENTINEL: f64 = -1.0;

/// Decides the minimum score a position must reach to be accepted as a peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// Percentile (0-100) of the input scores, taken before any suppression.
    Percentile(f64),
    /// An absolute cutoff.
    Fixed(f64),
    /// Accept peaks until every position has been suppressed.
    Unbounded,
}

/// Decides how a chosen peak retires its neighborhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuppressionPolicy {
    /// Overwrite `[i - w, i + w)` with the smallest score of the trajectory and
    /// stop once only that value is left.
    TrueMinimum,
    /// Overwrite `[i - w/2, i + w/2)` with a fixed sentinel. A candidate whose
    /// window already touches a blocked position is dropped instead of recorded.
    Sentinel(f64),
}

/// Threshold and suppression strategies for [`pick_peaks_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPolicy {
    pub threshold: ThresholdPolicy,
    pub suppression: SuppressionPolicy,
}

impl Default for PeakPolicy {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::Percentile(DEFAULT_PERCENTILE),
            suppression: SuppressionPolicy::TrueMinimum,
        }
    }
}

impl PeakPolicy {
    /// The older behavior: no quality bar, half-width windows blocked with `-1`.
    pub fn legacy() -> Self {
        Self {
            threshold: ThresholdPolicy::Unbounded,
            suppression: SuppressionPolicy::Sentinel(LEGACY_SENTINEL),
        }
    }

    fn threshold_for(&self, scores: &[f64]) -> Result<f64, PeakError> {
        match self.threshold {
            ThresholdPolicy::Percentile(p) => percentile(scores, p),
            ThresholdPolicy::Fixed(t) => Ok(t),
            ThresholdPolicy::Unbounded => Ok(f64::NEG_INFINITY),
        }
    }
}

/// Picks well-separated, high-scoring peaks with the default policy
/// (75th percentile threshold, full-window suppression with the true minimum).
///
/// Returns indices in ascending order. The caller's scores are left untouched.
pub fn pick_peaks(scores: &[f64], window_size: usize) -> Result<Vec<usize>, PeakError> {
    pick_peaks_with(scores, window_size, &PeakPolicy::default())
}

/// Greedy iterative maximum extraction: repeatedly take the highest remaining
/// score (first occurrence on ties), record it, and suppress its window.
pub fn pick_peaks_with(
    scores: &[f64],
    window_size: usize,
    policy: &PeakPolicy,
) -> Result<Vec<usize>, PeakError> {
    validate(scores, window_size)?;

    let threshold = policy.threshold_for(scores)?;
    let mut working = scores.to_vec();

    let mut peaks = match policy.suppression {
        SuppressionPolicy::TrueMinimum => {
            suppress_with_minimum(&mut working, window_size, threshold)
        }
        SuppressionPolicy::Sentinel(sentinel) => {
            suppress_with_sentinel(&mut working, window_size, threshold, sentinel)
        }
    };

    peaks.sort_unstable();
    log::debug!(
        "picked {} peak(s) from {} scores (window={}, threshold={})",
        peaks.len(),
        scores.len(),
        window_size,
        threshold
    );
    Ok(peaks)
}

fn validate(scores: &[f64], window_size: usize) -> Result<(), PeakError> {
    if scores.is_empty() {
        return Err(PeakError::EmptyScores);
    }
    if window_size == 0 {
        return Err(PeakError::InvalidWindow(window_size));
    }
    if let Some((index, &value)) = scores.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PeakError::NonFiniteScore { index, value });
    }
    Ok(())
}

fn suppress_with_minimum(working: &mut [f64], window_size: usize, threshold: f64) -> Vec<usize> {
    let floor = working.iter().copied().fold(f64::INFINITY, f64::min);
    let len = working.len();
    let mut peaks = Vec::new();

    loop {
        let (i, max) = argmax(working);
        if max < threshold {
            break;
        }
        // Nothing unsuppressed is left once the maximum has sunk to the floor.
        if !peaks.is_empty() && max == floor {
            break;
        }

        peaks.push(i);
        let lo = i.saturating_sub(window_size);
        let hi = (i + window_size).min(len);
        working[lo..hi].fill(floor);
    }
    peaks
}

fn suppress_with_sentinel(
    working: &mut [f64],
    window_size: usize,
    threshold: f64,
    sentinel: f64,
) -> Vec<usize> {
    let half = window_size / 2;
    let len = working.len();
    let mut peaks = Vec::new();

    loop {
        let (i, max) = argmax(working);
        if max == sentinel || max < threshold {
            break;
        }

        // Always block the candidate itself, otherwise a window of 1 never shrinks.
        let lo = i.saturating_sub(half);
        let hi = (i + half).min(len).max(i + 1);
        if !working[lo..hi].iter().any(|&v| v == sentinel) {
            peaks.push(i);
        }
        working[lo..hi].fill(sentinel);
    }
    peaks
}

/// Index and value of the maximum; ties go to the earliest index.
fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = (0, values[0]);
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}

/// Linearly interpolated percentile (`rank = p/100 * (n - 1)`).
pub fn percentile(values: &[f64], p: f64) -> Result<f64, PeakError> {
    if values.is_empty() {
        return Err(PeakError::EmptyScores);
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(PeakError::InvalidPercentile(p));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A noisy but deterministic trajectory-like score series.
    fn noisy_scores(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                (x / 7.0).sin() * 3.0 + (x / 2.3).cos() + 0.01 * x
            })
            .collect()
    }

    #[test]
    fn two_separated_maxima_are_both_picked() {
        let scores = [1.0, 5.0, 1.0, 1.0, 5.0, 1.0];
        assert_eq!(pick_peaks(&scores, 1).unwrap(), vec![1, 4]);
    }

    #[test]
    fn wide_window_leaves_a_single_peak() {
        let scores = [10.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert_eq!(pick_peaks(&scores, 5).unwrap(), vec![0]);
    }

    #[test]
    fn window_covering_everything_returns_global_maximum() {
        let scores = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        assert_eq!(pick_peaks(&scores, 8).unwrap(), vec![5]);
        assert_eq!(pick_peaks(&scores, 100).unwrap(), vec![5]);
    }

    #[test]
    fn all_equal_scores_give_the_first_index() {
        let scores = [2.5; 7];
        assert_eq!(pick_peaks(&scores, 1).unwrap(), vec![0]);
    }

    #[test]
    fn single_score_is_its_own_peak() {
        assert_eq!(pick_peaks(&[-4.0], 3).unwrap(), vec![0]);
    }

    #[test]
    fn ties_prefer_the_earliest_index() {
        // Both 7s qualify, the first is taken first and blanks the second.
        let scores = [0.0, 7.0, 7.0, 0.0];
        assert_eq!(pick_peaks(&scores, 2).unwrap(), vec![1]);
    }

    #[test]
    fn negative_scores_are_handled_without_a_sentinel() {
        let scores = [-10.0, -2.0, -9.0, -8.0, -9.0, -1.0, -10.0];
        assert_eq!(pick_peaks(&scores, 2).unwrap(), vec![1, 5]);
    }

    #[test]
    fn peaks_are_sorted_unique_in_range_and_qualifying() {
        let scores = noisy_scores(300);
        let threshold = percentile(&scores, DEFAULT_PERCENTILE).unwrap();

        for window in [1, 2, 5, 10, 33, 299, 300, 1000] {
            let peaks = pick_peaks(&scores, window).unwrap();
            assert!(!peaks.is_empty());
            assert!(peaks.windows(2).all(|w| w[0] < w[1]));
            assert!(peaks.iter().all(|&i| i < scores.len()));
            assert!(peaks.iter().all(|&i| scores[i] >= threshold));
            // Each pick blanks [i - w, i + w), so later picks land at least w away.
            assert!(peaks.windows(2).all(|w| w[1] - w[0] >= window));
        }
    }

    #[test]
    fn picking_is_deterministic_and_leaves_input_untouched() {
        let scores = noisy_scores(120);
        let before = scores.clone();
        let first = pick_peaks(&scores, 6).unwrap();
        let second = pick_peaks(&scores, 6).unwrap();
        assert_eq!(first, second);
        assert_eq!(scores, before);
    }

    #[test]
    fn peaks_exactly_one_window_apart_are_allowed() {
        let scores = [0.0, 9.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0];
        // Threshold is interpolated between 0 and 8, both peaks clear it.
        assert_eq!(pick_peaks(&scores, 3).unwrap(), vec![1, 4]);
    }

    #[test]
    fn precondition_violations_fail_fast() {
        assert_eq!(pick_peaks(&[], 1), Err(PeakError::EmptyScores));
        assert_eq!(pick_peaks(&[1.0], 0), Err(PeakError::InvalidWindow(0)));
        assert!(matches!(
            pick_peaks(&[1.0, f64::NAN], 1),
            Err(PeakError::NonFiniteScore { index: 1, .. })
        ));
        assert!(matches!(
            pick_peaks(&[f64::INFINITY], 1),
            Err(PeakError::NonFiniteScore { index: 0, .. })
        ));
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 5.0, 1.0, 1.0, 5.0, 1.0];
        assert_eq!(percentile(&values, 75.0).unwrap(), 4.0);
        assert_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&values, 100.0).unwrap(), 5.0);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0).unwrap(), 3.0);
        assert_eq!(
            percentile(&values, 101.0),
            Err(PeakError::InvalidPercentile(101.0))
        );
    }

    #[test]
    fn fixed_threshold_limits_the_peaks() {
        let scores = [1.0, 6.0, 1.0, 1.0, 4.0, 1.0, 1.0, 3.0];
        let policy = PeakPolicy {
            threshold: ThresholdPolicy::Fixed(3.5),
            suppression: SuppressionPolicy::TrueMinimum,
        };
        assert_eq!(pick_peaks_with(&scores, 1, &policy).unwrap(), vec![1, 4]);
    }

    #[test]
    fn legacy_policy_drops_candidates_next_to_blocked_regions() {
        let scores = [1.0, 5.0, 1.0, 1.0, 5.0, 1.0];
        let peaks = pick_peaks_with(&scores, 2, &PeakPolicy::legacy()).unwrap();
        assert_eq!(peaks, vec![1, 4]);
    }

    #[test]
    fn legacy_policy_with_unit_window_takes_every_position() {
        let scores = [3.0, 1.0, 2.0];
        let peaks = pick_peaks_with(&scores, 1, &PeakPolicy::legacy()).unwrap();
        assert_eq!(peaks, vec![0, 1, 2]);
    }
}
