//! Rolling majority-vote smoothing of categorical states.
//!
//! The value at position `i` depends only on positions `<= i`. At the start of
//! the series the window shrinks to whatever history exists.
//!
//! Ties go to the tied value whose first occurrence in the window is earliest.

use super::error::{RegimeError, RegimeResult};
use super::states::Categorical;

/// Smooth `states` with a trailing majority vote over `window` observations.
pub fn majority_smooth<T: Categorical>(states: &[T], window: usize) -> RegimeResult<Vec<T>> {
    if window == 0 {
        return Err(RegimeError::InvalidConfiguration(
            "smoothing window must be at least 1".to_string(),
        ));
    }

    let mut counts = vec![0usize; T::ALL.len()];
    let mut smoothed = Vec::with_capacity(states.len());

    for (i, state) in states.iter().enumerate() {
        counts[state.index()] += 1;
        if i >= window {
            counts[states[i - window].index()] -= 1;
        }

        let start = (i + 1).saturating_sub(window);
        smoothed.push(window_mode(&states[start..=i], &counts));
    }

    Ok(smoothed)
}

/// Most frequent value of `window`, scanning in window order so that the
/// earliest-seen candidate keeps the lead on equal counts.
fn window_mode<T: Categorical>(window: &[T], counts: &[usize]) -> T {
    let mut best = window[0];
    for candidate in &window[1..] {
        if counts[candidate.index()] > counts[best.index()] {
            best = *candidate;
        }
    }
    best
}
