//! Regime persistence confirmation.
//!
//! A new raw value is adopted only once it has been observed on `min_days`
//! consecutive dates; until then the previously confirmed value is carried
//! forward. The run counter follows the raw sequence, not the confirmed one,
//! so an alternating raw sequence never confirms anything new.

use super::error::{RegimeError, RegimeResult};

/// Confirm `raw` values that persist for at least `min_days` observations.
pub fn confirm_persistence<T: Copy + PartialEq>(raw: &[T], min_days: usize) -> RegimeResult<Vec<T>> {
    if min_days == 0 {
        return Err(RegimeError::InvalidConfiguration(
            "min_days must be at least 1".to_string(),
        ));
    }

    let mut confirmed: Vec<T> = Vec::with_capacity(raw.len());
    let mut run = 0usize;

    for (i, value) in raw.iter().enumerate() {
        run = if i > 0 && raw[i - 1] == *value { run + 1 } else { 1 };

        match confirmed.last() {
            Some(&previous) if run < min_days => confirmed.push(previous),
            _ => confirmed.push(*value),
        }
    }

    Ok(confirmed)
}

/// Length of the run of identical values ending at each position, starting at 1.
pub fn run_lengths<T: PartialEq>(values: &[T]) -> Vec<usize> {
    let mut lengths = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let len = match lengths.last() {
            Some(&prev) if values[i - 1] == *value => prev + 1,
            _ => 1,
        };
        lengths.push(len);
    }
    lengths
}
