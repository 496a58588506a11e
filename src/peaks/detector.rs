use log::debug;

use super::{Peak, PeakSet};
use crate::error::{PeakError, Result};

/// Smallest sequence that holds one complete window.
pub const WINDOW: usize = 3;

/// Find every local maximum under the 3-sample window rule.
///
/// A window `(first, second, third)` slides from `(0, 1, 2)` one bin at a
/// time. The middle bin is a peak when `second >= third` and
/// `second >= first`. Both comparisons are non-strict, so a plateau of equal
/// values reports every interior bin of the plateau; `[1, 5, 5, 5, 1]`
/// yields peaks at 1, 2 and 3.
///
/// The first and last bins are never the middle of a window and so are never
/// peaks. Sequences shorter than three samples give an empty set.
///
/// Values that do not compare (NaN) fail both tests: a NaN is never a peak
/// and never lets its neighbour qualify.
pub fn find_peaks<T: PartialOrd + Copy>(intensities: &[T]) -> PeakSet<T> {
    let peaks: Vec<Peak<T>> = intensities
        .windows(WINDOW)
        .enumerate()
        .filter_map(|(start, w)| {
            let (first, second, third) = (w[0], w[1], w[2]);
            (second >= third && second >= first).then_some(Peak {
                index: start + 1,
                value: second,
            })
        })
        .collect();

    debug!(
        "find_peaks: {} samples, {} peaks",
        intensities.len(),
        peaks.len()
    );
    PeakSet::from_sorted(peaks)
}

/// Like [`find_peaks`], but reports a sequence too short for a window as
/// [`PeakError::InvalidInput`] instead of returning an empty set.
pub fn try_find_peaks<T: PartialOrd + Copy>(intensities: &[T]) -> Result<PeakSet<T>> {
    if intensities.len() < WINDOW {
        return Err(PeakError::InvalidInput(format!(
            "need at least {WINDOW} samples to form a window, got {}",
            intensities.len()
        )));
    }
    Ok(find_peaks(intensities))
}
