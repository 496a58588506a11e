/// Peak layer: detection, post-detection filtering, and coordinate mapping.
///
/// ```text
///   intensities ──► detector ──► PeakSet ──► [filter…] ──► mapper ──► (coordinate, value)*
/// ```

pub mod detector;
pub mod filter;
pub mod mapper;

use serde::Serialize;

use crate::data::model::Spectrum;

pub use detector::{find_peaks, try_find_peaks};
pub use filter::{PeakFilter, PeakPipeline};
pub use mapper::{map_to_coordinates, map_to_spectrum, unzip_mapped, MappedPeak};

// ---------------------------------------------------------------------------
// Peak / PeakSet
// ---------------------------------------------------------------------------

/// A bin classified as a local maximum.
///
/// `index` refers into the source sequence and is always interior
/// (`0 < index < len - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak<T = f64> {
    pub index: usize,
    pub value: T,
}

/// Peaks of one sequence, ascending by index with no repeated index.
///
/// Only the detector builds one; consumers get read-only access.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PeakSet<T = f64> {
    peaks: Vec<Peak<T>>,
}

impl<T> PeakSet<T> {
    pub(crate) fn from_sorted(peaks: Vec<Peak<T>>) -> Self {
        debug_assert!(peaks.windows(2).all(|w| w[0].index < w[1].index));
        Self { peaks }
    }

    pub fn empty() -> Self {
        Self { peaks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peak<T>> {
        self.peaks.iter()
    }

    pub fn as_slice(&self) -> &[Peak<T>] {
        &self.peaks
    }

    pub fn indices(&self) -> Vec<usize> {
        self.peaks.iter().map(|p| p.index).collect()
    }

    pub fn into_vec(self) -> Vec<Peak<T>> {
        self.peaks
    }
}

impl<T> Default for PeakSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> IntoIterator for PeakSet<T> {
    type Item = Peak<T>;
    type IntoIter = std::vec::IntoIter<Peak<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PeakSet<T> {
    type Item = &'a Peak<T>;
    type IntoIter = std::slice::Iter<'a, Peak<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

// ---------------------------------------------------------------------------
// Batch detection
// ---------------------------------------------------------------------------

/// Detect peaks in every spectrum, preserving input order.
///
/// With the `parallel` feature the spectra are scanned on the rayon pool;
/// the output is the same either way.
#[cfg(not(feature = "parallel"))]
pub fn detect_all(spectra: &[Spectrum]) -> Vec<PeakSet<f64>> {
    spectra.iter().map(Spectrum::find_peaks).collect()
}

/// Detect peaks in every spectrum, preserving input order.
///
/// With the `parallel` feature the spectra are scanned on the rayon pool;
/// the output is the same either way.
#[cfg(feature = "parallel")]
pub fn detect_all(spectra: &[Spectrum]) -> Vec<PeakSet<f64>> {
    use rayon::prelude::*;

    spectra.par_iter().map(Spectrum::find_peaks).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_all_matches_per_spectrum_detection() {
        let spectra = vec![
            Spectrum::new(vec![0.0, 1.0, 0.0]),
            Spectrum::new(vec![1.0, 2.0]),
            Spectrum::new(vec![1.0, 3.0, 2.0, 5.0, 1.0]),
        ];
        let all = detect_all(&spectra);
        assert_eq!(all.len(), 3);
        for (sp, set) in spectra.iter().zip(&all) {
            assert_eq!(&sp.find_peaks(), set);
        }
        assert!(all[1].is_empty());
        assert_eq!(all[2].indices(), vec![1, 3]);
    }

    #[test]
    fn peak_set_iterates_in_order() {
        let set = PeakSet::from_sorted(vec![
            Peak { index: 2, value: 4.0 },
            Peak { index: 5, value: 1.0 },
        ]);
        let values: Vec<f64> = set.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![4.0, 1.0]);
        assert_eq!(set.clone().into_vec().len(), 2);
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"[{"index":2,"value":4.0},{"index":5,"value":1.0}]"#
        );
    }
}
