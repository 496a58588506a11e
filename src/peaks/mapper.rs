use serde::Serialize;

use super::PeakSet;
use crate::data::model::Spectrum;
use crate::error::{PeakError, Result};

/// A peak projected onto the caller's coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MappedPeak<T = f64> {
    pub coordinate: f64,
    pub value: T,
}

/// Emit `(coordinates[peak.index], peak.value)` for each peak, in order.
///
/// Fails if a peak index does not exist in `coordinates`, which means the
/// axis does not belong to the spectrum the peaks came from.
pub fn map_to_coordinates<T: Copy>(
    peaks: &PeakSet<T>,
    coordinates: &[f64],
) -> Result<Vec<MappedPeak<T>>> {
    peaks
        .iter()
        .map(|p| {
            coordinates
                .get(p.index)
                .map(|&coordinate| MappedPeak {
                    coordinate,
                    value: p.value,
                })
                .ok_or_else(|| {
                    PeakError::InvalidInput(format!(
                        "peak index {} out of bounds for {} coordinates",
                        p.index,
                        coordinates.len()
                    ))
                })
        })
        .collect()
}

/// Map peaks onto a spectrum's own axis, or onto bin indices if it has none.
pub fn map_to_spectrum(peaks: &PeakSet<f64>, spectrum: &Spectrum) -> Result<Vec<MappedPeak>> {
    match spectrum.coordinates() {
        Some(x) => map_to_coordinates(peaks, x),
        None => {
            let bins: Vec<f64> = (0..spectrum.len()).map(|i| i as f64).collect();
            map_to_coordinates(peaks, &bins)
        }
    }
}

/// Split into separate coordinate and value columns, ready for a scatter overlay.
pub fn unzip_mapped<T: Copy>(mapped: &[MappedPeak<T>]) -> (Vec<f64>, Vec<T>) {
    mapped.iter().map(|m| (m.coordinate, m.value)).unzip()
}
