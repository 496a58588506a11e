use std::ops::Range;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::model::Spectrum;
use crate::error::{PeakError, Result};

/// Draw range of the leading "active" third of the spectrum.
pub const ACTIVE_RANGE: Range<u32> = 45..55;
/// Draw range of the quiet baseline filling the remainder.
pub const QUIET_RANGE: Range<u32> = 0..10;
/// Draw range of injected spikes.
pub const SPIKE_RANGE: Range<u32> = 40..100;
/// The first `length / ACTIVE_FRACTION_DIVISOR` bins are active.
pub const ACTIVE_FRACTION_DIVISOR: usize = 3;

/// Parameters for one synthetic spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumGenerationRequest {
    pub length: usize,
    pub spike_count: usize,
    /// Same seed, same spectrum. `None` draws from the OS-seeded thread RNG.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SpectrumGenerationRequest {
    pub fn new(length: usize, spike_count: usize) -> Self {
        Self {
            length,
            spike_count,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build from signed values, rejecting a non-positive length or a
    /// negative spike count.
    pub fn from_signed(length: i64, spike_count: i64, seed: Option<u64>) -> Result<Self> {
        if length <= 0 {
            return Err(PeakError::InvalidRequest(format!(
                "length must be positive, got {length}"
            )));
        }
        if spike_count < 0 {
            return Err(PeakError::InvalidRequest(format!(
                "spike count must not be negative, got {spike_count}"
            )));
        }
        let request = Self {
            length: length as usize,
            spike_count: spike_count as usize,
            seed,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(PeakError::InvalidRequest(
                "length must be positive, got 0".to_string(),
            ));
        }
        // spikes land in [0, length - 1), which is empty for a single bin
        if self.length == 1 && self.spike_count > 0 {
            return Err(PeakError::InvalidRequest(
                "cannot place spikes in a spectrum of length 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a synthetic spectrum.
///
/// Seeded requests use `StdRng::seed_from_u64`, so the output is stable for
/// a given seed and `rand` version.
pub fn generate(request: &SpectrumGenerationRequest) -> Result<Spectrum> {
    debug!(
        "generate: length={}, spikes={}, seed={:?}",
        request.length, request.spike_count, request.seed
    );
    match request.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            generate_with_rng(request.length, request.spike_count, &mut rng)
        }
        None => generate_with_rng(request.length, request.spike_count, &mut rand::rng()),
    }
}

/// Generate a synthetic spectrum drawing from a caller-supplied RNG.
///
/// The first `length / 3` bins are drawn from [`ACTIVE_RANGE`], the rest from
/// [`QUIET_RANGE`]. Then, `spike_count` times, a bin in `[0, length - 1)` is
/// overwritten with a draw from [`SPIKE_RANGE`]. Spike positions are drawn
/// with replacement: two spikes can hit the same bin, so fewer than
/// `spike_count` bins may end up elevated. The last bin is never spiked.
pub fn generate_with_rng<R: Rng + ?Sized>(
    length: usize,
    spike_count: usize,
    rng: &mut R,
) -> Result<Spectrum> {
    SpectrumGenerationRequest::new(length, spike_count).validate()?;

    let active = length / ACTIVE_FRACTION_DIVISOR;
    let mut intensities: Vec<f64> = (0..length)
        .map(|i| {
            let range = if i < active { ACTIVE_RANGE } else { QUIET_RANGE };
            f64::from(rng.random_range(range))
        })
        .collect();

    for _ in 0..spike_count {
        let at = rng.random_range(0..length - 1);
        intensities[at] = f64::from(rng.random_range(SPIKE_RANGE));
    }

    Ok(Spectrum::new(intensities))
}
