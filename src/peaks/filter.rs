use super::{find_peaks, Peak, PeakSet};

// ---------------------------------------------------------------------------
// Post-detection filter stages
// ---------------------------------------------------------------------------

/// A stage run after detection that decides which peaks to keep.
///
/// The detector's output is never altered in place; each stage only drops
/// peaks, so the result stays ascending and free of repeated indices.
pub trait PeakFilter<T> {
    /// Keep `peak`? `intensities` is the sequence the peak was found in.
    fn retain(&self, peak: &Peak<T>, intensities: &[T]) -> bool;
}

impl<T, F> PeakFilter<T> for F
where
    F: Fn(&Peak<T>, &[T]) -> bool,
{
    fn retain(&self, peak: &Peak<T>, intensities: &[T]) -> bool {
        self(peak, intensities)
    }
}

/// Detection followed by an ordered list of filter stages.
///
/// A peak survives only if every stage keeps it. With no stages the output
/// is exactly what [`find_peaks`] returns.
pub struct PeakPipeline<T> {
    stages: Vec<Box<dyn PeakFilter<T> + Send + Sync>>,
}

impl<T> Default for PeakPipeline<T> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<T: PartialOrd + Copy> PeakPipeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; stages run in insertion order.
    pub fn then<F>(mut self, stage: F) -> Self
    where
        F: PeakFilter<T> + Send + Sync + 'static,
    {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run the stages over an existing peak set.
    pub fn apply(&self, peaks: PeakSet<T>, intensities: &[T]) -> PeakSet<T> {
        if self.stages.is_empty() {
            return peaks;
        }
        let kept = peaks
            .into_iter()
            .filter(|p| self.stages.iter().all(|s| s.retain(p, intensities)))
            .collect();
        PeakSet::from_sorted(kept)
    }

    /// Detect, then filter.
    pub fn run(&self, intensities: &[T]) -> PeakSet<T> {
        self.apply(find_peaks(intensities), intensities)
    }
}
