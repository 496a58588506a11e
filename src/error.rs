/// Errors reported by the generator, detector and mapper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeakError {
    /// Malformed generation parameters (non-positive length, negative spike count).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Sequence too short to form a window, or coordinates inconsistent
    /// with the spectrum / peak indices.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PeakError>;
