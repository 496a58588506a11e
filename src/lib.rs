//! # gamma-peaks
//!
//! Local-maxima detection over 1-D intensity sequences, groundwork for
//! gamma-spectroscopy peak identification, plus the synthetic noisy-spectrum
//! generator used to exercise it.
//!
//! ```
//! use gamma_peaks::peaks::{find_peaks, map_to_coordinates};
//!
//! let peaks = find_peaks(&[1.0, 3.0, 2.0, 5.0, 1.0]);
//! assert_eq!(peaks.indices(), vec![1, 3]);
//!
//! let x = [0.0, 450.0, 900.0, 1350.0, 1800.0];
//! let mapped = map_to_coordinates(&peaks, &x).unwrap();
//! assert_eq!(mapped[1].coordinate, 1350.0);
//! ```

pub mod data;
pub mod error;
pub mod peaks;

pub use data::generator::{generate, generate_with_rng, SpectrumGenerationRequest};
pub use data::model::Spectrum;
pub use error::{PeakError, Result};
pub use peaks::{find_peaks, map_to_coordinates, try_find_peaks, Peak, PeakSet};
