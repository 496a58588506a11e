use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::{PeakError, Result};
use crate::peaks::{find_peaks, PeakSet};

// ---------------------------------------------------------------------------
// MetadataValue – a single metadata cell attached to a stored spectrum
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value.
///
/// Serialized untagged so JSON records hold plain scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Null => Ok(()),
        }
    }
}

impl MetadataValue {
    /// Text form that [`guess`](Self::guess) reads back as the same variant,
    /// except for strings that themselves look like numbers or booleans.
    /// Floats always keep a decimal point or exponent.
    pub fn to_cell(&self) -> String {
        match self {
            MetadataValue::Float(v) => format!("{v:?}"),
            other => other.to_string(),
        }
    }

    /// Guess the type of a text cell (CSV has no column types).
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(v) = s.parse::<f64>() {
            return MetadataValue::Float(v);
        }
        match s {
            "true" => MetadataValue::Bool(true),
            "false" => MetadataValue::Bool(false),
            _ => MetadataValue::String(s.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – intensities with an optional coordinate axis
// ---------------------------------------------------------------------------

/// `n` evenly spaced values from `start` to `stop`, both ends included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// An ordered sequence of intensities, one per bin.
///
/// When no coordinate axis is attached the bin index is the coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    intensities: Vec<f64>,
    coordinates: Option<Vec<f64>>,
}

impl Spectrum {
    pub fn new(intensities: Vec<f64>) -> Self {
        Self {
            intensities,
            coordinates: None,
        }
    }

    /// Pair intensities with a coordinate axis of the same length.
    pub fn with_coordinates(intensities: Vec<f64>, coordinates: Vec<f64>) -> Result<Self> {
        if coordinates.len() != intensities.len() {
            return Err(PeakError::InvalidInput(format!(
                "{} coordinates for {} intensities",
                coordinates.len(),
                intensities.len()
            )));
        }
        Ok(Self {
            intensities,
            coordinates: Some(coordinates),
        })
    }

    /// Attach an evenly spaced axis from `start` to `stop`.
    pub fn with_linspace(mut self, start: f64, stop: f64) -> Self {
        self.coordinates = Some(linspace(start, stop, self.intensities.len()));
        self
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn coordinates(&self) -> Option<&[f64]> {
        self.coordinates.as_deref()
    }

    /// Coordinate of bin `index`, falling back to the index itself.
    pub fn coordinate(&self, index: usize) -> Option<f64> {
        if index >= self.intensities.len() {
            return None;
        }
        match &self.coordinates {
            Some(x) => Some(x[index]),
            None => Some(index as f64),
        }
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    /// Run the peak detector over this spectrum's intensities.
    pub fn find_peaks(&self) -> PeakSet<f64> {
        find_peaks(&self.intensities)
    }

    pub fn into_parts(self) -> (Vec<f64>, Option<Vec<f64>>) {
        (self.intensities, self.coordinates)
    }
}

// ---------------------------------------------------------------------------
// SpectralDataset – spectra as stored on disk
// ---------------------------------------------------------------------------

/// A spectrum together with its metadata columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumRecord {
    pub spectrum: Spectrum,
    /// column_name → value
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl SpectrumRecord {
    pub fn new(spectrum: Spectrum) -> Self {
        Self {
            spectrum,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, column: &str, value: MetadataValue) -> Self {
        self.metadata.insert(column.to_string(), value);
        self
    }
}

/// Every record of a file, plus the sorted union of metadata column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralDataset {
    pub records: Vec<SpectrumRecord>,
    pub column_names: Vec<String>,
}

impl SpectralDataset {
    pub fn from_records(records: Vec<SpectrumRecord>) -> Self {
        let column_names: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.metadata.keys().cloned())
            .collect();
        SpectralDataset {
            records,
            column_names: column_names.into_iter().collect(),
        }
    }

    /// Wrap bare spectra, without metadata.
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        Self::from_records(spectra.into_iter().map(SpectrumRecord::new).collect())
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record carries a coordinate axis.
    pub fn has_coordinates(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.spectrum.coordinates().is_some())
    }
}
