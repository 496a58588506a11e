/// Data layer: spectrum types, synthetic generation, and file I/O.
///
/// Architecture:
/// ```text
///  generator (seed)        .parquet / .json / .csv
///        │                        │
///        ▼                        ▼
///   ┌──────────┐            ┌──────────┐
///   │ Spectrum  │ ◄───────── │  loader   │  parse file → SpectralDataset
///   └──────────┘            └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  SpectralDataset → file
///   └──────────┘
/// ```

pub mod generator;
pub mod loader;
pub mod model;
pub mod writer;
