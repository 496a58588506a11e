use std::path::Path;

use anyhow::Result;

use gamma_peaks::data::generator::{generate, SpectrumGenerationRequest};
use gamma_peaks::data::model::{MetadataValue, SpectralDataset, SpectrumRecord};
use gamma_peaks::data::writer::write_file;

/// Write a small, reproducible demo dataset to `sample_data.parquet`.
fn main() -> Result<()> {
    env_logger::init();

    // every spectrum gets an x axis spanning 0 → 1800
    let lengths = [120usize, 1000];
    let spike_counts = [1usize, 5, 7, 10];
    let base_seed = 42u64;

    let mut records = Vec::new();
    for &length in &lengths {
        for &spikes in &spike_counts {
            let seed = base_seed + records.len() as u64;
            let request = SpectrumGenerationRequest::new(length, spikes).with_seed(seed);
            let spectrum = generate(&request)?.with_linspace(0.0, 1800.0);
            let peaks = spectrum.find_peaks().len();

            records.push(
                SpectrumRecord::new(spectrum)
                    .with_meta("length", MetadataValue::Integer(length as i64))
                    .with_meta("spikes", MetadataValue::Integer(spikes as i64))
                    .with_meta("seed", MetadataValue::Integer(seed as i64))
                    .with_meta("detected_peaks", MetadataValue::Integer(peaks as i64)),
            );
        }
    }

    let output_path = Path::new("sample_data.parquet");
    let dataset = SpectralDataset::from_records(records);
    write_file(output_path, &dataset)?;

    println!(
        "Wrote {} spectra to {}",
        dataset.len(),
        output_path.display()
    );
    Ok(())
}
