use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use gamma_peaks::data::generator::{generate, SpectrumGenerationRequest};
use gamma_peaks::data::model::{MetadataValue, SpectralDataset, SpectrumRecord};
use gamma_peaks::data::writer::write_file;

fn seed_value(seed: Option<u64>) -> MetadataValue {
    match seed {
        Some(s) => i64::try_from(s)
            .map(MetadataValue::Integer)
            .unwrap_or_else(|_| MetadataValue::String(s.to_string())),
        None => MetadataValue::Null,
    }
}

/// `count` spectra as records with `spectrum_id`, `spikes` and `seed`
/// metadata. Spectrum `i` is seeded with `seed + i` (wrapping).
pub(crate) fn build_dataset(
    length: usize,
    spikes: usize,
    seed: Option<u64>,
    count: usize,
    axis: Option<(f64, f64)>,
) -> Result<SpectralDataset> {
    let records = (0..count)
        .map(|i| -> Result<SpectrumRecord> {
            let request = SpectrumGenerationRequest {
                length,
                spike_count: spikes,
                seed: seed.map(|s| s.wrapping_add(i as u64)),
            };
            let mut spectrum = generate(&request)
                .with_context(|| format!("generating spectrum {i}"))?;
            if let Some((start, stop)) = axis {
                spectrum = spectrum.with_linspace(start, stop);
            }
            Ok(SpectrumRecord::new(spectrum)
                .with_meta("spectrum_id", MetadataValue::Integer(i as i64))
                .with_meta("spikes", MetadataValue::Integer(spikes as i64))
                .with_meta("seed", seed_value(request.seed)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SpectralDataset::from_records(records))
}

pub fn run(
    output: &Path,
    length: usize,
    spikes: usize,
    seed: Option<u64>,
    count: usize,
    axis: Option<(f64, f64)>,
) -> Result<()> {
    info!("Generating {count} spectra: length={length}, spikes={spikes}, seed={seed:?}");

    let dataset = build_dataset(length, spikes, seed, count, axis)?;
    write_file(output, &dataset)?;
    println!("Wrote {count} spectra ({length} bins each) to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamma_peaks::data::loader::load_file;

    #[test]
    fn spectrum_i_uses_seed_plus_i() {
        let ds = build_dataset(60, 4, Some(10), 3, None).unwrap();
        assert_eq!(ds.len(), 3);
        for (i, rec) in ds.records.iter().enumerate() {
            let expected =
                generate(&SpectrumGenerationRequest::new(60, 4).with_seed(10 + i as u64)).unwrap();
            assert_eq!(rec.spectrum, expected, "spectrum {i}");
            assert_eq!(rec.metadata["seed"], MetadataValue::Integer(10 + i as i64));
            assert_eq!(rec.metadata["spectrum_id"], MetadataValue::Integer(i as i64));
            assert_eq!(rec.metadata["spikes"], MetadataValue::Integer(4));
        }
        assert_eq!(ds.column_names, vec!["seed", "spectrum_id", "spikes"]);
    }

    #[test]
    fn seed_wraps_at_u64_max() {
        let ds = build_dataset(10, 1, Some(u64::MAX), 2, None).unwrap();
        assert_eq!(
            ds.records[0].metadata["seed"],
            MetadataValue::String(u64::MAX.to_string())
        );
        assert_eq!(ds.records[1].metadata["seed"], MetadataValue::Integer(0));
    }

    #[test]
    fn unseeded_spectra_record_null_seed() {
        let ds = build_dataset(10, 1, None, 1, None).unwrap();
        assert_eq!(ds.records[0].metadata["seed"], MetadataValue::Null);
        assert_eq!(seed_value(Some(7)), MetadataValue::Integer(7));
    }

    #[test]
    fn axis_is_attached_when_requested() {
        let ds = build_dataset(5, 0, Some(1), 1, Some((0.0, 40.0))).unwrap();
        assert_eq!(
            ds.records[0].spectrum.coordinates(),
            Some(&[0.0, 10.0, 20.0, 30.0, 40.0][..])
        );
        let bare = build_dataset(5, 0, Some(1), 1, None).unwrap();
        assert_eq!(bare.records[0].spectrum.coordinates(), None);
    }

    #[test]
    fn invalid_request_is_reported() {
        assert!(build_dataset(0, 1, Some(1), 1, None).is_err());
        assert!(build_dataset(0, 1, Some(1), 0, None).unwrap().is_empty());
    }

    #[test]
    fn run_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        run(&path, 30, 2, Some(5), 2, None).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded, build_dataset(30, 2, Some(5), 2, None).unwrap());
    }
}
