use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use gamma_peaks::data::loader::load_file;
use gamma_peaks::data::model::SpectralDataset;
use gamma_peaks::peaks::detector::WINDOW;
use gamma_peaks::peaks::{detect_all, map_to_spectrum};

/// One line of the peak report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PeakRow {
    pub spectrum: usize,
    pub index: usize,
    pub coordinate: f64,
    pub value: f64,
}

/// Report rows for every peak of every spectrum, in file order.
/// Spectra too short to hold a window are skipped with a warning.
pub(crate) fn peak_rows(dataset: &SpectralDataset) -> Result<Vec<PeakRow>> {
    let spectra: Vec<_> = dataset.records.iter().map(|r| r.spectrum.clone()).collect();
    let found = detect_all(&spectra);

    let mut rows = Vec::new();
    for (i, (spectrum, peaks)) in spectra.iter().zip(&found).enumerate() {
        if spectrum.len() < WINDOW {
            warn!("Spectrum {i} has {} bins, too short for peak detection", spectrum.len());
            continue;
        }
        let mapped = map_to_spectrum(peaks, spectrum)
            .with_context(|| format!("mapping peaks of spectrum {i}"))?;
        info!("Spectrum {i}: {} peaks in {} bins", peaks.len(), spectrum.len());
        rows.extend(peaks.iter().zip(mapped).map(|(p, m)| PeakRow {
            spectrum: i,
            index: p.index,
            coordinate: m.coordinate,
            value: m.value,
        }));
    }
    Ok(rows)
}

/// Write the rows as pretty JSON records or as CSV with a header line.
pub(crate) fn write_report<W: Write>(rows: &[PeakRow], json: bool, mut out: W) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut out, rows).context("writing JSON report")?;
        writeln!(out).context("writing JSON report")?;
    } else {
        let mut writer = csv::Writer::from_writer(&mut out);
        if rows.is_empty() {
            writer
                .write_record(["spectrum", "index", "coordinate", "value"])
                .context("writing CSV report")?;
        }
        for row in rows {
            writer.serialize(row).context("writing CSV report")?;
        }
        writer.flush().context("flushing CSV report")?;
    }
    Ok(())
}

pub fn run(input: &Path, json: bool) -> Result<()> {
    let dataset = load_file(input)?;
    let rows = peak_rows(&dataset)?;
    write_report(&rows, json, io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamma_peaks::data::model::{Spectrum, SpectrumRecord};

    fn dataset() -> SpectralDataset {
        SpectralDataset::from_spectra(vec![
            Spectrum::with_coordinates(
                vec![0.0, 4.0, 1.0, 6.0, 0.0],
                vec![0.0, 10.0, 20.0, 30.0, 40.0],
            )
            .unwrap(),
            Spectrum::new(vec![3.0, 9.0]),
            Spectrum::new(vec![1.0, 2.0, 1.0]),
        ])
    }

    fn report(rows: &[PeakRow], json: bool) -> String {
        let mut out = Vec::new();
        write_report(rows, json, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn one_row_per_peak_and_short_spectra_skipped() {
        let rows = peak_rows(&dataset()).unwrap();
        let expected = vec![
            PeakRow { spectrum: 0, index: 1, coordinate: 10.0, value: 4.0 },
            PeakRow { spectrum: 0, index: 3, coordinate: 30.0, value: 6.0 },
            PeakRow { spectrum: 2, index: 1, coordinate: 1.0, value: 2.0 },
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn csv_report_has_header_then_rows() {
        let rows = peak_rows(&dataset()).unwrap();
        let text = report(&rows, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "spectrum,index,coordinate,value");
        assert_eq!(lines[1], "0,1,10.0,4.0");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn csv_report_without_peaks_still_has_header() {
        assert_eq!(report(&[], false), "spectrum,index,coordinate,value\n");
    }

    #[test]
    fn json_report_parses_back() {
        let rows = peak_rows(&dataset()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report(&rows, true)).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["spectrum"], 2);
        assert_eq!(records[1]["coordinate"], 30.0);
    }

    #[test]
    fn reads_spectra_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.json");
        let ds = SpectralDataset::from_records(vec![SpectrumRecord::new(Spectrum::new(vec![
            0.0, 5.0, 0.0,
        ]))]);
        gamma_peaks::data::writer::write_file(&path, &ds).unwrap();
        let rows = peak_rows(&load_file(&path).unwrap()).unwrap();
        assert_eq!(rows, vec![PeakRow { spectrum: 0, index: 1, coordinate: 1.0, value: 5.0 }]);
    }
}
