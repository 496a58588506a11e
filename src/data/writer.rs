use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, ListBuilder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::loader::extension;
use super::model::{MetadataValue, SpectralDataset};

/// Write spectra to a file in the layout [`load_file`](super::loader::load_file) reads.
/// Dispatch by extension.
pub fn write_file(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    match extension(path).as_str() {
        "parquet" | "pq" => write_parquet(path, dataset),
        "json" => write_json(path, dataset),
        "csv" => write_csv(path, dataset),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("writing {}", path.display()))?;

    info!("Wrote {} spectra to {}", dataset.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

fn write_json(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let rows: Vec<JsonValue> = dataset
        .records
        .iter()
        .map(|rec| -> Result<JsonValue> {
            let mut obj = Map::new();
            if let Some(x) = rec.spectrum.coordinates() {
                obj.insert("x".into(), serde_json::to_value(x)?);
            }
            obj.insert("y".into(), serde_json::to_value(rec.spectrum.intensities())?);
            for (key, val) in &rec.metadata {
                obj.insert(key.clone(), serde_json::to_value(val)?);
            }
            Ok(JsonValue::Object(obj))
        })
        .collect::<Result<_>>()?;

    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer(std::io::BufWriter::new(file), &rows).context("serializing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// CSV cells carry no type. Metadata is written with
/// [`MetadataValue::to_cell`] and the loader guesses the type back, so a
/// string such as `"42"` or `"true"` reloads as a number or a bool.
/// A record without coordinates gets an empty `x` cell.
fn write_csv(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let with_x = dataset.has_coordinates();
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;

    let mut header: Vec<&str> = Vec::new();
    if with_x {
        header.push("x");
    }
    header.push("y");
    header.extend(dataset.column_names.iter().map(String::as_str));
    writer.write_record(&header).context("writing CSV header")?;

    for (row_no, rec) in dataset.records.iter().enumerate() {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        if with_x {
            row.push(rec.spectrum.coordinates().map(join_floats).unwrap_or_default());
        }
        row.push(join_floats(rec.spectrum.intensities()));
        for col in &dataset.column_names {
            row.push(rec.metadata.get(col).map(MetadataValue::to_cell).unwrap_or_default());
        }
        writer
            .write_record(&row)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// Arrow type chosen for a metadata column from the values it holds.
///
/// A column mixing integers and floats is stored as `Float64`, so its
/// integers reload as floats. Any other mix is stored as `Utf8` and every
/// value in it reloads as a string. Nulls do not affect the choice.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn column_kind(dataset: &SpectralDataset, column: &str) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for value in dataset.records.iter().filter_map(|r| r.metadata.get(column)) {
        let this = match value {
            MetadataValue::Null => continue,
            MetadataValue::Integer(_) => ColumnKind::Int,
            MetadataValue::Float(_) => ColumnKind::Float,
            MetadataValue::Bool(_) => ColumnKind::Bool,
            MetadataValue::String(_) => ColumnKind::Text,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Int) => ColumnKind::Float,
            _ => ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn list_column<'a>(rows: impl Iterator<Item = Option<&'a [f64]>>) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        match row {
            Some(values) => {
                builder.values().append_slice(values);
                builder.append(true);
            }
            None => builder.append(false),
        }
    }
    Arc::new(builder.finish())
}

fn metadata_column(dataset: &SpectralDataset, column: &str, kind: ColumnKind) -> ArrayRef {
    let cells = dataset.records.iter().map(|r| r.metadata.get(column));
    match kind {
        ColumnKind::Int => {
            let mut b = Int64Builder::new();
            for cell in cells {
                b.append_option(cell.and_then(MetadataValue::as_i64));
            }
            Arc::new(b.finish())
        }
        ColumnKind::Float => {
            let mut b = Float64Builder::new();
            for cell in cells {
                b.append_option(match cell {
                    Some(MetadataValue::Float(v)) => Some(*v),
                    Some(MetadataValue::Integer(i)) => Some(*i as f64),
                    _ => None,
                });
            }
            Arc::new(b.finish())
        }
        ColumnKind::Bool => {
            let mut b = BooleanBuilder::new();
            for cell in cells {
                b.append_option(match cell {
                    Some(MetadataValue::Bool(v)) => Some(*v),
                    _ => None,
                });
            }
            Arc::new(b.finish())
        }
        ColumnKind::Text => {
            let mut b = StringBuilder::new();
            for cell in cells {
                match cell {
                    None | Some(MetadataValue::Null) => b.append_null(),
                    Some(v) => b.append_value(v.to_cell()),
                }
            }
            Arc::new(b.finish())
        }
    }
}

fn write_parquet(path: &Path, dataset: &SpectralDataset) -> Result<()> {
    let list_type = DataType::List(Arc::new(Field::new("item", DataType::Float64, true)));

    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    if dataset.has_coordinates() {
        fields.push(Field::new("x", list_type.clone(), true));
        columns.push(list_column(
            dataset.records.iter().map(|r| r.spectrum.coordinates()),
        ));
    }
    fields.push(Field::new("y", list_type, false));
    columns.push(list_column(
        dataset.records.iter().map(|r| Some(r.spectrum.intensities())),
    ));

    for col in &dataset.column_names {
        let kind = column_kind(dataset, col);
        let data_type = match kind {
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Text => DataType::Utf8,
        };
        fields.push(Field::new(col, data_type, true));
        columns.push(metadata_column(dataset, col, kind));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::{Spectrum, SpectrumRecord};

    fn sample() -> SpectralDataset {
        let a = SpectrumRecord::new(
            Spectrum::with_coordinates(vec![51.0, 47.0, 3.0], vec![0.0, 900.0, 1800.0]).unwrap(),
        )
        .with_meta("spikes", MetadataValue::Integer(5))
        .with_meta("energy_kev", MetadataValue::Float(662.0))
        .with_meta("label", MetadataValue::String("run-a".into()));
        let b = SpectrumRecord::new(
            Spectrum::with_coordinates(vec![1.0, 9.5, 2.0], vec![0.0, 1.0, 2.0]).unwrap(),
        )
        .with_meta("spikes", MetadataValue::Integer(0))
        .with_meta("energy_kev", MetadataValue::Float(1173.2))
        .with_meta("label", MetadataValue::String("run-b".into()));
        SpectralDataset::from_records(vec![a, b])
    }

    fn round_trip(ext: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("spectra.{ext}"));
        let original = sample();
        write_file(&path, &original).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded, original, "round trip through .{ext}");
    }

    #[test]
    fn json_round_trip() {
        round_trip("json");
    }

    #[test]
    fn csv_round_trip() {
        round_trip("csv");
    }

    #[test]
    fn parquet_round_trip() {
        round_trip("parquet");
    }

    #[test]
    fn spectra_without_axis_stay_without_axis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.json");
        let ds = SpectralDataset::from_spectra(vec![Spectrum::new(vec![0.0, 1.0, 0.0])]);
        write_file(&path, &ds).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.records[0].spectrum.coordinates(), None);
        assert_eq!(loaded.records[0].spectrum.find_peaks().indices(), vec![1]);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_file(&dir.path().join("out.txt"), &sample()).is_err());
    }

    fn reload(ext: &str, dataset: &SpectralDataset) -> SpectralDataset {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("spectra.{ext}"));
        write_file(&path, dataset).unwrap();
        load_file(&path).unwrap()
    }

    fn meta(ds: &SpectralDataset, row: usize, col: &str) -> MetadataValue {
        ds.records[row].metadata[col].clone()
    }

    #[test]
    fn whole_floats_stay_floats_in_csv() {
        let ds = SpectralDataset::from_records(vec![SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("energy_kev", MetadataValue::Float(662.0))]);
        assert_eq!(meta(&reload("csv", &ds), 0, "energy_kev"), MetadataValue::Float(662.0));
    }

    #[test]
    fn numeric_looking_strings_are_guessed_in_csv_only() {
        let ds = SpectralDataset::from_records(vec![SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("serial", MetadataValue::String("42".into()))]);
        assert_eq!(meta(&reload("csv", &ds), 0, "serial"), MetadataValue::Integer(42));
        for ext in ["json", "parquet"] {
            assert_eq!(
                meta(&reload(ext, &ds), 0, "serial"),
                MetadataValue::String("42".into()),
                "format .{ext}"
            );
        }
    }

    #[test]
    fn parquet_widens_int_and_float_column_to_float() {
        let a = SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("c", MetadataValue::Integer(1));
        let b = SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("c", MetadataValue::Float(0.5));
        let loaded = reload("parquet", &SpectralDataset::from_records(vec![a, b]));
        assert_eq!(meta(&loaded, 0, "c"), MetadataValue::Float(1.0));
        assert_eq!(meta(&loaded, 1, "c"), MetadataValue::Float(0.5));
    }

    #[test]
    fn parquet_stores_other_mixed_columns_as_text() {
        let a = SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("detector", MetadataValue::Integer(3));
        let b = SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("detector", MetadataValue::String("HPGe".into()));
        let c = SpectrumRecord::new(Spectrum::new(vec![1.0]))
            .with_meta("detector", MetadataValue::Null);
        let loaded = reload("parquet", &SpectralDataset::from_records(vec![a, b, c]));
        assert_eq!(meta(&loaded, 0, "detector"), MetadataValue::String("3".into()));
        assert_eq!(meta(&loaded, 1, "detector"), MetadataValue::String("HPGe".into()));
        assert_eq!(meta(&loaded, 2, "detector"), MetadataValue::Null);
    }

    #[test]
    fn mixed_axis_dataset_reloads_the_same_in_every_format() {
        let with_axis = SpectrumRecord::new(
            Spectrum::with_coordinates(vec![0.0, 4.0, 1.0], vec![10.0, 20.0, 30.0]).unwrap(),
        );
        let bare = SpectrumRecord::new(Spectrum::new(vec![2.0, 0.0, 3.0, 1.0]));
        let original = SpectralDataset::from_records(vec![with_axis, bare]);
        for ext in ["csv", "json", "parquet"] {
            let loaded = reload(ext, &original);
            assert_eq!(loaded, original, "format .{ext}");
            assert_eq!(loaded.records[1].spectrum.coordinates(), None);
        }
    }
}
