use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray,
};
use arrow::datatypes::DataType;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, SpectralDataset, Spectrum, SpectrumRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load spectra from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `y` (and optionally `x`) list columns
/// * `.json`    – `[{ "y": [...], "x": [...], ...meta }, ...]`
/// * `.csv`     – `y` (and optionally `x`) columns of semicolon-separated floats
///
/// A record without `x` gets no coordinate axis; its bin index is the coordinate.
pub fn load_file(path: &Path) -> Result<SpectralDataset> {
    let dataset = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "Loaded {} spectra from {} (columns: {:?})",
        dataset.len(),
        path.display(),
        dataset.column_names
    );
    Ok(dataset)
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn build_spectrum(x: Option<Vec<f64>>, y: Vec<f64>, row: usize) -> Result<Spectrum> {
    match x {
        Some(x) => Spectrum::with_coordinates(y, x).with_context(|| format!("Row {row}")),
        None => Ok(Spectrum::new(y)),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct JsonRecord {
    #[serde(default)]
    x: Option<Vec<f64>>,
    y: Vec<f64>,
    #[serde(flatten)]
    metadata: BTreeMap<String, JsonValue>,
}

/// Scalars map to their own variant. Arrays and objects are kept as their
/// JSON text so a file with nested metadata still loads.
fn json_to_metadata(value: JsonValue) -> MetadataValue {
    match value {
        JsonValue::Null => MetadataValue::Null,
        JsonValue::Bool(b) => MetadataValue::Bool(b),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => MetadataValue::Integer(i),
            (None, Some(f)) => MetadataValue::Float(f),
            (None, None) => MetadataValue::String(n.to_string()),
        },
        JsonValue::String(s) => MetadataValue::String(s),
        other => MetadataValue::String(other.to_string()),
    }
}

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "x": [0.0, 15.1, ...], "y": [51, 47, ...], "spikes": 5, "seed": 42 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SpectralDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<JsonRecord> = serde_json::from_str(&text).context("parsing JSON")?;

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| -> Result<SpectrumRecord> {
            Ok(SpectrumRecord {
                spectrum: build_spectrum(row.x, row.y, i)?,
                metadata: row
                    .metadata
                    .into_iter()
                    .map(|(key, value)| (key, json_to_metadata(value)))
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SpectralDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names; `x` and `y` cells hold semicolon-separated
/// floats (`"0.0;15.1;30.2"`). All other columns are metadata.
fn load_csv(path: &Path) -> Result<SpectralDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let x_idx = headers.iter().position(|h| h == "x");
    let y_idx = headers
        .iter()
        .position(|h| h == "y")
        .context("CSV missing 'y' column")?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let y = parse_semicolon_floats(record.get(y_idx).unwrap_or(""), row_no, "y")?;
        // an empty x cell means this row has no axis of its own
        let x = x_idx
            .map(|i| record.get(i).unwrap_or(""))
            .filter(|cell| !cell.trim().is_empty())
            .map(|cell| parse_semicolon_floats(cell, row_no, "x"))
            .transpose()?;

        let metadata = record
            .iter()
            .enumerate()
            .filter(|(col_idx, _)| Some(*col_idx) != x_idx && *col_idx != y_idx)
            .map(|(col_idx, value)| (headers[col_idx].clone(), MetadataValue::guess(value)))
            .collect();

        records.push(SpectrumRecord {
            spectrum: build_spectrum(x, y, row_no)?,
            metadata,
        });
    }

    Ok(SpectralDataset::from_records(records))
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `y`: List<Float64> or LargeList<Float64> (Float32 inner accepted)
/// - `x`: optional, same type as `y`
/// - any other column is metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<SpectralDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let x_idx = schema.index_of("x").ok();
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;

        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != x_idx && *i != y_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let y = extract_f64_list(batch.column(y_idx), row)
                .with_context(|| format!("Row {row}: failed to read 'y'"))?;
            // a null x means this row has no axis of its own
            let x = x_idx
                .filter(|&i| !batch.column(i).is_null(row))
                .map(|i| {
                    extract_f64_list(batch.column(i), row)
                        .with_context(|| format!("Row {row}: failed to read 'x'"))
                })
                .transpose()?;

            let mut metadata = BTreeMap::new();
            for (col_idx, col_name) in &meta_cols {
                let value = extract_metadata_value(batch.column(*col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{col_name}'"))?;
                metadata.insert(col_name.clone(), value);
            }

            records.push(SpectrumRecord {
                spectrum: build_spectrum(x, y, records.len())?,
                metadata,
            });
        }
    }

    Ok(SpectralDataset::from_records(records))
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(arr) = values.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = values.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values.data_type()
        )
    }
}

fn downcast<'a, A: Array + 'static>(col: &'a Arc<dyn Array>) -> Result<&'a A> {
    col.as_any()
        .downcast_ref::<A>()
        .with_context(|| format!("unexpected array for {:?}", col.data_type()))
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> Result<MetadataValue> {
    if col.is_null(row) {
        return Ok(MetadataValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            MetadataValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Int32 => {
            MetadataValue::Integer(i64::from(downcast::<Int32Array>(col)?.value(row)))
        }
        DataType::Int64 => MetadataValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => {
            MetadataValue::Float(f64::from(downcast::<Float32Array>(col)?.value(row)))
        }
        DataType::Float64 => MetadataValue::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => MetadataValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => MetadataValue::String(format!("{other:?}")),
    };
    Ok(value)
}
