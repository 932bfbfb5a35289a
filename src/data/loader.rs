use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::{Channel, Record};

/// Header of the identifying column in measurement sheets.
pub const LABEL_COLUMN: &str = "Fabric Roll Number";

/// Files above this size are refused before parsing.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load measurement records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one measurement per row
/// * `.json`    – `[{ "Fabric Roll Number": "R1", "L*": 50.1, ... }, ...]`
/// * `.parquet` – flat columns, channels as any numeric (or numeric text) type
///
/// Every returned record has finite channel values and a dense 1-based
/// `sequence_id` in file order. Row numbers in error messages count the
/// header as row 1.
pub fn load_file(path: &Path) -> Result<Vec<Record>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loader: fn(&Path) -> Result<Vec<Record>> = match ext.as_str() {
        "parquet" | "pq" => load_parquet,
        "json" => load_json,
        "csv" => load_csv,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let size = std::fs::metadata(path)
        .with_context(|| format!("reading {}", path.display()))?
        .len();
    if size > MAX_FILE_BYTES {
        bail!("File size exceeds 10MB limit ({size} bytes)");
    }

    let records = loader(path)?;
    if records.is_empty() {
        bail!("No data found in {}", path.display());
    }
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Find the header that stands for `wanted`.
///
/// An exact match wins. Otherwise the first header (in order) that equals
/// `wanted` after trimming, case-insensitively, or case-insensitively with
/// `*` removed, or that contains `wanted` verbatim.
pub fn find_column(headers: &[String], wanted: &str) -> Option<usize> {
    if let Some(idx) = headers.iter().position(|h| h == wanted) {
        return Some(idx);
    }

    let wanted = wanted.trim();
    let wanted_lower = wanted.to_lowercase();
    let wanted_bare = wanted_lower.replace('*', "");

    headers.iter().position(|h| {
        let trimmed = h.trim();
        let lower = trimmed.to_lowercase();
        trimmed == wanted
            || lower == wanted_lower
            || lower.replace('*', "") == wanted_bare
            || h.contains(wanted)
    })
}

/// Positions of the four required columns.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    label: usize,
    l: usize,
    a: usize,
    b: usize,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            find_column(headers, name).ok_or_else(|| anyhow!("Column \"{name}\" not found"))
        };
        Ok(Columns {
            label: find(LABEL_COLUMN)?,
            l: find(Channel::L.label())?,
            a: find(Channel::A.label())?,
            b: find(Channel::B.label())?,
        })
    }

    fn channel(&self, channel: Channel) -> usize {
        match channel {
            Channel::L => self.l,
            Channel::A => self.a,
            Channel::B => self.b,
        }
    }
}

// -- Row helpers --

fn invalid_value(channel: Channel, index: usize) -> anyhow::Error {
    anyhow!("Invalid {channel} value in row {}", index + 2)
}

fn parse_cell(cell: Option<&str>, channel: Channel, index: usize) -> Result<f64> {
    cell.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_value(channel, index))
}

/// Build a record from the data row at `index` (0-based, header excluded).
fn build_record(
    index: usize,
    label: String,
    mut channel_value: impl FnMut(Channel) -> Result<f64>,
) -> Result<Record> {
    Ok(Record::new(
        index + 1,
        label,
        channel_value(Channel::L)?,
        channel_value(Channel::A)?,
        channel_value(Channel::B)?,
    ))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one measurement per row.
/// Extra columns are ignored.
fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {}", index + 2))?;
        let label = row.get(columns.label).unwrap_or("").to_string();
        let record = build_record(index, label, |c| {
            parse_cell(row.get(columns.channel(c)), c, index)
        })?;
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Fabric Roll Number": "R-001", "L*": 50.12, "a*": 1.03, "b*": 2.0 },
///   ...
/// ]
/// ```
///
/// Column names are resolved against the keys of the first object, in the
/// order they appear in the file.
/// Channel cells may be numbers or numeric strings.
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = first
        .as_object()
        .context("Row 2 is not a JSON object")?
        .keys()
        .cloned()
        .collect();
    let columns = Columns::resolve(&headers)?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let obj = row
                .as_object()
                .with_context(|| format!("Row {} is not a JSON object", index + 2))?;
            let label = json_label(obj.get(&headers[columns.label]));
            build_record(index, label, |c| {
                json_channel(obj, &headers[columns.channel(c)], c, index)
            })
        })
        .collect()
}

fn json_label(val: Option<&JsonValue>) -> String {
    match val {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_channel(
    obj: &Map<String, JsonValue>,
    key: &str,
    channel: Channel,
    index: usize,
) -> Result<f64> {
    match obj.get(key) {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid_value(channel, index)),
        Some(JsonValue::String(s)) => parse_cell(Some(s.as_str()), channel, index),
        _ => Err(invalid_value(channel, index)),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one measurement per row.
///
/// Channel columns may be any Arrow type castable to Float64 (floats,
/// integers, numeric strings); the label column anything castable to Utf8.
/// Works with files written by both Pandas and Polars.
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let columns = Columns::resolve(&headers)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let labels = cast(batch.column(columns.label), &DataType::Utf8)
            .with_context(|| format!("column \"{}\" is not text", headers[columns.label]))?;
        let labels = labels.as_string::<i32>();

        let l = channel_column(batch.column(columns.l), Channel::L)?;
        let a = channel_column(batch.column(columns.a), Channel::A)?;
        let b = channel_column(batch.column(columns.b), Channel::B)?;

        for row in 0..batch.num_rows() {
            let index = records.len();
            let label = if labels.is_null(row) {
                String::new()
            } else {
                labels.value(row).to_string()
            };
            let record = build_record(index, label, |c| {
                let col = match c {
                    Channel::L => &l,
                    Channel::A => &a,
                    Channel::B => &b,
                };
                arrow_channel(col, row, c, index)
            })?;
            records.push(record);
        }
    }
    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Cast a channel column to Float64. Unparseable text becomes null and is
/// reported per row.
fn channel_column(col: &Arc<dyn Array>, channel: Channel) -> Result<Arc<dyn Array>> {
    match col.data_type() {
        DataType::List(_) | DataType::LargeList(_) | DataType::Struct(_) => {
            bail!("{channel} column has unsupported type {:?}", col.data_type())
        }
        _ => cast(col, &DataType::Float64)
            .with_context(|| format!("{channel} column is not numeric")),
    }
}

fn arrow_channel(col: &Arc<dyn Array>, row: usize, channel: Channel, index: usize) -> Result<f64> {
    let values = col.as_primitive::<Float64Type>();
    if values.is_null(row) {
        return Err(invalid_value(channel, index));
    }
    Some(values.value(row))
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_value(channel, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float32Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn find_column_variants() {
        let h = headers(&["Fabric Roll Number", "L* ", "A", "b*(D65)"]);
        assert_eq!(find_column(&h, LABEL_COLUMN), Some(0));
        assert_eq!(find_column(&h, "L*"), Some(1));
        assert_eq!(find_column(&h, "a*"), Some(2));
        assert_eq!(find_column(&h, "b*"), Some(3));
        assert_eq!(find_column(&h, "Shade"), None);
    }

    #[test]
    fn find_column_prefers_exact_match() {
        let h = headers(&["l", "L*"]);
        assert_eq!(find_column(&h, "L*"), Some(1));
    }

    #[test]
    fn loads_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "lots.csv",
            "Fabric Roll Number,L* ,a* ,b* ,Operator\n\
             R-001,50.00,1.00,2.00,kim\n\
             R-002, 50.10 ,1.05,2.05,kim\n\
             ,60,1,2,lee\n",
        );
        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Record::new(1, "R-001", 50.0, 1.0, 2.0));
        assert_eq!(records[1].l, 50.10);
        assert_eq!(records[2].sequence_id, 3);
        assert_eq!(records[2].label, "");
    }

    #[test]
    fn csv_bad_value_reports_row_with_header_offset() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "bad.csv",
            "Fabric Roll Number,L*,a*,b*\nR1,50,1,2\nR2,50,oops,2\n",
        );
        let err = load_file(&path).unwrap_err();
        assert_eq!(err.to_string(), "Invalid a* value in row 3");
    }

    #[test]
    fn csv_rejects_non_finite_and_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "nan.csv", "Fabric Roll Number,L*,a*,b*\nR1,NaN,1,2\n");
        assert_eq!(
            load_file(&path).unwrap_err().to_string(),
            "Invalid L* value in row 2"
        );

        let path = write_file(&dir, "empty.csv", "Fabric Roll Number,L*,a*,b*\nR1,50,1,\n");
        assert_eq!(
            load_file(&path).unwrap_err().to_string(),
            "Invalid b* value in row 2"
        );
    }

    #[test]
    fn missing_column_is_named() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "nob.csv", "Fabric Roll Number,L*,a*\nR1,50,1\n");
        assert_eq!(
            load_file(&path).unwrap_err().to_string(),
            "Column \"b*\" not found"
        );
    }

    #[test]
    fn header_only_file_has_no_data() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "hdr.csv", "Fabric Roll Number,L*,a*,b*\n");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("No data found"));
    }

    #[test]
    fn unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "lots.xlsx", "");
        assert_eq!(
            load_file(&path).unwrap_err().to_string(),
            "Unsupported file extension: .xlsx"
        );
    }

    #[test]
    fn oversized_file_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.csv");
        let f = std::fs::File::create(&path).unwrap();
        f.set_len(MAX_FILE_BYTES + 1).unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("File size exceeds 10MB limit"));
    }

    #[test]
    fn loads_json_with_numbers_and_strings() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "lots.json",
            r#"[
                {"Fabric Roll Number": "R1", "L*": 50.0, "a*": "1.25", "b*": 2},
                {"Fabric Roll Number": 1002, "L*": 51.5, "a*": 1.0, "b*": 2.5},
                {"L*": 52.0, "a*": 1.0, "b*": 2.5}
            ]"#,
        );
        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Record::new(1, "R1", 50.0, 1.25, 2.0));
        assert_eq!(records[1].label, "1002");
        assert_eq!(records[2].label, "");
    }

    #[test]
    fn json_resolves_columns_in_file_order_like_csv() {
        let dir = TempDir::new().unwrap();
        let csv = write_file(
            &dir,
            "lots.csv",
            "Fabric Roll Number,L*,a* ,Delta a*,b*\nR1,50.0,1.0,0.3,2.0\n",
        );
        let json = write_file(
            &dir,
            "lots.json",
            r#"[
                {"Fabric Roll Number": "R1", "L*": 50.0, "a* ": 1.0, "Delta a*": 0.3, "b*": 2.0}
            ]"#,
        );
        let from_csv = load_file(&csv).unwrap();
        let from_json = load_file(&json).unwrap();
        assert_eq!(from_csv[0].a, 1.0);
        assert_eq!(from_json, from_csv);
    }

    #[test]
    fn json_missing_channel_reports_row() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "bad.json",
            r#"[
                {"Fabric Roll Number": "R1", "L*": 50.0, "a*": 1.0, "b*": 2.0},
                {"Fabric Roll Number": "R2", "L*": null, "a*": 1.0, "b*": 2.0}
            ]"#,
        );
        assert_eq!(
            load_file(&path).unwrap_err().to_string(),
            "Invalid L* value in row 3"
        );
    }

    #[test]
    fn loads_parquet_with_mixed_numeric_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lots.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Fabric Roll Number", DataType::Utf8, true),
            Field::new("L*", DataType::Float64, false),
            Field::new("a*", DataType::Float32, false),
            Field::new("b*", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("R1"), None])),
                Arc::new(Float64Array::from(vec![50.0, 50.5])),
                Arc::new(Float32Array::from(vec![1.25f32, 1.5])),
                Arc::new(Int64Array::from(vec![2, 3])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_file(&path).unwrap();
        assert_eq!(
            records,
            vec![
                Record::new(1, "R1", 50.0, 1.25, 2.0),
                Record::new(2, "", 50.5, 1.5, 3.0),
            ]
        );
    }
}
