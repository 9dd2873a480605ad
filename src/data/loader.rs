use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
};
use encoding_rs::mem::decode_latin1;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;
use url::Url;

use super::model::{CellValue, EventTable, RawRow, EXPECTED_COLUMNS, is_expected_column};
use super::normalize::build_table;
use super::sample::sample_table;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Source-level failures. Library errors are wrapped with `anyhow` context.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("none of the expected columns were found in the source")]
    NoExpectedColumns,
    #[error("expected a top-level JSON array of records")]
    NotRecordArray,
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where the incident table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(Url),
    Local(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are remote, everything else is a path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Source::Remote(url);
            }
        }
        Source::Local(PathBuf::from(trimmed))
    }

    /// Stable key used by the dataset cache.
    pub fn id(&self) -> String {
        match self {
            Source::Remote(url) => url.to_string(),
            Source::Local(path) => path.display().to_string(),
        }
    }

    fn extension(&self) -> String {
        let name = match self {
            Source::Remote(url) => url
                .path_segments()
                .and_then(|mut segs| segs.next_back())
                .unwrap_or("")
                .to_string(),
            Source::Local(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string(),
        };
        Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    fn format(&self) -> Result<Format> {
        match self.extension().as_str() {
            "" | "csv" | "txt" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => bail!(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Parquet,
}

/// Knobs for fetching remote sources.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub http_timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of [`load`]: always a usable table, plus a warning when the
/// built-in sample had to stand in for the requested source.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: EventTable,
    pub warning: Option<String>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and normalize a source, falling back to the sample table on any error.
pub fn load(source: &Source, options: &LoadOptions) -> LoadOutcome {
    match try_load(source, options) {
        Ok(table) => {
            log::info!(
                "Loaded {} events from {} with columns {:?}",
                table.len(),
                source.id(),
                table.columns()
            );
            LoadOutcome {
                table,
                warning: None,
            }
        }
        Err(e) => {
            log::warn!("Failed to load {}: {e:#}; using sample data", source.id());
            LoadOutcome {
                table: sample_table(),
                warning: Some(format!("Dataset not available ({e:#}). Using sample data.")),
            }
        }
    }
}

/// Load a source without the fallback.
pub fn try_load(source: &Source, options: &LoadOptions) -> Result<EventTable> {
    let format = source.format()?;
    match source {
        Source::Local(path) => load_file(path, format),
        Source::Remote(url) => load_remote(url, format, options),
    }
}

fn load_file(path: &Path, format: Format) -> Result<EventTable> {
    match format {
        Format::Parquet => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            parse_parquet(file)
        }
        Format::Csv => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            parse_csv(&bytes)
        }
        Format::Json => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            parse_json(&bytes)
        }
    }
}

fn load_remote(url: &Url, format: Format, options: &LoadOptions) -> Result<EventTable> {
    let client = reqwest::blocking::Client::builder()
        .timeout(options.http_timeout)
        .build()
        .context("building HTTP client")?;

    log::info!("Fetching {url}");
    let response = client
        .get(url.as_str())
        .send()
        .with_context(|| format!("fetching {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!(LoadError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().context("reading response body")?;
    match format {
        Format::Csv => parse_csv(&body),
        Format::Json => parse_json(&body),
        Format::Parquet => parse_parquet(body),
    }
}

/// Keep only the whitelisted columns, in whitelist order.
fn present_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
    let found: Vec<&str> = names.into_iter().collect();
    let columns: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| found.contains(*c))
        .map(|c| c.to_string())
        .collect();
    if columns.is_empty() {
        bail!(LoadError::NoExpectedColumns);
    }
    Ok(columns)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one incident per record.
/// Bytes are decoded as ISO-8859-1: each byte is the code point of the same
/// value, so decoding never fails.
fn parse_csv(bytes: &[u8]) -> Result<EventTable> {
    let text = decode_latin1(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let columns = present_columns(headers.iter().map(String::as_str))?;
    let kept: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| is_expected_column(h))
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut row = RawRow::new();
        for (col_idx, col_name) in &kept {
            let value = record.get(*col_idx).unwrap_or("");
            row.insert((*col_name).clone(), guess_cell_type(value));
        }
        rows.push(row);
    }

    Ok(build_table(columns, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "eventid": 1, "iyear": 2001, "country_txt": "USA", "nkill": 3000 },
///   ...
/// ]
/// ```
fn parse_json(bytes: &[u8]) -> Result<EventTable> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;
    let Some(records) = root.as_array() else {
        bail!(LoadError::NotRecordArray);
    };

    let mut seen: Vec<&str> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = RawRow::new();
        for (key, val) in obj {
            if !is_expected_column(key) {
                continue;
            }
            if !seen.contains(&key.as_str()) {
                seen.push(key.as_str());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        rows.push(row);
    }

    let columns = present_columns(seen)?;
    Ok(build_table(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding incident rows.
///
/// Scalar columns only: strings, integers, floats, booleans and `Date32`.
/// Works with files written by both Pandas (`df.to_parquet()`) and Polars.
fn parse_parquet<R: ChunkReader + 'static>(reader: R) -> Result<EventTable> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(reader).context("reading parquet metadata")?;
    let columns = present_columns(
        builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().as_str()),
    )?;
    let batches = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in batches {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let kept: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| is_expected_column(f.name()))
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let mut cells = BTreeMap::new();
            for (col_idx, col_name) in &kept {
                cells.insert(col_name.clone(), extract_cell_value(batch.column(*col_idx), row));
            }
            rows.push(cells);
        }
    }

    Ok(build_table(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(|d| CellValue::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(CellValue::Null),
        other => {
            log::debug!("Unsupported parquet column type {other:?}; treating as null");
            CellValue::Null
        }
    }
}
