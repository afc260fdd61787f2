use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{Column, Table, Value};
use crate::error::{LabelError, Result};

/// Cell spellings read as missing, matching the usual dataframe defaults.
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Source & options
// ---------------------------------------------------------------------------

/// Where a table comes from: a table the caller holds, or a file path.
#[derive(Debug, Clone)]
pub enum Source<'a> {
    /// Cloned on load so labelling never touches the caller's table.
    Borrowed(&'a Table),
    /// Handed over by the caller and used as-is.
    Owned(Table),
    Path(Cow<'a, Path>),
}

impl<'a> From<&'a Table> for Source<'a> {
    fn from(table: &'a Table) -> Self {
        Source::Borrowed(table)
    }
}

impl From<Table> for Source<'_> {
    fn from(table: Table) -> Self {
        Source::Owned(table)
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(path: &'a str) -> Self {
        Source::Path(Cow::Borrowed(Path::new(path)))
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(path: &'a String) -> Self {
        Source::Path(Cow::Borrowed(Path::new(path)))
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Source::Path(Cow::Borrowed(path))
    }
}

impl<'a> From<&'a PathBuf> for Source<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Source::Path(Cow::Borrowed(path.as_path()))
    }
}

impl From<PathBuf> for Source<'_> {
    fn from(path: PathBuf) -> Self {
        Source::Path(Cow::Owned(path))
    }
}

/// File parsing knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Field delimiter for `.csv` files.
    pub delimiter: u8,
    /// Worksheet to read from a workbook; the first sheet when `None`.
    pub sheet: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sheet: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Resolve a source into an owned table with default options.
pub fn load_data<'a>(source: impl Into<Source<'a>>) -> Result<Table> {
    load_with(source, &LoadOptions::default())
}

pub fn load_with<'a>(source: impl Into<Source<'a>>, options: &LoadOptions) -> Result<Table> {
    match source.into() {
        Source::Borrowed(table) => Ok(table.clone()),
        Source::Owned(table) => Ok(table),
        Source::Path(path) => load_file(&path, options),
    }
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                                     – header row, then records
/// * `.xls` / `.xlsx` / `.xlsm` / `.xlsb` / `.ods` – first (or named) sheet
/// * `.json`                                    – `[{ "col": value, ... }, ...]`
/// * `.parquet` / `.pq`
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path, options.delimiter)?,
        "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => {
            load_spreadsheet(path, options.sheet.as_deref())?
        }
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        _ => return Err(LabelError::UnsupportedSource(path.to_path_buf())),
    };

    info!(
        "loaded {} rows x {} columns from {}",
        table.height(),
        table.width(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Cell types are inferred per column. Records shorter than the header are
/// padded with missing cells; longer ones are rejected.
fn load_csv(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    let headers = clean_headers(reader.headers()?.iter().map(str::to_string).collect());

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(LabelError::LongRecord {
                line: record.position().map_or(0, |p| p.line()),
                expected: headers.len(),
                found: record.len(),
            });
        }
        if record.len() < headers.len() {
            debug!(
                "line {}: {} of {} fields, padding with missing",
                record.position().map_or(0, |p| p.line()),
                record.len(),
                headers.len()
            );
        }
        for (i, column) in cells.iter_mut().enumerate() {
            let field = record.get(i).filter(|f| !is_na(f));
            column.push(field.map(str::to_string));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column {
            name,
            values: infer_column(raw),
        })
        .collect();
    Table::new(columns)
}

fn is_na(s: &str) -> bool {
    NA_MARKERS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Type a CSV column as a whole: integers, floats, booleans, else text.
fn infer_column(raw: Vec<Option<String>>) -> Vec<Value> {
    let present = || raw.iter().flatten();

    if present().next().is_none() {
        return vec![Value::Missing; raw.len()];
    }
    if present().all(|s| s.trim().parse::<i64>().is_ok()) {
        return raw
            .iter()
            .map(|c| Value::from(c.as_ref().and_then(|s| s.trim().parse::<i64>().ok())))
            .collect();
    }
    if present().all(|s| s.trim().parse::<f64>().is_ok()) {
        return raw
            .iter()
            .map(|c| Value::from(c.as_ref().and_then(|s| s.trim().parse::<f64>().ok())))
            .collect();
    }
    if present().all(|s| parse_bool(s).is_some()) {
        return raw
            .iter()
            .map(|c| Value::from(c.as_deref().and_then(parse_bool)))
            .collect();
    }
    raw.into_iter().map(Value::from).collect()
}

/// Name blank headers `Unnamed: {i}` and suffix repeats as `name.1`, `name.2`.
fn clean_headers(headers: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            let base = if header.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                header
            };
            let mut name = base.clone();
            while !used.insert(name.clone()) {
                let n = repeats.entry(base.clone()).or_insert(0);
                *n += 1;
                name = format!("{base}.{n}");
            }
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// First row of the sheet is the header; empty and error cells are missing.
fn load_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(LabelError::MissingSheet(name.to_string()));
            }
            workbook.worksheet_range(name)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LabelError::MissingSheet("first sheet".to_string()))??,
    };

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        debug!("{} has an empty sheet", path.display());
        return Ok(Table::default());
    };
    let headers = clean_headers(header_row.iter().map(header_text).collect());

    let height = range.height().saturating_sub(1);
    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(height); headers.len()];
    for row in rows {
        for (column, cell) in values.iter_mut().zip(row) {
            column.push(cell_value(cell));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, mut values)| {
            settle_integral_floats(&mut values);
            Column { name, values }
        })
        .collect();
    Table::new(columns)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Missing,
        Data::String(s) if is_na(s) => Value::Missing,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::from(*f),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::Text(other.to_string()),
    }
}

/// Workbooks store every number as a float; a numeric column whose values
/// are all whole numbers reads back as integers.
fn settle_integral_floats(values: &mut [Value]) {
    let integral = values.iter().all(|v| match v {
        Value::Float(f) => f.fract() == 0.0 && f.abs() < 9.0e15,
        Value::Integer(_) | Value::Missing => true,
        _ => false,
    });
    if !integral {
        return;
    }
    for v in values.iter_mut() {
        if let Value::Float(f) = *v {
            *v = Value::Integer(f as i64);
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "Alice", "age": 30 },
///   { "name": "Bob",   "age": null }
/// ]
/// ```
///
/// Columns appear in first-seen key order; absent keys are missing.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| LabelError::InvalidJson("expected top-level JSON array".to_string()))?;

    let mut columns: Vec<Column> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LabelError::InvalidJson(format!("row {i} is not a JSON object")))?;

        for (key, val) in obj {
            let idx = *index.entry(key.clone()).or_insert_with(|| {
                columns.push(Column {
                    name: key.clone(),
                    values: vec![Value::Missing; i],
                });
                columns.len() - 1
            });
            columns[idx].values.push(json_to_value(val));
        }
        for column in &mut columns {
            if column.values.len() == i {
                column.values.push(Value::Missing);
            }
        }
    }

    Table::new(columns)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Missing,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    if batches.is_empty() {
        batches.push(RecordBatch::new_empty(schema));
    }
    Table::from_record_batches(&batches)
}
