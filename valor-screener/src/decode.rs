//! Decoding of exported sheets into pipeline input rows.
//!
//! CSV exports from the screening sites differ in delimiter (`;` for
//! Fundamentus, `,` elsewhere) and encoding (Latin-1 is common). JSON input
//! is either an array of row objects or a previous JSON report. Spreadsheets
//! are read from their first worksheet.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::screener::types::{CellValue, InputRow, NormalizedStock, RawRow};

const DELIMITER_CANDIDATES: &[u8] = b",;\t|";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Expected a JSON array of objects, found {0}")]
    UnexpectedShape(&'static str),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

impl From<DecodeError> for valor_common::Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::NotFound(e.to_string())
            }
            DecodeError::Io(e) => Self::Io(e),
            DecodeError::Spreadsheet(calamine::Error::Io(e)) => Self::Io(e),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// Input file formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
    Xlsx,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" | "xls" => Ok(Self::Xlsx),
            "" => Err(DecodeError::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            ))),
            other => Err(DecodeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Read and decode a sheet from disk.
pub fn read_rows(path: &Path) -> Result<Vec<InputRow>> {
    let format = InputFormat::from_path(path)?;
    let decode: fn(&str) -> Result<Vec<InputRow>> = match format {
        InputFormat::Csv => decode_csv,
        InputFormat::Json => decode_json,
        InputFormat::Xlsx => {
            let rows = decode_xlsx(path)?;
            debug!(path = %path.display(), rows = rows.len(), "Decoded input workbook");
            return Ok(rows);
        }
    };

    let text = decode_text(std::fs::read(path)?);
    let rows = decode(&text)?;

    debug!(path = %path.display(), rows = rows.len(), "Decoded input sheet");
    Ok(rows)
}

/// UTF-8 when valid, Latin-1 otherwise.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Input is not UTF-8, reading as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Decode a CSV document with a header row. Every cell becomes text.
///
/// Only truly empty lines are skipped. A line of bare delimiters (`;;`)
/// still yields a row of empty cells, which later reads as an unknown ticker.
pub fn decode_csv(text: &str) -> Result<Vec<InputRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| (header, CellValue::from(field)))
            .collect();
        rows.push(InputRow::Raw(row));
    }

    Ok(rows)
}

/// Pick the candidate delimiter occurring most often in the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let mut best = (b',', 0usize);

    for &candidate in DELIMITER_CANDIDATES {
        let count = header.bytes().filter(|&b| b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }

    best.0
}

// ============================================================================
// XLSX
// ============================================================================

/// Decode the first worksheet of a workbook.
///
/// The first row holds the headers. Empty cells are left out of the row and
/// rows with no cells at all are skipped.
pub fn decode_xlsx(path: &Path) -> Result<Vec<InputRow>> {
    let mut workbook = open_workbook_auto(path)?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        warn!(path = %path.display(), "Workbook has no worksheets");
        return Ok(Vec::new());
    };
    let range = range?;

    let mut sheet = range.rows();
    let Some(header_cells) = sheet.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_cells
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let rows = sheet
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .filter_map(|(header, cell)| sheet_cell(cell).map(|v| (header.as_str(), v)))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .map(InputRow::Raw)
        .collect();

    Ok(rows)
}

fn sheet_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            Some(CellValue::Text(s.clone()))
        }
        Data::Bool(b) => Some(CellValue::Text(b.to_string())),
        Data::Error(_) | Data::Empty => None,
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Decode a JSON array of row objects, or a report object with a `stocks` array.
///
/// Objects carrying a numeric `ebitMargin`/`ebit_margin` are taken as
/// already normalized; everything else becomes a raw row where strings are
/// text cells, numbers are numeric cells and other values are dropped.
pub fn decode_json(text: &str) -> Result<Vec<InputRow>> {
    let value: Value = serde_json::from_str(text)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("stocks") {
            Some(Value::Array(items)) => items,
            _ => return Err(DecodeError::UnexpectedShape("an object")),
        },
        Value::Null => return Err(DecodeError::UnexpectedShape("null")),
        Value::Bool(_) => return Err(DecodeError::UnexpectedShape("a boolean")),
        Value::Number(_) => return Err(DecodeError::UnexpectedShape("a number")),
        Value::String(_) => return Err(DecodeError::UnexpectedShape("a string")),
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(_) => rows.push(json_row(item)),
            _ => warn!(index, "Skipping non-object JSON element"),
        }
    }

    Ok(rows)
}

fn json_row(item: Value) -> InputRow {
    if looks_normalized(&item) {
        match serde_json::from_value::<NormalizedStock>(item.clone()) {
            Ok(stock) => return InputRow::Normalized(stock),
            Err(e) => debug!(error = %e, "Record is not a normalized stock, reading as raw row"),
        }
    }

    let Value::Object(map) = item else {
        return InputRow::Raw(RawRow::new());
    };

    let row: RawRow = map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, CellValue::Text(text))),
            Value::Number(n) => n.as_f64().map(|n| (key, CellValue::Number(n))),
            _ => None,
        })
        .collect();

    InputRow::Raw(row)
}

fn looks_normalized(item: &Value) -> bool {
    ["ebitMargin", "ebit_margin"]
        .iter()
        .any(|key| item.get(key).map_or(false, Value::is_number))
}
