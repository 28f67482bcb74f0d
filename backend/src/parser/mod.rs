//! File decoding: raw upload bytes to a JSON object or a flat table.
//!
//! The file kind is chosen from the extension:
//!
//! | Extension     | Kind                                  | Output              |
//! |---------------|---------------------------------------|---------------------|
//! | `.json`       | [`FileKind::StructuredText`]          | [`Decoded::Document`] |
//! | `.xlsx` `.xls`| [`FileKind::Workbook`] (first sheet)  | [`Decoded::Table`]  |
//! | `.csv`        | [`FileKind::Delimited`] (auto-detect) | [`Decoded::Table`]  |
//!
//! No domain logic lives here; header interpretation happens in
//! [`crate::transform`].

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Map, Value};
use std::io::Cursor;
use std::path::Path;

use crate::error::{DecodeError, DecodeResult};
use crate::models::{Cell, FlatTable};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Declared kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A whole-file JSON object.
    StructuredText,
    /// An Excel workbook, read from its first sheet.
    Workbook,
    /// Delimited text (CSV and friends), read as a single sheet.
    Delimited,
}

impl FileKind {
    /// Resolve the kind from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> DecodeResult<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::StructuredText),
            "xlsx" | "xls" => Ok(Self::Workbook),
            "csv" => Ok(Self::Delimited),
            _ => Err(DecodeError::UnsupportedKind(ext)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StructuredText => "JSON",
            Self::Workbook => "Excel",
            Self::Delimited => "CSV",
        }
    }
}

/// Decoder output.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A model-shaped JSON object, merged as-is.
    Document(Map<String, Value>),
    /// Header plus positional rows, to be transformed.
    Table(FlatTable),
}

/// Decode a payload of the given kind.
pub fn decode(bytes: &[u8], kind: FileKind) -> DecodeResult<Decoded> {
    match kind {
        FileKind::StructuredText => decode_json(bytes).map(Decoded::Document),
        FileKind::Workbook => decode_workbook(bytes).map(Decoded::Table),
        FileKind::Delimited => decode_delimited(bytes).map(Decoded::Table),
    }
}

/// Read a file from disk and decode it according to its extension.
pub fn decode_file<P: AsRef<Path>>(path: P) -> DecodeResult<Decoded> {
    let path = path.as_ref();
    let kind = FileKind::from_file_name(&path.to_string_lossy())?;
    let bytes = std::fs::read(path)?;
    decode(&bytes, kind)
}

/// Parse the whole payload as one JSON object. A leading UTF-8 BOM is ignored.
pub fn decode_json(bytes: &[u8]) -> DecodeResult<Map<String, Value>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::format("JSON", e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::format(
            "JSON",
            format!("expected a top-level object, found {}", json_type_name(&other)),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode an Excel workbook and return its first sheet as a flat table.
pub fn decode_workbook(bytes: &[u8]) -> DecodeResult<FlatTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DecodeError::format("Excel", e.to_string()))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DecodeError::format("Excel", "workbook has no sheets"))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| DecodeError::format("Excel", format!("sheet '{}': {}", first_sheet, e)))?;

    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    // Leading empty rows are not part of the range.
    let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);

    FlatTable::from_grid_at(grid, header_row)
        .ok_or_else(|| DecodeError::format("Excel", "first sheet is empty"))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}

/// Decode delimited text with encoding and delimiter auto-detection.
pub fn decode_delimited(bytes: &[u8]) -> DecodeResult<FlatTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    // Empty lines never become records, so row numbers come from the reader.
    let mut rows: Vec<(usize, Vec<Cell>)> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::format("CSV", e.to_string()))?;
        let line = record
            .position()
            .map_or(rows.len() + 1, |pos| pos.line() as usize);
        rows.push((line, record.iter().map(cell_from_field).collect()));
    }

    FlatTable::from_numbered_rows(rows).ok_or_else(|| DecodeError::format("CSV", "file is empty"))
}

/// Fields stay text so identifiers like `007` keep their spelling.
fn cell_from_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(trimmed.to_string())
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding, lossy on invalid input.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}
