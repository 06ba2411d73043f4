//! Decoding of uploaded barcode lists into a plain text grid.
//!
//! Workbooks (XLSX/ODS by ZIP magic, legacy XLS by CFB magic) are read with
//! `calamine` from the first worksheet; anything else is treated as delimited
//! text and read with `csv`. Every cell comes out as text so the importer
//! never sees a barcode as a floating point number.

use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::CoreError;

/// Row-major grid of cell text. Rows may have different lengths.
pub type SheetRows = Vec<Vec<String>>;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Payload container detected from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Workbook,
    Delimited,
}

impl SheetKind {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(CFB_MAGIC) {
            Self::Workbook
        } else {
            Self::Delimited
        }
    }
}

/// Decode an uploaded payload into rows of cell text.
pub fn read_sheet(bytes: &[u8]) -> Result<SheetRows, CoreError> {
    match SheetKind::detect(bytes) {
        SheetKind::Workbook => read_workbook(bytes),
        SheetKind::Delimited => read_delimited(bytes),
    }
}

fn read_workbook(bytes: &[u8]) -> Result<SheetRows, CoreError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CoreError::Parse(format!("Unreadable workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CoreError::Parse("Workbook contains no worksheets".to_string()))?
        .map_err(|e| CoreError::Parse(format!("Unreadable worksheet: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn read_delimited(bytes: &[u8]) -> Result<SheetRows, CoreError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::Parse(format!("Delimited payload is not UTF-8: {e}")))?;
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Parse(format!("Malformed row: {e}")))?;
        rows.push(record.iter().map(|field| field.trim().to_string()).collect());
    }
    Ok(rows)
}

/// Pick the delimiter from the first non-empty line: comma unless the line
/// only contains semicolons or tabs.
fn sniff_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first.contains(',') {
        b','
    } else if first.contains(';') {
        b';'
    } else if first.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Render a workbook cell as text.
///
/// Numeric cells holding whole numbers are printed as plain integers, so a
/// 15-digit barcode typed into a spreadsheet comes back as the same digits
/// rather than `1.23456789012345E+14`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        // f64 Display never switches to exponent notation.
        format!("{value}")
    }
}
