//! Pure logic for the barcode inventory importer.
//!
//! This module has zero external dependencies (no DB, no async, no I/O).
//! It provides:
//!
//! - Constants for import limits (header scan depth, chunk size, sample cap).
//! - Header detection: which column holds barcodes, and on which row the
//!   header sits.
//! - Candidate extraction and screening (validation + in-file dedup).
//! - The [`ImportResult`] summary returned to callers.

use serde::Serialize;

use crate::barcode::{dedup_case_insensitive, is_valid_barcode, normalize_header};
use crate::sheet::SheetRows;
use crate::types::BatchId;

// ── Constants ────────────────────────────────────────────────────────

/// Only the first rows of a sheet are searched for a header.
pub const HEADER_SCAN_ROWS: usize = 20;

/// Number of codes checked and inserted per storage round trip.
pub const IMPORT_CHUNK_SIZE: usize = 5000;

/// Maximum rejected raw values kept in [`ImportResult::sample_invalid`].
pub const MAX_INVALID_SAMPLES: usize = 10;

/// Header tokens and their weight. A normalized header cell scores the sum
/// of the weights of every token it contains.
pub const HEADER_TOKENS: &[(&str, u32)] = &[
    ("BARCODE", 3),
    ("MAVACH", 3),
    ("MÃVẠCH", 3),
    ("TRACKING", 2),
    ("CODE", 1),
];

// ── Header detection ─────────────────────────────────────────────────

/// Which column holds barcodes and where its header was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDetection {
    /// 0-based column index.
    pub column: usize,
    /// 0-based row index of the header, `None` when no header was recognised.
    pub header_row: Option<usize>,
    /// Score of the winning header cell (0 for the fallback).
    pub score: u32,
}

impl ColumnDetection {
    /// First column, no header: used when nothing looks like a barcode header.
    pub fn fallback() -> Self {
        Self {
            column: 0,
            header_row: None,
            score: 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.header_row.is_none()
    }

    /// Index of the first data row.
    pub fn first_data_row(&self) -> usize {
        self.header_row.map_or(0, |row| row + 1)
    }
}

/// Score a single header cell against [`HEADER_TOKENS`].
///
/// Cells containing ASCII digits are data, not labels, and score 0: a code
/// such as `QRCODE0003` must never be taken for a header.
pub fn score_header(cell: &str) -> u32 {
    if cell.bytes().any(|b| b.is_ascii_digit()) {
        return 0;
    }
    let normalized = normalize_header(cell);
    if normalized.is_empty() {
        return 0;
    }
    HEADER_TOKENS
        .iter()
        .filter(|(token, _)| normalized.contains(token))
        .map(|(_, weight)| weight)
        .sum()
}

/// Find the barcode column within the first [`HEADER_SCAN_ROWS`] rows.
///
/// The column whose best header cell scores highest wins; ties go to the
/// leftmost column, and within a column to the topmost row.
pub fn detect_barcode_column(rows: &SheetRows) -> ColumnDetection {
    let mut best = ColumnDetection::fallback();

    for (row_idx, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let score = score_header(cell);
            let better = score > best.score
                || (score == best.score && score > 0 && col_idx < best.column);
            if better {
                best = ColumnDetection {
                    column: col_idx,
                    header_row: Some(row_idx),
                    score,
                };
            }
        }
    }

    best
}

// ── Extraction and screening ─────────────────────────────────────────

/// Candidate values from the detected column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Data rows looked at (rows after the header), including blank ones.
    pub rows_read: usize,
    /// Non-blank cell values in row order.
    pub values: Vec<String>,
    /// Valid-looking codes in the detected column above the header row.
    /// They are not imported.
    pub skipped_above_header: usize,
}

/// Read the detected column from every data row, skipping blank cells.
pub fn extract_candidates(rows: &SheetRows, detection: &ColumnDetection) -> Candidates {
    let mut candidates = Candidates {
        skipped_above_header: rows
            .iter()
            .take(detection.header_row.unwrap_or(0))
            .filter_map(|row| row.get(detection.column))
            .filter(|cell| is_valid_barcode(cell.trim()))
            .count(),
        ..Default::default()
    };

    let data_rows = rows.iter().skip(detection.first_data_row());

    for row in data_rows {
        candidates.rows_read += 1;
        if let Some(value) = row.get(detection.column).map(|c| c.trim()) {
            if !value.is_empty() {
                candidates.values.push(value.to_string());
            }
        }
    }

    candidates
}

/// Outcome of validating and deduplicating candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenedCodes {
    /// Valid codes, deduplicated case-insensitively, in first-seen order.
    pub valid: Vec<String>,
    /// Valid values dropped because an earlier row had the same code.
    pub duplicates_in_file: usize,
    pub invalid: usize,
    pub sample_invalid: Vec<String>,
}

/// Validate every candidate and collapse in-file duplicates.
pub fn screen_candidates(values: Vec<String>) -> ScreenedCodes {
    let mut screened = ScreenedCodes::default();
    let mut valid = Vec::with_capacity(values.len());

    for value in values {
        if is_valid_barcode(&value) {
            valid.push(value);
        } else {
            screened.invalid += 1;
            if screened.sample_invalid.len() < MAX_INVALID_SAMPLES {
                screened.sample_invalid.push(value);
            }
        }
    }

    let total_valid = valid.len();
    screened.valid = dedup_case_insensitive(valid);
    screened.duplicates_in_file = total_valid - screened.valid.len();
    screened
}

// ── Result ───────────────────────────────────────────────────────────

/// Per-run import outcome. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub batch_id: BatchId,
    pub rows_read: usize,
    /// Distinct valid codes found in the file.
    pub valid_barcodes: usize,
    pub duplicates_in_file: usize,
    pub added: usize,
    pub already_exists: usize,
    pub invalid: usize,
    pub sample_invalid: Vec<String>,
    pub column: usize,
    pub header_row: Option<usize>,
    pub warnings: Vec<String>,
}

impl ImportResult {
    /// Start a result from the pure screening stages; storage counters begin at zero.
    pub fn new(
        batch_id: BatchId,
        detection: &ColumnDetection,
        rows_read: usize,
        screened: &ScreenedCodes,
    ) -> Self {
        let mut warnings = Vec::new();
        if detection.is_fallback() {
            warnings.push(
                "No barcode header found in the first rows; reading column 1 as data"
                    .to_string(),
            );
        }

        Self {
            batch_id,
            rows_read,
            valid_barcodes: screened.valid.len(),
            duplicates_in_file: screened.duplicates_in_file,
            added: 0,
            already_exists: 0,
            invalid: screened.invalid,
            sample_invalid: screened.sample_invalid.clone(),
            column: detection.column,
            header_row: detection.header_row,
            warnings,
        }
    }

    /// Record that `count` codes above the header row were left out.
    pub fn warn_skipped_above_header(&mut self, count: usize) {
        if count > 0 {
            self.warnings.push(format!(
                "{count} barcode-like values above the header row were not imported"
            ));
        }
    }
}
