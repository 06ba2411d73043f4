//! Rendering of inventory snapshots for external handoff and audit.
//!
//! Two layouts exist:
//!
//! ```text
//! Remaining / All            Snapshot
//! ---------------            ------------------------------------------
//! code          (optional)   code,status,usedAt,usedByKey,batchId
//! RR000001VN                 RR000001VN,used,2024-05-01T08:00:00Z,ORD-1,…
//! RR000002VN                 RR000002VN,available,,,…
//! ```
//!
//! The flat layout may drop its header to match what the receiving system
//! expects; the snapshot layout is always headered.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{BatchId, Timestamp};

/// Header of the single-column layout.
pub const CODE_HEADER: &str = "code";

/// Header of the audit layout, in column order.
pub const SNAPSHOT_HEADERS: [&str; 5] = ["code", "status", "usedAt", "usedByKey", "batchId"];

/// MIME type for CSV exports.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// MIME type for XLSX exports.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Which rows an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// Available items only.
    Remaining,
    /// Every item, code column only.
    All,
    /// Every item with audit columns.
    Snapshot,
}

impl ExportScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remaining => "remaining",
            Self::All => "all",
            Self::Snapshot => "snapshot",
        }
    }

    /// Whether the rendered file carries a header row.
    pub fn includes_header(&self, requested: bool) -> bool {
        match self {
            Self::Snapshot => true,
            Self::Remaining | Self::All => requested,
        }
    }
}

impl std::str::FromStr for ExportScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remaining" => Ok(Self::Remaining),
            "all" => Ok(Self::All),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(CoreError::Validation(format!("Unknown export scope '{other}'"))),
        }
    }
}

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => CSV_CONTENT_TYPE,
            Self::Xlsx => XLSX_CONTENT_TYPE,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" | "spreadsheet" => Ok(Self::Xlsx),
            other => Err(CoreError::Validation(format!("Unknown export format '{other}'"))),
        }
    }
}

/// One exported inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    pub code: String,
    /// Lowercase state name (`available`, `used`, `disabled`).
    pub status: String,
    pub used_at: Option<Timestamp>,
    pub used_by_key: Option<String>,
    pub batch_id: BatchId,
}

impl ExportRecord {
    fn snapshot_fields(&self) -> [String; 5] {
        [
            self.code.clone(),
            self.status.clone(),
            self.used_at
                .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                .unwrap_or_default(),
            self.used_by_key.clone().unwrap_or_default(),
            self.batch_id.to_string(),
        ]
    }
}

/// Render `records` in the requested layout and container.
pub fn render(
    scope: ExportScope,
    format: ExportFormat,
    include_header: bool,
    records: &[ExportRecord],
) -> Result<Vec<u8>, CoreError> {
    let header = scope.includes_header(include_header);
    match format {
        ExportFormat::Csv => render_csv(scope, header, records),
        ExportFormat::Xlsx => render_xlsx(scope, header, records),
    }
}

fn render_csv(
    scope: ExportScope,
    header: bool,
    records: &[ExportRecord],
) -> Result<Vec<u8>, CoreError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_writer(Vec::new());
    let csv_err = |e: csv::Error| CoreError::Internal(format!("CSV write failed: {e}"));

    match scope {
        ExportScope::Snapshot => {
            if header {
                writer.write_record(SNAPSHOT_HEADERS).map_err(csv_err)?;
            }
            for record in records {
                writer.write_record(record.snapshot_fields()).map_err(csv_err)?;
            }
        }
        ExportScope::Remaining | ExportScope::All => {
            if header {
                writer.write_record([CODE_HEADER]).map_err(csv_err)?;
            }
            for record in records {
                writer.write_record([record.code.as_str()]).map_err(csv_err)?;
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV flush failed: {e}")))
}

fn render_xlsx(
    scope: ExportScope,
    header: bool,
    records: &[ExportRecord],
) -> Result<Vec<u8>, CoreError> {
    use rust_xlsxwriter::{Format, Workbook};

    let xlsx_err = |e: rust_xlsxwriter::XlsxError| CoreError::Internal(format!("XLSX write failed: {e}"));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let text = Format::new().set_num_format("@");
    let bold = Format::new().set_bold();

    // Text-format the code column so numeric-looking codes stay strings,
    // including in cells a user types into later.
    sheet.set_column_format(0, &text).map_err(xlsx_err)?;
    sheet.set_column_width(0, 24).map_err(xlsx_err)?;

    let headers: &[&str] = match scope {
        ExportScope::Snapshot => &SNAPSHOT_HEADERS,
        ExportScope::Remaining | ExportScope::All => &[CODE_HEADER],
    };

    let mut row: u32 = 0;
    if header {
        for (col, title) in headers.iter().enumerate() {
            sheet
                .write_string_with_format(row, col as u16, *title, &bold)
                .map_err(xlsx_err)?;
        }
        row += 1;
    }

    for record in records {
        match scope {
            ExportScope::Snapshot => {
                for (col, value) in record.snapshot_fields().iter().enumerate() {
                    sheet
                        .write_string_with_format(row, col as u16, value, &text)
                        .map_err(xlsx_err)?;
                }
            }
            ExportScope::Remaining | ExportScope::All => {
                sheet
                    .write_string_with_format(row, 0, &record.code, &text)
                    .map_err(xlsx_err)?;
            }
        }
        row += 1;
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Suggested download name: `{prefix}_{scope}_{yyyyMMdd_HHmmss}.{ext}`.
pub fn suggested_file_name(
    prefix: &str,
    scope: ExportScope,
    format: ExportFormat,
    at: Timestamp,
) -> String {
    format!(
        "{prefix}_{}_{}.{}",
        scope.as_str(),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}
