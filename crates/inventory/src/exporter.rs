//! Export of the pool inventory to CSV or XLSX files.

use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracecode_core::export::{render, suggested_file_name, ExportFormat, ExportRecord, ExportScope};
use tracecode_db::repositories::BarcodeItemRepo;
use tracecode_db::DbPool;

use crate::error::ExportError;

/// What to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExportRequest {
    pub scope: ExportScope,
    pub format: ExportFormat,
    /// Ignored for [`ExportScope::Snapshot`], which always has a header.
    pub include_header: bool,
}

/// A rendered export ready to be written or sent.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    /// Data rows written (header excluded).
    pub rows: usize,
}

/// Renders inventory snapshots. Never mutates inventory state.
#[derive(Clone)]
pub struct InventoryExporter {
    pool: DbPool,
    file_prefix: String,
}

impl InventoryExporter {
    pub fn new(pool: DbPool, file_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            file_prefix: file_prefix.into(),
        }
    }

    pub async fn export(
        &self,
        request: &ExportRequest,
        cancel: &CancellationToken,
    ) -> Result<ExportFile, ExportError> {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let records: Vec<ExportRecord> = BarcodeItemRepo::export_rows(&self.pool, request.scope)
            .await?
            .into_iter()
            .map(ExportRecord::from)
            .collect();

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let bytes = render(request.scope, request.format, request.include_header, &records)?;
        let file_name =
            suggested_file_name(&self.file_prefix, request.scope, request.format, Utc::now());

        tracing::info!(
            scope = request.scope.as_str(),
            format = request.format.extension(),
            rows = records.len(),
            bytes = bytes.len(),
            file_name = %file_name,
            "Exported barcode inventory"
        );

        Ok(ExportFile {
            file_name,
            content_type: request.format.content_type(),
            bytes,
            rows: records.len(),
        })
    }
}
