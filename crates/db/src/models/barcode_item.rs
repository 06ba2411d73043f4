//! Pool inventory entity models.

use serde::Serialize;
use sqlx::FromRow;
use tracecode_core::export::ExportRecord;
use tracecode_core::types::{BatchId, DbId, Timestamp};

use super::status::{BarcodeItemStatus, StatusId};

/// A row from the `barcode_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BarcodeItem {
    pub id: DbId,
    pub code: String,
    pub status_id: StatusId,
    pub imported_at: Timestamp,
    pub used_at: Option<Timestamp>,
    pub batch_id: BatchId,
    pub source: String,
    pub used_by_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BarcodeItem {
    pub fn status(&self) -> Option<BarcodeItemStatus> {
        BarcodeItemStatus::from_id(self.status_id)
    }
}

impl From<BarcodeItem> for ExportRecord {
    fn from(item: BarcodeItem) -> Self {
        let status = item
            .status()
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| format!("status_{}", item.status_id));
        Self {
            code: item.code,
            status,
            used_at: item.used_at,
            used_by_key: item.used_by_key,
            batch_id: item.batch_id,
        }
    }
}

/// Aggregate counts over the whole inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct InventoryStats {
    pub total: i64,
    pub available: i64,
    pub used: i64,
    pub disabled: i64,
    /// Items claimed since the start of the current UTC day.
    pub used_today: i64,
}

/// Per-batch counts, one row per import run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub source: String,
    pub imported_at: Timestamp,
    pub total: i64,
    pub available: i64,
    pub used: i64,
    pub disabled: i64,
}
