//! Pool-backed inventory: atomic claims plus read-only and administrative
//! queries over imported barcodes.

use tokio_util::sync::CancellationToken;
use tracecode_core::export::ExportScope;
use tracecode_core::types::Timestamp;
use tracecode_db::models::barcode_item::{BarcodeItem, BatchSummary, InventoryStats};
use tracecode_db::repositories::BarcodeItemRepo;
use tracecode_db::DbPool;

use crate::error::{AllocationError, StoreError};

/// Service over the `barcode_items` inventory.
#[derive(Clone)]
pub struct PoolInventoryStore {
    pool: DbPool,
}

impl PoolInventoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Claim the oldest available barcode for `used_by_key`.
    ///
    /// Safe under any number of concurrent callers: each receives a distinct
    /// code. An empty pool yields [`AllocationError::PoolEmpty`] and changes
    /// nothing.
    pub async fn claim_next(
        &self,
        used_by_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, AllocationError> {
        if cancel.is_cancelled() {
            return Err(AllocationError::Cancelled);
        }

        match BarcodeItemRepo::claim_next(&self.pool, used_by_key).await? {
            Some(item) => {
                tracing::info!(
                    item_id = item.id,
                    code = %item.code,
                    used_by_key = used_by_key.unwrap_or_default(),
                    "Claimed pool barcode"
                );
                Ok(item.code)
            }
            None => {
                tracing::warn!(
                    used_by_key = used_by_key.unwrap_or_default(),
                    "Barcode pool is empty"
                );
                Err(AllocationError::PoolEmpty)
            }
        }
    }

    pub async fn stats(&self) -> Result<InventoryStats, StoreError> {
        Ok(BarcodeItemRepo::stats(&self.pool).await?)
    }

    /// Items covered by `scope`, in import order.
    pub async fn export_rows(&self, scope: ExportScope) -> Result<Vec<BarcodeItem>, StoreError> {
        Ok(BarcodeItemRepo::export_rows(&self.pool, scope).await?)
    }

    /// Take an available code out of circulation. Returns `false` if the
    /// code is unknown, already used, or already disabled.
    pub async fn disable(&self, code: &str) -> Result<bool, StoreError> {
        let changed = BarcodeItemRepo::disable(&self.pool, code).await?;
        if changed {
            tracing::info!(code, "Disabled pool barcode");
        }
        Ok(changed)
    }

    /// Delete used items, optionally only those used before `before`.
    pub async fn purge_used(&self, before: Option<Timestamp>) -> Result<u64, StoreError> {
        let deleted = BarcodeItemRepo::purge_used(&self.pool, before).await?;
        tracing::info!(deleted, before = ?before, "Purged used barcodes");
        Ok(deleted)
    }

    pub async fn list_batches(&self) -> Result<Vec<BatchSummary>, StoreError> {
        Ok(BarcodeItemRepo::list_batches(&self.pool).await?)
    }
}
