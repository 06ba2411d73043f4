//! The single allocation entry point.

use tokio_util::sync::CancellationToken;
use tracecode_core::mode::AllocationMode;
use tracecode_db::repositories::BarcodeSettingsRepo;
use tracecode_db::DbPool;

use crate::error::AllocationError;
use crate::legacy::LegacySequenceGenerator;
use crate::pool_store::PoolInventoryStore;

/// Issues barcodes using whichever strategy is configured.
///
/// The mode is read from storage on every call, so a switch takes effect on
/// the next allocation. The strategies never fall back to each other: an
/// empty pool is reported as [`AllocationError::PoolEmpty`] even when a
/// legacy sequence is configured.
#[derive(Clone)]
pub struct BarcodeAllocator {
    pool: DbPool,
    store: PoolInventoryStore,
    legacy: LegacySequenceGenerator,
}

impl BarcodeAllocator {
    pub fn new(pool: DbPool) -> Self {
        Self {
            store: PoolInventoryStore::new(pool.clone()),
            legacy: LegacySequenceGenerator::new(pool.clone()),
            pool,
        }
    }

    /// Allocate one barcode, recording `used_by_key` against it.
    pub async fn allocate(
        &self,
        used_by_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, AllocationError> {
        if cancel.is_cancelled() {
            return Err(AllocationError::Cancelled);
        }

        let mode = BarcodeSettingsRepo::get(&self.pool)
            .await?
            .allocation_mode()
            .map_err(|e| AllocationError::Configuration(e.to_string()))?;

        tracing::debug!(mode = %mode, "Allocating barcode");
        match mode {
            AllocationMode::Pool => self.store.claim_next(used_by_key, cancel).await,
            AllocationMode::Legacy => self.legacy.next(used_by_key, cancel).await,
        }
    }
}
