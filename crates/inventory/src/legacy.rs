//! Counter-based code generation.
//!
//! Each allocation runs in one transaction that holds a row lock on the
//! settings row, so concurrent legacy callers are serialized and the counter
//! read, collision checks, ledger write, and counter write commit together.
//! The counter is read fresh from storage on every call.

use tokio_util::sync::CancellationToken;
use tracecode_core::sequence::MAX_COLLISION_RETRIES;
use tracecode_db::repositories::{BarcodeSettingsRepo, IssuedCodeRepo};
use tracecode_db::DbPool;

use crate::error::{AllocationError, ExhaustedReason};

/// Issues `prefix + digits + suffix` codes from the stored counter.
#[derive(Clone)]
pub struct LegacySequenceGenerator {
    pool: DbPool,
}

impl LegacySequenceGenerator {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Issue the next code and advance the counter past it.
    ///
    /// Candidates already present in the issued ledger are skipped, up to
    /// [`MAX_COLLISION_RETRIES`] attempts and never beyond `quantity`.
    pub async fn next(
        &self,
        used_by_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, AllocationError> {
        if cancel.is_cancelled() {
            return Err(AllocationError::Cancelled);
        }

        let mut tx = self.pool.begin().await?;
        let settings = BarcodeSettingsRepo::lock_for_update(&mut tx).await?;
        let config = settings.sequence_config();
        config
            .validate()
            .map_err(|e| AllocationError::Configuration(e.to_string()))?;

        if config.is_exhausted() {
            tracing::warn!(
                current_index = config.current_index,
                quantity = config.quantity,
                "Legacy sequence exhausted"
            );
            return Err(AllocationError::Exhausted(ExhaustedReason::QuantityReached {
                current_index: config.current_index,
                quantity: config.quantity,
            }));
        }

        let mut index = config.current_index;
        let mut attempts: u32 = 0;
        while attempts < MAX_COLLISION_RETRIES && index < config.quantity {
            attempts += 1;
            let code = config.code_at(index);

            if IssuedCodeRepo::exists(&mut tx, &code).await? {
                tracing::debug!(code = %code, index, "Legacy candidate already issued, skipping");
                index += 1;
                continue;
            }

            IssuedCodeRepo::record(&mut tx, &code, used_by_key).await?;
            BarcodeSettingsRepo::set_current_index(&mut tx, index + 1).await?;
            tx.commit().await?;

            tracing::info!(
                code = %code,
                index,
                used_by_key = used_by_key.unwrap_or_default(),
                "Issued legacy barcode"
            );
            return Ok(code);
        }

        // Persist the skipped positions so the next call does not rescan them.
        BarcodeSettingsRepo::set_current_index(&mut tx, index).await?;
        tx.commit().await?;

        let reason = if index >= config.quantity {
            ExhaustedReason::QuantityReached {
                current_index: index,
                quantity: config.quantity,
            }
        } else {
            ExhaustedReason::RetryCeiling { attempts }
        };
        tracing::warn!(reason = %reason, "Legacy sequence exhausted");
        Err(AllocationError::Exhausted(reason))
    }
}
