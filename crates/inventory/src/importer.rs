//! Bulk loading of barcode lists into the pool inventory.
//!
//! The pure stages (decoding, header detection, validation, in-file dedup)
//! live in `tracecode_core`; this module drives them and writes the result
//! in chunks, recovering row by row when a chunk collides with codes that
//! appeared after its existence check.

use tokio_util::sync::CancellationToken;
use tracecode_core::barcode::dedup_key;
use tracecode_core::importer::{
    detect_barcode_column, extract_candidates, screen_candidates, ImportResult, IMPORT_CHUNK_SIZE,
};
use tracecode_core::sheet::read_sheet;
use tracecode_core::types::BatchId;
use tracecode_db::errors::is_unique_violation;
use tracecode_db::repositories::BarcodeItemRepo;
use tracecode_db::DbPool;
use uuid::Uuid;

use crate::error::ImportError;

/// Loads uploaded barcode lists into `barcode_items`.
#[derive(Clone)]
pub struct InventoryImporter {
    pool: DbPool,
    chunk_size: usize,
}

impl InventoryImporter {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            chunk_size: IMPORT_CHUNK_SIZE,
        }
    }

    /// Override the number of codes per storage round trip (minimum 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Import `bytes` (XLSX workbook or delimited text) as one batch.
    ///
    /// Every inserted item shares a fresh batch id and `source_label`, and
    /// items are inserted in file order. Codes already stored (in any case)
    /// are counted in `already_exists`; malformed values in `invalid`.
    ///
    /// On cancellation the chunks and rows committed so far stay committed
    /// and the partial result is returned inside [`ImportError::Cancelled`].
    pub async fn import(
        &self,
        bytes: &[u8],
        source_label: &str,
        cancel: &CancellationToken,
    ) -> Result<ImportResult, ImportError> {
        let rows = read_sheet(bytes).map_err(ImportError::Unreadable)?;

        // A missing table must surface before any counting happens.
        BarcodeItemRepo::probe(&self.pool).await?;

        let detection = detect_barcode_column(&rows);
        if detection.is_fallback() {
            tracing::warn!(
                source = source_label,
                "No barcode header found, reading the first column as data"
            );
        } else {
            tracing::debug!(
                column = detection.column,
                header_row = ?detection.header_row,
                score = detection.score,
                "Detected barcode column"
            );
        }

        let candidates = extract_candidates(&rows, &detection);
        if candidates.skipped_above_header > 0 {
            tracing::warn!(
                source = source_label,
                header_row = ?detection.header_row,
                skipped = candidates.skipped_above_header,
                "Barcode-like values above the header row are not imported"
            );
        }
        let screened = screen_candidates(candidates.values);
        let batch_id = Uuid::now_v7();
        let mut result = ImportResult::new(batch_id, &detection, candidates.rows_read, &screened);
        result.warn_skipped_above_header(candidates.skipped_above_header);

        for (chunk_no, chunk) in screened.valid.chunks(self.chunk_size).enumerate() {
            if cancel.is_cancelled() {
                return Err(self.cancelled(result));
            }

            let existing = BarcodeItemRepo::find_existing_keys(&self.pool, chunk).await?;
            let fresh: Vec<String> = chunk
                .iter()
                .filter(|code| !existing.contains(&dedup_key(code)))
                .cloned()
                .collect();
            result.already_exists += chunk.len() - fresh.len();

            match BarcodeItemRepo::insert_batch(&self.pool, &fresh, batch_id, source_label).await {
                Ok(inserted) => {
                    result.added += inserted as usize;
                    tracing::debug!(
                        batch_id = %batch_id,
                        chunk = chunk_no,
                        inserted,
                        skipped = chunk.len() - fresh.len(),
                        "Imported chunk"
                    );
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(
                        batch_id = %batch_id,
                        chunk = chunk_no,
                        rows = fresh.len(),
                        "Chunk collided with concurrent inserts, falling back to row-by-row"
                    );
                    self.insert_rows(&fresh, batch_id, source_label, cancel, &mut result)
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            batch_id = %batch_id,
            source = source_label,
            rows_read = result.rows_read,
            valid = result.valid_barcodes,
            added = result.added,
            already_exists = result.already_exists,
            duplicates_in_file = result.duplicates_in_file,
            invalid = result.invalid,
            "Barcode import finished"
        );
        Ok(result)
    }

    /// Insert `codes` one at a time, counting conflicts as existing.
    async fn insert_rows(
        &self,
        codes: &[String],
        batch_id: BatchId,
        source_label: &str,
        cancel: &CancellationToken,
        result: &mut ImportResult,
    ) -> Result<(), ImportError> {
        for code in codes {
            if cancel.is_cancelled() {
                return Err(self.cancelled(result.clone()));
            }
            if BarcodeItemRepo::insert_one(&self.pool, code, batch_id, source_label).await? {
                result.added += 1;
            } else {
                result.already_exists += 1;
            }
        }
        Ok(())
    }

    fn cancelled(&self, result: ImportResult) -> ImportError {
        tracing::warn!(
            batch_id = %result.batch_id,
            added = result.added,
            "Barcode import cancelled"
        );
        ImportError::Cancelled(Box::new(result))
    }
}
