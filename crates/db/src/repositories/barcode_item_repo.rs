//! Repository for the `barcode_items` table (pool inventory).
//!
//! Uses `BarcodeItemStatus` from `models::status` for every state literal.
//! The only statements that mutate rows are the claim, the bulk/row
//! inserts, disable, and purge-used.

use std::collections::HashSet;

use sqlx::PgPool;
use tracecode_core::barcode::dedup_key;
use tracecode_core::export::ExportScope;
use tracecode_core::types::{BatchId, Timestamp};

use crate::models::barcode_item::{BarcodeItem, BatchSummary, InventoryStats};
use crate::models::status::BarcodeItemStatus;

/// Column list for `barcode_items` queries.
const COLUMNS: &str = "\
    id, code, status_id, imported_at, used_at, batch_id, source, used_by_key, \
    created_at, updated_at";

/// Start of the current UTC day, as a `TIMESTAMPTZ` expression.
const UTC_DAY_START: &str = "(date_trunc('day', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC')";

/// Provides inventory operations for pool-provisioned barcodes.
pub struct BarcodeItemRepo;

impl BarcodeItemRepo {
    /// Touch the table so a missing schema surfaces before any work starts.
    pub async fn probe(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1 FROM barcode_items LIMIT 1")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Atomically claim the lowest-id available item.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` inside a single `UPDATE` so
    /// concurrent claimants each lock a different row without waiting on
    /// one another. Returns `None` when no available item exists.
    ///
    /// A claim without a business key records an empty `used_by_key` so the
    /// used-fields invariant holds.
    pub async fn claim_next(
        pool: &PgPool,
        used_by_key: Option<&str>,
    ) -> Result<Option<BarcodeItem>, sqlx::Error> {
        let query = format!(
            "UPDATE barcode_items \
             SET status_id = $1, used_at = NOW(), used_by_key = COALESCE($2, '') \
             WHERE id = ( \
                 SELECT id FROM barcode_items \
                 WHERE status_id = $3 \
                 ORDER BY id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BarcodeItem>(&query)
            .bind(BarcodeItemStatus::Used.id())
            .bind(used_by_key)
            .bind(BarcodeItemStatus::Available.id())
            .fetch_optional(pool)
            .await
    }

    /// Find an item by code (case-insensitive).
    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<BarcodeItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM barcode_items WHERE UPPER(code) = UPPER($1)");
        sqlx::query_as::<_, BarcodeItem>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Return the dedup keys (uppercased codes) of `codes` already stored.
    pub async fn find_existing_keys(
        pool: &PgPool,
        codes: &[String],
    ) -> Result<HashSet<String>, sqlx::Error> {
        if codes.is_empty() {
            return Ok(HashSet::new());
        }
        let keys: Vec<String> = codes.iter().map(|c| dedup_key(c)).collect();
        let existing: Vec<String> = sqlx::query_scalar(
            "SELECT UPPER(code) FROM barcode_items WHERE UPPER(code) = ANY($1)",
        )
        .bind(&keys)
        .fetch_all(pool)
        .await?;
        Ok(existing.into_iter().collect())
    }

    /// Insert `codes` as available items in one statement.
    ///
    /// Rows are inserted in slice order so ids ascend in import order. The
    /// statement is all-or-nothing: a single uniqueness collision rejects the
    /// whole chunk with a `23505` error.
    pub async fn insert_batch(
        pool: &PgPool,
        codes: &[String],
        batch_id: BatchId,
        source: &str,
    ) -> Result<u64, sqlx::Error> {
        if codes.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO barcode_items (code, status_id, batch_id, source) \
             SELECT t.code, $2, $3, $4 \
             FROM UNNEST($1::TEXT[]) WITH ORDINALITY AS t(code, ord) \
             ORDER BY t.ord",
        )
        .bind(codes)
        .bind(BarcodeItemStatus::Available.id())
        .bind(batch_id)
        .bind(source)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert a single available item.
    ///
    /// Returns `false` when the code (in any case) already exists.
    pub async fn insert_one(
        pool: &PgPool,
        code: &str,
        batch_id: BatchId,
        source: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO barcode_items (code, status_id, batch_id, source) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING",
        )
        .bind(code)
        .bind(BarcodeItemStatus::Available.id())
        .bind(batch_id)
        .bind(source)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Counts by state, plus items claimed since the start of the UTC day.
    pub async fn stats(pool: &PgPool) -> Result<InventoryStats, sqlx::Error> {
        let query = format!(
            "SELECT \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status_id = $1) AS available, \
                COUNT(*) FILTER (WHERE status_id = $2) AS used, \
                COUNT(*) FILTER (WHERE status_id = $3) AS disabled, \
                COUNT(*) FILTER (WHERE status_id = $2 AND used_at >= {UTC_DAY_START}) AS used_today \
             FROM barcode_items"
        );
        sqlx::query_as::<_, InventoryStats>(&query)
            .bind(BarcodeItemStatus::Available.id())
            .bind(BarcodeItemStatus::Used.id())
            .bind(BarcodeItemStatus::Disabled.id())
            .fetch_one(pool)
            .await
    }

    /// Rows covered by `scope`, ordered by id (import order).
    pub async fn export_rows(
        pool: &PgPool,
        scope: ExportScope,
    ) -> Result<Vec<BarcodeItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM barcode_items \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
             ORDER BY id ASC"
        );
        let status_filter = match scope {
            ExportScope::Remaining => Some(BarcodeItemStatus::Available.id()),
            ExportScope::All | ExportScope::Snapshot => None,
        };
        sqlx::query_as::<_, BarcodeItem>(&query)
            .bind(status_filter)
            .fetch_all(pool)
            .await
    }

    /// Take an available item out of circulation.
    ///
    /// Returns `true` if the item was disabled, `false` if it does not exist
    /// or is already used or disabled.
    pub async fn disable(pool: &PgPool, code: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE barcode_items SET status_id = $2 \
             WHERE UPPER(code) = UPPER($1) AND status_id = $3",
        )
        .bind(code)
        .bind(BarcodeItemStatus::Disabled.id())
        .bind(BarcodeItemStatus::Available.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete used items, optionally only those used before `before`.
    ///
    /// Returns the number of deleted rows.
    pub async fn purge_used(
        pool: &PgPool,
        before: Option<Timestamp>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM barcode_items \
             WHERE status_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR used_at < $2)",
        )
        .bind(BarcodeItemStatus::Used.id())
        .bind(before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Per-batch counts, newest batch first.
    pub async fn list_batches(pool: &PgPool) -> Result<Vec<BatchSummary>, sqlx::Error> {
        sqlx::query_as::<_, BatchSummary>(
            "SELECT \
                batch_id, \
                MIN(source) AS source, \
                MIN(imported_at) AS imported_at, \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status_id = $1) AS available, \
                COUNT(*) FILTER (WHERE status_id = $2) AS used, \
                COUNT(*) FILTER (WHERE status_id = $3) AS disabled \
             FROM barcode_items \
             GROUP BY batch_id \
             ORDER BY MIN(imported_at) DESC, MIN(id) DESC",
        )
        .bind(BarcodeItemStatus::Available.id())
        .bind(BarcodeItemStatus::Used.id())
        .bind(BarcodeItemStatus::Disabled.id())
        .fetch_all(pool)
        .await
    }
}
