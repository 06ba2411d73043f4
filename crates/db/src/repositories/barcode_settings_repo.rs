//! Repository for the single-row `barcode_settings` table.
//!
//! The legacy counter is always read fresh from this row; nothing caches it.

use sqlx::PgPool;

use crate::models::barcode_settings::{BarcodeSettings, UpdateBarcodeSettings};

/// Column list for `barcode_settings` queries.
const COLUMNS: &str = "\
    mode, prefix, suffix, start_number, digit_count, quantity, current_index, updated_at";

/// Primary key of the only settings row.
const SETTINGS_ID: i16 = 1;

/// Provides read/update access to allocation settings.
pub struct BarcodeSettingsRepo;

impl BarcodeSettingsRepo {
    /// Load the settings row.
    pub async fn get(pool: &PgPool) -> Result<BarcodeSettings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM barcode_settings WHERE id = $1");
        sqlx::query_as::<_, BarcodeSettings>(&query)
            .bind(SETTINGS_ID)
            .fetch_one(pool)
            .await
    }

    /// Load the settings row and hold a row lock until `tx` ends.
    ///
    /// Legacy allocators serialize on this lock, so the counter read, the
    /// collision checks, and the counter write happen as one unit.
    pub async fn lock_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<BarcodeSettings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM barcode_settings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, BarcodeSettings>(&query)
            .bind(SETTINGS_ID)
            .fetch_one(&mut **tx)
            .await
    }

    /// Persist a new counter position.
    pub async fn set_current_index(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        current_index: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE barcode_settings SET current_index = $2 WHERE id = $1")
            .bind(SETTINGS_ID)
            .bind(current_index)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Apply the non-`None` fields of `input` and return the updated row.
    pub async fn update(
        pool: &PgPool,
        input: &UpdateBarcodeSettings,
    ) -> Result<BarcodeSettings, sqlx::Error> {
        let query = format!(
            "UPDATE barcode_settings SET \
                mode = COALESCE($2, mode), \
                prefix = COALESCE($3, prefix), \
                suffix = COALESCE($4, suffix), \
                start_number = COALESCE($5, start_number), \
                digit_count = COALESCE($6, digit_count), \
                quantity = COALESCE($7, quantity), \
                current_index = COALESCE($8, current_index) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BarcodeSettings>(&query)
            .bind(SETTINGS_ID)
            .bind(input.mode.map(|m| m.as_str()))
            .bind(&input.prefix)
            .bind(&input.suffix)
            .bind(input.start_number)
            .bind(input.digit_count)
            .bind(input.quantity)
            .bind(input.current_index)
            .fetch_one(pool)
            .await
    }
}
