//! Repository for the `issued_codes` ledger written by legacy allocation.

use sqlx::PgPool;

use crate::models::issued_code::IssuedCode;

/// Column list for `issued_codes` queries.
const COLUMNS: &str = "id, code, used_by_key, issued_at, created_at, updated_at";

/// Provides access to previously issued legacy codes.
pub struct IssuedCodeRepo;

impl IssuedCodeRepo {
    /// `true` if `code` has already been issued.
    pub async fn exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM issued_codes WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    /// Record `code` as issued.
    pub async fn record(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        code: &str,
        used_by_key: Option<&str>,
    ) -> Result<IssuedCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO issued_codes (code, used_by_key) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssuedCode>(&query)
            .bind(code)
            .bind(used_by_key)
            .fetch_one(&mut **tx)
            .await
    }

    /// Record `code` outside of an allocation, e.g. to reserve numbers
    /// issued by another system. Returns `false` if it was already recorded.
    pub async fn reserve(
        pool: &PgPool,
        code: &str,
        used_by_key: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO issued_codes (code, used_by_key) VALUES ($1, $2) \
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(code)
        .bind(used_by_key)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a ledger entry by exact code.
    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<IssuedCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM issued_codes WHERE code = $1");
        sqlx::query_as::<_, IssuedCode>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Number of codes issued so far.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM issued_codes")
            .fetch_one(pool)
            .await
    }
}
