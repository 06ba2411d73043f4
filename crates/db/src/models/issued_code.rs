//! Ledger of codes issued by the legacy sequence generator.

use serde::Serialize;
use sqlx::FromRow;
use tracecode_core::types::{DbId, Timestamp};

/// A row from the `issued_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IssuedCode {
    pub id: DbId,
    pub code: String,
    pub used_by_key: Option<String>,
    pub issued_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
