//! Error taxonomy for the inventory services.
//!
//! Each service surface has its own enum. Storage failures that mean "the
//! inventory cannot be reached or was never provisioned" are classified as
//! `Infrastructure` so callers can tell them apart from data outcomes such as
//! an empty pool or an exhausted sequence.

use tracecode_core::error::CoreError;
use tracecode_core::importer::ImportResult;
use tracecode_db::errors::{is_undefined_table, is_unreachable};

/// Why legacy generation cannot issue another code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustedReason {
    /// The counter has issued every code the configuration allows.
    QuantityReached { current_index: i64, quantity: i64 },
    /// Too many consecutive candidates were already issued.
    RetryCeiling { attempts: u32 },
}

impl std::fmt::Display for ExhaustedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuantityReached {
                current_index,
                quantity,
            } => write!(f, "quantity reached ({current_index}/{quantity})"),
            Self::RetryCeiling { attempts } => {
                write!(f, "{attempts} consecutive candidates were already issued")
            }
        }
    }
}

/// Errors returned by [`BarcodeAllocator`](crate::BarcodeAllocator) and the
/// strategies behind it.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// No available item remains in the pool.
    #[error("Barcode pool is empty")]
    PoolEmpty,

    #[error("Legacy sequence exhausted: {0}")]
    Exhausted(ExhaustedReason),

    /// Stored settings cannot drive allocation (unknown mode, bad counter shape).
    #[error("Invalid allocation settings: {0}")]
    Configuration(String),

    #[error("Inventory storage unavailable: {0}")]
    Infrastructure(String),

    #[error("Allocation cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for AllocationError {
    fn from(err: sqlx::Error) -> Self {
        match infrastructure_message(&err) {
            Some(msg) => Self::Infrastructure(msg),
            None => Self::Database(err),
        }
    }
}

/// Errors returned by [`InventoryImporter`](crate::InventoryImporter).
///
/// Invalid rows and uniqueness collisions are reported in the
/// [`ImportResult`], never here.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The payload could not be decoded into rows.
    #[error("Unreadable import file: {0}")]
    Unreadable(CoreError),

    #[error("Inventory storage unavailable: {0}")]
    Infrastructure(String),

    /// Stopped between chunks or rows; carries what was committed so far.
    #[error("Import cancelled after adding {} barcodes", .0.added)]
    Cancelled(Box<ImportResult>),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        match infrastructure_message(&err) {
            Some(msg) => Self::Infrastructure(msg),
            None => Self::Database(err),
        }
    }
}

/// Errors returned by [`InventoryExporter`](crate::InventoryExporter).
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to render export: {0}")]
    Render(#[from] CoreError),

    #[error("Inventory storage unavailable: {0}")]
    Infrastructure(String),

    #[error("Export cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ExportError {
    fn from(err: sqlx::Error) -> Self {
        match infrastructure_message(&err) {
            Some(msg) => Self::Infrastructure(msg),
            None => Self::Database(err),
        }
    }
}

/// Errors from read-only and administrative store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Inventory storage unavailable: {0}")]
    Infrastructure(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match infrastructure_message(&err) {
            Some(msg) => Self::Infrastructure(msg),
            None => Self::Database(err),
        }
    }
}

/// Describe `err` if it means the inventory storage is missing or unreachable.
fn infrastructure_message(err: &sqlx::Error) -> Option<String> {
    if is_undefined_table(err) {
        Some(format!("inventory schema is not provisioned ({err})"))
    } else if is_unreachable(err) {
        Some(format!("database unreachable ({err})"))
    } else {
        None
    }
}
