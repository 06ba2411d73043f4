//! Allocation settings: active mode and legacy counter state.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracecode_core::error::CoreError;
use tracecode_core::mode::AllocationMode;
use tracecode_core::sequence::SequenceConfig;
use tracecode_core::types::Timestamp;

/// The single row of the `barcode_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BarcodeSettings {
    pub mode: String,
    pub prefix: String,
    pub suffix: String,
    pub start_number: i64,
    pub digit_count: i32,
    pub quantity: i64,
    pub current_index: i64,
    pub updated_at: Timestamp,
}

impl BarcodeSettings {
    /// Parse the stored mode.
    pub fn allocation_mode(&self) -> Result<AllocationMode, CoreError> {
        self.mode.parse()
    }

    /// Legacy counter state as a pure value.
    pub fn sequence_config(&self) -> SequenceConfig {
        SequenceConfig {
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            start_number: self.start_number,
            digit_count: self.digit_count,
            quantity: self.quantity,
            current_index: self.current_index,
        }
    }
}

/// DTO for updating settings. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBarcodeSettings {
    pub mode: Option<AllocationMode>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub start_number: Option<i64>,
    pub digit_count: Option<i32>,
    pub quantity: Option<i64>,
    /// Overwrite the counter. Leave `None` to keep the issued position.
    pub current_index: Option<i64>,
}
