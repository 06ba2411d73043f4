//! Legacy sequential code generation.
//!
//! A legacy code is `prefix + digits + suffix`, where `digits` is
//! `start_number + index` rendered at a fixed width: zero-padded on the
//! left when short, truncated from the left when long (the least-significant
//! digits are kept).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Upper bound on consecutive collision skips within one allocation.
pub const MAX_COLLISION_RETRIES: u32 = 1000;

/// Widest numeric portion a legacy code may use (fits in an `i64`).
pub const MAX_DIGIT_COUNT: i32 = 18;

/// Counter state for legacy generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub prefix: String,
    pub suffix: String,
    pub start_number: i64,
    pub digit_count: i32,
    /// Total codes this configuration may ever produce.
    pub quantity: i64,
    /// Codes produced so far.
    pub current_index: i64,
}

impl SequenceConfig {
    /// `true` once `current_index` has reached `quantity`.
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.quantity
    }

    /// Codes still available before the configuration is exhausted.
    pub fn remaining(&self) -> i64 {
        (self.quantity - self.current_index).max(0)
    }

    /// Render the code for an arbitrary `index` (not necessarily the current one).
    pub fn code_at(&self, index: i64) -> String {
        let numeric = render_digits(self.start_number.saturating_add(index), self.digit_count);
        format!("{}{numeric}{}", self.prefix, self.suffix)
    }

    /// Check the structural constraints the generator relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=MAX_DIGIT_COUNT).contains(&self.digit_count) {
            return Err(CoreError::Validation(format!(
                "digit_count must be between 1 and {MAX_DIGIT_COUNT}, got {}",
                self.digit_count
            )));
        }
        if self.start_number < 0 {
            return Err(CoreError::Validation(format!(
                "start_number must not be negative, got {}",
                self.start_number
            )));
        }
        if self.quantity < 0 {
            return Err(CoreError::Validation(format!(
                "quantity must not be negative, got {}",
                self.quantity
            )));
        }
        if self.current_index < 0 || self.current_index > self.quantity {
            return Err(CoreError::Validation(format!(
                "current_index {} is outside 0..={}",
                self.current_index, self.quantity
            )));
        }
        Ok(())
    }
}

/// Render `value` at exactly `width` digits.
pub fn render_digits(value: i64, width: i32) -> String {
    let width = width.max(0) as usize;
    let raw = value.to_string();
    if raw.len() > width {
        raw[raw.len() - width..].to_string()
    } else {
        format!("{raw:0>width$}")
    }
}
