//! Issuance strategy selection.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which strategy the allocator uses to issue the next code.
///
/// Stored as lowercase text in `barcode_settings.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// Claim pre-provisioned codes from the imported inventory.
    Pool,
    /// Generate sequential codes from the configured counter.
    Legacy,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AllocationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pool" => Ok(Self::Pool),
            "legacy" => Ok(Self::Legacy),
            other => Err(CoreError::Validation(format!(
                "Unknown allocation mode '{other}' (expected 'pool' or 'legacy')"
            ))),
        }
    }
}
