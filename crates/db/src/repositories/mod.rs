//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or an open transaction) as the first argument.

pub mod barcode_item_repo;
pub mod barcode_settings_repo;
pub mod issued_code_repo;

pub use barcode_item_repo::BarcodeItemRepo;
pub use barcode_settings_repo::BarcodeSettingsRepo;
pub use issued_code_repo::IssuedCodeRepo;
