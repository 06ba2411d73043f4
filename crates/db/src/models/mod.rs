//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus whatever input DTOs its repository accepts.

pub mod barcode_item;
pub mod barcode_settings;
pub mod issued_code;
pub mod status;
