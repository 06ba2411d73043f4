//! Pure domain logic for barcode allocation and pool management.
//!
//! Nothing in this crate touches the database or performs async I/O. The
//! `tracecode-db` and `tracecode-inventory` crates build on these types.

pub mod barcode;
pub mod error;
pub mod export;
pub mod importer;
pub mod mode;
pub mod sequence;
pub mod sheet;
pub mod types;
