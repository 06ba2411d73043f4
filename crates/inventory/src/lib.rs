//! Barcode allocation and pool management services.
//!
//! - [`BarcodeAllocator`]: the single allocation entry point, dispatching on
//!   the configured [`AllocationMode`](tracecode_core::mode::AllocationMode).
//! - [`PoolInventoryStore`]: atomic claims and read-only inventory queries.
//! - [`LegacySequenceGenerator`]: counter-based code generation.
//! - [`InventoryImporter`] / [`InventoryExporter`]: administrative bulk
//!   load and snapshot export.

pub mod allocator;
pub mod config;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod legacy;
pub mod pool_store;

pub use allocator::BarcodeAllocator;
pub use config::{ConfigError, InventoryConfig};
pub use error::{AllocationError, ExhaustedReason, ExportError, ImportError, StoreError};
pub use exporter::{ExportFile, ExportRequest, InventoryExporter};
pub use importer::InventoryImporter;
pub use legacy::LegacySequenceGenerator;
pub use pool_store::PoolInventoryStore;
