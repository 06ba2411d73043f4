//! Command-line surface of `tracecode-admin`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracecode_core::export::{ExportFormat, ExportScope};
use tracecode_core::mode::AllocationMode;
use tracecode_core::types::Timestamp;
use tracecode_db::models::barcode_settings::UpdateBarcodeSettings;

#[derive(Debug, Parser)]
#[command(name = "tracecode-admin")]
#[command(about = "Barcode pool administration: allocate, import, export, and inspect inventory")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,

    /// Allocate one barcode using the configured mode.
    Allocate {
        /// Business key recorded against the issued code (e.g. an order id).
        #[arg(long)]
        key: Option<String>,
    },

    /// Import a spreadsheet or CSV file into the pool.
    Import {
        file: PathBuf,

        /// Source label stored on every item (defaults to the file name).
        #[arg(long)]
        source: Option<String>,
    },

    /// Export the pool inventory.
    Export {
        #[arg(long, default_value = "remaining")]
        scope: ExportScope,

        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Omit the header row (ignored for snapshot exports).
        #[arg(long)]
        no_header: bool,

        /// Output directory or file path (defaults to the suggested name in
        /// the current directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show inventory counts.
    Stats,

    /// List import batches, newest first.
    Batches,

    /// Take an available barcode out of circulation.
    Disable { code: String },

    /// Delete used barcodes.
    PurgeUsed {
        /// Only purge items used before this RFC 3339 timestamp.
        #[arg(long)]
        before: Option<Timestamp>,
    },

    /// Show or change allocation settings.
    Settings(SettingsArgs),
}

#[derive(Debug, clap::Args)]
pub struct SettingsArgs {
    #[arg(long)]
    pub mode: Option<AllocationMode>,

    #[arg(long)]
    pub prefix: Option<String>,

    #[arg(long)]
    pub suffix: Option<String>,

    #[arg(long)]
    pub start: Option<i64>,

    #[arg(long)]
    pub digits: Option<i32>,

    #[arg(long)]
    pub quantity: Option<i64>,

    /// Restart the legacy counter at zero.
    #[arg(long)]
    pub reset_index: bool,
}

impl SettingsArgs {
    /// `None` when no field was supplied, i.e. the command is a read.
    pub fn into_update(self) -> Option<UpdateBarcodeSettings> {
        let update = UpdateBarcodeSettings {
            mode: self.mode,
            prefix: self.prefix,
            suffix: self.suffix,
            start_number: self.start,
            digit_count: self.digits,
            quantity: self.quantity,
            current_index: self.reset_index.then_some(0),
        };
        let empty = update.mode.is_none()
            && update.prefix.is_none()
            && update.suffix.is_none()
            && update.start_number.is_none()
            && update.digit_count.is_none()
            && update.quantity.is_none()
            && update.current_index.is_none();
        (!empty).then_some(update)
    }
}
