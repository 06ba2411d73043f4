//! `tracecode-admin`: operator CLI over the barcode inventory services.

mod cli;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracecode_db::models::barcode_settings::BarcodeSettings;
use tracecode_db::repositories::BarcodeSettingsRepo;
use tracecode_db::DbPool;
use tracecode_inventory::{
    BarcodeAllocator, ExportRequest, ImportError, InventoryConfig, InventoryExporter,
    InventoryImporter, PoolInventoryStore,
};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tracecode_admin=info,tracecode_inventory=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // --- Configuration ---
    let config = InventoryConfig::from_env()?;

    // --- Database ---
    let pool = tracecode_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracecode_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::debug!(max_connections = config.max_connections, "Database connection pool created");

    // --- Cancellation ---
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    run(cli.command, &config, pool, &cancel).await
}

async fn run(
    command: Command,
    config: &InventoryConfig,
    pool: DbPool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Command::Migrate => {
            tracecode_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }

        Command::Allocate { key } => {
            let code = BarcodeAllocator::new(pool)
                .allocate(key.as_deref(), cancel)
                .await?;
            println!("{code}");
        }

        Command::Import { file, source } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let source = source.unwrap_or_else(|| file_label(&file));
            let importer =
                InventoryImporter::new(pool).with_chunk_size(config.import_chunk_size);

            match importer.import(&bytes, &source, cancel).await {
                Ok(result) => print_json(&result)?,
                Err(ImportError::Cancelled(partial)) => {
                    print_json(&partial)?;
                    anyhow::bail!("Import cancelled; {} barcodes were added", partial.added);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Command::Export {
            scope,
            format,
            no_header,
            out,
        } => {
            let exporter = InventoryExporter::new(pool, config.export_file_prefix.clone());
            let request = ExportRequest {
                scope,
                format,
                include_header: !no_header,
            };
            let file = exporter.export(&request, cancel).await?;
            let path = output_path(out, &file.file_name);
            tokio::fs::write(&path, &file.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), rows = file.rows, "Export written");
            println!("{}", path.display());
        }

        Command::Stats => {
            let stats = PoolInventoryStore::new(pool).stats().await?;
            print_json(&stats)?;
        }

        Command::Batches => {
            let batches = PoolInventoryStore::new(pool).list_batches().await?;
            print_json(&batches)?;
        }

        Command::Disable { code } => {
            if !PoolInventoryStore::new(pool).disable(&code).await? {
                anyhow::bail!("{code} is not an available barcode");
            }
            println!("{code}");
        }

        Command::PurgeUsed { before } => {
            let deleted = PoolInventoryStore::new(pool).purge_used(before).await?;
            println!("{deleted}");
        }

        Command::Settings(args) => {
            let settings = match args.into_update() {
                Some(update) => {
                    let updated = BarcodeSettingsRepo::update(&pool, &update)
                        .await
                        .context("Failed to update settings")?;
                    tracing::info!(mode = %updated.mode, "Allocation settings updated");
                    updated
                }
                None => BarcodeSettingsRepo::get(&pool)
                    .await
                    .context("Failed to load settings")?,
            };
            print_json(&SettingsView::from(settings))?;
        }
    }

    Ok(())
}

/// Settings as printed by `settings`: the stored row plus the legacy codes
/// still issuable.
#[derive(Debug, Serialize)]
struct SettingsView {
    #[serde(flatten)]
    settings: BarcodeSettings,
    remaining: i64,
}

impl From<BarcodeSettings> for SettingsView {
    fn from(settings: BarcodeSettings) -> Self {
        let remaining = settings.sequence_config().remaining();
        Self {
            settings,
            remaining,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// File name component of `path`, used as the default import source label.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Resolve `--out`: a directory receives the suggested name, anything else
/// is used as the file path.
fn output_path(out: Option<PathBuf>, suggested: &str) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(suggested),
        Some(path) => path,
        None => PathBuf::from(suggested),
    }
}
