//! Service configuration loaded from environment variables.

use tracecode_core::importer::IMPORT_CHUNK_SIZE;
use tracecode_db::DEFAULT_MAX_CONNECTIONS;

/// Default file name prefix for exports.
pub const DEFAULT_EXPORT_FILE_PREFIX: &str = "barcodes";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Connection and tuning settings for the inventory services.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub database_url: String,
    /// Connection pool ceiling (default: `20`).
    pub max_connections: u32,
    /// Codes per import chunk (default: `5000`).
    pub import_chunk_size: usize,
    /// Export file name prefix (default: `barcodes`).
    pub export_file_prefix: String,
}

impl InventoryConfig {
    /// Defaults for everything but the database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            import_chunk_size: IMPORT_CHUNK_SIZE,
            export_file_prefix: DEFAULT_EXPORT_FILE_PREFIX.to_string(),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default    |
    /// |----------------------|------------|
    /// | `DATABASE_URL`       | (required) |
    /// | `DB_MAX_CONNECTIONS` | `20`       |
    /// | `IMPORT_CHUNK_SIZE`  | `5000`     |
    /// | `EXPORT_FILE_PREFIX` | `barcodes` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self::new(database_url);

        if let Some(raw) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = parse_positive("DB_MAX_CONNECTIONS", &raw)?;
        }
        if let Some(raw) = lookup("IMPORT_CHUNK_SIZE") {
            config.import_chunk_size = parse_positive("IMPORT_CHUNK_SIZE", &raw)?;
        }
        if let Some(prefix) = lookup("EXPORT_FILE_PREFIX") {
            let prefix = prefix.trim();
            if !prefix.is_empty() {
                config.export_file_prefix = prefix.to_string();
            }
        }

        Ok(config)
    }
}

fn parse_positive<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value: T = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
