mod file_config;

pub use file_config::{FileConfig, MediaStoreConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_size_mb: usize,
    pub media_store_url: Option<String>,
    pub media_store_api_key: Option<String>,
    pub media_store_timeout_sec: u64,
    pub upload_folder: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_size_mb: usize,

    pub media_store: MediaStoreSettings,
}

#[derive(Debug, Clone)]
pub struct MediaStoreSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_sec: u64,
    pub folder: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let max_upload_size_mb = file.max_upload_size_mb.unwrap_or(cli.max_upload_size_mb);

        let ms_file = file.media_store.unwrap_or_default();
        let url = match ms_file.url.or_else(|| cli.media_store_url.clone()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                bail!("media store url must be specified via --media-store-url or in config file")
            }
        };
        let media_store = MediaStoreSettings {
            url,
            api_key: ms_file.api_key.or_else(|| cli.media_store_api_key.clone()),
            timeout_sec: ms_file.timeout_sec.unwrap_or(cli.media_store_timeout_sec),
            folder: ms_file.folder.unwrap_or_else(|| cli.upload_folder.clone()),
        };

        Ok(Self {
            db_dir,
            port,
            logging_level,
            max_upload_size_mb,
            media_store,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
