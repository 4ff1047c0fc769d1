use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog;
use catalog::CatalogService;

mod catalog_store;
use catalog_store::SqliteCatalogStore;

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod object_repository;
use object_repository::MediaStoreClient;

mod server;
use server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite catalog database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Values set there override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Maximum accepted upload size in megabytes.
    #[clap(long, default_value_t = 100)]
    pub max_upload_size_mb: usize,

    /// Base URL of the remote media store.
    #[clap(long)]
    pub media_store_url: Option<String>,

    /// API key for the remote media store, if it requires one.
    #[clap(long)]
    pub media_store_api_key: Option<String>,

    /// Timeout in seconds for media store requests.
    #[clap(long, default_value_t = 120)]
    pub media_store_timeout_sec: u64,

    /// Remote folder under which uploaded audio is filed.
    #[clap(long, default_value = "catalog_audio")]
    pub upload_folder: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        max_upload_size_mb: cli_args.max_upload_size_mb,
        media_store_url: cli_args.media_store_url,
        media_store_api_key: cli_args.media_store_api_key,
        media_store_timeout_sec: cli_args.media_store_timeout_sec,
        upload_folder: cli_args.upload_folder,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let db_path = config.catalog_db_path();
    info!("Opening SQLite catalog database at {:?}...", db_path);
    let store = Arc::new(SqliteCatalogStore::new(&db_path)?);

    info!("Media store configured at {}", config.media_store.url);
    let repository = Arc::new(MediaStoreClient::new(
        config.media_store.url.clone(),
        config.media_store.api_key.clone(),
        config.media_store.timeout_sec,
    )?);

    let catalog = CatalogService::new(store, repository, config.media_store.folder.clone());

    info!("Ready to serve at port {}!", config.port);
    run_server(
        catalog,
        config.logging_level,
        config.port,
        config.max_upload_size_mb,
    )
    .await
}
