use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod media;
mod server;
mod utils;

use config::Config;
use media::{MediaService, YtDlpBackend};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on, overrides server.bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory downloads are written under, overrides storage.root
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Cookies file handed to yt-dlp, overrides backend.cookie_file
    #[arg(long)]
    cookie_file: Option<PathBuf>,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/mediagrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/mediagrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match get_config_path(args) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(root) = &args.storage_root {
        config.storage.root = root.clone();
    }
    if let Some(cookie_file) = &args.cookie_file {
        config.backend.cookie_file = Some(cookie_file.clone());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Starting mediagrab...");
    match get_config_path(&args) {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let storage_root = std::path::absolute(&config.storage.root)
        .context("Failed to resolve storage root")?;
    tokio::fs::create_dir_all(&storage_root)
        .await
        .with_context(|| format!("Failed to create storage root {}", storage_root.display()))?;

    let backend = Arc::new(YtDlpBackend::new(&config.backend));
    let service = Arc::new(MediaService::new(backend, storage_root));

    if let Err(e) = service.test_setup().await {
        warn!("Extraction backend test failed: {}", e);
    }

    server::run(service, &config.server.bind).await
}
