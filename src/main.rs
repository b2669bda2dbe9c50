use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use feed_images::domain::ports::ResponseCachePort;
use feed_images::infrastructure::{
    AppConfig, CliArgs, Command, DiskResponseCache, ImageLoader, StorageManager,
};
use feed_images::presentation::DisplaySurface;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn open_response_cache(config: &AppConfig) -> Result<Arc<DiskResponseCache>> {
    let cache = DiskResponseCache::new(config.effective_cache_dir(), config.cache.disk_max_bytes)
        .await?;
    Ok(Arc::new(cache))
}

async fn fetch(config: &AppConfig, urls: Vec<String>) -> Result<()> {
    let (tx, _rx) = mpsc::unbounded_channel();
    let loader = ImageLoader::new(config.loader_config(), &tx, open_response_cache(config).await?)?;

    let results = join_all(urls.iter().map(|url| loader.fetch(url))).await;
    for (url, result) in urls.iter().zip(results) {
        match result {
            Some(loaded) => println!(
                "{url}\t{}\t{}x{}",
                loaded.source,
                loaded.image.width(),
                loaded.image.height()
            ),
            None => println!("{url}\tunavailable"),
        }
    }

    info!(stats = %loader.memory_cache_stats(), "Fetch complete");
    Ok(())
}

async fn slot(config: &AppConfig, urls: Vec<String>) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let loader = ImageLoader::new(config.loader_config(), &tx, open_response_cache(config).await?)?;
    drop(tx);

    let mut surface = DisplaySurface::new(loader, rx);
    let id = surface.add_slot();
    for url in &urls {
        surface.load(id, Some(url));
    }

    let status = surface.settle(id).await.unwrap_or_default();
    if let Some(shown) = surface.slot(id) {
        let shown_as = if status.is_unavailable() {
            "unavailable".to_string()
        } else {
            shown
                .image()
                .map(|img| format!("{}x{}", img.width(), img.height()))
                .unwrap_or_default()
        };
        println!("{id}\t{}\t{status:?}\t{shown_as}", shown.url().unwrap_or("-"));
    }
    Ok(())
}

async fn stats(config: &AppConfig) -> Result<()> {
    let cache = open_response_cache(config).await?;
    println!("directory\t{}", cache.cache_dir().display());
    println!("entries\t{}", cache.len());
    println!("bytes\t{}", cache.current_size());
    Ok(())
}

async fn clear(config: &AppConfig) -> Result<()> {
    let cache = open_response_cache(config).await?;
    let entries = cache.len();
    cache.clear().await?;
    println!("removed {entries} cached responses");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = feed_images::VERSION, "Starting {}", feed_images::NAME);

    match args.command {
        Command::Fetch { urls } => fetch(&config, urls).await,
        Command::Slot { urls } => slot(&config, urls).await,
        Command::Stats => stats(&config).await,
        Command::Clear => clear(&config).await,
    }
}
