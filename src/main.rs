mod config;
mod delivery;
mod logging;
mod matcher;
mod platform;
mod relay;
mod retrieval;
mod scheduler;
mod store;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use teloxide::Bot;
use tracing::{info, warn};

use crate::config::{Config, LoadSource};
use crate::relay::Relay;
use crate::retrieval::YtDlp;
use crate::scheduler::Scheduler;
use crate::store::ConfigStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let (config, source) = Config::load(&config_path);

    // Initialize logging
    let (log_handle, _log_guards) =
        logging::init(&config.paths.logs_dir, config.general.level_filter())?;

    let store = Arc::new(ConfigStore::from_loaded(&config_path, config));
    let snapshot = store.current();
    let config = &snapshot.config;

    let path = store.path().display();
    match source {
        LoadSource::File => info!("Loaded configuration from {}", path),
        LoadSource::Missing => warn!("Config file {} not found, using defaults", path),
        LoadSource::Malformed(reason) => {
            warn!("Config file {} is malformed, using defaults: {}", path, reason)
        }
    }
    info!("  Downloads: {}", config.paths.downloads_dir.display());
    info!("  Logs: {}", config.paths.logs_dir.display());
    info!("  Delete after send: {}", config.settings.delete_old_files);

    if config.general.token.trim().is_empty() {
        anyhow::bail!("No bot token configured: set [General] token in {}", path);
    }

    // Background config reload
    let mut scheduler = Scheduler::new().await?;
    scheduler::tasks::register_config_watcher(
        &scheduler,
        store.clone(),
        log_handle,
        config.reload_interval(),
    )
    .await?;
    scheduler.start().await?;

    let retriever = Arc::new(YtDlp::new(&config.paths.ytdlp_path));
    let relay = Arc::new(Relay::new(store.clone(), retriever));
    let bot = Bot::new(&config.general.token);

    info!("Bot started successfully");
    platform::telegram::run(bot, relay).await?;

    scheduler.shutdown().await?;
    Ok(())
}
