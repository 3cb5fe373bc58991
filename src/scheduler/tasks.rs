use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::logging::LogHandle;
use crate::scheduler::Scheduler;
use crate::store::ConfigStore;

/// Re-read the configuration file every `interval`. A changed `log_level`
/// is applied to the running subscriber.
pub async fn register_config_watcher(
    scheduler: &Scheduler,
    store: Arc<ConfigStore>,
    log_handle: LogHandle,
    interval: Duration,
) -> anyhow::Result<()> {
    scheduler
        .every(interval, "config-reload", move || {
            let store = store.clone();
            let log_handle = log_handle.clone();
            async move { reload_config(&store, &log_handle) }
        })
        .await
}

fn reload_config(store: &ConfigStore, log_handle: &LogHandle) {
    let previous = store.current();
    let Some(next) = store.reload() else {
        return;
    };
    if next.config.general.log_level != previous.config.general.log_level {
        if let Err(e) = log_handle.set_level(next.config.general.level_filter()) {
            warn!("{:#}", e);
        }
    }
}
