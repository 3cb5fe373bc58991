use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{Config, LoadSource};
use crate::matcher::LinkMatcher;

/// An immutable, point-in-time view of the configuration together with the
/// link rules compiled from it.
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub config: Config,
    pub matcher: LinkMatcher,
}

impl Snapshot {
    fn new(version: u64, config: Config) -> Self {
        let matcher = LinkMatcher::from_config(&config.regex);
        Self {
            version,
            config,
            matcher,
        }
    }
}

/// Holds the current [`Snapshot`] and replaces it wholesale on reload.
/// Readers always get a complete snapshot, never a mix of two versions.
pub struct ConfigStore {
    path: PathBuf,
    current: watch::Sender<Arc<Snapshot>>,
}

impl ConfigStore {
    /// Publish an already loaded `config` as version 1. Directory creation
    /// and pattern compilation happen here, so install logging first to see
    /// their warnings.
    pub fn from_loaded(path: &Path, config: Config) -> Self {
        config.ensure_directories();

        let (current, _) = watch::channel(Arc::new(Snapshot::new(1, config)));
        Self {
            path: path.to_path_buf(),
            current,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Re-read the file and publish a new snapshot if anything changed.
    /// Returns the new snapshot, or `None` when the configuration is
    /// identical to the one already published.
    pub fn reload(&self) -> Option<Arc<Snapshot>> {
        let (config, source) = Config::load(&self.path);
        if let LoadSource::Malformed(reason) = &source {
            warn!(
                "Config file {} is malformed, using defaults: {}",
                self.path.display(),
                reason
            );
        }
        config.ensure_directories();

        let previous = self.current();
        if previous.config == config {
            return None;
        }

        let next = Arc::new(Snapshot::new(previous.version + 1, config));
        self.current.send_replace(next.clone());
        info!(
            "Configuration reloaded from {} (version {})",
            self.path.display(),
            next.version
        );
        Some(next)
    }
}
