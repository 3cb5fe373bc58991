use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Outbound side of the chat platform.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Send the file at `path` as a video replying to `reply_to`.
    async fn send_video(&self, chat_id: i64, reply_to: i32, path: &Path) -> Result<()>;

    async fn send_text(&self, chat_id: i64, reply_to: i32, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    Missing,
    Failed,
}

/// Delete a delivered media file. Problems are logged, never returned.
pub async fn remove_media(path: &Path) -> CleanupOutcome {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("File {} successfully deleted", path.display());
            CleanupOutcome::Deleted
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("File {} does not exist", path.display());
            CleanupOutcome::Missing
        }
        Err(e) => {
            error!("Error deleting file {}: {}", path.display(), e);
            CleanupOutcome::Failed
        }
    }
}
