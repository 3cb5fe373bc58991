use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::delivery::{self, CleanupOutcome, Outbox};
use crate::matcher::{LinkMatch, Platform};
use crate::platform::IncomingMessage;
use crate::retrieval::Retriever;
use crate::store::ConfigStore;

/// Reply sent when anything between matching and delivery goes wrong.
pub const FAILURE_REPLY: &str = "Oops, something gone wrong.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The text carried no supported link.
    Ignored,
    Delivered {
        platform: Platform,
        path: PathBuf,
        /// `None` when `delete_old_files` is off.
        cleanup: Option<CleanupOutcome>,
    },
    /// A step failed and the chat got [`FAILURE_REPLY`].
    Failed,
}

/// Message-to-video pipeline: match, retrieve, send, clean up.
pub struct Relay {
    store: Arc<ConfigStore>,
    retriever: Arc<dyn Retriever>,
}

impl Relay {
    pub fn new(store: Arc<ConfigStore>, retriever: Arc<dyn Retriever>) -> Self {
        Self { store, retriever }
    }

    /// Handle one incoming message. Failures stay inside this call: they
    /// are logged and answered with [`FAILURE_REPLY`].
    pub async fn handle(&self, outbox: &dyn Outbox, msg: &IncomingMessage) -> Outcome {
        let snapshot = self.store.current();
        let (platform, url) = match snapshot.matcher.find(&msg.text) {
            LinkMatch::NoMatch => return Outcome::Ignored,
            LinkMatch::Matched { platform, url } => (platform, url),
        };

        info!("Valid message found in chat {}: '{}'", msg.chat_id, msg.text);

        let downloads_dir = snapshot.config.paths.downloads_dir.clone();
        match self.deliver(outbox, msg, &url, &downloads_dir).await {
            Ok((path, cleanup)) => Outcome::Delivered {
                platform,
                path,
                cleanup,
            },
            Err(e) => {
                error!("Unexpected error: {:#}", e);
                if let Err(e) = outbox
                    .send_text(msg.chat_id, msg.message_id, FAILURE_REPLY)
                    .await
                {
                    error!("Failed to send failure reply to chat {}: {:#}", msg.chat_id, e);
                }
                Outcome::Failed
            }
        }
    }

    async fn deliver(
        &self,
        outbox: &dyn Outbox,
        msg: &IncomingMessage,
        url: &str,
        downloads_dir: &Path,
    ) -> Result<(PathBuf, Option<CleanupOutcome>)> {
        let path = self.retriever.download(url, downloads_dir).await?;

        outbox
            .send_video(msg.chat_id, msg.message_id, &path)
            .await
            .with_context(|| format!("Failed to send {}", path.display()))?;
        info!(
            "Video successfully sent to chat {} in reply to message {}",
            msg.chat_id, msg.message_id
        );

        // The setting may have been reloaded while the download ran.
        let cleanup = if self.store.current().config.settings.delete_old_files {
            Some(delivery::remove_media(&path).await)
        } else {
            None
        };

        Ok((path, cleanup))
    }
}
