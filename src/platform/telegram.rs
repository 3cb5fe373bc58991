use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::payloads::{SendMessageSetters, SendVideoSetters};
use teloxide::prelude::*;
use teloxide::types::{Chat, InputFile, MessageId, ReplyParameters};
use tracing::{debug, info};

use crate::delivery::Outbox;
use crate::platform::IncomingMessage;
use crate::relay::{Outcome, Relay};

/// [`Outbox`] that answers through the Telegram Bot API.
pub struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbox for TelegramOutbox {
    async fn send_video(&self, chat_id: i64, reply_to: i32, path: &Path) -> Result<()> {
        self.bot
            .send_video(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .reply_parameters(ReplyParameters::new(MessageId(reply_to)))
            .supports_streaming(true)
            .await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, reply_to: i32, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(reply_to)))
            .await?;
        Ok(())
    }
}

/// Only group chats are watched; private chats and channels are left alone.
fn is_group(chat: &Chat) -> bool {
    chat.is_group() || chat.is_supergroup()
}

/// Run the Telegram dispatcher until Ctrl-C
pub async fn run(bot: Bot, relay: Arc<Relay>) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message()
        .filter(|msg: Message| is_group(&msg.chat) && msg.text().is_some())
        .endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram platform stopped");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, relay: Arc<Relay>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    let incoming = IncomingMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        text,
    };

    let outbox = TelegramOutbox::new(bot);
    if let Outcome::Delivered {
        platform,
        path,
        cleanup,
    } = relay.handle(&outbox, &incoming).await
    {
        debug!(
            "Relayed {} video {} to chat {} (cleanup: {:?})",
            platform,
            path.display(),
            incoming.chat_id,
            cleanup
        );
    }

    Ok(())
}
