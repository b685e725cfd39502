//! Telegram delivery for trade notifications. Strictly best-effort: a failed
//! send is logged and forgotten, the scan loop never sees it.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::warn;

use common::Notifier;

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        if let Err(err) = self.bot.send_message(self.chat_id, text).await {
            warn!(%err, "telegram notification failed");
        }
    }
}
