//! Outbound chat messages through the Telegram Bot API.
use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use wally_engine::traits::{NotificationAction, Notifier, ProviderError};

use crate::config::TelegramConfig;

#[derive(Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Arc<Client>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboard {
    inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Debug, Serialize)]
struct InlineButton {
    text: String,
    callback_data: String,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().build().map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.base_url.trim_end_matches('/'), self.config.bot_token.reveal())
    }
}

fn keyboard(actions: &[NotificationAction]) -> Option<InlineKeyboard> {
    if actions.is_empty() {
        return None;
    }
    let row = actions
        .iter()
        .map(|a| InlineButton { text: a.label.clone(), callback_data: a.action.clone() })
        .collect::<Vec<_>>();
    Some(InlineKeyboard { inline_keyboard: vec![row] })
}

impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str, actions: &[NotificationAction]) -> Result<(), ProviderError> {
        if self.config.bot_token.reveal().is_empty() {
            info!("⏰️ No bot token. Message for {chat_id} not delivered: {text}");
            return Err(ProviderError::NotConfigured("the Telegram bot token is empty".into()));
        }
        let message = SendMessage { chat_id, text, reply_markup: keyboard(actions) };
        let response = self
            .client
            .post(self.url("sendMessage"))
            .json(&message)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.without_url().to_string()))?;
        let status = response.status();
        let body = response.json::<BotResponse>().await.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if body.ok {
            trace!("⏰️ Message delivered to {chat_id}");
            Ok(())
        } else {
            let reason = body.description.unwrap_or_else(|| format!("HTTP {status}"));
            Err(ProviderError::Rejected(reason))
        }
    }
}
