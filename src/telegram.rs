//! Telegram Bot API delivery.

use crate::error::DeliveryError;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Public Bot API server.
pub const API_BASE: &str = "https://api.telegram.org";

/// Markup dialect the channel should apply to message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

/// Posts text to a chat or channel.
pub trait Deliver {
    async fn send(&self, chat_id: &str, text: &str, parse_mode: ParseMode) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: ParseMode,
}

/// The subset of the Bot API response envelope we look at.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through a Telegram bot.
#[derive(Clone)]
pub struct TelegramSender {
    client: Client,
    api_base: String,
    token: String,
}

impl fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the token grants full control of the bot
        f.debug_struct("TelegramSender")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramSender {
    /// Build a sender for one bot.
    ///
    /// # Arguments
    ///
    /// * `token` - Bot token issued by BotFather
    /// * `api_base` - Bot API server, normally [`API_BASE`]
    /// * `timeout` - Timeout for every request
    pub fn new(
        token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

impl Deliver for TelegramSender {
    #[instrument(level = "debug", skip_all, fields(%chat_id, chars = text.chars().count()))]
    async fn send(&self, chat_id: &str, text: &str, parse_mode: ParseMode) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode,
        };

        let response = self.client.post(self.endpoint()).json(&payload).send().await?;
        let status = response.status();
        let body: ApiResponse = response.json().await?;

        if body.ok {
            debug!("Message delivered");
            Ok(())
        } else {
            let reason = body
                .description
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!(
                status = status.as_u16(),
                %reason,
                preview = %truncate_for_log(text, 80),
                "Telegram rejected message"
            );
            Err(DeliveryError::Rejected(reason))
        }
    }
}
