//! Telegram Bot API forwarder (`tgbot`).

use async_trait::async_trait;
use serde::Serialize;
use smsfwd_config::ForwarderSpec;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};

use crate::http;

const NAME: &str = "tgbot";
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram forwarder configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Target chat, user or channel id.
    pub chat_id: String,
    /// Bot API root, overridable for self-hosted API servers.
    pub api_base: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramConfig {
    pub fn from_spec(spec: &ForwarderSpec) -> Result<Self, ForwardError> {
        let bot_token = spec
            .get_str("bot_token")
            .ok_or_else(|| ForwardError::invalid_config(NAME, "missing bot_token"))?;
        // chat_id is often written as a bare number
        let chat_id = match spec.config.get("chat_id") {
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => spec
                .get_str("chat_id")
                .ok_or_else(|| ForwardError::invalid_config(NAME, "missing chat_id"))?
                .to_string(),
        };
        let api_base = http::base_url(NAME, spec.get_str("api_base").unwrap_or(DEFAULT_API_BASE))?;

        Ok(Self {
            bot_token: bot_token.to_string(),
            chat_id,
            api_base,
        })
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

pub struct TelegramForwarder {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramForwarder {
    pub fn new(config: TelegramConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        )
    }
}

#[async_trait]
impl Forwarder for TelegramForwarder {
    fn name(&self) -> &str {
        NAME
    }

    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
        let payload = SendMessage {
            chat_id: &self.config.chat_id,
            text: ctx.text_body(),
        };
        let request = self.client.post(self.endpoint()).json(&payload);
        http::send(NAME, request).await.map(|_| ())
    }

    async fn health_check(&self) -> Result<bool, ForwardError> {
        Ok(!self.config.bot_token.is_empty())
    }
}
