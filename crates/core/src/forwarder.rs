//! Forwarder trait: the abstraction over delivery targets.
//!
//! A Forwarder takes one complete message and hands it to an external system
//! (HTTP callback, chat bot, local script). It is invoked once per message per
//! configured target, possibly concurrently with other forwarders.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ForwardError;
use crate::message::LogicalMessage;

/// Environment variable carrying the sender to script forwarders.
pub const ENV_SENDER: &str = "SMS_SENDER";
/// Environment variable carrying the formatted receive time.
pub const ENV_TIME: &str = "SMS_TIME";
/// Environment variable carrying the message text.
pub const ENV_CONTENT: &str = "SMS_CONTENT";

/// Per-invocation delivery context.
///
/// Each forwarder call gets its own copy; nothing about the message being
/// delivered is ever stored in process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardContext {
    /// Sender address
    pub sender: String,

    /// Receive time formatted as `%Y-%m-%d %H:%M:%S` (local time)
    pub time: String,

    /// Full message text
    pub content: String,

    /// Raw receive time, epoch seconds
    pub timestamp: i64,
}

impl ForwardContext {
    pub fn from_message(message: &LogicalMessage) -> Self {
        Self {
            sender: message.sender.clone(),
            time: message.formatted_time(),
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }

    /// Environment passed to script forwarders.
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            (ENV_SENDER, self.sender.as_str()),
            (ENV_TIME, self.time.as_str()),
            (ENV_CONTENT, self.content.as_str()),
        ]
    }

    /// Replace `{SENDER}`, `{TIME}` and `{CONTENT}` in `template`.
    pub fn render(&self, template: &str) -> String {
        self.render_with(template, |v| v.to_string())
    }

    /// Like [`render`](Self::render), passing each value through `escape` first.
    ///
    /// The template is scanned once, so placeholders inside substituted
    /// values are left as they are.
    pub fn render_with(&self, template: &str, escape: impl Fn(&str) -> String) -> String {
        let placeholders = [
            ("{SENDER}", self.sender.as_str()),
            ("{TIME}", self.time.as_str()),
            ("{CONTENT}", self.content.as_str()),
        ];

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            match placeholders.iter().find(|&&(name, _)| tail.starts_with(name)) {
                Some(&(name, value)) => {
                    out.push_str(&escape(value));
                    rest = &tail[name.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Plain-text body used by chat-style forwarders.
    pub fn text_body(&self) -> String {
        format!("{}\n{}\n\n{}", self.sender, self.time, self.content)
    }
}

/// The core Forwarder trait.
///
/// Implementations handle target-specific formatting, transport and
/// authentication. A returned `Ok(())` means the target accepted the message.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forwarder type tag (e.g., "webhook", "tgbot", "custom").
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError>;

    /// Whether this forwarder can plausibly deliver right now.
    async fn health_check(&self) -> Result<bool, ForwardError> {
        Ok(true)
    }
}
