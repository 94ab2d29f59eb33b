//! Delivery targets for smsfwd.
//!
//! Each forwarder turns one complete SMS into a call on an external system.
//! Forwarders are trait-based and built from the `apis` entries of a modem's
//! configuration.
//!
//! Available forwarders:
//! - **webhook**: generic HTTP callback (GET or POST, templated)
//! - **tgbot**: Telegram Bot API
//! - **serverchan**: ServerChan Turbo
//! - **pushdeer**: PushDeer
//! - **feishu**: Feishu / Lark custom bot
//! - **custom**: a user script, message passed in the environment
//! - anything else: a packaged `sms_forward_<type>.sh` helper

mod http;

pub mod feishu;
pub mod pushdeer;
pub mod registry;
pub mod script;
pub mod serverchan;
pub mod telegram;
pub mod webhook;

#[cfg(test)]
mod test_support;

pub use feishu::FeishuForwarder;
pub use pushdeer::{PushDeerConfig, PushDeerForwarder};
pub use registry::{BUILTIN_TYPES, ForwarderEnv, build, build_all};
pub use script::ScriptForwarder;
pub use serverchan::{ServerChanConfig, ServerChanForwarder};
pub use telegram::{TelegramConfig, TelegramForwarder};
pub use webhook::{RequestMethod, WebhookConfig, WebhookForwarder};
