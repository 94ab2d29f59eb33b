//! Forwarder registry: turns configured `apis` entries into live forwarders.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use smsfwd_config::{DaemonSettings, ForwarderSpec};
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::Forwarder;
use tracing::{info, warn};

use crate::feishu::FeishuForwarder;
use crate::pushdeer::{PushDeerConfig, PushDeerForwarder};
use crate::script::ScriptForwarder;
use crate::serverchan::{ServerChanConfig, ServerChanForwarder};
use crate::telegram::{TelegramConfig, TelegramForwarder};
use crate::webhook::{WebhookConfig, WebhookForwarder};

/// Type tags with a built-in implementation. Anything else is delegated to
/// a helper script.
pub const BUILTIN_TYPES: [&str; 7] = [
    "webhook",
    "tgbot",
    "serverchan",
    "pushdeer",
    "feishu",
    "custom",
    "custom_script",
];

/// Resources shared by every forwarder of the process.
#[derive(Debug, Clone)]
pub struct ForwarderEnv {
    /// One HTTP client (and connection pool) for all network forwarders
    pub client: reqwest::Client,
    /// Where `sms_forward_<type>.sh` helpers live
    pub script_dir: PathBuf,
}

impl ForwarderEnv {
    pub fn new(script_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("smsfwd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForwardError::invalid_config("http", e.to_string()))?;
        Ok(Self {
            client,
            script_dir: script_dir.into(),
        })
    }

    pub fn from_settings(settings: &DaemonSettings) -> Result<Self, ForwardError> {
        Self::new(
            &settings.script_dir,
            Duration::from_secs(settings.forward_timeout_secs),
        )
    }
}

/// Build one forwarder from its config entry.
pub fn build(spec: &ForwarderSpec, env: &ForwarderEnv) -> Result<Arc<dyn Forwarder>, ForwardError> {
    let client = || env.client.clone();
    let forwarder: Arc<dyn Forwarder> = match spec.kind.trim().to_ascii_lowercase().as_str() {
        "webhook" => Arc::new(WebhookForwarder::new(
            WebhookConfig::from_spec(spec)?,
            client(),
        )),
        "tgbot" => Arc::new(TelegramForwarder::new(
            TelegramConfig::from_spec(spec)?,
            client(),
        )),
        "serverchan" => Arc::new(ServerChanForwarder::new(
            ServerChanConfig::from_spec(spec)?,
            client(),
        )),
        "pushdeer" => Arc::new(PushDeerForwarder::new(
            PushDeerConfig::from_spec(spec)?,
            client(),
        )),
        "feishu" => Arc::new(FeishuForwarder::from_spec(spec, client())?),
        "custom" | "custom_script" => Arc::new(ScriptForwarder::custom(spec)?),
        _ => Arc::new(ScriptForwarder::helper(spec, &env.script_dir)?),
    };
    Ok(forwarder)
}

/// Build every forwarder of one modem, in configuration order.
///
/// Entries that fail to build are logged and skipped; the modem keeps the
/// forwarders that did build.
pub fn build_all(port: &str, specs: &[ForwarderSpec], env: &ForwarderEnv) -> Vec<Arc<dyn Forwarder>> {
    specs
        .iter()
        .filter_map(|spec| match build(spec, env) {
            Ok(forwarder) => {
                info!(modem = %port, forwarder = %forwarder.name(), "Registered forwarder");
                Some(forwarder)
            }
            Err(e) => {
                warn!(modem = %port, api_type = %spec.kind, error = %e, "Skipping forwarder");
                None
            }
        })
        .collect()
}
