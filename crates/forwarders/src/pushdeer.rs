//! PushDeer forwarder.

use async_trait::async_trait;
use smsfwd_config::ForwarderSpec;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};

use crate::http;

const NAME: &str = "pushdeer";
pub const DEFAULT_SERVER: &str = "https://api2.pushdeer.com";

#[derive(Clone)]
pub struct PushDeerConfig {
    pub pushkey: String,
    /// API root; self-hosted PushDeer servers use their own
    pub server: String,
}

impl std::fmt::Debug for PushDeerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushDeerConfig")
            .field("pushkey", &"[REDACTED]")
            .field("server", &self.server)
            .finish()
    }
}

impl PushDeerConfig {
    pub fn from_spec(spec: &ForwarderSpec) -> Result<Self, ForwardError> {
        let pushkey = spec
            .get_str("pushkey")
            .ok_or_else(|| ForwardError::invalid_config(NAME, "missing pushkey"))?;
        Ok(Self {
            pushkey: pushkey.to_string(),
            server: http::base_url(NAME, spec.get_str("server").unwrap_or(DEFAULT_SERVER))?,
        })
    }
}

pub struct PushDeerForwarder {
    config: PushDeerConfig,
    client: reqwest::Client,
}

impl PushDeerForwarder {
    pub fn new(config: PushDeerConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Forwarder for PushDeerForwarder {
    fn name(&self) -> &str {
        NAME
    }

    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
        let url = format!("{}/message/push", self.config.server);
        let form = [
            ("pushkey", self.config.pushkey.clone()),
            ("text", format!("SMS from {}", ctx.sender)),
            ("desp", ctx.text_body()),
            ("type", "markdown".to_string()),
        ];
        let request = self.client.post(url).form(&form[..]);
        http::send(NAME, request).await.map(|_| ())
    }
}
