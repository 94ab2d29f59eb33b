//! ServerChan (Server酱 Turbo) forwarder.

use async_trait::async_trait;
use smsfwd_config::ForwarderSpec;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};

use crate::http;

const NAME: &str = "serverchan";
pub const DEFAULT_SERVER: &str = "https://sctapi.ftqq.com";

#[derive(Clone)]
pub struct ServerChanConfig {
    pub token: String,
    /// Delivery channel selector, e.g. `9|66`
    pub channel: Option<String>,
    /// `1` hides the caller IP on the push page
    pub noip: Option<String>,
    /// Extra recipients, comma separated
    pub openid: Option<String>,
    pub server: String,
}

impl std::fmt::Debug for ServerChanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerChanConfig")
            .field("token", &"[REDACTED]")
            .field("channel", &self.channel)
            .field("noip", &self.noip)
            .field("openid", &self.openid)
            .field("server", &self.server)
            .finish()
    }
}

impl ServerChanConfig {
    pub fn from_spec(spec: &ForwarderSpec) -> Result<Self, ForwardError> {
        let token = spec
            .get_str("token")
            .ok_or_else(|| ForwardError::invalid_config(NAME, "missing token"))?;
        let optional = |key: &str| spec.get_str(key).map(str::to_string);

        Ok(Self {
            token: token.to_string(),
            channel: optional("channel"),
            noip: optional("noip"),
            openid: optional("openid"),
            server: http::base_url(NAME, spec.get_str("server").unwrap_or(DEFAULT_SERVER))?,
        })
    }
}

pub struct ServerChanForwarder {
    config: ServerChanConfig,
    client: reqwest::Client,
}

impl ServerChanForwarder {
    pub fn new(config: ServerChanConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn form(&self, ctx: &ForwardContext) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("title", format!("SMS from {}", ctx.sender)),
            ("desp", ctx.text_body()),
        ];
        let optional = [
            ("channel", &self.config.channel),
            ("noip", &self.config.noip),
            ("openid", &self.config.openid),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                form.push((key, v.clone()));
            }
        }
        form
    }
}

#[async_trait]
impl Forwarder for ServerChanForwarder {
    fn name(&self) -> &str {
        NAME
    }

    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
        let url = format!("{}/{}.send", self.config.server, self.config.token);
        let request = self.client.post(url).form(&self.form(ctx));
        http::send(NAME, request).await.map(|_| ())
    }
}
