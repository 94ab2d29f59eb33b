//! Generic HTTP callback forwarder.
//!
//! `GET` requests carry the message in the URL (placeholders are
//! URL-encoded); `POST` requests carry it in a body rendered from the
//! `format` template, or a default JSON object when no template is set.
//! Placeholders: `{SENDER}`, `{TIME}`, `{CONTENT}`.

use async_trait::async_trait;
use smsfwd_config::ForwarderSpec;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};
use tracing::debug;

use crate::http;

const NAME: &str = "webhook";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// Webhook forwarder configuration.
#[derive(Clone)]
pub struct WebhookConfig {
    /// Target URL, may contain placeholders
    pub url: String,
    pub method: RequestMethod,
    /// POST body template; `None` sends the default JSON object
    pub format: Option<String>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("format", &self.format)
            .field("headers", &format_args!("[{} REDACTED]", self.headers.len()))
            .finish()
    }
}

impl WebhookConfig {
    pub fn from_spec(spec: &ForwarderSpec) -> Result<Self, ForwardError> {
        let url = spec
            .get_str("webhook_url")
            .ok_or_else(|| ForwardError::invalid_config(NAME, "missing webhook_url"))?;
        http::parse_endpoint(NAME, url)?;

        let method = match spec.get_str("request_method") {
            None => RequestMethod::Get,
            Some(m) if m.eq_ignore_ascii_case("get") => RequestMethod::Get,
            Some(m) if m.eq_ignore_ascii_case("post") => RequestMethod::Post,
            Some(other) => {
                return Err(ForwardError::invalid_config(
                    NAME,
                    format!("unsupported request_method {other:?}"),
                ));
            }
        };

        let headers = match spec.config.get("headers") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::String(s)) => parse_header_lines(s)?,
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .map(|(k, v)| {
                    let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), value)
                })
                .collect(),
            Some(_) => {
                return Err(ForwardError::invalid_config(
                    NAME,
                    "headers must be a string or an object",
                ));
            }
        };

        Ok(Self {
            url: url.to_string(),
            method,
            format: spec.get_str("format").map(str::to_string),
            headers,
        })
    }
}

/// Parse `Name: value` lines; blank lines are ignored.
fn parse_header_lines(raw: &str) -> Result<Vec<(String, String)>, ForwardError> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (name, value) = line.split_once(':').ok_or_else(|| {
                ForwardError::invalid_config(NAME, format!("header line without ':': {line:?}"))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ForwardError::invalid_config(NAME, "empty header name"));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Escape `value` for use inside a JSON string literal.
fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

fn looks_like_json(template: &str) -> bool {
    let t = template.trim_start();
    t.starts_with('{') || t.starts_with('[')
}

pub struct WebhookForwarder {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookForwarder {
    pub fn new(config: WebhookConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// The request body for a POST and its content type.
    fn post_body(&self, ctx: &ForwardContext) -> (String, &'static str) {
        match &self.config.format {
            Some(template) if looks_like_json(template) => {
                (ctx.render_with(template, json_escape), "application/json")
            }
            Some(template) => (ctx.render(template), "text/plain; charset=utf-8"),
            None => {
                let body = serde_json::json!({
                    "sender": ctx.sender,
                    "time": ctx.time,
                    "content": ctx.content,
                });
                (body.to_string(), "application/json")
            }
        }
    }
}

#[async_trait]
impl Forwarder for WebhookForwarder {
    fn name(&self) -> &str {
        NAME
    }

    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
        let mut request = match self.config.method {
            RequestMethod::Get => {
                let url = ctx.render_with(&self.config.url, url_encode);
                debug!(url = %self.config.url, "Sending webhook GET");
                self.client.get(url)
            }
            RequestMethod::Post => {
                let url = ctx.render_with(&self.config.url, url_encode);
                let (body, content_type) = self.post_body(ctx);
                debug!(url = %self.config.url, body_len = body.len(), "Sending webhook POST");
                self.client
                    .post(url)
                    .header("Content-Type", content_type)
                    .body(body)
            }
        };

        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        http::send(NAME, request).await.map(|_| ())
    }
}
