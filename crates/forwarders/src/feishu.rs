//! Feishu / Lark custom bot forwarder.
//!
//! Feishu answers HTTP 200 even for rejected messages, so the JSON `code`
//! field of the reply is checked as well.

use async_trait::async_trait;
use smsfwd_config::ForwarderSpec;
use smsfwd_core::error::ForwardError;
use smsfwd_core::forwarder::{ForwardContext, Forwarder};

use crate::http;

const NAME: &str = "feishu";

pub struct FeishuForwarder {
    webhook_url: String,
    client: reqwest::Client,
}

impl FeishuForwarder {
    pub fn from_spec(spec: &ForwarderSpec, client: reqwest::Client) -> Result<Self, ForwardError> {
        let webhook_url = spec
            .get_str("webhook_url")
            .ok_or_else(|| ForwardError::invalid_config(NAME, "missing webhook_url"))?;
        http::parse_endpoint(NAME, webhook_url)?;
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Forwarder for FeishuForwarder {
    fn name(&self) -> &str {
        NAME
    }

    async fn forward(&self, ctx: &ForwardContext) -> Result<(), ForwardError> {
        let payload = serde_json::json!({
            "msg_type": "text",
            "content": { "text": ctx.text_body() },
        });
        let request = self.client.post(&self.webhook_url).json(&payload);
        let body = http::send(NAME, request).await?;

        let code = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("code").and_then(|c| c.as_i64()))
            .unwrap_or(0);
        if code != 0 {
            return Err(ForwardError::delivery(
                NAME,
                format!("bot rejected message (code {code}): {}", body.trim()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_server, client, ctx};
    use axum::http::StatusCode;

    fn forwarder(url: String) -> FeishuForwarder {
        let spec = ForwarderSpec::new("feishu", serde_json::json!({ "webhook_url": url }));
        FeishuForwarder::from_spec(&spec, client()).unwrap()
    }

    #[tokio::test]
    async fn posts_text_message() {
        let server = capture_server(StatusCode::OK, r#"{"code":0,"msg":"success"}"#).await;
        forwarder(format!("{}/open-apis/bot/v2/hook/x", server.base_url))
            .forward(&ctx())
            .await
            .unwrap();

        let body: serde_json::Value =
            serde_json::from_str(&server.requests()[0].body).unwrap();
        assert_eq!(body["msg_type"], "text");
        assert!(body["content"]["text"].as_str().unwrap().starts_with("+8613800000000\n"));
    }

    #[tokio::test]
    async fn nonzero_code_is_failure() {
        let server = capture_server(StatusCode::OK, r#"{"code":19001,"msg":"param invalid"}"#).await;
        let err = forwarder(server.base_url.clone())
            .forward(&ctx())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("19001"));
    }

    #[test]
    fn missing_url_is_invalid() {
        let spec = ForwarderSpec::new("feishu", serde_json::json!({}));
        assert!(FeishuForwarder::from_spec(&spec, client()).is_err());
    }
}
