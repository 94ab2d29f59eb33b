//! Shared HTTP plumbing for the network forwarders.

use smsfwd_core::error::ForwardError;
use tracing::warn;

/// Longest slice of an error response body kept in the failure reason.
const MAX_ERROR_BODY: usize = 200;

/// Send `request` and map transport errors and non-2xx statuses to
/// [`ForwardError::DeliveryFailed`]. Returns the response body on success.
pub(crate) async fn send(
    forwarder: &str,
    request: reqwest::RequestBuilder,
) -> Result<String, ForwardError> {
    let response = request.send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!("request timed out: {e}")
        } else {
            format!("network error: {e}")
        };
        ForwardError::delivery(forwarder, reason)
    })?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!(forwarder, status = status.as_u16(), body = %body, "Forwarder endpoint returned error");
        let snippet = smsfwd_core::message::truncate_utf8(&body, MAX_ERROR_BODY);
        return Err(ForwardError::delivery(
            forwarder,
            format!("HTTP {}: {}", status.as_u16(), snippet.trim()),
        ));
    }

    Ok(body)
}

/// Parse and check an endpoint URL from config.
pub(crate) fn parse_endpoint(forwarder: &str, raw: &str) -> Result<url::Url, ForwardError> {
    let url = url::Url::parse(raw)
        .map_err(|e| ForwardError::invalid_config(forwarder, format!("invalid URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ForwardError::invalid_config(
            forwarder,
            format!("unsupported URL scheme {other:?}"),
        )),
    }
}

/// A base URL with any trailing slash removed, ready for path appending.
pub(crate) fn base_url(forwarder: &str, raw: &str) -> Result<String, ForwardError> {
    parse_endpoint(forwarder, raw)?;
    Ok(raw.trim_end_matches('/').to_string())
}
