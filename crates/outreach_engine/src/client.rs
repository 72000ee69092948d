use std::time::Duration;

use outreach_logging::{outreach_debug, outreach_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::types::excerpt;
use crate::ClientError;

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub connect_timeout: Duration,
    /// Whole-request budget. Generation and lookups can take minutes.
    pub request_timeout: Duration,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
        }
    }
}

#[async_trait::async_trait]
pub trait WebhookClient: Send + Sync {
    /// POSTs `body` as JSON and returns the parsed response body.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestWebhookClient {
    client: reqwest::Client,
}

impl ReqwestWebhookClient {
    pub fn new(settings: &WebhookSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl WebhookClient for ReqwestWebhookClient {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ClientError> {
        let parsed = reqwest::Url::parse(url).map_err(|err| ClientError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let payload = body.to_string().into_bytes();

        outreach_debug!("POST {} ({} bytes)", url, payload.len());
        let response = self
            .client
            .post(parsed)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            outreach_warn!("POST {} returned {}", url, status);
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body: excerpt(text.trim()),
            });
        }

        parse_json_body(&bytes)
    }
}

/// Parses a response body as JSON whatever its declared content type.
/// An empty body reads as `null`.
/// Bytes that are not valid UTF-8 are malformed, never replaced.
pub fn parse_json_body(bytes: &[u8]) -> Result<Value, ClientError> {
    let trimmed = bytes.trim_ascii();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(trimmed).map_err(|err| {
        let text = String::from_utf8_lossy(trimmed);
        ClientError::MalformedResponse(format!("{err}; body was: {}", excerpt(&text)))
    })
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout(err.to_string());
    }
    ClientError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_json_body;
    use crate::ClientError;
    use serde_json::{json, Value};

    #[test]
    fn empty_body_is_null() {
        assert_eq!(parse_json_body(b"  \n"), Ok(Value::Null));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_json_body(b"\n{\"status\":\"ok\"}\n"), Ok(json!({"status": "ok"})));
    }

    #[test]
    fn html_body_is_malformed() {
        let err = parse_json_body(b"<html>Workflow was started</html>").unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(message) if message.contains("<html>")));
    }

    #[test]
    fn latin1_body_is_malformed_not_replaced() {
        let err = parse_json_body(b"[{\"id\":\"a1\",\"name\":\"Caf\xE9\"}]").unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)), "got {err:?}");
    }

    #[test]
    fn utf8_body_keeps_accents() {
        assert_eq!(
            parse_json_body("[{\"name\":\"Caf\u{e9}\"}]".as_bytes()),
            Ok(json!([{"name": "Caf\u{e9}"}]))
        );
    }
}
