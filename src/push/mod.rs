use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::push::model::{ErrorResponse, SendResponse};

pub mod model;

const FCM_API_BASE: &str = "https://fcm.googleapis.com/";

/// Failure classes the fan-out cares about. Only `Unregistered` changes
/// state; everything else is logged and dropped.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("registration token not registered")]
    Unregistered,
    #[error("push provider error {status}: {body}")]
    Provider { status: StatusCode, body: String },
    #[error("failed to reach push provider: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A data-only push message. No notification banner fields: the receiving
/// app rebuilds the widget from the data map itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub data: BTreeMap<String, String>,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Attempt one delivery. Returns the provider's message name.
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, PushError>;
}

#[derive(Clone)]
pub struct FcmClient {
    http: Client,
    base_url: Url,
    project_id: String,
    token: String,
}

impl fmt::Debug for FcmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FcmClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl FcmClient {
    pub fn new(project_id: String, token: String) -> Self {
        let base_url = Url::parse(FCM_API_BASE).expect("valid default FCM URL");
        Self::with_base_url(project_id, token, base_url)
    }

    pub fn with_base_url(project_id: String, token: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("pairnote/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            project_id,
            token,
        }
    }

    pub fn build_request(&self, device_token: &str, message: &PushMessage) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("v1/projects/{}/messages:send", self.project_id))
            .context("invalid FCM base URL")?;
        let body = build_send_body(device_token, message);
        self.http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&body)
            .build()
            .context("failed to build FCM request")
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, PushError> {
        let request = self
            .build_request(token, message)
            .map_err(|err| PushError::Provider {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: err.to_string(),
            })?;

        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();

        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&body) {
                if parsed.is_unregistered() {
                    return Err(PushError::Unregistered);
                }
            }
            if status == StatusCode::NOT_FOUND {
                return Err(PushError::Unregistered);
            }
            warn!(%status, "push send rejected: {}", body);
            return Err(PushError::Provider { status, body });
        }

        let payload: SendResponse =
            serde_json::from_str(&body).map_err(|err| PushError::Provider {
                status,
                body: format!("invalid send response JSON: {err}"),
            })?;
        Ok(payload.name)
    }
}

/// Wire body for one send: the token, the flat data map, and the delivery
/// policy. Priority is high and the TTL is zero so the provider drops the
/// message instead of queueing it for an unreachable device.
pub fn build_send_body(device_token: &str, message: &PushMessage) -> Value {
    json!({
        "message": {
            "token": device_token,
            "data": &message.data,
            "android": {
                "priority": "HIGH",
                "ttl": "0s",
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("text".to_string(), "miss you".to_string());
        data.insert("sender".to_string(), "— Ana".to_string());
        PushMessage { data }
    }

    #[test]
    fn send_body_is_data_only_with_fresh_or_discard_policy() {
        let body = build_send_body("tok-1", &sample_message());
        assert_eq!(body["message"]["token"], "tok-1");
        assert_eq!(body["message"]["data"]["text"], "miss you");
        assert_eq!(body["message"]["android"]["priority"], "HIGH");
        assert_eq!(body["message"]["android"]["ttl"], "0s");
        assert!(body["message"].get("notification").is_none());
    }

    #[test]
    fn build_request_sets_headers_and_path() {
        let client = FcmClient::new("demo-project".into(), "token".into());
        let request = client.build_request("tok-1", &sample_message()).unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().path(),
            "/v1/projects/demo-project/messages:send"
        );
        let headers = request.headers();
        assert_eq!(
            headers
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "Bearer token"
        );
        assert_eq!(
            headers
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
    }
}
