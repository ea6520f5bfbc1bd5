//! Client for hosted edge functions.
//!
//! Functions are invoked by name with `POST {base_url}/functions/v1/{name}`
//! and answer with a `{data, error}` envelope. The client never returns an
//! `Err`: transport failures, non-2xx statuses and unreadable bodies are all
//! folded into [`EdgeResponse::error`].

use std::time::Duration;

use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{info, warn};

use crate::core::config::{AppConfig, EdgeConfig};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Allora-Signature";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl EdgeResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(err) => Err(anyhow!(err)),
            None => Ok(self.data.unwrap_or(Value::Null)),
        }
    }
}

#[derive(Clone)]
pub struct EdgeClient {
    client: Client,
    base_url: String,
    api_key: String,
    signing_secret: String,
}

impl EdgeClient {
    pub fn new(cfg: &EdgeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim().trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            signing_secret: cfg.signing_secret.clone(),
        })
    }

    /// `None` when no edge base URL is configured.
    pub fn from_config(cfg: &AppConfig) -> Result<Option<Self>> {
        if !cfg.edge_enabled() {
            return Ok(None);
        }
        Ok(Some(Self::new(&cfg.edge)?))
    }

    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    pub async fn invoke(&self, name: &str, body: &Value) -> EdgeResponse {
        let payload = match serde_json::to_vec(body) {
            Ok(p) => p,
            Err(e) => return EdgeResponse::err(format!("Invalid request body: {}", e)),
        };

        let mut request = self
            .client
            .post(self.function_url(name))
            .header("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            request = request
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("apikey", &self.api_key);
        }
        if !self.signing_secret.is_empty() {
            request = request.header(SIGNATURE_HEADER, sign_body(&self.signing_secret, &payload));
        }

        info!("Invoking edge function [{}]", name);
        let res = match request.body(payload).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Edge function [{}] unreachable: {}", name, e);
                return EdgeResponse::err(format!("Edge function {} unreachable: {}", name, e));
            }
        };

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<Value>(&text).ok();

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(|v| v.get("error"))
                .and_then(error_message)
                .unwrap_or_else(|| format!("Edge function {} returned {}: {}", name, status, text));
            warn!("Edge function [{}] failed: {}", name, message);
            return EdgeResponse::err(message);
        }

        match parsed {
            Some(value) => envelope_from_value(value),
            None if text.trim().is_empty() => EdgeResponse::ok(Value::Null),
            None => EdgeResponse::err(format!("Edge function {} returned invalid JSON", name)),
        }
    }
}

/// `sha256=<hex>` HMAC over the raw request body.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

/// Bodies carrying `data` or `error` are treated as an envelope; anything else
/// is the function's data.
fn envelope_from_value(value: Value) -> EdgeResponse {
    let is_envelope = value
        .as_object()
        .is_some_and(|m| m.contains_key("data") || m.contains_key("error"));
    if !is_envelope {
        return EdgeResponse::ok(value);
    }
    let error = value.get("error").and_then(error_message);
    let data = value.get("data").cloned().filter(|d| !d.is_null());
    EdgeResponse { data, error }
}
