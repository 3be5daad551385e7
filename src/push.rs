//! Best-effort device push delivery. Behind a trait so tests can capture
//! attempted sends without a live FCM project.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

#[async_trait]
pub trait PushSender: Send + Sync + 'static {
    async fn send(&self, device_token: &str, title: &str, body: &str, data: &Value) -> Result<()>;
}

/// FCM legacy HTTP sender. The client timeout bounds every delivery
/// attempt; callers never wait longer than that.
pub struct FcmPush {
    client: Client,
    endpoint: String,
    server_key: String,
}

impl FcmPush {
    pub fn new(endpoint: impl Into<String>, server_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build push HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        })
    }
}

#[async_trait]
impl PushSender for FcmPush {
    async fn send(&self, device_token: &str, title: &str, body: &str, data: &Value) -> Result<()> {
        let payload = json!({
            "to": device_token,
            "notification": { "title": title, "body": body },
            "data": data,
        });

        self.client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await
            .context("push request failed")?
            .error_for_status()
            .context("push endpoint rejected the message")?;

        Ok(())
    }
}

/// Used when no FCM credentials are configured; durable notification rows
/// are still written, only live delivery is skipped.
pub struct DisabledPush;

#[async_trait]
impl PushSender for DisabledPush {
    async fn send(&self, _device_token: &str, title: &str, _body: &str, _data: &Value) -> Result<()> {
        tracing::debug!(title, "push delivery disabled, skipping send");
        Ok(())
    }
}
