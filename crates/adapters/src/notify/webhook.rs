// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook notify adapter: POSTs `{"device": .., "text": ..}` as JSON.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Clone)]
pub struct WebhookNotifyAdapter {
    url: String,
    agent: ureq::Agent,
}

impl WebhookNotifyAdapter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            url: url.into(),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn post(agent: &ureq::Agent, url: &str, body: &str) -> Result<(), NotifyError> {
    agent
        .post(url)
        .header("Content-Type", "application/json")
        .send(body.as_bytes())
        .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl NotifyAdapter for WebhookNotifyAdapter {
    async fn send(&self, channel: &str, message: &str) -> Result<(), NotifyError> {
        let body = serde_json::json!({ "device": channel, "text": message }).to_string();
        let agent = self.agent.clone();
        let url = self.url.clone();
        // ureq blocks
        tokio::task::spawn_blocking(move || post(&agent, &url, &body))
            .await
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
