// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound notification delivery

mod log;
mod webhook;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use log::LogNotifyAdapter;
pub use webhook::WebhookNotifyAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Delivers one status line to the channel of one device
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    async fn send(&self, channel: &str, message: &str) -> Result<(), NotifyError>;
}
