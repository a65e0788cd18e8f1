// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub channel: String,
    pub message: String,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<NotifyCall>,
    attempts: usize,
    failures_left: usize,
}

/// Fake notification adapter for testing.
///
/// Only successful sends are recorded; `attempts` counts every call.
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    state: Arc<Mutex<FakeState>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` sends fail
    pub fn fail_next(&self, count: usize) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).failures_left = count;
    }

    /// Get all delivered notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.message).collect()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).attempts
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn send(&self, channel: &str, message: &str) -> Result<(), NotifyError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(NotifyError::SendFailed("injected failure".to_string()));
        }
        state.calls.push(NotifyCall {
            channel: channel.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
