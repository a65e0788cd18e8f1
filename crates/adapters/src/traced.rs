// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{NotifyAdapter, NotifyError};
use crate::source::ObservationSource;
use async_trait::async_trait;
use prattle_core::{Device, Observation, Outcome};
use tracing::Instrument;

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn send(&self, channel: &str, message: &str) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.send", channel);
        async {
            tracing::debug!(message_len = message.len(), "sending");
            let start = std::time::Instant::now();
            let result = self.inner.send(channel, message).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "sent"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "send failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any ObservationSource
#[derive(Clone)]
pub struct TracedObservationSource<S> {
    inner: S,
}

impl<S> TracedObservationSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: ObservationSource> ObservationSource for TracedObservationSource<S> {
    fn observe(&self, device: &Device) -> Observation {
        let span = tracing::info_span!("source.observe", device_id = %device.id, name = %device.name);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let observation = self.inner.observe(device);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match observation.outcome() {
            Outcome::Failed(failure) => tracing::info!(
                elapsed_ms,
                class_name = %failure.class_name,
                timed_out = failure.timed_out,
                "unreachable"
            ),
            Outcome::Status { code, payloads } => tracing::debug!(
                elapsed_ms,
                status = code,
                payloads = payloads.len(),
                "observed"
            ),
            Outcome::Empty => tracing::debug!(elapsed_ms, "nothing requested"),
        }
        observation
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
