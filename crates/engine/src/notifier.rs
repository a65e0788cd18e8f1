// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device status line delivery.
//!
//! The state machine talks to a [`Notifier`], which must never block. The
//! queued implementation hands each line to a bounded channel drained by
//! one tokio task per device, so a slow or failing outbound call only
//! delays that device's later lines.

use prattle_adapters::{
    LogNotifyAdapter, NotifyAdapter, TracedNotifyAdapter, WebhookNotifyAdapter,
};
use prattle_core::{Device, NotifySettings, NotifyTarget};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Receives the status lines of one device
pub trait Notifier: Send + Sync {
    fn update_status(&self, text: &str);

    /// No lines are accepted afterwards; queued ones are still delivered
    fn terminate(&self);
}

/// Used for devices without a notification target
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn update_status(&self, _text: &str) {}

    fn terminate(&self) {}
}

/// Records every line, for tests
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    lines: Arc<Mutex<Vec<String>>>,
    terminated: Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Forget what was recorded so far
    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Notifier for RecordingNotifier {
    fn update_status(&self, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
    }

    fn terminate(&self) {
        self.terminated
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Strip leading whitespace, cut to `max_len` characters, strip again
pub fn tidy_text(text: &str, max_len: usize) -> String {
    let cut: String = text.trim_start().chars().take(max_len).collect();
    cut.trim().to_string()
}

enum Work {
    Status(String),
    Terminate,
}

/// Notifier backed by a bounded queue and a delivery task
pub struct QueuedNotifier {
    channel: String,
    max_length: usize,
    sender: Mutex<Option<mpsc::Sender<Work>>>,
}

impl QueuedNotifier {
    /// Start the delivery task for `channel` on `runtime`.
    ///
    /// The returned handle completes once the queue has been drained after
    /// [`Notifier::terminate`].
    pub fn spawn<N: NotifyAdapter>(
        adapter: N,
        channel: impl Into<String>,
        settings: &NotifySettings,
        runtime: &Handle,
    ) -> (Self, JoinHandle<()>) {
        let channel = channel.into();
        let (sender, receiver) = mpsc::channel(settings.queue_capacity.max(1));
        let worker = runtime.spawn(deliver(
            adapter,
            channel.clone(),
            receiver,
            settings.max_attempts.max(1),
        ));
        let notifier = Self {
            channel,
            max_length: settings.max_length,
            sender: Mutex::new(Some(sender)),
        };
        (notifier, worker)
    }
}

impl Notifier for QueuedNotifier {
    fn update_status(&self, text: &str) {
        let text = tidy_text(text, self.max_length);
        if text.is_empty() {
            return;
        }
        let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = guard.as_ref() else {
            tracing::debug!(channel = %self.channel, "notifier terminated, line dropped");
            return;
        };
        match sender.try_send(Work::Status(text)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(channel = %self.channel, "notification queue full, line dropped")
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(channel = %self.channel, "notification worker gone, line dropped")
            }
        }
    }

    fn terminate(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        // A full queue still ends the worker: dropping the sender closes it
        if let Some(sender) = sender {
            let _ = sender.try_send(Work::Terminate);
        }
    }
}

async fn deliver<N: NotifyAdapter>(
    adapter: N,
    channel: String,
    mut receiver: mpsc::Receiver<Work>,
    max_attempts: u32,
) {
    while let Some(work) = receiver.recv().await {
        match work {
            Work::Status(text) => {
                send_with_retry(&adapter, &channel, &text, max_attempts).await;
            }
            Work::Terminate => break,
        }
    }
    tracing::debug!(%channel, "notification worker finished");
}

/// Returns whether the line was delivered
async fn send_with_retry<N: NotifyAdapter>(
    adapter: &N,
    channel: &str,
    text: &str,
    max_attempts: u32,
) -> bool {
    for attempt in 1..=max_attempts {
        match adapter.send(channel, text).await {
            Ok(()) => return true,
            Err(e) => {
                tracing::warn!(channel, attempt, error = %e, "notification attempt failed")
            }
        }
    }
    tracing::error!(channel, attempts = max_attempts, text, "notification dropped");
    false
}

/// Supplies the notifier for a newly seen device
pub trait NotifierFactory: Send {
    fn notifier_for(&mut self, device: &Device) -> Arc<dyn Notifier>;
}

/// Every device gets a [`NullNotifier`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifiers;

impl NotifierFactory for NullNotifiers {
    fn notifier_for(&mut self, _device: &Device) -> Arc<dyn Notifier> {
        Arc::new(NullNotifier)
    }
}

/// Delivery tasks started by a [`TargetNotifiers`]
#[derive(Clone, Default)]
pub struct NotifyWorkers {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl NotifyWorkers {
    fn push(&self, handle: JoinHandle<()>) {
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every started task. Call after the notifiers are terminated.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(|e| e.into_inner()));
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "notification worker failed");
            }
        }
    }
}

/// Builds a queued notifier from each device's [`NotifyTarget`]
pub struct TargetNotifiers {
    runtime: Handle,
    settings: NotifySettings,
    request_timeout: Duration,
    workers: NotifyWorkers,
}

impl TargetNotifiers {
    pub fn new(runtime: Handle, settings: NotifySettings, request_timeout: Duration) -> Self {
        Self {
            runtime,
            settings,
            request_timeout,
            workers: NotifyWorkers::default(),
        }
    }

    pub fn workers(&self) -> NotifyWorkers {
        self.workers.clone()
    }

    fn queued<N: NotifyAdapter>(&self, adapter: N, device: &Device) -> Arc<dyn Notifier> {
        let (notifier, worker) = QueuedNotifier::spawn(
            TracedNotifyAdapter::new(adapter),
            device.name.clone(),
            &self.settings,
            &self.runtime,
        );
        self.workers.push(worker);
        Arc::new(notifier)
    }
}

impl NotifierFactory for TargetNotifiers {
    fn notifier_for(&mut self, device: &Device) -> Arc<dyn Notifier> {
        match &device.notify {
            None => Arc::new(NullNotifier),
            Some(NotifyTarget::Log) => self.queued(LogNotifyAdapter::new(), device),
            Some(NotifyTarget::Webhook { url }) => self.queued(
                WebhookNotifyAdapter::new(url.clone(), self.request_timeout),
                device,
            ),
        }
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
