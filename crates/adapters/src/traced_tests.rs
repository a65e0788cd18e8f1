// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notify::FakeNotifyAdapter;
use crate::source::FakeObservationSource;
use prattle_core::DeviceId;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a closure with captured tracing output
fn with_tracing<T>(f: impl FnOnce() -> T) -> (String, T) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (logs.contents(), result)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

#[test]
fn traced_source_logs_transport_failures() {
    let source = TracedObservationSource::new(FakeObservationSource::new());
    source.inner.push_timeout(DeviceId(3));

    let (logs, observation) = with_tracing(|| source.observe(&Device::new(3, "Voron")));

    assert!(observation.failure().is_some());
    assert!(logs.contains("source.observe"), "Logs:\n{logs}");
    assert!(logs.contains("Voron"), "Logs:\n{logs}");
    assert!(logs.contains("unreachable"), "Logs:\n{logs}");
    assert!(logs.contains("timed_out=true"), "Logs:\n{logs}");
}

#[test]
fn traced_source_logs_status() {
    let source = TracedObservationSource::new(FakeObservationSource::new());
    source.inner.push_status(DeviceId(3), 200, "{}");

    let (logs, _) = with_tracing(|| source.observe(&Device::new(3, "Voron")));

    assert!(logs.contains("status=200"), "Logs:\n{logs}");
    assert!(logs.contains("elapsed_ms"), "Logs:\n{logs}");
}

#[test]
fn traced_notify_logs_failures() {
    let fake = FakeNotifyAdapter::new();
    fake.fail_next(1);
    let traced = TracedNotifyAdapter::new(fake);

    let (logs, result) = with_tracing(|| block_on(traced.send("Mk3", "hello")));

    assert!(result.is_err());
    assert!(logs.contains("notify.send"), "Logs:\n{logs}");
    assert!(logs.contains("send failed"), "Logs:\n{logs}");
}

#[tokio::test]
async fn traced_notify_passes_through() {
    let fake = FakeNotifyAdapter::new();
    let traced = TracedNotifyAdapter::new(fake.clone());

    traced.send("Mk3", "hello").await.unwrap();

    assert_eq!(fake.messages(), vec!["hello"]);
}
