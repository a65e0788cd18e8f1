// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_notify_records_calls() {
    let adapter = FakeNotifyAdapter::new();

    adapter.send("Mk3", "Printing").await.unwrap();
    adapter.send("Mk3", "Done").await.unwrap();

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].channel, "Mk3");
    assert_eq!(calls[0].message, "Printing");
}

#[tokio::test]
async fn injected_failures_are_counted_but_not_recorded() {
    let adapter = FakeNotifyAdapter::new();
    adapter.fail_next(1);

    assert!(adapter.send("Mk3", "lost").await.is_err());
    adapter.send("Mk3", "kept").await.unwrap();

    assert_eq!(adapter.attempts(), 2);
    assert_eq!(adapter.messages(), vec!["kept"]);
}
