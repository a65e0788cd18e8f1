// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use prattle_adapters::FakeNotifyAdapter;

fn settings(queue_capacity: usize, max_attempts: u32) -> NotifySettings {
    NotifySettings {
        queue_capacity,
        max_attempts,
        max_length: 140,
        greeting: None,
    }
}

#[test]
fn tidy_text_trims_and_truncates() {
    assert_eq!(tidy_text("   hello  ", 140), "hello");
    assert_eq!(tidy_text("  abcdef", 4), "abcd");
    assert_eq!(tidy_text("ab   cd", 4), "ab");
    assert_eq!(tidy_text("héllo", 2), "hé");
    assert_eq!(tidy_text("   ", 10), "");
}

#[test]
fn null_notifier_accepts_anything() {
    let notifier = NullNotifier;
    notifier.update_status("ignored");
    notifier.terminate();
    notifier.update_status("still ignored");
}

#[tokio::test]
async fn lines_are_delivered_in_order() {
    let fake = FakeNotifyAdapter::new();
    let (notifier, worker) =
        QueuedNotifier::spawn(fake.clone(), "Mk3", &settings(8, 2), &Handle::current());

    notifier.update_status("first");
    notifier.update_status("  second  ");
    notifier.update_status("");
    notifier.terminate();
    worker.await.unwrap();

    assert_eq!(fake.messages(), vec!["first", "second"]);
    assert!(fake.calls().iter().all(|call| call.channel == "Mk3"));
}

#[tokio::test]
async fn failed_send_is_retried() {
    let fake = FakeNotifyAdapter::new();
    fake.fail_next(1);
    let (notifier, worker) =
        QueuedNotifier::spawn(fake.clone(), "Mk3", &settings(8, 2), &Handle::current());

    notifier.update_status("eventually");
    notifier.terminate();
    worker.await.unwrap();

    assert_eq!(fake.messages(), vec!["eventually"]);
    assert_eq!(fake.attempts(), 2);
}

#[tokio::test]
async fn line_is_dropped_after_max_attempts_and_worker_continues() {
    let fake = FakeNotifyAdapter::new();
    fake.fail_next(2);
    let (notifier, worker) =
        QueuedNotifier::spawn(fake.clone(), "Mk3", &settings(8, 2), &Handle::current());

    notifier.update_status("lost");
    notifier.update_status("kept");
    notifier.terminate();
    worker.await.unwrap();

    assert_eq!(fake.messages(), vec!["kept"]);
    assert_eq!(fake.attempts(), 3);
}

#[tokio::test]
async fn full_queue_drops_new_lines() {
    let fake = FakeNotifyAdapter::new();
    let (notifier, worker) =
        QueuedNotifier::spawn(fake.clone(), "Mk3", &settings(2, 1), &Handle::current());

    // The worker has not run yet on the current-thread runtime
    notifier.update_status("a");
    notifier.update_status("b");
    notifier.update_status("c");
    notifier.terminate();
    worker.await.unwrap();

    assert_eq!(fake.messages(), vec!["a", "b"]);
}

#[tokio::test]
async fn lines_after_terminate_are_ignored() {
    let fake = FakeNotifyAdapter::new();
    let (notifier, worker) =
        QueuedNotifier::spawn(fake.clone(), "Mk3", &settings(8, 2), &Handle::current());

    notifier.terminate();
    notifier.update_status("too late");
    notifier.terminate();
    worker.await.unwrap();

    assert!(fake.messages().is_empty());
}

#[tokio::test]
async fn target_notifiers_follow_device_configuration() {
    let mut factory = TargetNotifiers::new(
        Handle::current(),
        settings(8, 2),
        Duration::from_millis(100),
    );
    let workers = factory.workers();

    let silent = factory.notifier_for(&Device::new(1, "Silent"));
    silent.update_status("nobody hears this");
    assert!(workers.is_empty());

    let logged = factory.notifier_for(&Device::new(2, "Logged").with_notify(NotifyTarget::Log));
    logged.update_status("hello log");
    logged.terminate();
    assert_eq!(workers.len(), 1);

    workers.drain().await;
    assert!(workers.is_empty());
}
