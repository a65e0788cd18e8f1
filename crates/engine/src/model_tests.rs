// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notifier::RecordingNotifier;
use prattle_core::FakeClock;
use proptest::prelude::*;
use proptest::sample::select;

fn setup() -> (Scheduler<FakeClock>, RecordingNotifier, ResourceModel<FakeClock>) {
    let scheduler = Scheduler::new(FakeClock::new());
    let notifier = RecordingNotifier::new();
    let model = ResourceModel::with_seed(DeviceId(1), &scheduler, Arc::new(notifier.clone()), 42);
    (scheduler, notifier, model)
}

/// Apply both axes as one observation
fn observe(model: &mut ResourceModel<FakeClock>, network: NetworkAxis, device: DeviceAxis) {
    let mut frozen = model.freeze();
    frozen.update_network(network);
    frozen.update_device(device);
}

#[test]
fn initialize_posts_the_greeting() {
    let (_scheduler, notifier, model) = setup();
    model.initialize(Some("Howdy"));
    model.initialize(None);
    assert_eq!(notifier.lines(), vec!["Howdy"]);
}

#[test]
fn every_update_evaluates_when_not_frozen() {
    let (_scheduler, _notifier, mut model) = setup();
    model.update_network(NetworkAxis::Good);
    model.update_device(DeviceAxis::Idle);
    assert_eq!(model.evaluations(), 2);
    assert_eq!(model.transitions(), 2);
}

#[test]
fn freeze_coalesces_updates_into_one_evaluation() {
    let (_scheduler, notifier, mut model) = setup();
    observe(&mut model, NetworkAxis::Good, DeviceAxis::Idle);
    notifier.clear();
    let evaluations = model.evaluations();
    let transitions = model.transitions();

    {
        let mut frozen = model.freeze();
        frozen.update_device(DeviceAxis::Busy);
        frozen.update_device(DeviceAxis::Idle);
        assert!(frozen.is_frozen());
        assert_eq!(frozen.evaluations(), evaluations);
    }

    assert_eq!(model.evaluations(), evaluations + 1);
    assert_eq!(model.transitions(), transitions);
    assert!(notifier.lines().is_empty());
    assert!(model.idle_chatter().is_running());
}

#[test]
fn nested_freeze_evaluates_on_the_outermost_drop() {
    let (_scheduler, _notifier, mut model) = setup();
    {
        let mut outer = model.freeze();
        {
            let mut inner = outer.freeze();
            inner.update_network(NetworkAxis::Good);
        }
        assert_eq!(outer.evaluations(), 0);
        outer.update_device(DeviceAxis::Busy);
    }
    assert_eq!(model.evaluations(), 1);
    assert!(!model.is_frozen());
    assert_eq!(model.device().previous(), DeviceAxis::Busy);
}

#[test]
fn finishing_a_print_notifies_once_then_chatters() {
    let (_scheduler, notifier, mut model) = setup();
    observe(&mut model, NetworkAxis::Good, DeviceAxis::Busy);
    assert_eq!(notifier.lines().len(), 1);
    notifier.clear();

    observe(&mut model, NetworkAxis::Good, DeviceAxis::Idle);

    let lines = notifier.lines();
    let finished: Vec<_> = lines.iter().filter(|l| l.contains("Done!")).collect();
    assert_eq!(finished.len(), 1, "{lines:?}");
    assert!(lines.last().unwrap().contains("Done!"));
    assert!(model.idle_chatter().is_running());
}

#[test]
fn idle_without_a_print_starts_chatter_silently() {
    let (_scheduler, notifier, mut model) = setup();
    observe(&mut model, NetworkAxis::Good, DeviceAxis::Idle);
    assert!(notifier.lines().is_empty());
    assert!(model.idle_chatter().is_running());
}

#[test]
fn offline_streak_is_summarised_on_recovery() {
    let (_scheduler, notifier, mut model) = setup();
    for _ in 0..3 {
        let mut frozen = model.freeze();
        frozen.update_network(NetworkAxis::Offline);
    }
    assert_eq!(model.offline_streak(), 3);
    assert!(notifier.lines().is_empty());

    observe(&mut model, NetworkAxis::Good, DeviceAxis::Idle);

    assert_eq!(model.offline_streak(), 0);
    assert_eq!(notifier.lines(), vec!["Network state OFFLINE (3)"]);
}

#[test]
fn unreachable_and_bad_password_are_announced() {
    let (_scheduler, notifier, mut model) = setup();
    model.update_network(NetworkAxis::Unreachable);
    model.update_network(NetworkAxis::Unreachable);
    model.update_network(NetworkAxis::BadPassword);
    assert_eq!(
        notifier.lines(),
        vec!["Network state UNREACHABLE", "Network state BAD_PASSWORD"]
    );
}

#[test]
fn paused_nags_at_once_and_stops_when_resumed() {
    let (_scheduler, notifier, mut model) = setup();
    observe(&mut model, NetworkAxis::Good, DeviceAxis::Paused);
    assert_eq!(notifier.lines().len(), 1);
    assert!(model.paused_chatter().is_running());

    observe(&mut model, NetworkAxis::Good, DeviceAxis::Busy);
    assert!(!model.paused_chatter().is_running());
    assert!(!model.idle_chatter().is_running());
}

#[test]
fn inoperable_nags_until_the_network_drops() {
    let (scheduler, notifier, mut model) = setup();
    observe(&mut model, NetworkAxis::Good, DeviceAxis::Inoperable);
    assert_eq!(notifier.lines().len(), 1);
    assert!(model.inoperable_chatter().is_running());

    model.update_network(NetworkAxis::Offline);
    assert!(!model.inoperable_chatter().is_running());
    assert!(scheduler.is_empty());
}

#[test]
fn shutdown_stops_chatter_and_terminates_notifier() {
    let (scheduler, notifier, mut model) = setup();
    observe(&mut model, NetworkAxis::Good, DeviceAxis::Idle);
    model.shutdown();
    assert!(scheduler.is_empty());
    assert!(notifier.is_terminated());
}

const NETWORKS: [NetworkAxis; 5] = [
    NetworkAxis::Unknown,
    NetworkAxis::Good,
    NetworkAxis::Unreachable,
    NetworkAxis::Offline,
    NetworkAxis::BadPassword,
];

const DEVICES: [DeviceAxis; 5] = [
    DeviceAxis::Unknown,
    DeviceAxis::Idle,
    DeviceAxis::Busy,
    DeviceAxis::Paused,
    DeviceAxis::Inoperable,
];

proptest! {
    #[test]
    fn axes_settle_after_every_evaluation(
        steps in prop::collection::vec((select(NETWORKS.to_vec()), select(DEVICES.to_vec())), 1..40)
    ) {
        let (scheduler, _notifier, mut model) = setup();
        for (network, device) in steps {
            let before = (model.network().previous(), model.device().previous());
            let transitions = model.transitions();
            observe(&mut model, network, device);

            prop_assert_eq!(model.network().previous(), model.network().current());
            prop_assert_eq!(model.device().previous(), model.device().current());
            let changed = before != (network, device);
            prop_assert_eq!(model.transitions(), transitions + u64::from(changed));
            // At most one chatter runs at a time
            prop_assert!(scheduler.len() <= 1);
        }
    }
}
