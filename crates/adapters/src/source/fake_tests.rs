// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use prattle_core::Outcome;
use serde_json::json;

#[test]
fn replays_in_order_then_repeats_the_last() {
    let source = FakeObservationSource::new();
    let device = Device::new(1, "Mk3");
    source.push_timeout(device.id);
    source.push_payloads(device.id, &[("PRINTER", json!({"state": {"text": "Operational"}}))]);

    assert!(matches!(source.observe(&device).outcome(), Outcome::Failed(_)));
    for _ in 0..2 {
        assert!(matches!(
            source.observe(&device).outcome(),
            Outcome::Status { code: 200, .. }
        ));
    }
    assert_eq!(source.observed().len(), 3);
}

#[test]
fn unscripted_devices_are_unreachable() {
    let source = FakeObservationSource::new();
    match source.observe(&Device::new(2, "Mini")).outcome() {
        Outcome::Failed(failure) => assert!(!failure.timed_out),
        other => panic!("unexpected {other:?}"),
    }
}
