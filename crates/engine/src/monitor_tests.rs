// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::poller::ObservationHandler;
use crate::EngineError;
use prattle_adapters::FakeObservationSource;
use prattle_core::{Device, DeviceRegistry, FakeClock, Observation};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts observations; fails when asked and stops the scheduler after `limit`
struct Counter {
    seen: Arc<AtomicUsize>,
    fail: bool,
    limit: Option<(usize, Scheduler<FakeClock>)>,
}

impl ObservationHandler for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn handle(&mut self, _device: &Device, _observation: &Observation) -> Result<(), EngineError> {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, scheduler)) = &self.limit {
            if seen >= *limit {
                scheduler.stop();
            }
        }
        if self.fail {
            return Err(EngineError::Poll {
                failed: 1,
                total: 1,
                first: "boom".to_string(),
            });
        }
        Ok(())
    }
}

fn monitor(
    clock: &FakeClock,
    fail: bool,
    limit: Option<usize>,
) -> (Monitor<FakeClock, FakeObservationSource>, Arc<AtomicUsize>) {
    let scheduler = Scheduler::new(clock.clone());
    let seen = Arc::new(AtomicUsize::new(0));
    let registry = DeviceRegistry::new(vec![Device::new(1, "Mk3")
        .with_address("10.0.0.1")
        .with_api_key("k")])
    .unwrap();
    let poller = Poller::new(registry, FakeObservationSource::new()).with_handler(Counter {
        seen: Arc::clone(&seen),
        fail,
        limit: limit.map(|n| (n, scheduler.clone())),
    });
    (Monitor::new(scheduler, poller, Duration::from_secs(10)), seen)
}

#[test]
fn first_poll_is_about_a_second_out() {
    let clock = FakeClock::new();
    let (mut monitor, seen) = monitor(&clock, false, None);
    monitor.start();

    assert_eq!(monitor.scheduler().run_pending(), 0);
    clock.advance(Duration::from_secs(1));
    assert_eq!(monitor.scheduler().run_pending(), 1);

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(monitor.ticks(), 1);
}

#[test]
fn polls_repeat_every_interval() {
    let clock = FakeClock::new();
    let (mut monitor, seen) = monitor(&clock, false, None);
    monitor.start();
    clock.advance(Duration::from_secs(1));
    monitor.scheduler().run_pending();

    clock.advance(Duration::from_secs(9));
    assert_eq!(monitor.scheduler().run_pending(), 0);
    clock.advance(Duration::from_secs(1));
    assert_eq!(monitor.scheduler().run_pending(), 1);

    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn start_twice_registers_one_poll() {
    let clock = FakeClock::new();
    let (mut monitor, _seen) = monitor(&clock, false, None);
    monitor.start();
    monitor.start();
    assert_eq!(monitor.scheduler().len(), 1);
    assert!(monitor.is_started());
}

#[test]
fn failed_poll_is_rearmed() {
    let clock = FakeClock::new();
    let (mut monitor, seen) = monitor(&clock, true, None);
    monitor.start();
    clock.advance(Duration::from_secs(1));
    monitor.scheduler().run_pending();

    assert!(monitor.is_started());
    clock.advance(Duration::from_secs(10));
    monitor.scheduler().run_pending();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn run_returns_once_stopped() {
    let clock = FakeClock::new();
    let (mut monitor, seen) = monitor(&clock, false, Some(3));

    monitor.run();

    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert!(monitor.stopper().is_stopped());
    // Three ticks: one second out, then two ten second periods
    assert!(clock.slept() >= Duration::from_secs(21));
}

#[test]
fn shutdown_cancels_the_poll() {
    let clock = FakeClock::new();
    let (mut monitor, seen) = monitor(&clock, false, None);
    monitor.start();
    monitor.shutdown();

    assert!(!monitor.is_started());
    assert!(monitor.scheduler().is_empty());
    clock.advance(Duration::from_secs(5));
    monitor.scheduler().run_pending();
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}
