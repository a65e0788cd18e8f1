// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observation sources: how a device is asked for its current state

mod octoprint;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use octoprint::OctoPrintSource;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeObservationSource;

use prattle_core::{Device, Observation};

/// Produces one observation per device per polling tick.
///
/// Blocking: the poll loop runs on the scheduler thread and talks to one
/// device at a time. Failures are part of the observation, never an `Err`.
pub trait ObservationSource: Send + 'static {
    fn observe(&self, device: &Device) -> Observation;
}
