// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted observation source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::ObservationSource;
use prattle_core::{Device, DeviceId, Observation, TransportFailure};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Script {
    queued: HashMap<DeviceId, VecDeque<Observation>>,
    observed: Vec<DeviceId>,
}

/// Replays queued observations per device. The last one repeats once the
/// queue runs dry; unscripted devices look unreachable.
#[derive(Clone, Default)]
pub struct FakeObservationSource {
    script: Arc<Mutex<Script>>,
}

impl FakeObservationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, observation: Observation) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .queued
            .entry(observation.device_id())
            .or_default()
            .push_back(observation);
    }

    pub fn push_payloads(&self, id: DeviceId, payloads: &[(&str, serde_json::Value)]) {
        let mut observation = Observation::new(id);
        for (prefix, payload) in payloads {
            observation.record_payload(prefix, payload.clone());
        }
        self.push(observation);
    }

    pub fn push_timeout(&self, id: DeviceId) {
        let mut observation = Observation::new(id);
        observation.record_failure(TransportFailure::timeout());
        self.push(observation);
    }

    pub fn push_status(&self, id: DeviceId, status: u16, body: &str) {
        let mut observation = Observation::new(id);
        observation.record_response("PRINTER", status, body);
        self.push(observation);
    }

    /// Devices observed so far, in order
    pub fn observed(&self) -> Vec<DeviceId> {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .observed
            .clone()
    }
}

impl ObservationSource for FakeObservationSource {
    fn observe(&self, device: &Device) -> Observation {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.observed.push(device.id);
        let Some(queue) = script.queued.get_mut(&device.id) else {
            let mut observation = Observation::new(device.id);
            observation.record_failure(TransportFailure::new("ConnectionFailed", false));
            return observation;
        };
        match queue.len() {
            0 => Observation::new(device.id),
            1 => queue.front().cloned().unwrap_or_else(|| Observation::new(device.id)),
            _ => queue.pop_front().unwrap_or_else(|| Observation::new(device.id)),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
