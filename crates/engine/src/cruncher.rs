// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns observations into axis updates for each device's model

use crate::model::ResourceModel;
use crate::notifier::NotifierFactory;
use crate::octoprint::{device_axis, state_text};
use crate::poller::ObservationHandler;
use crate::EngineError;
use prattle_core::observation::{STATUS_CONFLICT, STATUS_OK, STATUS_UNAUTHORIZED};
use prattle_core::{
    Clock, Device, DeviceAxis, DeviceId, NetworkAxis, Observation, Outcome, Scheduler,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub struct ObservationCruncher<C: Clock> {
    scheduler: Scheduler<C>,
    notifiers: Box<dyn NotifierFactory>,
    greeting: Option<String>,
    models: HashMap<DeviceId, ResourceModel<C>>,
}

impl<C: Clock> ObservationCruncher<C> {
    pub fn new(
        scheduler: Scheduler<C>,
        notifiers: impl NotifierFactory + 'static,
        greeting: Option<String>,
    ) -> Self {
        Self {
            scheduler,
            notifiers: Box::new(notifiers),
            greeting,
            models: HashMap::new(),
        }
    }

    pub fn model(&self, id: DeviceId) -> Option<&ResourceModel<C>> {
        self.models.get(&id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model for `device`, created and greeted on first sight
    fn model_for(&mut self, device: &Device) -> &mut ResourceModel<C> {
        match self.models.entry(device.id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::info!(device_id = %device.id, name = %device.name, "new device");
                let notifier = self.notifiers.notifier_for(device);
                let model = ResourceModel::new(device.id, &self.scheduler, notifier);
                model.initialize(self.greeting.as_deref());
                entry.insert(model)
            }
        }
    }

    /// Apply one observation. All axis updates are evaluated together.
    pub fn crunch(&mut self, device: &Device, observation: &Observation) {
        let mut model = self.model_for(device).freeze();
        match observation.outcome() {
            Outcome::Failed(failure) if failure.timed_out => {
                model.update_network(NetworkAxis::Offline)
            }
            Outcome::Failed(_) => model.update_network(NetworkAxis::Unreachable),
            Outcome::Status {
                code: STATUS_UNAUTHORIZED,
                ..
            } => model.update_network(NetworkAxis::BadPassword),
            Outcome::Status { code, payloads } => {
                model.update_network(NetworkAxis::Good);
                match code {
                    STATUS_OK => model.update_device(device_axis(state_text(payloads))),
                    // Printer not responding to OctoPrint
                    STATUS_CONFLICT => model.update_device(DeviceAxis::Inoperable),
                    _ => tracing::debug!(device_id = %device.id, status = code, "status ignored"),
                }
            }
            Outcome::Empty => model.update_network(NetworkAxis::Good),
        }
    }

    pub fn shutdown(&mut self) {
        for model in self.models.values_mut() {
            model.shutdown();
        }
    }
}

impl<C: Clock> ObservationHandler for ObservationCruncher<C> {
    fn name(&self) -> &'static str {
        "cruncher"
    }

    fn handle(&mut self, device: &Device, observation: &Observation) -> Result<(), EngineError> {
        self.crunch(device, observation);
        Ok(())
    }

    fn shutdown(&mut self) {
        ObservationCruncher::shutdown(self);
    }
}

#[cfg(test)]
#[path = "cruncher_tests.rs"]
mod tests;
