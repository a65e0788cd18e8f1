// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device state machine.
//!
//! A model tracks the network and device axes of one printer. Every axis
//! update triggers an evaluation unless the model is frozen; evaluations
//! decide which notification to post and which chatter runs.

use crate::chatter::{post, Chatter};
use crate::notifier::Notifier;
use crate::prattle::{
    BusyPrattler, IdlePrattler, InoperablePrattler, PausedPrattler, Prattler, SuccessPrattler,
};
use prattle_core::{Axis, Clock, DeviceAxis, DeviceId, NetworkAxis, Scheduler};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

pub struct ResourceModel<C: Clock> {
    device_id: DeviceId,
    network: Axis<NetworkAxis>,
    device: Axis<DeviceAxis>,
    offline_streak: u32,
    frozen: u32,
    evaluations: u64,
    transitions: u64,
    notifier: Arc<dyn Notifier>,
    busy: BusyPrattler,
    success: SuccessPrattler,
    idle: Chatter<C>,
    paused: Chatter<C>,
    inoperable: Chatter<C>,
}

impl<C: Clock> ResourceModel<C> {
    pub fn new(device_id: DeviceId, scheduler: &Scheduler<C>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_seed(device_id, scheduler, notifier, rand::random())
    }

    /// Same as [`new`](Self::new) with reproducible flavor text
    pub fn with_seed(
        device_id: DeviceId,
        scheduler: &Scheduler<C>,
        notifier: Arc<dyn Notifier>,
        seed: u64,
    ) -> Self {
        let idle = Chatter::new(
            "idle",
            IdlePrattler::new(seed),
            false,
            scheduler.clone(),
            Arc::clone(&notifier),
        );
        let paused = Chatter::new(
            "paused",
            PausedPrattler::new(seed),
            true,
            scheduler.clone(),
            Arc::clone(&notifier),
        );
        let inoperable = Chatter::new(
            "inoperable",
            InoperablePrattler::new(seed),
            true,
            scheduler.clone(),
            Arc::clone(&notifier),
        );
        Self {
            device_id,
            network: Axis::default(),
            device: Axis::default(),
            offline_streak: 0,
            frozen: 0,
            evaluations: 0,
            transitions: 0,
            busy: BusyPrattler::new(seed),
            success: SuccessPrattler::new(seed),
            idle,
            paused,
            inoperable,
            notifier,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Post the greeting of a newly seen device
    pub fn initialize(&self, greeting: Option<&str>) {
        if let Some(greeting) = greeting {
            self.notifier.update_status(greeting);
        }
    }

    pub fn network(&self) -> Axis<NetworkAxis> {
        self.network
    }

    pub fn device(&self) -> Axis<DeviceAxis> {
        self.device
    }

    /// Consecutive evaluations that saw the network offline
    pub fn offline_streak(&self) -> u32 {
        self.offline_streak
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Evaluations in which at least one axis changed
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen > 0
    }

    pub fn idle_chatter(&self) -> &Chatter<C> {
        &self.idle
    }

    pub fn paused_chatter(&self) -> &Chatter<C> {
        &self.paused
    }

    pub fn inoperable_chatter(&self) -> &Chatter<C> {
        &self.inoperable
    }

    /// Defer evaluation until the returned guard, and any nested guards,
    /// are dropped. The net effect of the updates made meanwhile is then
    /// evaluated once.
    pub fn freeze(&mut self) -> Freeze<'_, C> {
        self.frozen += 1;
        Freeze { model: self }
    }

    pub fn update_network(&mut self, value: NetworkAxis) {
        self.network.set(value);
        self.evaluate_if_thawed();
    }

    pub fn update_device(&mut self, value: DeviceAxis) {
        self.device.set(value);
        self.evaluate_if_thawed();
    }

    fn evaluate_if_thawed(&mut self) {
        if self.frozen == 0 {
            self.evaluate();
        }
    }

    fn evaluate(&mut self) {
        self.evaluations += 1;
        let network = self.network.current();
        let device = self.device.current();

        if network == NetworkAxis::Offline {
            self.offline_streak += 1;
        } else if self.offline_streak > 0 {
            tracing::info!(device_id = %self.device_id, streak = self.offline_streak, "back online");
            self.notifier.update_status(&format!(
                "Network state {} ({})",
                NetworkAxis::Offline,
                self.offline_streak
            ));
            self.offline_streak = 0;
        }

        if self.network.changed() || self.device.changed() {
            self.transitions += 1;
            tracing::info!(
                device_id = %self.device_id,
                network = %network,
                device = %device,
                previous_network = %self.network.previous(),
                previous_device = %self.device.previous(),
                "state changed"
            );
            self.stop_chatter();
            match network {
                NetworkAxis::Good => self.enter_device_state(device),
                NetworkAxis::Unreachable | NetworkAxis::BadPassword => {
                    self.notifier
                        .update_status(&format!("Network state {network}"));
                }
                NetworkAxis::Offline | NetworkAxis::Unknown => {}
            }
        }

        self.network.settle();
        self.device.settle();
    }

    fn enter_device_state(&mut self, device: DeviceAxis) {
        match device {
            DeviceAxis::Busy => post(self.notifier.as_ref(), self.busy.next_prattle()),
            DeviceAxis::Idle => {
                if self.device.previous() == DeviceAxis::Busy {
                    post(self.notifier.as_ref(), self.success.next_prattle());
                }
                self.idle.start();
            }
            DeviceAxis::Paused => self.paused.start(),
            DeviceAxis::Inoperable => self.inoperable.start(),
            DeviceAxis::Unknown => {}
        }
    }

    fn stop_chatter(&self) {
        self.idle.stop();
        self.paused.stop();
        self.inoperable.stop();
    }

    /// Stop all chatter and close the notifier
    pub fn shutdown(&mut self) {
        self.stop_chatter();
        self.notifier.terminate();
        tracing::debug!(device_id = %self.device_id, "model shut down");
    }
}

/// Scoped freeze of a [`ResourceModel`]; evaluates on the last drop
pub struct Freeze<'a, C: Clock> {
    model: &'a mut ResourceModel<C>,
}

impl<C: Clock> Deref for Freeze<'_, C> {
    type Target = ResourceModel<C>;

    fn deref(&self) -> &Self::Target {
        self.model
    }
}

impl<C: Clock> DerefMut for Freeze<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.model
    }
}

impl<C: Clock> Drop for Freeze<'_, C> {
    fn drop(&mut self) {
        self.model.frozen = self.model.frozen.saturating_sub(1);
        self.model.evaluate_if_thawed();
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
