// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One polling tick: observe every active device and hand each observation
//! to the handlers in order

use crate::EngineError;
use prattle_adapters::ObservationSource;
use prattle_core::{Device, DeviceRegistry, Observation};

/// Consumer of observations
pub trait ObservationHandler: Send {
    /// Used in logs
    fn name(&self) -> &'static str;

    fn handle(&mut self, device: &Device, observation: &Observation) -> Result<(), EngineError>;

    fn shutdown(&mut self) {}
}

pub struct Poller<S: ObservationSource> {
    registry: DeviceRegistry,
    source: S,
    handlers: Vec<Box<dyn ObservationHandler>>,
    ticks: u64,
}

impl<S: ObservationSource> Poller<S> {
    pub fn new(registry: DeviceRegistry, source: S) -> Self {
        Self {
            registry,
            source,
            handlers: Vec::new(),
            ticks: 0,
        }
    }

    pub fn with_handler(mut self, handler: impl ObservationHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Poll every active device once.
    ///
    /// A handler failure for one device does not keep the others from
    /// being polled; the failures are summarised in the returned error.
    pub fn poll(&mut self) -> Result<usize, EngineError> {
        self.ticks += 1;
        let mut total = 0;
        let mut failed = 0;
        let mut first = None;
        for device in self.registry.active() {
            total += 1;
            let observation = self.source.observe(device);
            let mut device_failed = false;
            for handler in &mut self.handlers {
                if let Err(e) = handler.handle(device, &observation) {
                    tracing::error!(
                        device_id = %device.id,
                        handler = handler.name(),
                        error = %e,
                        "observation handling failed"
                    );
                    device_failed = true;
                    first.get_or_insert_with(|| e.to_string());
                }
            }
            failed += usize::from(device_failed);
        }
        tracing::debug!(tick = self.ticks, devices = total, failed, "poll complete");
        match first {
            Some(first) => Err(EngineError::Poll {
                failed,
                total,
                first,
            }),
            None => Ok(total),
        }
    }

    pub fn shutdown(&mut self) {
        for handler in &mut self.handlers {
            handler.shutdown();
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
