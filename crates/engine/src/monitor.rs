// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives the poller from the scheduler.
//!
//! The monitor owns nothing but the tick registration: the scheduler runs
//! on the calling thread, and chatter scheduled by the resource models
//! shares the same queue.

use crate::poller::Poller;
use prattle_adapters::ObservationSource;
use prattle_core::{ActionHandle, Clock, Scheduler};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Polling runs ahead of chatter due at the same instant
pub const POLL_PRIORITY: i32 = 100;

pub struct Monitor<C: Clock, S: ObservationSource> {
    scheduler: Scheduler<C>,
    poller: Arc<Mutex<Poller<S>>>,
    interval: Duration,
    tick: Option<ActionHandle>,
}

impl<C: Clock, S: ObservationSource> Monitor<C, S> {
    pub fn new(scheduler: Scheduler<C>, poller: Poller<S>, interval: Duration) -> Self {
        Self {
            scheduler,
            poller: Arc::new(Mutex::new(poller)),
            interval,
            tick: None,
        }
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_started(&self) -> bool {
        self.tick.is_some_and(|tick| self.scheduler.is_pending(tick))
    }

    pub fn ticks(&self) -> u64 {
        self.poller().ticks()
    }

    fn poller(&self) -> MutexGuard<'_, Poller<S>> {
        self.poller.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register the repeating poll. Calling it again is a no-op.
    pub fn start(&mut self) {
        if self.is_started() {
            return;
        }
        let poller = Arc::clone(&self.poller);
        let tick = self
            .scheduler
            .every(self.interval, POLL_PRIORITY, move || {
                let mut poller = poller.lock().unwrap_or_else(|e| e.into_inner());
                poller.poll()?;
                Ok(())
            });
        tracing::info!(
            interval = ?self.interval,
            devices = self.poller().registry().len(),
            "monitor started"
        );
        self.tick = Some(tick);
    }

    /// Block on the scheduler until [`stop`](Self::stop) is called from
    /// another thread through a [`stopper`](Self::stopper).
    pub fn run(&mut self) {
        self.start();
        self.scheduler.run();
        tracing::info!(ticks = self.ticks(), "monitor returned");
    }

    /// Handle that can stop [`run`](Self::run) from another thread
    pub fn stopper(&self) -> Scheduler<C> {
        self.scheduler.clone()
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Cancel the poll and shut every handler down
    pub fn shutdown(&mut self) {
        if let Some(tick) = self.tick.take() {
            self.scheduler.cancel(tick);
        }
        self.poller().shutdown();
        tracing::info!("monitor shut down");
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
