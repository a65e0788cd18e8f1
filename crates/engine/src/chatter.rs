// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic chatter driven by the scheduler.
//!
//! Each firing posts the prattler's next message and re-arms a one-shot
//! action with the prattler's next delay. Stopping bumps a generation
//! counter and cancels the pending action, so a firing already taken off
//! the queue cannot re-arm a stopped chatter.

use crate::notifier::Notifier;
use crate::prattle::RepeatingPrattler;
use prattle_core::{ActionHandle, Clock, Scheduler};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Chatter runs after everything else due at the same instant
pub const CHATTER_PRIORITY: i32 = 999;

struct Slot {
    prattler: Box<dyn RepeatingPrattler>,
    handle: Option<ActionHandle>,
    generation: u64,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Post every line of `lines`, splitting embedded newlines
pub fn post(notifier: &dyn Notifier, lines: Vec<String>) {
    for line in lines {
        for part in line.split('\n') {
            notifier.update_status(part);
        }
    }
}

pub struct Chatter<C: Clock> {
    purpose: &'static str,
    immediate: bool,
    scheduler: Scheduler<C>,
    notifier: Arc<dyn Notifier>,
    slot: Arc<Mutex<Slot>>,
}

impl<C: Clock> Chatter<C> {
    /// `immediate` chatter speaks as soon as it starts, then on schedule
    pub fn new(
        purpose: &'static str,
        prattler: impl RepeatingPrattler + 'static,
        immediate: bool,
        scheduler: Scheduler<C>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            purpose,
            immediate,
            scheduler,
            notifier,
            slot: Arc::new(Mutex::new(Slot {
                prattler: Box::new(prattler),
                handle: None,
                generation: 0,
            })),
        }
    }

    /// Restart from scratch; a running chatter is stopped first
    pub fn start(&self) {
        self.stop();
        let mut slot = lock(&self.slot);
        if self.immediate {
            let lines = slot.prattler.next_prattle();
            post(self.notifier.as_ref(), lines);
        }
        arm(
            &self.scheduler,
            &self.notifier,
            &self.slot,
            &mut slot,
            self.purpose,
        );
    }

    pub fn stop(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            if self.scheduler.cancel(handle) {
                tracing::debug!(purpose = self.purpose, action = %handle, "chatter stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.slot)
            .handle
            .is_some_and(|handle| self.scheduler.is_pending(handle))
    }

    /// Handle of the pending firing
    pub fn pending(&self) -> Option<ActionHandle> {
        lock(&self.slot)
            .handle
            .filter(|handle| self.scheduler.is_pending(*handle))
    }
}

impl<C: Clock> Drop for Chatter<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn arm<C: Clock>(
    scheduler: &Scheduler<C>,
    notifier: &Arc<dyn Notifier>,
    shared: &Arc<Mutex<Slot>>,
    slot: &mut Slot,
    purpose: &'static str,
) {
    let delay = slot.prattler.next_delay();
    let generation = slot.generation;
    let weak: Weak<Mutex<Slot>> = Arc::downgrade(shared);
    let again = scheduler.clone();
    let notifier = Arc::clone(notifier);
    let handle = scheduler.schedule(delay, CHATTER_PRIORITY, move || {
        let Some(shared) = weak.upgrade() else {
            return Ok(());
        };
        let mut slot = lock(&shared);
        if slot.generation != generation {
            return Ok(());
        }
        let lines = slot.prattler.next_prattle();
        post(notifier.as_ref(), lines);
        arm(&again, &notifier, &shared, &mut slot, purpose);
        Ok(())
    });
    slot.handle = Some(handle);
    tracing::debug!(purpose, action = %handle, delay_secs = delay.as_secs(), "chatter armed");
}

#[cfg(test)]
#[path = "chatter_tests.rs"]
mod tests;
