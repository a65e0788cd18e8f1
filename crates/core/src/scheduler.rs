// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable, priority-ordered event scheduler.
//!
//! Actions are closures keyed by an [`ActionHandle`]. The queue is a
//! min-heap on `(due, priority, sequence)`; cancelling removes the closure
//! immediately and leaves a stale heap entry that is skipped when popped.
//!
//! The scheduler is cheap to clone. Actions may call back into it to
//! schedule or cancel work: the internal lock is never held while an
//! action runs.

use crate::clock::Clock;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Error returned by a scheduled action
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

type Action = Box<dyn FnMut() -> Result<(), ActionError> + Send>;

/// Longest single sleep in [`Scheduler::run`], so `stop` is noticed promptly
const MAX_NAP: Duration = Duration::from_millis(250);

/// Period used for the first firing of a repeating action
const FIRST_PERIOD: Duration = Duration::from_secs(1);

/// Due times snap to whole seconds, so shorter periods could land in the past
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Opaque handle to a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionHandle(u64);

impl fmt::Display for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recurrence {
    Once,
    Every(Duration),
}

/// Heap entry. Ordering is reversed so `BinaryHeap` pops the earliest.
#[derive(Debug, PartialEq, Eq)]
struct Pending {
    due: Instant,
    priority: i32,
    seq: u64,
    handle: ActionHandle,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.priority, other.seq).cmp(&(self.due, self.priority, self.seq))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Entry {
    /// `None` while the action is firing
    action: Option<Action>,
    recurrence: Recurrence,
    priority: i32,
    /// Sequence of the live heap entry; older heap entries are stale
    seq: u64,
}

#[derive(Default)]
struct Inner {
    queue: BinaryHeap<Pending>,
    entries: HashMap<ActionHandle, Entry>,
    next_handle: u64,
    next_seq: u64,
    stopped: bool,
}

impl Inner {
    fn push(&mut self, handle: ActionHandle, due: Instant, priority: i32) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Pending {
            due,
            priority,
            seq,
            handle,
        });
        seq
    }

    fn is_live(&self, pending: &Pending) -> bool {
        self.entries
            .get(&pending.handle)
            .is_some_and(|entry| entry.seq == pending.seq)
    }

    /// Drop stale entries from the top of the heap
    fn prune(&mut self) {
        while let Some(top) = self.queue.peek() {
            if self.is_live(top) {
                break;
            }
            self.queue.pop();
        }
    }
}

/// Cancellable scheduler shared by everything that runs on one loop
pub struct Scheduler<C: Clock> {
    clock: C,
    origin: Instant,
    inner: Arc<Mutex<Inner>>,
}

impl<C: Clock> Clone for Scheduler<C> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            origin: self.origin,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        let origin = clock.now();
        Self {
            clock,
            origin,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `action` once, no earlier than `delay` from now.
    ///
    /// Among actions due at the same instant, lower `priority` runs first,
    /// then insertion order.
    pub fn schedule<F>(&self, delay: Duration, priority: i32, action: F) -> ActionHandle
    where
        F: FnMut() -> Result<(), ActionError> + Send + 'static,
    {
        let due = self.clock.now() + delay;
        self.enter(due, priority, Recurrence::Once, Box::new(action))
    }

    /// Run `action` repeatedly, every `period`.
    ///
    /// Due times snap to whole seconds since the scheduler started and are
    /// computed from the current time after each firing, so a slow action
    /// shifts later firings instead of causing a burst. The first firing
    /// is about one second out and never later than one period. The handle
    /// stays valid across firings.
    ///
    /// Periods shorter than one second are rounded up to one second.
    pub fn every<F>(&self, period: Duration, priority: i32, action: F) -> ActionHandle
    where
        F: FnMut() -> Result<(), ActionError> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        // Rounding to the boundary must not push the first run past one period
        let due = self
            .next_boundary(FIRST_PERIOD)
            .min(self.clock.now() + period);
        self.enter(due, priority, Recurrence::Every(period), Box::new(action))
    }

    fn enter(
        &self,
        due: Instant,
        priority: i32,
        recurrence: Recurrence,
        action: Action,
    ) -> ActionHandle {
        let mut inner = self.lock();
        let handle = ActionHandle(inner.next_handle);
        inner.next_handle += 1;
        let seq = inner.push(handle, due, priority);
        inner.entries.insert(
            handle,
            Entry {
                action: Some(action),
                recurrence,
                priority,
                seq,
            },
        );
        handle
    }

    /// `floor(elapsed + 0.5s) + period`, measured from the scheduler origin
    pub fn next_boundary(&self, period: Duration) -> Instant {
        let elapsed = self.clock.now().saturating_duration_since(self.origin);
        let whole = (elapsed + Duration::from_millis(500)).as_secs();
        self.origin + Duration::from_secs(whole) + period
    }

    /// Cancel a pending action.
    ///
    /// Returns `false` for handles that already fired, were already
    /// cancelled, or were never issued. Cancelling a repeating action from
    /// inside its own firing stops it from being re-armed.
    pub fn cancel(&self, handle: ActionHandle) -> bool {
        self.lock().entries.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: ActionHandle) -> bool {
        self.lock().entries.contains_key(&handle)
    }

    /// Number of live actions, including one that is currently firing
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Due time of the earliest live action
    pub fn next_due(&self) -> Option<Instant> {
        let mut inner = self.lock();
        inner.prune();
        inner.queue.peek().map(|pending| pending.due)
    }

    /// Ask [`run`](Self::run) to return after the action in progress
    pub fn stop(&self) {
        self.lock().stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Fire every action due at or before now, in order. Returns how many fired.
    ///
    /// Failures are logged and do not stop the pass; a failing repeating
    /// action is re-armed like a successful one.
    pub fn run_pending(&self) -> usize {
        let mut fired = 0;
        while let Some((handle, mut action)) = self.take_due() {
            let result = action();
            if let Err(e) = &result {
                tracing::error!(action = %handle, error = %e, "scheduled action failed");
            }
            self.rearm(handle, action);
            fired += 1;
        }
        fired
    }

    fn take_due(&self) -> Option<(ActionHandle, Action)> {
        let now = self.clock.now();
        let mut inner = self.lock();
        if inner.stopped {
            return None;
        }
        loop {
            inner.prune();
            let top = inner.queue.peek()?;
            if top.due > now {
                return None;
            }
            let pending = inner.queue.pop()?;
            let action = inner
                .entries
                .get_mut(&pending.handle)
                .and_then(|entry| entry.action.take());
            if let Some(action) = action {
                return Some((pending.handle, action));
            }
        }
    }

    /// Put a fired action back: drop one-shots, re-queue repeating ones
    fn rearm(&self, handle: ActionHandle, action: Action) {
        let mut inner = self.lock();
        // Missing means it was cancelled while firing
        let Some((recurrence, priority)) = inner
            .entries
            .get(&handle)
            .map(|entry| (entry.recurrence, entry.priority))
        else {
            return;
        };
        match recurrence {
            Recurrence::Once => {
                inner.entries.remove(&handle);
            }
            Recurrence::Every(period) => {
                let due = self.next_boundary(period);
                let seq = inner.push(handle, due, priority);
                if let Some(entry) = inner.entries.get_mut(&handle) {
                    entry.seq = seq;
                    entry.action = Some(action);
                }
            }
        }
    }

    /// Block, firing actions as they come due, until nothing is pending or
    /// [`stop`](Self::stop) is called.
    pub fn run(&self) {
        loop {
            if self.is_stopped() {
                tracing::debug!("scheduler stopped");
                return;
            }
            self.run_pending();
            let Some(due) = self.next_due() else {
                tracing::debug!("scheduler queue drained");
                return;
            };
            let now = self.clock.now();
            if due > now {
                self.clock.sleep((due - now).min(MAX_NAP));
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
