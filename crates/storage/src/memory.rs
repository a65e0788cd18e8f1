// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::sink::{build_row, PersistenceSink, Row, Staging, StoreError, UniqueKey};
use prattle_core::field::InsertTemplate;
use prattle_core::Value;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    staging: Staging,
    rows: Vec<(String, Row)>,
    fail_execute: usize,
    fail_commit: usize,
    commits: usize,
    rollbacks: usize,
    /// Logical clock so every execute gets a distinct timestamp
    ticks: i64,
}

/// Store that keeps committed rows in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new(unique: Vec<UniqueKey>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                staging: Staging::new(unique),
                ..MemoryState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next `count` executes fail with an I/O error
    pub fn fail_next_execute(&self, count: usize) {
        self.lock().fail_execute = count;
    }

    /// Make the next `count` commits fail with an I/O error
    pub fn fail_next_commit(&self, count: usize) {
        self.lock().fail_commit = count;
    }

    pub fn rows(&self) -> Vec<Row> {
        self.lock().rows.iter().map(|(_, row)| row.clone()).collect()
    }

    pub fn pending(&self) -> usize {
        self.lock().staging.pending().len()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }
}

fn injected() -> StoreError {
    StoreError::Io(io::Error::other("injected failure"))
}

impl PersistenceSink for MemoryStore {
    fn execute(
        &mut self,
        template: &InsertTemplate,
        values: &[Option<Value>],
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.fail_execute > 0 {
            state.fail_execute -= 1;
            return Err(injected());
        }
        state.ticks += 1;
        let observed = chrono::DateTime::from_timestamp(state.ticks, 0)
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let row = build_row(template, values, &observed)?;
        Ok(state.staging.stage(&template.table, row))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_commit > 0 {
            state.fail_commit -= 1;
            return Err(injected());
        }
        let committed = state.staging.confirm();
        state.rows.extend(committed);
        state.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) {
        let mut state = self.lock();
        state.staging.discard();
        state.rollbacks += 1;
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
