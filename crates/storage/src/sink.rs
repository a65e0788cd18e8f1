// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence sink contract and the staging shared by the stores

use prattle_core::field::{InsertTemplate, Placeholder};
use prattle_core::Value;
use std::collections::{BTreeMap, HashSet};
use std::io;
use thiserror::Error;

/// Column name to value; `None` is SQL NULL
pub type Row = BTreeMap<String, Option<Value>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{table} takes {expected} values, got {actual}")]
    Arity {
        table: String,
        expected: usize,
        actual: usize,
    },
}

/// Receives insert statements for mapped observations.
///
/// `execute` stages a row and returns `Ok(false)` when it would duplicate
/// a unique key; nothing is durable until `commit`.
pub trait PersistenceSink: Send {
    fn execute(
        &mut self,
        template: &InsertTemplate,
        values: &[Option<Value>],
    ) -> Result<bool, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard everything staged since the last commit
    fn rollback(&mut self);
}

/// Columns whose combined values must be unique within a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub table: String,
    pub columns: Vec<String>,
}

impl UniqueKey {
    pub fn new(table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Encoded key of `row`, if every key column is present and non-null
    fn encode(&self, table: &str, row: &Row) -> Option<String> {
        if self.table != table {
            return None;
        }
        let parts: Option<Vec<&Value>> = self
            .columns
            .iter()
            .map(|column| row.get(column).and_then(Option::as_ref))
            .collect();
        serde_json::to_string(&(table, parts?)).ok()
    }
}

/// Store-side UTC timestamp, second resolution
pub(crate) fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Combine a template with its positional values
pub(crate) fn build_row(
    template: &InsertTemplate,
    values: &[Option<Value>],
    observed: &str,
) -> Result<Row, StoreError> {
    let expected = template.params().count();
    if expected != values.len() {
        return Err(StoreError::Arity {
            table: template.table.clone(),
            expected,
            actual: values.len(),
        });
    }
    let mut values = values.iter();
    let mut row = Row::new();
    for (column, placeholder) in &template.columns {
        let value = match placeholder {
            Placeholder::Param => values.next().cloned().flatten(),
            Placeholder::ServerTimestamp => Some(Value::Text(observed.to_string())),
        };
        row.insert(column.clone(), value);
    }
    Ok(row)
}

/// Rows staged since the last commit plus the keys already committed
#[derive(Debug, Default)]
pub(crate) struct Staging {
    unique: Vec<UniqueKey>,
    committed_keys: HashSet<String>,
    pending: Vec<(String, Row)>,
    pending_keys: HashSet<String>,
}

impl Staging {
    pub(crate) fn new(unique: Vec<UniqueKey>) -> Self {
        Self {
            unique,
            ..Self::default()
        }
    }

    fn keys(&self, table: &str, row: &Row) -> Vec<String> {
        self.unique
            .iter()
            .filter_map(|key| key.encode(table, row))
            .collect()
    }

    /// Remember a row that is already durable
    pub(crate) fn remember(&mut self, table: &str, row: &Row) {
        for key in self.keys(table, row) {
            self.committed_keys.insert(key);
        }
    }

    /// Stage a row; `false` if it collides with a known key
    pub(crate) fn stage(&mut self, table: &str, row: Row) -> bool {
        let keys = self.keys(table, &row);
        if keys
            .iter()
            .any(|k| self.committed_keys.contains(k) || self.pending_keys.contains(k))
        {
            tracing::debug!(table, "duplicate row ignored");
            return false;
        }
        self.pending_keys.extend(keys);
        self.pending.push((table.to_string(), row));
        true
    }

    pub(crate) fn pending(&self) -> &[(String, Row)] {
        &self.pending
    }

    /// Pending rows became durable
    pub(crate) fn confirm(&mut self) -> Vec<(String, Row)> {
        let keys = std::mem::take(&mut self.pending_keys);
        self.committed_keys.extend(keys);
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn discard(&mut self) {
        self.pending.clear();
        self.pending_keys.clear();
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
