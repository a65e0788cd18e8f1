// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines store for persisted observations

use crate::sink::{build_row, utc_timestamp, PersistenceSink, Row, Staging, StoreError, UniqueKey};
use prattle_core::field::InsertTemplate;
use prattle_core::Value;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One committed row as it appears in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub seq: u64,
    pub table: String,
    pub row: Row,
}

/// Transactional store over an append-only log.
///
/// `execute` stages rows in memory; `commit` appends them and syncs.
pub struct WalStore {
    path: PathBuf,
    file: File,
    sequence: u64,
    staging: Staging,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Rows read from a log, up to the first entry that does not parse
struct Scan {
    rows: Vec<StoredRow>,
    /// Byte offset just past the last complete row
    valid_len: u64,
    /// Why the scan stopped early, if it did
    torn: Option<String>,
}

/// Read complete lines until the first torn or unparsable one.
///
/// A crash mid-append leaves a partial last line; everything from that
/// point on is treated as never committed.
fn scan(path: &Path) -> Result<Scan, StoreError> {
    let mut scan = Scan {
        rows: Vec::new(),
        valid_len: 0,
        torn: None,
    };
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(scan),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut line = String::new();
    loop {
        line.clear();
        let read = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                scan.torn = Some(e.to_string());
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if !line.ends_with('\n') {
            scan.torn = Some("incomplete last line".to_string());
            break;
        }
        let entry = line.trim_end();
        if !entry.is_empty() {
            match serde_json::from_str(entry) {
                Ok(row) => scan.rows.push(row),
                Err(e) => {
                    scan.torn = Some(e.to_string());
                    break;
                }
            }
        }
        scan.valid_len += read as u64;
    }
    Ok(scan)
}

impl WalStore {
    /// Open or create a store at the given path.
    ///
    /// Existing rows are scanned to continue the sequence and to seed the
    /// unique keys. A torn tail is cut back to the last complete row.
    pub fn open(path: &Path, unique: Vec<UniqueKey>) -> Result<Self, StoreError> {
        let Scan {
            rows: existing,
            valid_len,
            torn,
        } = scan(path)?;
        if let Some(reason) = torn {
            tracing::warn!(
                path = %path.display(),
                offset = valid_len,
                reason = %reason,
                "store log has a torn tail, truncating"
            );
            OpenOptions::new().write(true).open(path)?.set_len(valid_len)?;
        }
        let file = open_append(path)?;
        let mut staging = Staging::new(unique);
        for stored in &existing {
            staging.remember(&stored.table, &stored.row);
        }
        let sequence = existing.last().map_or(0, |stored| stored.seq);
        tracing::debug!(path = %path.display(), rows = existing.len(), "store opened");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
            staging,
        })
    }

    /// Sequence number of the last committed row
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every committed row, stopping at a torn tail
    pub fn replay(path: &Path) -> Result<Vec<StoredRow>, StoreError> {
        Ok(scan(path)?.rows)
    }

    fn write_batch(&mut self, batch: &[u8]) -> io::Result<()> {
        self.file.write_all(batch)?;
        self.file.sync_all()
    }
}

impl PersistenceSink for WalStore {
    fn execute(
        &mut self,
        template: &InsertTemplate,
        values: &[Option<Value>],
    ) -> Result<bool, StoreError> {
        let row = build_row(template, values, &utc_timestamp())?;
        Ok(self.staging.stage(&template.table, row))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.staging.pending().is_empty() {
            return Ok(());
        }

        let mut batch = Vec::new();
        let mut seq = self.sequence;
        for (table, row) in self.staging.pending() {
            seq += 1;
            let stored = StoredRow {
                seq,
                table: table.clone(),
                row: row.clone(),
            };
            serde_json::to_writer(&mut batch, &stored)?;
            batch.push(b'\n');
        }

        if let Err(e) = self.write_batch(&batch) {
            // One retry on a fresh handle
            tracing::warn!(path = %self.path.display(), error = %e, "store write failed, reopening");
            self.file = open_append(&self.path)?;
            self.write_batch(&batch)?;
        }

        self.staging.confirm();
        self.sequence = seq;
        Ok(())
    }

    fn rollback(&mut self) {
        self.staging.discard();
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
