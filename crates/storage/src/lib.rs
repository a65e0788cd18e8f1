// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prattle-storage: where significant observations are persisted

mod sink;
mod wal;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use sink::{PersistenceSink, Row, StoreError, UniqueKey};
pub use wal::{StoredRow, WalStore};

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
